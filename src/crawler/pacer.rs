//! Politeness delay between requests to the origin

use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// Enforces a fixed minimum pause between consecutive requests
///
/// This is not a retry backoff: the pause applies to every request, listing
/// pages and article pages alike.
#[derive(Debug, Clone)]
pub struct Pacer {
    min_delay: Duration,
    last_request_time: Option<Instant>,
}

impl Pacer {
    pub fn new(min_delay: Duration) -> Self {
        Self {
            min_delay,
            last_request_time: None,
        }
    }

    /// Builds a pacer from a delay in (possibly fractional) seconds
    ///
    /// Negative or NaN delays mean no pause; delays too large for a
    /// `Duration` saturate.
    pub fn from_secs_f64(seconds: f64) -> Self {
        let delay = Duration::try_from_secs_f64(seconds.max(0.0)).unwrap_or(Duration::MAX);
        Self::new(delay)
    }

    pub fn min_delay(&self) -> Duration {
        self.min_delay
    }

    /// Time remaining before the next request may start, if any
    pub fn time_until_next_request(&self, now: Instant) -> Option<Duration> {
        let last = self.last_request_time?;
        let elapsed = now.saturating_duration_since(last);
        (elapsed < self.min_delay).then(|| self.min_delay - elapsed)
    }

    pub fn record_request(&mut self, now: Instant) {
        self.last_request_time = Some(now);
    }

    /// Sleeps until the next request is allowed
    ///
    /// Returns `false` if `cancel` fired while waiting.
    pub async fn wait(&self, cancel: &CancellationToken) -> bool {
        let Some(delay) = self.time_until_next_request(Instant::now()) else {
            return !cancel.is_cancelled();
        };

        tracing::trace!("Pausing {:?} before next request", delay);
        tokio::select! {
            _ = cancel.cancelled() => false,
            _ = tokio::time::sleep(delay) => true,
        }
    }
}
