use serde::Deserialize;
use std::fmt;

/// How far back a run is expected to reach
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CrawlMode {
    /// Walk the archive until it runs out or hits an explicit cap
    Historical,

    /// Re-visit the newest pages and stop once nothing new turns up
    #[default]
    Incremental,
}

impl CrawlMode {
    /// Converts the mode to its database string representation
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Historical => "historical",
            Self::Incremental => "incremental",
        }
    }

    /// Parses a mode from its database string representation
    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "historical" => Some(Self::Historical),
            "incremental" => Some(Self::Incremental),
            _ => None,
        }
    }

    /// Whether consecutive pages without new posts end the run
    pub fn stops_on_stale_pages(&self) -> bool {
        matches!(self, Self::Incremental)
    }
}

impl fmt::Display for CrawlMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_string())
    }
}
