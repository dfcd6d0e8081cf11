/// A single way of pulling something out of an input
///
/// Strategies are kept in an ordered list and tried until one succeeds. The
/// lifetime lets an output borrow from the input, e.g. element references
/// into a parsed document.
pub trait ExtractionStrategy<'a, I: ?Sized + 'a> {
    type Output;

    /// Identifier used in logs and provenance tags
    fn name(&self) -> &str;

    /// Returns `None` when this strategy finds nothing usable
    fn try_extract(&self, input: &'a I) -> Option<Self::Output>;
}

/// Runs `strategies` in order and returns the first success with the strategy
/// that produced it
pub fn first_match<'s, 'a, I, S>(strategies: &'s [S], input: &'a I) -> Option<(&'s S, S::Output)>
where
    I: ?Sized + 'a,
    S: ExtractionStrategy<'a, I>,
{
    strategies.iter().find_map(|strategy| {
        let output = strategy.try_extract(input);
        if output.is_none() {
            tracing::trace!("Strategy {} did not match", strategy.name());
        }
        output.map(|out| (strategy, out))
    })
}
