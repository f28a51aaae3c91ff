use std::time::Duration;

/// Growth factor applied after every poll cycle.
pub const BACKOFF_MULTIPLIER: f64 = 1.3;

/// Capped exponential delay between poll cycles.
///
/// Yields `initial`, then multiplies by [`BACKOFF_MULTIPLIER`] after every call until
/// `max` is reached. No jitter.
#[derive(Debug, Clone)]
pub struct PollingBackoff {
    current: Duration,
    max: Duration,
}

impl PollingBackoff {
    #[must_use]
    pub fn new(initial: Duration, max: Duration) -> Self {
        Self {
            current: initial.min(max),
            max,
        }
    }

    /// The delay to sleep now. Advances the sequence.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        self.current = self.current.mul_f64(BACKOFF_MULTIPLIER).min(self.max);
        delay
    }
}
