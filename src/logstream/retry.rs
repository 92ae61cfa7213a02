//! Exponential backoff schedules.

use std::time::Duration;

/// Grow `delay` by `multiplier`, never exceeding `max`.
fn next_delay(delay: Duration, multiplier: f64, max: Duration) -> Duration {
    let grown = delay.as_secs_f64() * multiplier.max(1.0);
    if grown >= max.as_secs_f64() {
        max
    } else {
        Duration::from_secs_f64(grown)
    }
}

/// A growing delay, starting at `initial` and capped at `max`.
#[derive(Debug, Clone)]
pub struct Backoff {
    current: Duration,
    max: Duration,
    multiplier: f64,
}

impl Backoff {
    #[must_use]
    pub fn new(initial: Duration, max: Duration, multiplier: f64) -> Self {
        Self {
            current: initial.min(max),
            max,
            multiplier,
        }
    }

    /// Return the current delay and grow it for the following call.
    pub fn advance(&mut self) -> Duration {
        let delay = self.current;
        self.current = next_delay(self.current, self.multiplier, self.max);
        delay
    }
}
