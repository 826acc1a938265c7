//! Caller-initiated retry budget for failed searches.
//!
//! Unlike an automatic retry loop, the user presses "Try again" and the
//! session asks the budget how long to wait first. Delays double from the
//! base: 1 s, 2 s, 4 s. After [`MAX_RETRY_ATTEMPTS`] the budget is spent and
//! the UI shows [`RETRY_EXHAUSTED_MESSAGE`] instead of a retry button.

use std::time::Duration;

pub const MAX_RETRY_ATTEMPTS: u32 = 3;

pub const RETRY_EXHAUSTED_MESSAGE: &str = "Maximum retry attempts reached";

const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
pub struct RetryBudget {
    attempts: u32,
    max_attempts: u32,
    base_delay: Duration,
}

impl Default for RetryBudget {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_DELAY)
    }
}

impl RetryBudget {
    #[must_use]
    pub fn new(base_delay: Duration) -> Self {
        Self {
            attempts: 0,
            max_attempts: MAX_RETRY_ATTEMPTS,
            base_delay,
        }
    }

    /// Consumes one attempt and returns the delay to wait before it, or
    /// `None` once the budget is spent.
    pub fn next_delay(&mut self) -> Option<Duration> {
        if self.attempts >= self.max_attempts {
            return None;
        }
        let delay = self.base_delay.saturating_mul(1u32 << self.attempts.min(16));
        self.attempts += 1;
        Some(delay)
    }

    #[must_use]
    pub fn can_retry(&self) -> bool {
        self.attempts < self.max_attempts
    }

    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Called after a successful search.
    pub fn reset(&mut self) {
        self.attempts = 0;
    }
}
