//! Polling policy for the stop-verification loop.

use std::time::Duration;

/// Default interval between status polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Default poll budget.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 60;

/// Default cap on consecutive transient status-check failures.
pub const DEFAULT_MAX_TRANSIENT_POLLS: u32 = 3;

/// Bound on how long the orchestrator polls for an instance to stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollBudget {
    /// Give up after this many status checks.
    MaxAttempts(u32),

    /// Give up once this much time has been spent polling.
    MaxElapsed(Duration),
}

/// Polling configuration for a resize run.
///
/// Configuration only; the orchestrator never mutates it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Sleep between status checks.
    pub interval: Duration,

    /// Overall polling bound.
    pub budget: PollBudget,

    /// Consecutive transient status-check failures tolerated before the
    /// run fails. The streak resets on every successful check.
    pub max_transient_polls: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            budget: PollBudget::MaxAttempts(DEFAULT_MAX_ATTEMPTS),
            max_transient_polls: DEFAULT_MAX_TRANSIENT_POLLS,
        }
    }
}

impl PollPolicy {
    /// Policy bounded by a number of status checks.
    pub fn with_max_attempts(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            budget: PollBudget::MaxAttempts(max_attempts),
            ..Self::default()
        }
    }

    /// Policy bounded by elapsed polling time.
    pub fn with_max_elapsed(interval: Duration, max_elapsed: Duration) -> Self {
        Self {
            interval,
            budget: PollBudget::MaxElapsed(max_elapsed),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy() {
        let policy = PollPolicy::default();
        assert_eq!(policy.interval, DEFAULT_POLL_INTERVAL);
        assert_eq!(policy.budget, PollBudget::MaxAttempts(DEFAULT_MAX_ATTEMPTS));
        assert_eq!(policy.max_transient_polls, DEFAULT_MAX_TRANSIENT_POLLS);
    }

    #[test]
    fn test_constructors() {
        let policy = PollPolicy::with_max_attempts(Duration::from_secs(2), 10);
        assert_eq!(policy.budget, PollBudget::MaxAttempts(10));
        assert_eq!(policy.interval, Duration::from_secs(2));

        let policy = PollPolicy::with_max_elapsed(Duration::from_secs(1), Duration::from_secs(30));
        assert_eq!(policy.budget, PollBudget::MaxElapsed(Duration::from_secs(30)));
    }
}
