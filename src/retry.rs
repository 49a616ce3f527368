//! Bounded retry for rate-limited requests.

use crate::error::{Result, ShuttleError};
use std::time::{Duration, SystemTime};

/// Limits applied while waiting out rate limits for one repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of attempts, the first one included.
    pub max_attempts: u32,
    /// Maximum total time spent sleeping.
    pub max_total_wait: Duration,
    /// Wait used when the provider gives no reset time.
    pub default_wait: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            max_total_wait: Duration::from_secs(60 * 60),
            default_wait: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    /// Sets the maximum number of attempts.
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    /// Sets the total sleep budget.
    pub fn max_total_wait(mut self, wait: Duration) -> Self {
        self.max_total_wait = wait;
        self
    }

    /// Sets the fallback wait.
    pub fn default_wait(mut self, wait: Duration) -> Self {
        self.default_wait = wait;
        self
    }

    /// Start tracking attempts against this policy.
    pub fn start(&self) -> Backoff {
        Backoff {
            policy: *self,
            attempts: 0,
            waited: Duration::ZERO,
        }
    }
}

/// Source of time for backoff.
///
/// The creator only ever sleeps through this trait, so tests can run rate
/// limit scenarios instantly.
pub trait Clock {
    /// Current wall-clock time.
    fn now(&self) -> SystemTime;

    /// Block the caller for `duration`.
    fn sleep(&self, duration: Duration);
}

/// The real clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Attempt and wait accounting for one retried operation.
#[derive(Debug, Clone)]
pub struct Backoff {
    policy: RetryPolicy,
    attempts: u32,
    waited: Duration,
}

impl Backoff {
    /// Record that an attempt is about to be made.
    pub fn begin_attempt(&mut self) {
        self.attempts += 1;
    }

    /// Attempts made so far.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Total time slept so far.
    pub fn waited(&self) -> Duration {
        self.waited
    }

    /// Sleep for `wait` before the next attempt, or fail if the policy does
    /// not allow another attempt or the wait does not fit the budget.
    pub fn wait(&mut self, clock: &impl Clock, wait: Duration) -> Result<()> {
        let remaining = self.policy.max_total_wait.saturating_sub(self.waited);
        if self.attempts >= self.policy.max_attempts || wait > remaining {
            return Err(ShuttleError::RateLimitExhausted {
                attempts: self.attempts,
                waited: self.waited,
            });
        }

        clock.sleep(wait);
        self.waited += wait;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Default)]
    struct FakeClock {
        sleeps: RefCell<Vec<Duration>>,
    }

    impl Clock for FakeClock {
        fn now(&self) -> SystemTime {
            SystemTime::UNIX_EPOCH
        }

        fn sleep(&self, duration: Duration) {
            self.sleeps.borrow_mut().push(duration);
        }
    }

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 10);
        assert_eq!(policy.default_wait, Duration::from_secs(60));
        assert_eq!(policy.max_total_wait, Duration::from_secs(3600));
    }

    #[test]
    fn test_max_attempts_is_at_least_one() {
        assert_eq!(RetryPolicy::default().max_attempts(0).max_attempts, 1);
    }

    #[test]
    fn test_waits_until_attempts_exhausted() {
        let clock = FakeClock::default();
        let mut backoff = RetryPolicy::default().max_attempts(3).start();

        backoff.begin_attempt();
        backoff.wait(&clock, Duration::from_secs(5)).unwrap();
        backoff.begin_attempt();
        backoff.wait(&clock, Duration::from_secs(5)).unwrap();
        backoff.begin_attempt();

        let err = backoff.wait(&clock, Duration::from_secs(5)).unwrap_err();
        match err {
            ShuttleError::RateLimitExhausted { attempts, waited } => {
                assert_eq!(attempts, 3);
                assert_eq!(waited, Duration::from_secs(10));
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(clock.sleeps.borrow().len(), 2);
    }

    #[test]
    fn test_refuses_wait_beyond_budget() {
        let clock = FakeClock::default();
        let mut backoff = RetryPolicy::default()
            .max_total_wait(Duration::from_secs(100))
            .start();

        backoff.begin_attempt();
        backoff.wait(&clock, Duration::from_secs(60)).unwrap();
        backoff.begin_attempt();

        assert!(backoff.wait(&clock, Duration::from_secs(41)).is_err());
        assert_eq!(*clock.sleeps.borrow(), vec![Duration::from_secs(60)]);
        assert_eq!(backoff.waited(), Duration::from_secs(60));
    }

    #[test]
    fn test_zero_wait_is_allowed() {
        let clock = FakeClock::default();
        let mut backoff = RetryPolicy::default().start();

        backoff.begin_attempt();
        backoff.wait(&clock, Duration::ZERO).unwrap();
        assert_eq!(backoff.attempts(), 1);
    }
}
