use std::time::Duration;

/// How `await_completion` waits for an indexing job.
///
/// The defaults keep a fixed 30 second cadence and give up after two hours of
/// status checks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PollPolicy {
    /// Delay before the second status check.
    pub interval: Duration,
    /// Multiplier applied to the delay after every check. `1.0` keeps it fixed.
    pub backoff: f64,
    /// Upper bound for the delay once backoff kicks in.
    pub max_interval: Duration,
    /// Maximum number of status checks, including the first.
    pub max_attempts: u32,
    /// Overall deadline, measured from the first status check.
    pub timeout: Option<Duration>,
    /// Stop as soon as the service reports `failed` instead of polling on.
    pub fail_fast: bool,
}

pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(30);
pub const DEFAULT_MAX_INTERVAL: Duration = Duration::from_secs(300);
pub const DEFAULT_MAX_ATTEMPTS: u32 = 240;

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            backoff: 1.0,
            max_interval: DEFAULT_MAX_INTERVAL,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            timeout: None,
            fail_fast: false,
        }
    }
}

impl PollPolicy {
    /// Fixed-interval policy with the given attempt ceiling.
    pub fn fixed(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts,
            ..Self::default()
        }
    }

    pub fn with_backoff(mut self, backoff: f64, max_interval: Duration) -> Self {
        self.backoff = backoff;
        self.max_interval = max_interval;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    /// Delay to use after `current`.
    pub fn next_delay(&self, current: Duration) -> Duration {
        if self.backoff <= 1.0 {
            return current;
        }
        let ceiling = self.max_interval.max(self.interval);
        Duration::try_from_secs_f64(current.as_secs_f64() * self.backoff)
            .map_or(ceiling, |scaled| scaled.min(ceiling))
    }

    /// Problems that would make the policy unusable.
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if self.max_attempts == 0 {
            problems.push("poll.max_attempts must be at least 1".to_string());
        }
        if !self.backoff.is_finite() || self.backoff < 1.0 {
            problems.push(format!(
                "poll.backoff must be a number >= 1.0, got {}",
                self.backoff
            ));
        }
        if self.max_interval < self.interval {
            problems.push("poll.max_interval_secs is smaller than poll.interval_secs".to_string());
        }
        problems
    }
}
