use std::time::Duration;

use rand::Rng;

/// Bounds how long a rate-limited registry lookup keeps retrying
#[derive(Clone, Debug, PartialEq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub max_total_wait: Duration,
    /// Used when the registry gives no (valid) retry-after
    pub default_delay: Duration,
    /// Each delay gets a random extra in `[0, jitter]`
    pub jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 10,
            max_total_wait: Duration::from_secs(1800),
            default_delay: Duration::from_secs(180),
            jitter: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    pub fn backoff(&self) -> Backoff<'_> {
        Backoff {
            policy: self,
            retries: 0,
            waited: Duration::from_secs(0),
        }
    }
}

/// Retry state for a single lookup
#[derive(Debug)]
pub struct Backoff<'a> {
    policy: &'a RetryPolicy,
    retries: u32,
    waited: Duration,
}

impl<'a> Backoff<'a> {
    /// Delay before the next attempt, or `None` once the policy is exhausted.
    ///
    /// A delay longer than what is left of `max_total_wait` is cut down to the
    /// remainder, so the last attempt happens right at the end of the budget.
    pub fn next_delay(&mut self, retry_after: Option<Duration>) -> Option<Duration> {
        if self.retries >= self.policy.max_retries {
            return None;
        }
        let remaining = self.policy.max_total_wait.saturating_sub(self.waited);
        if remaining == Duration::from_secs(0) {
            return None;
        }
        let delay = retry_after
            .unwrap_or(self.policy.default_delay)
            .saturating_add(self.jitter())
            .min(remaining);
        self.retries += 1;
        self.waited += delay;
        Some(delay)
    }

    pub fn retries(&self) -> u32 {
        self.retries
    }

    pub fn waited(&self) -> Duration {
        self.waited
    }

    fn jitter(&self) -> Duration {
        let max = self.policy.jitter.as_millis() as u64;
        if max == 0 {
            return Duration::from_secs(0);
        }
        Duration::from_millis(rand::thread_rng().gen_range(0..=max))
    }
}
