//! Exponential backoff with jitter.

use std::time::Duration;

use rand::Rng;

use crate::config::RestartConfig;

/// Calculate exponential backoff delay with jitter.
pub fn calculate_backoff(attempt: u32, base_ms: u64, max_ms: u64) -> Duration {
    if attempt == 0 {
        return Duration::from_millis(0);
    }

    let exponential_base = 2u64.saturating_pow(attempt - 1);
    let delay_ms = base_ms.saturating_mul(exponential_base);
    let capped_delay = delay_ms.min(max_ms);

    // Apply jitter (0 to 10% of the delay)
    let jitter_range = capped_delay / 10;
    let jitter = if jitter_range > 0 {
        rand::thread_rng().gen_range(0..jitter_range)
    } else {
        0
    };

    Duration::from_millis(capped_delay + jitter)
}

/// Restart decision helper over the configured policy.
#[derive(Debug, Clone)]
pub struct RestartPolicy {
    config: RestartConfig,
}

impl RestartPolicy {
    pub fn new(config: RestartConfig) -> Self {
        Self { config }
    }

    /// Whether another restart attempt is allowed.
    pub fn allows(&self, attempt: u32) -> bool {
        self.config.enabled && attempt < self.config.max_attempts
    }

    /// Delay before the given attempt (1-based).
    pub fn delay(&self, attempt: u32) -> Duration {
        calculate_backoff(attempt, self.config.base_delay_ms, self.config.max_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_calculation() {
        let b1 = calculate_backoff(1, 100, 2000);
        assert!(b1.as_millis() >= 100);

        let b2 = calculate_backoff(2, 100, 2000);
        assert!(b2.as_millis() >= 200);

        let max = calculate_backoff(10, 100, 1000);
        assert!(max.as_millis() >= 1000);
        // Cap plus at most 10% jitter
        assert!(max.as_millis() <= 1100);
    }

    #[test]
    fn test_policy_limits_attempts() {
        let policy = RestartPolicy::new(RestartConfig {
            enabled: true,
            max_attempts: 3,
            base_delay_ms: 10,
            max_delay_ms: 100,
        });
        assert!(policy.allows(0));
        assert!(policy.allows(2));
        assert!(!policy.allows(3));

        let disabled = RestartPolicy::new(RestartConfig {
            enabled: false,
            ..Default::default()
        });
        assert!(!disabled.allows(0));
    }
}
