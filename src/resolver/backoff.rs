//! Delay before re-resolving after a failed lookup.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How long to wait before retrying a failed resolution.
///
/// The default retries every minute, however many attempts have failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BackoffPolicy {
    /// Same delay after every failure.
    Fixed { delay_ms: u64 },
    /// Doubles from `base_delay_ms` with each consecutive failure, never
    /// exceeding `max_delay_ms`.
    Exponential { base_delay_ms: u64, max_delay_ms: u64 },
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self::Fixed { delay_ms: 60_000 }
    }
}

impl BackoffPolicy {
    pub fn fixed(delay: Duration) -> Self {
        Self::Fixed {
            delay_ms: delay.as_millis().try_into().unwrap_or(u64::MAX),
        }
    }

    /// Starts at one second and backs off to the one-minute default.
    pub fn exponential() -> Self {
        Self::Exponential {
            base_delay_ms: 1_000,
            max_delay_ms: 60_000,
        }
    }

    /// Delay after `failures` consecutive failed attempts. Zero failures
    /// count as one.
    pub fn delay(&self, failures: u32) -> Duration {
        match *self {
            Self::Fixed { delay_ms } => Duration::from_millis(delay_ms),
            Self::Exponential {
                base_delay_ms,
                max_delay_ms,
            } => calculate_backoff(failures, base_delay_ms, max_delay_ms),
        }
    }
}

/// `base_delay_ms * 2^(failures-1)`, capped at `max_delay_ms`.
pub fn calculate_backoff(failures: u32, base_delay_ms: u64, max_delay_ms: u64) -> Duration {
    let doublings = failures.saturating_sub(1);
    let delay_ms = 2u64
        .checked_pow(doublings)
        .and_then(|factor| base_delay_ms.checked_mul(factor))
        .map_or(max_delay_ms, |ms| ms.min(max_delay_ms));
    Duration::from_millis(delay_ms)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_one_minute_fixed() {
        let policy = BackoffPolicy::default();
        assert_eq!(policy.delay(1), Duration::from_secs(60));
        assert_eq!(policy.delay(50), Duration::from_secs(60));
    }

    #[test]
    fn test_exponential_doubles() {
        let policy = BackoffPolicy::Exponential {
            base_delay_ms: 100,
            max_delay_ms: 5_000,
        };

        assert_eq!(policy.delay(0), Duration::from_millis(100));
        assert_eq!(policy.delay(1), Duration::from_millis(100));
        assert_eq!(policy.delay(2), Duration::from_millis(200));
        assert_eq!(policy.delay(3), Duration::from_millis(400));
        assert_eq!(policy.delay(7), Duration::from_millis(5_000));
    }

    #[test]
    fn test_exponential_capped_without_overflow() {
        assert_eq!(calculate_backoff(2, 1_000, 2_000), Duration::from_millis(2_000));
        assert_eq!(calculate_backoff(64, 1_000, 60_000), Duration::from_millis(60_000));
        assert_eq!(calculate_backoff(u32::MAX, u64::MAX, 60_000), Duration::from_millis(60_000));
    }

    #[test]
    fn test_exponential_reaches_default_delay() {
        let policy = BackoffPolicy::exponential();
        assert_eq!(policy.delay(1), Duration::from_secs(1));
        assert_eq!(policy.delay(100), BackoffPolicy::default().delay(1));
    }

    #[test]
    fn test_fixed_from_duration() {
        let policy = BackoffPolicy::fixed(Duration::from_millis(250));
        assert_eq!(policy, BackoffPolicy::Fixed { delay_ms: 250 });
    }
}
