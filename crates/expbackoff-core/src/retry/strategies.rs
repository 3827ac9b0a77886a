//! Backoff delay scheduling
//!
//! A pure mapping from attempt index to pause length. Growth is unbounded:
//! there is no cap and no jitter.

use crate::types::RetryPolicy;
use std::time::Duration;

/// Calculate the pause before retry `attempt_index`
///
/// # Arguments
///
/// * `policy` - The retry policy containing the base delay and factor
/// * `attempt_index` - The retry index (0-indexed, 0 = before the first retry)
///
/// # Returns
///
/// `base_delay_ms * backoff_factor^attempt_index`, truncated to whole
/// milliseconds. Results beyond `u64::MAX` milliseconds saturate.
///
/// # Example
///
/// ```rust
/// use expbackoff_core::retry::calculate_delay;
/// use expbackoff_core::types::RetryPolicy;
/// use std::time::Duration;
///
/// let policy = RetryPolicy::new(5, Duration::from_millis(100), 1.5);
///
/// assert_eq!(calculate_delay(&policy, 0).as_millis(), 100);
/// assert_eq!(calculate_delay(&policy, 3).as_millis(), 337);
/// ```
pub fn calculate_delay(policy: &RetryPolicy, attempt_index: u32) -> Duration {
    let multiplier = policy.backoff_factor.powf(f64::from(attempt_index));
    // `as` truncates toward zero and saturates at the integer bounds
    let delay_ms = (policy.base_delay_ms as f64 * multiplier) as u64;

    Duration::from_millis(delay_ms)
}

/// Iterator over the pauses an exhausted invocation incurs
///
/// Yields `delay(0)` through `delay(max_retries - 1)`, one per retry. With
/// `trailing_delay` set, `delay(max_retries)` follows as the final pause.
#[derive(Debug, Clone)]
pub struct BackoffSchedule<'a> {
    policy: &'a RetryPolicy,
    next: u32,
    len: u32,
}

impl<'a> BackoffSchedule<'a> {
    /// Create a schedule for the given policy
    pub fn new(policy: &'a RetryPolicy) -> Self {
        let len = policy
            .max_retries
            .saturating_add(u32::from(policy.trailing_delay));
        Self {
            policy,
            next: 0,
            len,
        }
    }

    /// Sum of every pause in the schedule
    pub fn total(&self) -> Duration {
        self.clone()
            .fold(Duration::ZERO, |acc, delay| acc.saturating_add(delay))
    }
}

impl Iterator for BackoffSchedule<'_> {
    type Item = Duration;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.len {
            return None;
        }
        let delay = calculate_delay(self.policy, self.next);
        self.next += 1;
        Some(delay)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.len - self.next) as usize;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for BackoffSchedule<'_> {}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(base_ms: u64, factor: f64) -> RetryPolicy {
        RetryPolicy::new(5, Duration::from_millis(base_ms), factor)
    }

    #[test]
    fn test_first_delay_is_base_delay() {
        for factor in [0.5, 1.0, 1.5, 2.0, 10.0] {
            assert_eq!(
                calculate_delay(&policy(250, factor), 0),
                Duration::from_millis(250)
            );
        }
    }

    #[test]
    fn test_growth_with_fractional_factor() {
        let policy = policy(100, 1.5);

        // 100 * 1.5^n, fractional milliseconds discarded
        assert_eq!(calculate_delay(&policy, 0), Duration::from_millis(100));
        assert_eq!(calculate_delay(&policy, 1), Duration::from_millis(150));
        assert_eq!(calculate_delay(&policy, 2), Duration::from_millis(225));
        assert_eq!(calculate_delay(&policy, 3), Duration::from_millis(337));
    }

    #[test]
    fn test_truncates_rather_than_rounds() {
        // 3 * 1.5 = 4.5 -> 4, 3 * 2.25 = 6.75 -> 6
        let policy = policy(3, 1.5);
        assert_eq!(calculate_delay(&policy, 1), Duration::from_millis(4));
        assert_eq!(calculate_delay(&policy, 2), Duration::from_millis(6));
    }

    #[test]
    fn test_factor_one_is_fixed_delay() {
        let policy = policy(40, 1.0);
        for attempt in 0..20 {
            assert_eq!(calculate_delay(&policy, attempt), Duration::from_millis(40));
        }
    }

    #[test]
    fn test_monotonic_when_factor_at_least_one() {
        let policy = policy(7, 1.3);
        let delays: Vec<_> = (0..30).map(|n| calculate_delay(&policy, n)).collect();
        assert!(delays.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_factor_below_one_shrinks() {
        let policy = policy(1000, 0.5);
        assert_eq!(calculate_delay(&policy, 1), Duration::from_millis(500));
        assert_eq!(calculate_delay(&policy, 2), Duration::from_millis(250));
    }

    #[test]
    fn test_no_cap_and_saturation() {
        let policy = policy(1000, 10.0);
        assert_eq!(
            calculate_delay(&policy, 6),
            Duration::from_millis(1_000_000_000)
        );
        assert_eq!(calculate_delay(&policy, 400), Duration::from_millis(u64::MAX));
    }

    #[test]
    fn test_schedule_lists_one_delay_per_retry() {
        let policy = policy(100, 2.0);
        let schedule: Vec<_> = BackoffSchedule::new(&policy).collect();

        assert_eq!(
            schedule,
            vec![
                Duration::from_millis(100),
                Duration::from_millis(200),
                Duration::from_millis(400),
                Duration::from_millis(800),
                Duration::from_millis(1600),
            ]
        );
        assert_eq!(BackoffSchedule::new(&policy).len(), 5);
        assert_eq!(
            BackoffSchedule::new(&policy).total(),
            Duration::from_millis(3100)
        );
    }

    #[test]
    fn test_schedule_empty_without_retries() {
        let policy = RetryPolicy::new(0, Duration::from_millis(100), 2.0);
        assert_eq!(BackoffSchedule::new(&policy).count(), 0);
        assert_eq!(BackoffSchedule::new(&policy).total(), Duration::ZERO);
    }

    #[test]
    fn test_schedule_includes_trailing_pause() {
        let policy =
            RetryPolicy::new(2, Duration::from_millis(100), 2.0).with_trailing_delay(true);
        let schedule: Vec<_> = BackoffSchedule::new(&policy).collect();

        assert_eq!(
            schedule,
            vec![
                Duration::from_millis(100),
                Duration::from_millis(200),
                Duration::from_millis(400),
            ]
        );
        assert_eq!(BackoffSchedule::new(&policy).len(), 3);
        assert_eq!(
            BackoffSchedule::new(&policy).total(),
            Duration::from_millis(700)
        );
    }
}
