//
// Copyright 2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! Exponential backoff of retry delays and per-attempt timeouts.

use crate::settings::BackoffSettings;
use std::time::Duration;

/// Computes the delay before each retry and the timeout of each attempt.
///
/// Attempts are numbered from 1. For attempt `n`:
///
/// - `delay(n) = min(initial_retry_delay * retry_delay_multiplier^(n-1), max_retry_delay)`
/// - `rpc_timeout(n) = min(initial_rpc_timeout * rpc_timeout_multiplier^(n-1), max_rpc_timeout)`
///
/// With jitter enabled the delay actually slept is uniform in `[0, delay(n)]`.
///
/// # Examples
///
/// ```
/// use gaxrpc::retry::BackoffPolicy;
/// use gaxrpc::settings::BackoffSettings;
/// use std::time::Duration;
///
/// let policy = BackoffPolicy::new(
///     BackoffSettings::builder()
///         .initial_retry_delay(Duration::from_millis(100))
///         .retry_delay_multiplier(2.0)
///         .max_retry_delay(Duration::from_millis(500))
///         .jitter(false)
///         .build(),
/// );
///
/// assert_eq!(policy.delay(1), Duration::from_millis(100));
/// assert_eq!(policy.delay(3), Duration::from_millis(400));
/// assert_eq!(policy.delay(4), Duration::from_millis(500));
/// ```
#[derive(Debug, Clone)]
pub struct BackoffPolicy {
    settings: BackoffSettings,
}

impl BackoffPolicy {
    /// Creates a policy from backoff settings.
    pub fn new(settings: BackoffSettings) -> Self {
        Self { settings }
    }

    /// The settings this policy was built from.
    pub fn settings(&self) -> &BackoffSettings {
        &self.settings
    }

    /// Un-jittered delay after attempt `attempt` failed.
    pub fn delay(&self, attempt: u32) -> Duration {
        grow(
            self.settings.initial_retry_delay,
            self.settings.retry_delay_multiplier,
            attempt,
            Some(self.settings.max_retry_delay),
        )
    }

    /// Delay to actually sleep after attempt `attempt` failed.
    pub fn next_delay(&self, attempt: u32) -> Duration {
        let delay = self.delay(attempt);
        if self.settings.jitter {
            delay.mul_f64(rand::random::<f64>())
        } else {
            delay
        }
    }

    /// Timeout of attempt `attempt` ignoring the total budget, or `None`
    /// when no initial RPC timeout is configured.
    pub fn rpc_timeout(&self, attempt: u32) -> Option<Duration> {
        self.settings.initial_rpc_timeout.map(|initial| {
            grow(
                initial,
                self.settings.rpc_timeout_multiplier,
                attempt,
                self.settings.max_rpc_timeout,
            )
        })
    }

    /// Timeout of attempt `attempt`, additionally bounded by the `remaining`
    /// total budget.
    pub fn sub_timeout(&self, attempt: u32, remaining: Option<Duration>) -> Option<Duration> {
        match (self.rpc_timeout(attempt), remaining) {
            (Some(timeout), Some(remaining)) => Some(timeout.min(remaining)),
            (timeout, None) => timeout,
            (None, remaining) => remaining,
        }
    }
}

/// `base * multiplier^(attempt-1)` rounded to the nanosecond, capped at
/// `cap`. Saturates instead of overflowing.
fn grow(base: Duration, multiplier: f64, attempt: u32, cap: Option<Duration>) -> Duration {
    let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
    let nanos = (base.as_nanos() as f64 * multiplier.powi(exponent)).round();

    let grown = if nanos.is_nan() || nanos <= 0.0 {
        Duration::ZERO
    } else if nanos >= u64::MAX as f64 {
        Duration::MAX
    } else {
        Duration::from_nanos(nanos as u64)
    };
    match cap {
        Some(cap) => grown.min(cap),
        None => grown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_jitter() -> BackoffSettings {
        BackoffSettings::builder()
            .initial_retry_delay(Duration::from_millis(100))
            .retry_delay_multiplier(2.0)
            .max_retry_delay(Duration::from_secs(1))
            .initial_rpc_timeout(Duration::from_millis(200))
            .rpc_timeout_multiplier(1.5)
            .max_rpc_timeout(Duration::from_millis(400))
            .jitter(false)
            .build()
    }

    #[test]
    fn test_delay_growth() {
        let policy = BackoffPolicy::new(no_jitter());
        assert_eq!(policy.delay(1), Duration::from_millis(100));
        assert_eq!(policy.delay(2), Duration::from_millis(200));
        assert_eq!(policy.delay(3), Duration::from_millis(400));
        assert_eq!(policy.delay(4), Duration::from_millis(800));
        assert_eq!(policy.delay(5), Duration::from_secs(1));
        assert_eq!(policy.delay(500), Duration::from_secs(1));
    }

    #[test]
    fn test_delays_non_decreasing_and_bounded() {
        let policy = BackoffPolicy::new(no_jitter());
        let delays: Vec<_> = (1..=20).map(|n| policy.next_delay(n)).collect();
        for pair in delays.windows(2) {
            assert!(pair[0] <= pair[1]);
        }
        assert!(delays.iter().all(|d| *d <= Duration::from_secs(1)));
    }

    #[test]
    fn test_jitter_within_bounds() {
        let mut settings = no_jitter();
        settings.jitter = true;
        let policy = BackoffPolicy::new(settings);
        for attempt in 1..=10 {
            for _ in 0..20 {
                assert!(policy.next_delay(attempt) <= policy.delay(attempt));
            }
        }
    }

    #[test]
    fn test_rpc_timeout_growth() {
        let policy = BackoffPolicy::new(no_jitter());
        assert_eq!(policy.rpc_timeout(1), Some(Duration::from_millis(200)));
        assert_eq!(policy.rpc_timeout(2), Some(Duration::from_millis(300)));
        assert_eq!(policy.rpc_timeout(3), Some(Duration::from_millis(400)));
        assert_eq!(policy.rpc_timeout(9), Some(Duration::from_millis(400)));
    }

    #[test]
    fn test_sub_timeout_bounded_by_remaining() {
        let policy = BackoffPolicy::new(no_jitter());
        assert_eq!(
            policy.sub_timeout(2, Some(Duration::from_millis(50))),
            Some(Duration::from_millis(50))
        );
        assert_eq!(
            policy.sub_timeout(2, Some(Duration::from_secs(5))),
            Some(Duration::from_millis(300))
        );
        assert_eq!(
            policy.sub_timeout(1, None),
            Some(Duration::from_millis(200))
        );
    }

    #[test]
    fn test_sub_timeout_without_initial() {
        let policy = BackoffPolicy::new(BackoffSettings::default());
        assert_eq!(policy.rpc_timeout(1), None);
        assert_eq!(policy.sub_timeout(1, None), None);
        assert_eq!(
            policy.sub_timeout(1, Some(Duration::from_secs(3))),
            Some(Duration::from_secs(3))
        );
    }

    #[test]
    fn test_uncapped_growth_saturates() {
        let policy = BackoffPolicy::new(BackoffSettings {
            initial_rpc_timeout: Some(Duration::from_secs(1)),
            rpc_timeout_multiplier: 10.0,
            ..BackoffSettings::default()
        });
        assert_eq!(policy.rpc_timeout(1000), Some(Duration::MAX));
    }
}
