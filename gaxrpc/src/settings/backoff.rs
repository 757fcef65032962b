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

//! Backoff parameters shared by unary and streaming retries.

use std::time::Duration;

/// Parameters controlling the delay between retries and the timeout of each
/// individual attempt.
///
/// # Examples
///
/// ```
/// use gaxrpc::settings::BackoffSettings;
/// use std::time::Duration;
///
/// let backoff = BackoffSettings::builder()
///     .initial_retry_delay(Duration::from_millis(100))
///     .retry_delay_multiplier(1.3)
///     .max_retry_delay(Duration::from_secs(60))
///     .initial_rpc_timeout(Duration::from_secs(20))
///     .max_rpc_timeout(Duration::from_secs(60))
///     .total_timeout(Duration::from_secs(600))
///     .build();
/// assert_eq!(backoff.total_timeout, Some(Duration::from_secs(600)));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct BackoffSettings {
    /// Delay before the first retry.
    pub initial_retry_delay: Duration,
    /// Growth factor of the retry delay.
    pub retry_delay_multiplier: f64,
    /// Upper bound of the retry delay.
    pub max_retry_delay: Duration,
    /// Timeout of the first attempt. When unset the call's overall timeout
    /// is used.
    pub initial_rpc_timeout: Option<Duration>,
    /// Growth factor of the per-attempt timeout.
    pub rpc_timeout_multiplier: f64,
    /// Upper bound of the per-attempt timeout.
    pub max_rpc_timeout: Option<Duration>,
    /// Total time budget across all attempts and waits.
    pub total_timeout: Option<Duration>,
    /// Maximum number of retries. Mutually exclusive with `total_timeout`.
    pub max_retries: Option<u32>,
    /// Randomize each delay within `[0, delay]`.
    pub jitter: bool,
}

impl Default for BackoffSettings {
    fn default() -> Self {
        Self {
            initial_retry_delay: Duration::from_millis(100),
            retry_delay_multiplier: 1.3,
            max_retry_delay: Duration::from_secs(60),
            initial_rpc_timeout: None,
            rpc_timeout_multiplier: 1.0,
            max_rpc_timeout: None,
            total_timeout: None,
            max_retries: None,
            jitter: true,
        }
    }
}

impl BackoffSettings {
    /// Create a new builder for backoff settings.
    pub fn builder() -> BackoffSettingsBuilder {
        BackoffSettingsBuilder::default()
    }
}

/// Builder for [`BackoffSettings`].
#[derive(Debug, Default)]
pub struct BackoffSettingsBuilder {
    settings: BackoffSettings,
}

impl BackoffSettingsBuilder {
    /// Set the delay before the first retry.
    pub fn initial_retry_delay(mut self, delay: Duration) -> Self {
        self.settings.initial_retry_delay = delay;
        self
    }

    /// Set the growth factor of the retry delay.
    pub fn retry_delay_multiplier(mut self, multiplier: f64) -> Self {
        self.settings.retry_delay_multiplier = multiplier;
        self
    }

    /// Set the maximum retry delay.
    pub fn max_retry_delay(mut self, delay: Duration) -> Self {
        self.settings.max_retry_delay = delay;
        self
    }

    /// Set the timeout of the first attempt.
    pub fn initial_rpc_timeout(mut self, timeout: Duration) -> Self {
        self.settings.initial_rpc_timeout = Some(timeout);
        self
    }

    /// Set the growth factor of the per-attempt timeout.
    pub fn rpc_timeout_multiplier(mut self, multiplier: f64) -> Self {
        self.settings.rpc_timeout_multiplier = multiplier;
        self
    }

    /// Set the maximum per-attempt timeout.
    pub fn max_rpc_timeout(mut self, timeout: Duration) -> Self {
        self.settings.max_rpc_timeout = Some(timeout);
        self
    }

    /// Set the total time budget.
    pub fn total_timeout(mut self, timeout: Duration) -> Self {
        self.settings.total_timeout = Some(timeout);
        self
    }

    /// Set the maximum number of retries.
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.settings.max_retries = Some(retries);
        self
    }

    /// Enable or disable jitter.
    pub fn jitter(mut self, jitter: bool) -> Self {
        self.settings.jitter = jitter;
        self
    }

    /// Build the backoff settings.
    pub fn build(self) -> BackoffSettings {
        self.settings
    }
}
