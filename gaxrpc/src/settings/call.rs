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

//! Per-method call settings and per-call overrides.

use super::RetryOptions;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// Transport-specific arguments forwarded untouched to the call function.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OtherArgs {
    /// Request metadata (headers).
    pub headers: BTreeMap<String, String>,
}

impl OtherArgs {
    /// Returns a copy of `self` with the headers of `overrides` applied on
    /// top, key by key.
    #[must_use]
    pub fn merged_with(&self, overrides: &OtherArgs) -> Self {
        let mut headers = self.headers.clone();
        headers.extend(
            overrides
                .headers
                .iter()
                .map(|(key, value)| (key.clone(), value.clone())),
        );
        Self { headers }
    }
}

/// Settings of an API method, fixed at client construction.
///
/// `CallSettings` is never mutated after construction; per-call changes go
/// through [`CallSettings::merge`], which returns a new value.
///
/// # Examples
///
/// ```rust
/// use gaxrpc::settings::{CallOptions, CallSettings};
/// use std::time::Duration;
///
/// let settings = CallSettings::<String, String> {
///     timeout: Duration::from_secs(10),
///     ..Default::default()
/// };
/// let merged = settings.merge(&CallOptions::new().timeout(Duration::from_secs(2)));
/// assert_eq!(merged.timeout, Duration::from_secs(2));
/// assert_eq!(settings.timeout, Duration::from_secs(10));
/// ```
pub struct CallSettings<Req, Resp> {
    /// Timeout of a call without retries, and the default first-attempt
    /// timeout of a call with retries.
    ///
    /// Default: 30 seconds
    pub timeout: Duration,

    /// Retry policy. `None` disables retries.
    pub retry: Option<RetryOptions<Req, Resp>>,

    /// Fetch every page of a paginated method.
    ///
    /// Default: true
    pub auto_paginate: bool,

    /// Page token to start a paginated call from.
    pub page_token: Option<String>,

    /// Page size requested from a paginated method.
    pub page_size: Option<i32>,

    /// Maximum number of retries, applied on top of the retry policy.
    pub max_retries: Option<u32>,

    /// Route the call through the method's bundler.
    ///
    /// Default: true
    pub is_bundling: bool,

    /// Arguments passed to the transport.
    pub other_args: OtherArgs,

    /// Name of the API, used in diagnostics.
    pub api_name: Option<String>,
}

impl<Req, Resp> Default for CallSettings<Req, Resp> {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            retry: None,
            auto_paginate: true,
            page_token: None,
            page_size: None,
            max_retries: None,
            is_bundling: true,
            other_args: OtherArgs::default(),
            api_name: None,
        }
    }
}

impl<Req, Resp> CallSettings<Req, Resp> {
    /// Returns a new `CallSettings` with the fields set in `options` applied
    /// on top of `self`. Neither input is modified.
    ///
    /// Unset option fields keep the value of `self`. Headers are merged key
    /// by key. A `max_retries` override is written into the retry backoff and
    /// clears its total timeout, since the two limits are exclusive.
    #[must_use]
    pub fn merge(&self, options: &CallOptions<Req, Resp>) -> Self {
        let mut merged = self.clone();
        if let Some(timeout) = options.timeout {
            merged.timeout = timeout;
        }
        if let Some(retry) = &options.retry {
            merged.retry = retry.clone();
        }
        if let Some(auto_paginate) = options.auto_paginate {
            merged.auto_paginate = auto_paginate;
        }
        if let Some(page_token) = &options.page_token {
            merged.page_token = Some(page_token.clone());
        }
        if let Some(page_size) = options.page_size {
            merged.page_size = Some(page_size);
        }
        if let Some(max_retries) = options.max_retries {
            merged.max_retries = Some(max_retries);
            if let Some(retry) = merged.retry.as_mut() {
                retry.backoff.max_retries = Some(max_retries);
                retry.backoff.total_timeout = None;
            }
        }
        if let Some(is_bundling) = options.is_bundling {
            merged.is_bundling = is_bundling;
        }
        if let Some(other_args) = &options.other_args {
            merged.other_args = self.other_args.merged_with(other_args);
        }
        if let Some(api_name) = &options.api_name {
            merged.api_name = Some(api_name.clone());
        }
        merged
    }
}

impl<Req, Resp> Clone for CallSettings<Req, Resp> {
    fn clone(&self) -> Self {
        Self {
            timeout: self.timeout,
            retry: self.retry.clone(),
            auto_paginate: self.auto_paginate,
            page_token: self.page_token.clone(),
            page_size: self.page_size,
            max_retries: self.max_retries,
            is_bundling: self.is_bundling,
            other_args: self.other_args.clone(),
            api_name: self.api_name.clone(),
        }
    }
}

impl<Req, Resp> fmt::Debug for CallSettings<Req, Resp> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallSettings")
            .field("timeout", &self.timeout)
            .field("retry", &self.retry)
            .field("auto_paginate", &self.auto_paginate)
            .field("page_token", &self.page_token)
            .field("page_size", &self.page_size)
            .field("max_retries", &self.max_retries)
            .field("is_bundling", &self.is_bundling)
            .field("other_args", &self.other_args)
            .field("api_name", &self.api_name)
            .finish()
    }
}

/// Per-call overrides of [`CallSettings`]. Every field is optional.
pub struct CallOptions<Req, Resp> {
    timeout: Option<Duration>,
    retry: Option<Option<RetryOptions<Req, Resp>>>,
    auto_paginate: Option<bool>,
    page_token: Option<String>,
    page_size: Option<i32>,
    max_retries: Option<u32>,
    is_bundling: Option<bool>,
    other_args: Option<OtherArgs>,
    api_name: Option<String>,
}

impl<Req, Resp> Default for CallOptions<Req, Resp> {
    fn default() -> Self {
        Self {
            timeout: None,
            retry: None,
            auto_paginate: None,
            page_token: None,
            page_size: None,
            max_retries: None,
            is_bundling: None,
            other_args: None,
            api_name: None,
        }
    }
}

impl<Req, Resp> CallOptions<Req, Resp> {
    /// Creates empty options; merging them changes nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the call timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Replace the retry policy.
    pub fn retry(mut self, retry: RetryOptions<Req, Resp>) -> Self {
        self.retry = Some(Some(retry));
        self
    }

    /// Disable retries for this call.
    pub fn no_retry(mut self) -> Self {
        self.retry = Some(None);
        self
    }

    /// Enable or disable automatic pagination.
    pub fn auto_paginate(mut self, auto_paginate: bool) -> Self {
        self.auto_paginate = Some(auto_paginate);
        self
    }

    /// Start pagination from the given token.
    pub fn page_token(mut self, token: impl Into<String>) -> Self {
        self.page_token = Some(token.into());
        self
    }

    /// Request the given page size.
    pub fn page_size(mut self, size: i32) -> Self {
        self.page_size = Some(size);
        self
    }

    /// Limit the number of retries.
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = Some(retries);
        self
    }

    /// Enable or disable bundling for this call.
    pub fn bundling(mut self, is_bundling: bool) -> Self {
        self.is_bundling = Some(is_bundling);
        self
    }

    /// Add a request header.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.other_args
            .get_or_insert_with(OtherArgs::default)
            .headers
            .insert(key.into(), value.into());
        self
    }

    /// Set the API name reported in diagnostics.
    pub fn api_name(mut self, name: impl Into<String>) -> Self {
        self.api_name = Some(name.into());
        self
    }
}

impl<Req, Resp> fmt::Debug for CallOptions<Req, Resp> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallOptions")
            .field("timeout", &self.timeout)
            .field("retry", &self.retry)
            .field("auto_paginate", &self.auto_paginate)
            .field("page_token", &self.page_token)
            .field("page_size", &self.page_size)
            .field("max_retries", &self.max_retries)
            .field("is_bundling", &self.is_bundling)
            .field("other_args", &self.other_args)
            .field("api_name", &self.api_name)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::BackoffSettings;
    use crate::status::Code;

    type Settings = CallSettings<String, String>;
    type Options = CallOptions<String, String>;

    fn retrying() -> RetryOptions<String, String> {
        RetryOptions::new(
            vec![Code::Unavailable],
            BackoffSettings::builder()
                .total_timeout(Duration::from_secs(60))
                .build(),
        )
    }

    #[test]
    fn test_empty_merge_keeps_everything() {
        let settings = Settings {
            timeout: Duration::from_secs(5),
            retry: Some(retrying()),
            page_size: Some(10),
            api_name: Some("Echo".to_string()),
            ..Default::default()
        };
        let merged = settings.merge(&Options::new());
        assert_eq!(merged.timeout, Duration::from_secs(5));
        assert_eq!(merged.page_size, Some(10));
        assert_eq!(merged.api_name.as_deref(), Some("Echo"));
        assert_eq!(
            merged.retry.map(|r| r.retry_codes),
            Some(vec![Code::Unavailable])
        );
    }

    #[test]
    fn test_merge_does_not_mutate_inputs() {
        let settings = Settings::default();
        let options = Options::new()
            .timeout(Duration::from_secs(1))
            .bundling(false)
            .header("x-goog-request-params", "name=a");
        let merged = settings.merge(&options);

        assert_eq!(merged.timeout, Duration::from_secs(1));
        assert!(!merged.is_bundling);
        assert_eq!(settings.timeout, Duration::from_secs(30));
        assert!(settings.is_bundling);
        assert!(settings.other_args.headers.is_empty());
        assert_eq!(options.timeout, Some(Duration::from_secs(1)));
    }

    #[test]
    fn test_no_retry_clears_policy() {
        let settings = Settings {
            retry: Some(retrying()),
            ..Default::default()
        };
        assert!(settings.merge(&Options::new().no_retry()).retry.is_none());
        assert!(settings.retry.is_some());
    }

    #[test]
    fn test_max_retries_replaces_total_timeout() {
        let settings = Settings {
            retry: Some(retrying()),
            ..Default::default()
        };
        let merged = settings.merge(&Options::new().max_retries(3));
        let backoff = merged.retry.map(|r| r.backoff).unwrap();
        assert_eq!(backoff.max_retries, Some(3));
        assert!(backoff.total_timeout.is_none());
        assert_eq!(
            settings.retry.as_ref().unwrap().backoff.total_timeout,
            Some(Duration::from_secs(60))
        );
    }

    #[test]
    fn test_headers_merge_key_by_key() {
        let mut settings = Settings::default();
        settings
            .other_args
            .headers
            .insert("a".to_string(), "1".to_string());
        settings
            .other_args
            .headers
            .insert("b".to_string(), "2".to_string());
        let options = Options::new().header("b", "3").header("c", "4");
        let merged = settings.merge(&options);

        let header = |name: &str| merged.other_args.headers.get(name).cloned();
        assert_eq!(header("a").as_deref(), Some("1"));
        assert_eq!(header("b").as_deref(), Some("3"));
        assert_eq!(header("c").as_deref(), Some("4"));
        assert_eq!(settings.other_args.headers.len(), 2);
    }
}
