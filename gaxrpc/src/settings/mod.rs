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

//! Call settings, per-call options, retry policies and client configuration.
//!
//! # Examples
//!
//! ```
//! use gaxrpc::Code;
//! use gaxrpc::settings::{BackoffSettings, CallOptions, CallSettings, RetryOptions};
//! use std::time::Duration;
//!
//! let settings = CallSettings::<String, String> {
//!     timeout: Duration::from_secs(20),
//!     retry: Some(RetryOptions::new(
//!         vec![Code::Unavailable, Code::DeadlineExceeded],
//!         BackoffSettings::builder()
//!             .total_timeout(Duration::from_secs(120))
//!             .build(),
//!     )),
//!     ..Default::default()
//! };
//!
//! // Disable retries for one call only
//! let one_off = settings.merge(&CallOptions::new().no_retry());
//! assert!(one_off.retry.is_none());
//! assert!(settings.retry.is_some());
//! ```

mod backoff;
mod call;
mod client_config;
mod retry;

pub use backoff::{BackoffSettings, BackoffSettingsBuilder};
pub use call::{CallOptions, CallSettings, OtherArgs};
pub use client_config::{
    ClientConfig, ConfigError, InterfaceConfig, MethodConfig, MethodEntry, RetryParams,
};
pub use retry::{ResumptionFn, RetryOptions, RetryPredicate};
