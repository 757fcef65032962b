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

//! Retries, backoff and per-attempt deadlines.
//!
//! This module provides the building blocks that turn a raw transport call
//! into a resilient one:
//!
//! - **[`BackoffPolicy`]**: exponential delays and per-attempt timeouts with
//!   optional full jitter
//! - **[`call_with_timeout`] / [`with_timeout`]**: bound one attempt by a
//!   deadline
//! - **[`RetryExecutor`] / [`retryable`]**: retry transient failures until
//!   the retry budget runs out
//!
//! # Examples
//!
//! ```rust
//! use gaxrpc::retry::retryable;
//! use gaxrpc::rpc::unary_fn;
//! use gaxrpc::settings::{BackoffSettings, OtherArgs, RetryOptions};
//! use gaxrpc::{Code, RpcStatus};
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicU32, Ordering};
//! use std::time::Duration;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let attempts = Arc::new(AtomicU32::new(0));
//! let counter = attempts.clone();
//! let flaky = unary_fn(move |request: String, _ctx| {
//!     let counter = counter.clone();
//!     async move {
//!         if counter.fetch_add(1, Ordering::SeqCst) == 0 {
//!             Err(RpcStatus::new(Code::Unavailable, "try again"))
//!         } else {
//!             Ok(request)
//!         }
//!     }
//! });
//!
//! let retry = RetryOptions::new(
//!     vec![Code::Unavailable],
//!     BackoffSettings::builder()
//!         .initial_retry_delay(Duration::from_millis(1))
//!         .initial_rpc_timeout(Duration::from_secs(1))
//!         .build(),
//! );
//! let call = retryable(flaky, retry, OtherArgs::default(), None);
//! assert_eq!(call("ping".to_string()).await.unwrap(), "ping");
//! assert_eq!(attempts.load(Ordering::SeqCst), 2);
//! # }
//! ```

mod backoff;
mod retryable;
mod timeout;

pub use backoff::BackoffPolicy;
pub use retryable::{NOT_TRANSIENT_NOTE, RetryExecutor, check_backoff_limits, retryable};
pub use timeout::{call_with_timeout, with_timeout};
