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

#![allow(clippy::module_inception)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

//! # gaxrpc - Call Orchestration for Generated RPC Clients
//!
//! gaxrpc sits between a generated client library and its wire transport and
//! decides how each call is made:
//!
//! - **Settings merging**: per-call options layered over per-method defaults
//! - **Retries**: exponential backoff with jitter, bounded by a total timeout
//!   or a maximum number of retries
//! - **Deadlines**: every attempt bounded by its own timeout
//! - **Pagination and bundling**: alternative callers behind one entry point
//! - **Cancellation**: futures and callbacks that can be aborted at any time
//! - **Streaming resumption**: server streams transparently re-opened after
//!   transient failures
//! - **HTTP/JSON transcoding**: requests mapped onto `google.api.http` rules
//!
//! ## Architecture
//!
//! - **[`settings`]**: call settings, per-call options, backoff and retry
//!   policies, client configuration files
//! - **[`retry`]**: backoff policy, timeout and retry decorators
//! - **[`call`]**: `create_api_call`, descriptors and cancellable calls
//! - **[`streaming`]**: server streams with retries and resumption
//! - **[`transcoding`]**: HTTP rules and request transcoding
//! - **`fallback`**: HTTP request encoding (feature `fallback`)
//! - **[`observability`]**: warnings and structured logging
//!
//! ## Quick Start
//!
//! ```rust
//! use gaxrpc::call::{create_api_call, Descriptor};
//! use gaxrpc::rpc::unary_fn;
//! use gaxrpc::settings::{BackoffSettings, CallOptions, CallSettings, RetryOptions};
//! use gaxrpc::{Code, RpcStatus};
//! use std::time::Duration;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! // The transport is supplied by the generated client.
//! let get_book = unary_fn(|name: String, _ctx| async move {
//!     if name.is_empty() {
//!         Err(RpcStatus::new(Code::InvalidArgument, "name is required"))
//!     } else {
//!         Ok(format!("book {name}"))
//!     }
//! });
//!
//! let settings = CallSettings {
//!     timeout: Duration::from_secs(30),
//!     retry: Some(RetryOptions::new(
//!         vec![Code::Unavailable],
//!         BackoffSettings::builder()
//!             .total_timeout(Duration::from_secs(600))
//!             .build(),
//!     )),
//!     ..Default::default()
//! };
//!
//! let call = create_api_call(get_book, settings, Descriptor::Unary);
//!
//! let book = call.call("shelves/1/books/2".to_string(), CallOptions::new()).await;
//! assert_eq!(book.unwrap(), "book shelves/1/books/2");
//!
//! // Non-retryable failures surface immediately
//! let error = call.call(String::new(), CallOptions::new()).await.unwrap_err();
//! assert_eq!(error.code(), Code::InvalidArgument);
//! # }
//! ```
//!
//! ## Feature Flags
//!
//! - `fallback` (default): `http` request encoding for REST and
//!   proto-over-HTTP transports

pub mod call;
pub mod error;
#[cfg(feature = "fallback")]
pub mod fallback;
pub mod observability;
pub mod retry;
pub mod rpc;
pub mod settings;
pub mod status;
pub mod streaming;
pub mod transcoding;

pub use call::{
    ApiCall, CallHandle, CallState, CancellableCall, Descriptor, StreamingApiCall,
    create_api_call, create_streaming_api_call,
};
pub use error::GaxError;
pub use rpc::{CallContext, StreamCallFn, UnaryCallFn, stream_fn, unary_fn};
pub use settings::{BackoffSettings, CallOptions, CallSettings, RetryOptions};
pub use status::{Code, RpcStatus};
pub use streaming::CallStream;
pub use transcoding::{HttpRule, TranscodedRequest, transcode};
