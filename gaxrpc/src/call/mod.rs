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

//! API call orchestration.
//!
//! [`create_api_call`] combines a transport function, the method's
//! [`CallSettings`](crate::settings::CallSettings) and a [`Descriptor`] into
//! an [`ApiCall`]. Each invocation then goes through the same pipeline:
//!
//! ```text
//! options ──merge──▶ effective settings ──validate──▶ retry / timeout
//!                                                          │
//!              CancellableCall ◀── OngoingCall ◀── caller (unary, paged, bundled)
//! ```
//!
//! Server-streaming methods use [`create_streaming_api_call`] instead.

mod api_call;
mod caller;
mod descriptor;
mod ongoing;
mod validate;

pub use api_call::{ApiCall, StreamingApiCall, create_api_call, create_streaming_api_call};
pub use descriptor::{
    BundleDescriptor, BundleExecutor, Descriptor, PageDescriptor, StreamDescriptor,
};
pub use ongoing::{CallCallback, CallHandle, CallState, CancellableCall};
pub use validate::RETRY_CODES_AND_PREDICATE;
