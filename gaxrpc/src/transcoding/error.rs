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

//! Transcoding errors.

use thiserror::Error;

/// Errors raised while parsing HTTP rules or encoding HTTP requests.
///
/// A request that matches none of a method's bindings is not an error for
/// [`transcode`](super::transcode), which returns `None`. Only the fallback
/// encoder, which must produce a request, reports it as
/// [`TranscodingError::NoMatchingBinding`].
#[derive(Debug, Error)]
pub enum TranscodingError {
    /// A path template could not be parsed.
    #[error("malformed path template '{template}': {reason}")]
    MalformedTemplate {
        /// The template text.
        template: String,
        /// What is wrong with it.
        reason: String,
    },

    /// The method selector is not registered.
    #[error("unknown method '{0}'")]
    UnknownMethod(String),

    /// The request does not satisfy any binding of the method.
    #[error("request does not match any HTTP binding of '{selector}'")]
    NoMatchingBinding {
        /// Method selector.
        selector: String,
    },

    /// The rule uses an HTTP method name that is not valid.
    #[error("invalid HTTP method '{0}'")]
    InvalidHttpMethod(String),

    /// The request or body could not be serialized.
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The HTTP request could not be assembled.
    #[cfg(feature = "fallback")]
    #[error("invalid HTTP request: {0}")]
    Http(#[from] http::Error),
}

impl TranscodingError {
    /// Returns `true` if the request matched no binding.
    #[must_use]
    pub const fn is_no_match(&self) -> bool {
        matches!(self, Self::NoMatchingBinding { .. })
    }
}
