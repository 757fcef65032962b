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

//! Top-level error type for API calls.
//!
//! Every call outcome that is not a response is one of four kinds:
//!
//! 1. **Configuration**: the retry/streaming options are inconsistent. Raised
//!    before any attempt and never retried.
//! 2. **Rpc**: the transport reported a status. If its code was retryable the
//!    status is only surfaced after the retry budget ran out.
//! 3. **DeadlineExceeded**: the cumulative retry budget was exhausted.
//! 4. **Cancelled**: the caller aborted the call.
//!
//! # Examples
//!
//! ```rust
//! use gaxrpc::{Code, GaxError, RpcStatus};
//!
//! let error: GaxError = RpcStatus::new(Code::Unavailable, "backend down").into();
//! assert_eq!(error.code(), Code::Unavailable);
//! assert!(!error.is_cancelled());
//! ```

use crate::status::{Code, RpcStatus};
use std::time::Duration;
use thiserror::Error;

/// Errors produced by API calls.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GaxError {
    /// Invalid combination of call options.
    ///
    /// This is a programming error in the client setup and is reported
    /// before any attempt is made.
    #[error("invalid call configuration: {reason}")]
    Configuration {
        /// What is wrong with the configuration.
        reason: String,
    },

    /// The transport returned a failure status.
    #[error("rpc failed with {0}")]
    Rpc(#[from] RpcStatus),

    /// The total time allowed for the call, retries included, ran out.
    #[error("deadline of {timeout:?} exceeded: {message}")]
    DeadlineExceeded {
        /// The total timeout that was exceeded.
        timeout: Duration,
        /// Description including the last retried error, if any.
        message: String,
    },

    /// The call was cancelled by the caller.
    #[error("call cancelled by the caller")]
    Cancelled,
}

impl GaxError {
    /// Creates a configuration error.
    pub fn configuration(reason: impl Into<String>) -> Self {
        Self::Configuration {
            reason: reason.into(),
        }
    }

    /// Returns the status code that best describes this error.
    #[must_use]
    pub fn code(&self) -> Code {
        match self {
            Self::Configuration { .. } => Code::InvalidArgument,
            Self::Rpc(status) => status.code,
            Self::DeadlineExceeded { .. } => Code::DeadlineExceeded,
            Self::Cancelled => Code::Cancelled,
        }
    }

    /// Returns `true` if this is a configuration error.
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration { .. })
    }

    /// Returns `true` if the call ran out of time, either the cumulative
    /// retry budget or the deadline of its last attempt.
    #[must_use]
    pub const fn is_deadline_exceeded(&self) -> bool {
        match self {
            Self::DeadlineExceeded { .. } => true,
            Self::Rpc(status) => matches!(status.code, Code::DeadlineExceeded),
            _ => false,
        }
    }

    /// Returns `true` if the caller cancelled the call.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Returns the transport status, if this error carries one.
    #[must_use]
    pub const fn status(&self) -> Option<&RpcStatus> {
        match self {
            Self::Rpc(status) => Some(status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        assert_eq!(GaxError::configuration("bad").code(), Code::InvalidArgument);
        assert_eq!(GaxError::Cancelled.code(), Code::Cancelled);
        let deadline = GaxError::DeadlineExceeded {
            timeout: Duration::from_millis(10),
            message: "Total timeout exceeded".to_string(),
        };
        assert_eq!(deadline.code(), Code::DeadlineExceeded);
        assert!(deadline.is_deadline_exceeded());
    }

    #[test]
    fn test_rpc_conversion() {
        let error = GaxError::from(RpcStatus::new(Code::NotFound, "missing"));
        assert_eq!(error.code(), Code::NotFound);
        assert_eq!(error.status().map(|s| s.message.as_str()), Some("missing"));
        assert!(!error.is_configuration());
        assert!(!error.is_deadline_exceeded());

        let timed_out = GaxError::from(RpcStatus::new(Code::DeadlineExceeded, "slow"));
        assert!(timed_out.is_deadline_exceeded());
    }

    #[test]
    fn test_display() {
        let error = GaxError::configuration("predicate requires streaming");
        assert_eq!(
            error.to_string(),
            "invalid call configuration: predicate requires streaming"
        );
        assert_eq!(
            GaxError::Cancelled.to_string(),
            "call cancelled by the caller"
        );
    }
}
