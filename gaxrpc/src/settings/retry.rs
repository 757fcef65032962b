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

//! Retry options.

use super::BackoffSettings;
use crate::status::{Code, RpcStatus};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Decides whether a failed attempt should be retried, given the failure and
/// the time elapsed since the call started. Only valid for streaming calls.
pub type RetryPredicate = Arc<dyn Fn(&RpcStatus, Duration) -> bool + Send + Sync>;

/// Builds the request used to re-open a broken stream from the original
/// request and the last response observed on the stream.
pub type ResumptionFn<Req, Resp> = Arc<dyn Fn(&Req, Option<&Resp>) -> Req + Send + Sync>;

/// Retry policy of a call.
///
/// A failure is retried when its code is listed in `retry_codes`. Streaming
/// calls may instead provide a `should_retry` predicate and a resumption
/// builder; unary calls reject both.
pub struct RetryOptions<Req, Resp> {
    /// Codes that mark a failure as transient.
    pub retry_codes: Vec<Code>,
    /// Delay and timeout growth between attempts.
    pub backoff: BackoffSettings,
    /// Retry eligibility predicate, replacing `retry_codes`.
    pub should_retry: Option<RetryPredicate>,
    /// Resumption request builder for streams.
    pub resumption: Option<ResumptionFn<Req, Resp>>,
}

impl<Req, Resp> RetryOptions<Req, Resp> {
    /// Creates retry options from codes and backoff settings.
    pub fn new(retry_codes: Vec<Code>, backoff: BackoffSettings) -> Self {
        Self {
            retry_codes,
            backoff,
            should_retry: None,
            resumption: None,
        }
    }

    /// Sets the retry predicate.
    #[must_use]
    pub fn with_should_retry<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&RpcStatus, Duration) -> bool + Send + Sync + 'static,
    {
        self.should_retry = Some(Arc::new(predicate));
        self
    }

    /// Sets the resumption request builder.
    #[must_use]
    pub fn with_resumption<F>(mut self, builder: F) -> Self
    where
        F: Fn(&Req, Option<&Resp>) -> Req + Send + Sync + 'static,
    {
        self.resumption = Some(Arc::new(builder));
        self
    }

    /// Returns `true` if a failure with `status` after `elapsed` is
    /// transient under this policy.
    pub fn is_retryable(&self, status: &RpcStatus, elapsed: Duration) -> bool {
        match &self.should_retry {
            Some(predicate) => predicate(status, elapsed),
            None => self.retry_codes.contains(&status.code),
        }
    }
}

impl<Req, Resp> Clone for RetryOptions<Req, Resp> {
    fn clone(&self) -> Self {
        Self {
            retry_codes: self.retry_codes.clone(),
            backoff: self.backoff.clone(),
            should_retry: self.should_retry.clone(),
            resumption: self.resumption.clone(),
        }
    }
}

impl<Req, Resp> fmt::Debug for RetryOptions<Req, Resp> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryOptions")
            .field("retry_codes", &self.retry_codes)
            .field("backoff", &self.backoff)
            .field("should_retry", &self.should_retry.is_some())
            .field("resumption", &self.resumption.is_some())
            .finish()
    }
}
