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

//! Retry loop for unary calls.

use super::backoff::BackoffPolicy;
use super::timeout::call_with_timeout;
use crate::error::GaxError;
use crate::rpc::{DecoratedCall, UnaryCallFn};
use crate::settings::{BackoffSettings, OtherArgs, RetryOptions};
use crate::status::RpcStatus;
use futures_util::FutureExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Note attached to failures whose code is not retryable.
pub const NOT_TRANSIENT_NOTE: &str =
    "Exception occurred in retry method that was not classified as transient";

/// Checks that at most one of `max_retries` and `total_timeout` is set.
pub fn check_backoff_limits(backoff: &BackoffSettings) -> Result<(), GaxError> {
    if backoff.max_retries.is_some() && backoff.total_timeout.is_some() {
        return Err(GaxError::configuration(
            "Cannot set both total_timeout and max_retries in backoff settings",
        ));
    }
    Ok(())
}

/// Runs a unary call, retrying transient failures under a backoff policy.
///
/// Each attempt is bounded by the policy's sub-timeout. A failure is retried
/// when its code is in `retry_codes`. The loop gives up with
/// [`GaxError::DeadlineExceeded`] once `max_retries` retries were made or
/// the next attempt or backoff wait would cross `total_timeout`. Failures
/// with other codes are returned immediately.
///
/// Dropping the future cancels the loop, including a pending backoff wait.
#[derive(Debug)]
pub struct RetryExecutor<Req, Resp> {
    retry: RetryOptions<Req, Resp>,
    policy: BackoffPolicy,
    other_args: OtherArgs,
    api_name: Option<String>,
}

impl<Req, Resp> RetryExecutor<Req, Resp>
where
    Req: Clone + Send + 'static,
    Resp: Send + 'static,
{
    /// Creates an executor for the given retry options.
    pub fn new(
        retry: RetryOptions<Req, Resp>,
        other_args: OtherArgs,
        api_name: Option<String>,
    ) -> Self {
        let policy = BackoffPolicy::new(retry.backoff.clone());
        Self {
            retry,
            policy,
            other_args,
            api_name,
        }
    }

    /// Runs `func` with `request` until it succeeds or the retry budget is
    /// exhausted.
    pub async fn execute(
        &self,
        func: &UnaryCallFn<Req, Resp>,
        request: Req,
    ) -> Result<Resp, GaxError> {
        let backoff = self.policy.settings();
        check_backoff_limits(backoff)?;

        let api_name = self.api_name.as_deref().unwrap_or("unknown");
        let start = Instant::now();
        let deadline = backoff
            .total_timeout
            .and_then(|total| start.checked_add(total));
        let mut attempt = 1u32;
        let mut last_error: Option<RpcStatus> = None;

        loop {
            let remaining = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return Err(self.total_timeout_exceeded(last_error.as_ref()));
                    }
                    Some(deadline - now)
                }
                None => None,
            };
            let timeout = self.policy.sub_timeout(attempt, remaining);

            tracing::debug!(api_name, attempt, timeout = ?timeout, "Starting attempt");

            let outcome = call_with_timeout(func, request.clone(), timeout, &self.other_args);
            let status = match outcome.await {
                Ok(response) => return Ok(response),
                Err(status) => status,
            };

            // An attempt cut short by the total timeout exhausts the budget
            // whatever its code.
            if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                tracing::error!(
                    api_name,
                    attempt,
                    code = %status.code,
                    "Total timeout reached during attempt"
                );
                return Err(self.total_timeout_exceeded(Some(&status)));
            }

            if !self.retry.is_retryable(&status, start.elapsed()) {
                tracing::debug!(
                    api_name,
                    attempt,
                    code = %status.code,
                    "Failure is not retryable"
                );
                return Err(GaxError::Rpc(status.with_note(NOT_TRANSIENT_NOTE)));
            }

            let retries = attempt - 1;
            if let Some(max_retries) = backoff.max_retries {
                if retries >= max_retries {
                    tracing::error!(
                        api_name,
                        retries,
                        code = %status.code,
                        "Giving up after maximum retries"
                    );
                    return Err(GaxError::DeadlineExceeded {
                        timeout: start.elapsed(),
                        message: format!(
                            "Exceeded maximum number of retries ({max_retries}) retrying error \
                             {status} before any response was received"
                        ),
                    });
                }
            }

            let delay = self.policy.next_delay(attempt);
            if let Some(deadline) = deadline {
                let wake = Instant::now().checked_add(delay);
                if wake.is_none_or(|wake| wake >= deadline) {
                    tracing::error!(
                        api_name,
                        attempt,
                        code = %status.code,
                        "Backoff would exceed total timeout"
                    );
                    tokio::time::sleep_until(deadline).await;
                    return Err(self.total_timeout_exceeded(Some(&status)));
                }
            }

            tracing::warn!(
                api_name,
                attempt,
                code = %status.code,
                delay = ?delay,
                "Attempt failed with a transient error, retrying"
            );
            tokio::time::sleep(delay).await;

            last_error = Some(status);
            attempt += 1;
        }
    }

    fn total_timeout_exceeded(&self, last_error: Option<&RpcStatus>) -> GaxError {
        let total = self
            .policy
            .settings()
            .total_timeout
            .unwrap_or(Duration::ZERO);
        let api_name = self.api_name.as_deref().unwrap_or("unknown");
        let millis = total.as_millis();
        let message = match last_error {
            Some(status) => format!(
                "Total timeout of API {api_name} exceeded {millis} milliseconds retrying error \
                 {status} before any response was received"
            ),
            None => format!(
                "Total timeout of API {api_name} exceeded {millis} milliseconds before any \
                 response was received"
            ),
        };
        GaxError::DeadlineExceeded {
            timeout: total,
            message,
        }
    }
}

/// Decorates `func` with the retry loop of `retry`.
pub fn retryable<Req, Resp>(
    func: UnaryCallFn<Req, Resp>,
    retry: RetryOptions<Req, Resp>,
    other_args: OtherArgs,
    api_name: Option<String>,
) -> DecoratedCall<Req, Resp>
where
    Req: Clone + Send + 'static,
    Resp: Send + 'static,
{
    let executor = Arc::new(RetryExecutor::new(retry, other_args, api_name));
    Arc::new(move |request| {
        let func = func.clone();
        let executor = executor.clone();
        async move { executor.execute(&func, request).await }.boxed()
    })
}
