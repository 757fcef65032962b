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

//! Deadline enforcement for a single attempt.

use crate::error::GaxError;
use crate::rpc::{CallContext, DecoratedCall, UnaryCallFn};
use crate::settings::OtherArgs;
use crate::status::{Code, RpcStatus};
use futures_util::FutureExt;
use std::sync::Arc;
use std::time::Duration;

/// Runs one attempt of `func` bounded by `timeout`.
///
/// The transport sees the timeout and deadline through its [`CallContext`].
/// If the attempt is still running when the timeout expires its future is
/// dropped, which is the transport's cancellation signal, and a
/// `DEADLINE_EXCEEDED` status is returned. Without a timeout the attempt is
/// unbounded.
pub async fn call_with_timeout<Req, Resp>(
    func: &UnaryCallFn<Req, Resp>,
    request: Req,
    timeout: Option<Duration>,
    other_args: &OtherArgs,
) -> Result<Resp, RpcStatus> {
    let context = CallContext::with_timeout(timeout, other_args.clone());
    let attempt = func(request, context);
    match timeout {
        Some(timeout) => match tokio::time::timeout(timeout, attempt).await {
            Ok(result) => result,
            Err(_) => {
                tracing::debug!(timeout = ?timeout, "Attempt timed out");
                Err(RpcStatus::new(
                    Code::DeadlineExceeded,
                    format!("Deadline of {} ms exceeded", timeout.as_millis()),
                ))
            }
        },
        None => attempt.await,
    }
}

/// Decorates `func` with a fixed per-call timeout and no retries.
pub fn with_timeout<Req, Resp>(
    func: UnaryCallFn<Req, Resp>,
    timeout: Duration,
    other_args: OtherArgs,
) -> DecoratedCall<Req, Resp>
where
    Req: Send + 'static,
    Resp: Send + 'static,
{
    Arc::new(move |request| {
        let func = func.clone();
        let other_args = other_args.clone();
        async move {
            call_with_timeout(&func, request, Some(timeout), &other_args)
                .await
                .map_err(GaxError::from)
        }
        .boxed()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc::unary_fn;

    #[tokio::test(start_paused = true)]
    async fn test_fast_call_passes() {
        let func: UnaryCallFn<u32, u32> = unary_fn(|request: u32, _| async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            Ok(request)
        });
        let result = call_with_timeout(
            &func,
            7,
            Some(Duration::from_secs(1)),
            &OtherArgs::default(),
        )
        .await;
        assert_eq!(result, Ok(7));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_call_times_out() {
        let func: UnaryCallFn<u32, u32> = unary_fn(|request: u32, _| async move {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Ok(request)
        });
        let result = call_with_timeout(
            &func,
            7,
            Some(Duration::from_millis(100)),
            &OtherArgs::default(),
        )
        .await;
        assert_eq!(result.unwrap_err().code, Code::DeadlineExceeded);
    }

    #[tokio::test(start_paused = true)]
    async fn test_context_carries_timeout_and_headers() {
        let func: UnaryCallFn<(), Option<Duration>> = unary_fn(|_: (), context: CallContext| {
            let header = context.other_args.headers.get("x-test").cloned();
            async move {
                assert_eq!(header.as_deref(), Some("1"));
                Ok(context.timeout)
            }
        });
        let mut other_args = OtherArgs::default();
        let headers = &mut other_args.headers;
        headers.insert("x-test".to_string(), "1".to_string());

        let call = with_timeout(func, Duration::from_secs(3), other_args);
        assert_eq!(call(()).await, Ok(Some(Duration::from_secs(3))));
    }
}
