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

//! Turning a raw transport function into an API call governed by settings.

use super::caller::dispatch;
use super::descriptor::{Descriptor, StreamDescriptor};
use super::ongoing::{CallHandle, CancellableCall, OngoingCall};
use super::validate::validate_retry;
use crate::error::GaxError;
use crate::observability::{Diagnostics, log_error};
use crate::retry::{retryable, with_timeout};
use crate::rpc::{CallFnSource, DecoratedCall, StreamCallFn, UnaryCallFn};
use crate::settings::{CallOptions, CallSettings, RetryOptions};
use crate::streaming::{CallStream, StreamingCallController};
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Buffered responses between a streaming task and its consumer.
const STREAM_BUFFER: usize = 32;

/// Creates an API call from a transport function, the method's settings and
/// its descriptor.
///
/// # Examples
///
/// ```rust
/// use gaxrpc::call::{create_api_call, Descriptor};
/// use gaxrpc::rpc::unary_fn;
/// use gaxrpc::settings::{CallOptions, CallSettings};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let echo = create_api_call(
///     unary_fn(|request: String, _ctx| async move { Ok(request) }),
///     CallSettings::default(),
///     Descriptor::Unary,
/// );
///
/// let response = echo.call("hello".to_string(), CallOptions::new()).await;
/// assert_eq!(response.unwrap(), "hello");
/// # }
/// ```
pub fn create_api_call<Req, Resp>(
    func: impl Into<CallFnSource<UnaryCallFn<Req, Resp>>>,
    settings: CallSettings<Req, Resp>,
    descriptor: Descriptor<Req, Resp>,
) -> ApiCall<Req, Resp> {
    ApiCall {
        inner: Arc::new(ApiCallInner {
            source: func.into(),
            settings,
            descriptor,
            diagnostics: Diagnostics::default(),
        }),
    }
}

struct ApiCallInner<Req, Resp> {
    source: CallFnSource<UnaryCallFn<Req, Resp>>,
    settings: CallSettings<Req, Resp>,
    descriptor: Descriptor<Req, Resp>,
    diagnostics: Diagnostics,
}

/// A unary, paginated or bundled API method.
///
/// Every invocation merges its [`CallOptions`] into the method's settings,
/// validates the result, and runs the call on a spawned tokio task with
/// retries or a timeout applied. Invocations share nothing but the
/// read-only settings.
pub struct ApiCall<Req, Resp> {
    inner: Arc<ApiCallInner<Req, Resp>>,
}

impl<Req, Resp> ApiCall<Req, Resp>
where
    Req: Clone + Send + Sync + 'static,
    Resp: Send + Sync + 'static,
{
    /// Reports configuration warnings to `diagnostics` instead of a private
    /// sink.
    #[must_use]
    pub fn with_diagnostics(self, diagnostics: Diagnostics) -> Self {
        let inner = ApiCallInner {
            source: self.inner.source.clone(),
            settings: self.inner.settings.clone(),
            descriptor: self.inner.descriptor.clone(),
            diagnostics,
        };
        Self {
            inner: Arc::new(inner),
        }
    }

    /// The settings the method was created with.
    pub fn settings(&self) -> &CallSettings<Req, Resp> {
        &self.inner.settings
    }

    /// Starts a call and returns a future resolving to its outcome.
    ///
    /// Must be called within a tokio runtime.
    pub fn call(&self, request: Req, options: CallOptions<Req, Resp>) -> CancellableCall<Resp> {
        let (call, receiver) = OngoingCall::with_channel();
        self.start(request, options, call.clone());
        CancellableCall::new(call, receiver)
    }

    /// Starts a call whose outcome is passed to `callback`.
    ///
    /// The callback runs exactly once: with the response, the failure, or
    /// [`GaxError::Cancelled`] if the call is cancelled first.
    pub fn call_with_callback<F>(
        &self,
        request: Req,
        options: CallOptions<Req, Resp>,
        callback: F,
    ) -> CallHandle<Resp>
    where
        F: FnOnce(Result<Resp, GaxError>) + Send + 'static,
    {
        let call = OngoingCall::with_callback(Box::new(callback));
        self.start(request, options, call.clone());
        CallHandle::new(call)
    }

    fn start(&self, request: Req, options: CallOptions<Req, Resp>, call: Arc<OngoingCall<Resp>>) {
        let base = &self.inner.settings;
        let settings = base.merge(&options);

        let descriptor = match &self.inner.descriptor {
            Descriptor::Bundling(_) if base.is_bundling && !settings.is_bundling => {
                tracing::debug!(api_name = ?settings.api_name, "Bundling disabled for this call");
                Descriptor::Unary
            }
            descriptor => descriptor.clone(),
        };

        let retry = match validate_retry(
            settings.retry.clone(),
            descriptor.streaming(),
            &self.inner.diagnostics,
        ) {
            Ok(retry) => retry,
            Err(error) => {
                log_error(&error);
                call.complete(Err(error));
                return;
            }
        };

        let source = self.inner.source.clone();
        let task_call = call.clone();
        let task = tokio::spawn(async move {
            let result: Result<Resp, GaxError> = async {
                let func = source.resolve().await?;
                let decorated = decorate(func, &settings, retry);
                dispatch(&descriptor, decorated, request, &settings).await
            }
            .await;
            if let Err(error) = &result {
                log_error(error);
            }
            task_call.complete(result);
        });
        call.set_task(task.abort_handle());
    }
}

/// Applies retries when the effective policy lists retry codes, and a plain
/// timeout otherwise.
fn decorate<Req, Resp>(
    func: UnaryCallFn<Req, Resp>,
    settings: &CallSettings<Req, Resp>,
    retry: Option<RetryOptions<Req, Resp>>,
) -> DecoratedCall<Req, Resp>
where
    Req: Clone + Send + 'static,
    Resp: Send + 'static,
{
    match retry {
        Some(mut retry) if !retry.retry_codes.is_empty() => {
            let backoff = &mut retry.backoff;
            backoff.initial_rpc_timeout.get_or_insert(settings.timeout);
            retryable(
                func,
                retry,
                settings.other_args.clone(),
                settings.api_name.clone(),
            )
        }
        _ => with_timeout(func, settings.timeout, settings.other_args.clone()),
    }
}

impl<Req, Resp> Clone for ApiCall<Req, Resp> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<Req, Resp> fmt::Debug for ApiCall<Req, Resp> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiCall")
            .field("settings", &self.inner.settings)
            .field("descriptor", &self.inner.descriptor)
            .finish()
    }
}

/// Creates a server-streaming API call.
pub fn create_streaming_api_call<Req, Resp>(
    func: impl Into<CallFnSource<StreamCallFn<Req, Resp>>>,
    settings: CallSettings<Req, Resp>,
    descriptor: StreamDescriptor,
) -> StreamingApiCall<Req, Resp> {
    StreamingApiCall {
        inner: Arc::new(StreamingInner {
            source: func.into(),
            settings,
            descriptor,
            diagnostics: Diagnostics::default(),
        }),
    }
}

struct StreamingInner<Req, Resp> {
    source: CallFnSource<StreamCallFn<Req, Resp>>,
    settings: CallSettings<Req, Resp>,
    descriptor: StreamDescriptor,
    diagnostics: Diagnostics,
}

/// A server-streaming API method.
pub struct StreamingApiCall<Req, Resp> {
    inner: Arc<StreamingInner<Req, Resp>>,
}

impl<Req, Resp> StreamingApiCall<Req, Resp>
where
    Req: Clone + Send + Sync + 'static,
    Resp: Clone + Send + Sync + 'static,
{
    /// Reports configuration warnings to `diagnostics` instead of a private
    /// sink.
    #[must_use]
    pub fn with_diagnostics(self, diagnostics: Diagnostics) -> Self {
        let inner = StreamingInner {
            source: self.inner.source.clone(),
            settings: self.inner.settings.clone(),
            descriptor: self.inner.descriptor,
            diagnostics,
        };
        Self {
            inner: Arc::new(inner),
        }
    }

    /// Opens the stream. Configuration errors are reported as the first and
    /// only item of the returned stream.
    ///
    /// Must be called within a tokio runtime.
    pub fn call(&self, request: Req, options: CallOptions<Req, Resp>) -> CallStream<Resp> {
        let settings = self.inner.settings.merge(&options);
        let descriptor = self.inner.descriptor;

        let retry = match validate_retry(
            settings.retry.clone(),
            Some(descriptor),
            &self.inner.diagnostics,
        ) {
            Ok(retry) => retry,
            Err(error) => {
                log_error(&error);
                return CallStream::failed(error);
            }
        };

        let source = self.inner.source.clone();
        let (sender, receiver) = mpsc::channel(STREAM_BUFFER);
        let task = tokio::spawn(async move {
            let func = match source.resolve().await {
                Ok(func) => func,
                Err(error) => {
                    log_error(&error);
                    let _ = sender.send(Err(error)).await;
                    return;
                }
            };
            StreamingCallController::new(
                func,
                request,
                retry,
                descriptor,
                settings.timeout,
                settings.other_args,
                settings.api_name,
            )
            .run(sender)
            .await;
        });
        CallStream::new(receiver, task.abort_handle())
    }
}

impl<Req, Resp> Clone for StreamingApiCall<Req, Resp> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<Req, Resp> fmt::Debug for StreamingApiCall<Req, Resp> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamingApiCall")
            .field("settings", &self.inner.settings)
            .field("descriptor", &self.inner.descriptor)
            .finish()
    }
}
