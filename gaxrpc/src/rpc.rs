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

//! Raw transport functions and the context handed to them.
//!
//! The wire transport is not part of this crate. Generated clients inject it
//! as a function taking the request and a [`CallContext`]:
//!
//! - [`UnaryCallFn`] returns a future resolving to one response.
//! - [`StreamCallFn`] returns a stream of responses.
//!
//! The function may not be available when the client is built (for example
//! while credentials are loading), so [`CallFnSource`] accepts either the
//! function itself or a future resolving to it.

use crate::error::GaxError;
use crate::settings::OtherArgs;
use crate::status::RpcStatus;
use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use futures_util::stream::BoxStream;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Per-attempt information passed to the transport.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallContext {
    /// Timeout of this attempt.
    pub timeout: Option<Duration>,
    /// Point in time at which this attempt is abandoned.
    pub deadline: Option<Instant>,
    /// Transport-specific arguments such as request headers.
    pub other_args: OtherArgs,
}

impl CallContext {
    /// Creates a context for an attempt bounded by `timeout`.
    pub fn with_timeout(timeout: Option<Duration>, other_args: OtherArgs) -> Self {
        let deadline = timeout.and_then(|after| Instant::now().checked_add(after));
        Self {
            timeout,
            deadline,
            other_args,
        }
    }
}

/// A unary transport call.
pub type UnaryCallFn<Req, Resp> =
    Arc<dyn Fn(Req, CallContext) -> BoxFuture<'static, Result<Resp, RpcStatus>> + Send + Sync>;

/// A server-streaming transport call.
pub type StreamCallFn<Req, Resp> =
    Arc<dyn Fn(Req, CallContext) -> BoxStream<'static, Result<Resp, RpcStatus>> + Send + Sync>;

/// A unary call after retry and timeout handling were applied. Callers
/// (plain, paged, bundled) only ever see this form.
pub type DecoratedCall<Req, Resp> =
    Arc<dyn Fn(Req) -> BoxFuture<'static, Result<Resp, GaxError>> + Send + Sync>;

/// Wraps an async closure as a [`UnaryCallFn`].
///
/// # Examples
///
/// ```rust
/// use gaxrpc::rpc::{unary_fn, UnaryCallFn};
///
/// let echo: UnaryCallFn<String, String> = unary_fn(|request: String, _ctx| async move {
///     Ok(request)
/// });
/// ```
pub fn unary_fn<Req, Resp, F, Fut>(f: F) -> UnaryCallFn<Req, Resp>
where
    F: Fn(Req, CallContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Resp, RpcStatus>> + Send + 'static,
{
    Arc::new(move |request, context| f(request, context).boxed())
}

/// Wraps a closure returning a stream as a [`StreamCallFn`].
pub fn stream_fn<Req, Resp, F, S>(f: F) -> StreamCallFn<Req, Resp>
where
    F: Fn(Req, CallContext) -> S + Send + Sync + 'static,
    S: futures_util::Stream<Item = Result<Resp, RpcStatus>> + Send + 'static,
{
    use futures_util::StreamExt;
    Arc::new(move |request, context| f(request, context).boxed())
}

/// Where the transport function of an API method comes from.
pub enum CallFnSource<F> {
    /// The function is available now.
    Ready(F),
    /// The function becomes available once the future resolves. The future
    /// is shared by every call of the method and only polled once.
    Pending(Shared<BoxFuture<'static, Result<F, GaxError>>>),
}

impl<F> CallFnSource<F>
where
    F: Clone + Send + Sync + 'static,
{
    /// Source for an already available function.
    pub fn ready(f: F) -> Self {
        Self::Ready(f)
    }

    /// Source for a function resolved later.
    pub fn pending<Fut>(future: Fut) -> Self
    where
        Fut: Future<Output = Result<F, GaxError>> + Send + 'static,
    {
        Self::Pending(future.boxed().shared())
    }

    /// Waits for the function.
    pub async fn resolve(&self) -> Result<F, GaxError> {
        match self {
            Self::Ready(f) => Ok(f.clone()),
            Self::Pending(future) => future.clone().await,
        }
    }
}

impl<F: Clone> Clone for CallFnSource<F> {
    fn clone(&self) -> Self {
        match self {
            Self::Ready(f) => Self::Ready(f.clone()),
            Self::Pending(future) => Self::Pending(future.clone()),
        }
    }
}

impl<F> fmt::Debug for CallFnSource<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ready(_) => f.write_str("CallFnSource::Ready"),
            Self::Pending(_) => f.write_str("CallFnSource::Pending"),
        }
    }
}

impl<Req, Resp> From<UnaryCallFn<Req, Resp>> for CallFnSource<UnaryCallFn<Req, Resp>> {
    fn from(f: UnaryCallFn<Req, Resp>) -> Self {
        Self::Ready(f)
    }
}

impl<Req, Resp> From<StreamCallFn<Req, Resp>> for CallFnSource<StreamCallFn<Req, Resp>> {
    fn from(f: StreamCallFn<Req, Resp>) -> Self {
        Self::Ready(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::Code;

    #[tokio::test]
    async fn test_ready_source() {
        let f: UnaryCallFn<u32, u32> = unary_fn(|request: u32, _| async move { Ok(request + 1) });
        let source = CallFnSource::ready(f);
        let resolved = source.resolve().await.unwrap();
        assert_eq!(resolved(1, CallContext::default()).await, Ok(2));
    }

    #[tokio::test]
    async fn test_pending_source_is_shared() {
        let f: UnaryCallFn<u32, u32> = unary_fn(|request: u32, _| async move { Ok(request * 2) });
        let source = CallFnSource::pending(async move { Ok(f) });
        let other = source.clone();

        let first = source.resolve().await.unwrap();
        let second = other.resolve().await.unwrap();
        assert_eq!(first(2, CallContext::default()).await, Ok(4));
        assert_eq!(second(3, CallContext::default()).await, Ok(6));
    }

    #[tokio::test]
    async fn test_pending_source_failure() {
        let status = RpcStatus::new(Code::Unauthenticated, "no creds");
        let source: CallFnSource<UnaryCallFn<u32, u32>> =
            CallFnSource::pending(async { Err(GaxError::Rpc(status)) });
        let error = source.resolve().await.err().unwrap();
        assert_eq!(error.code(), Code::Unauthenticated);
    }

    #[tokio::test(start_paused = true)]
    async fn test_context_deadline() {
        let timeout = Some(Duration::from_secs(5));
        let context = CallContext::with_timeout(timeout, OtherArgs::default());
        let deadline = context.deadline.unwrap();
        assert_eq!(deadline - Instant::now(), Duration::from_secs(5));

        let unbounded = CallContext::with_timeout(None, OtherArgs::default());
        assert!(unbounded.deadline.is_none());
    }
}
