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

//! Tracking of in-flight calls and their cancellation.
//!
//! An [`OngoingCall`] moves from `Pending` to exactly one of `Succeeded`,
//! `Failed` or `Cancelled`. Whichever of completion and cancellation comes
//! first wins; the loser is ignored. The result is delivered either through a
//! oneshot channel (awaited via [`CancellableCall`]) or to a callback
//! (controlled via [`CallHandle`]).

use crate::error::GaxError;
use crate::status::{Code, RpcStatus};
use parking_lot::Mutex;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::oneshot;
use tokio::task::AbortHandle;

/// Lifecycle state of a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallState {
    /// The call has not finished yet.
    Pending,
    /// The call produced a response.
    Succeeded,
    /// The call failed.
    Failed,
    /// The caller cancelled the call.
    Cancelled,
}

/// Callback receiving the outcome of a call.
pub type CallCallback<Resp> = Box<dyn FnOnce(Result<Resp, GaxError>) + Send>;

enum Completion<Resp> {
    Channel(oneshot::Sender<Result<Resp, GaxError>>),
    Callback(CallCallback<Resp>),
}

impl<Resp> Completion<Resp> {
    fn deliver(self, result: Result<Resp, GaxError>) {
        match self {
            // The receiver may already be gone; nobody is waiting then.
            Self::Channel(sender) => {
                let _ = sender.send(result);
            }
            Self::Callback(callback) => callback(result),
        }
    }
}

struct Inner<Resp> {
    state: CallState,
    completion: Option<Completion<Resp>>,
    task: Option<AbortHandle>,
}

/// Shared state of one call invocation.
pub(crate) struct OngoingCall<Resp> {
    inner: Mutex<Inner<Resp>>,
}

impl<Resp> OngoingCall<Resp> {
    fn new(completion: Completion<Resp>) -> Arc<Self> {
        Arc::new(Self {
            inner: Mutex::new(Inner {
                state: CallState::Pending,
                completion: Some(completion),
                task: None,
            }),
        })
    }

    /// Creates a call whose result is sent to the returned receiver.
    pub(crate) fn with_channel() -> (Arc<Self>, oneshot::Receiver<Result<Resp, GaxError>>) {
        let (sender, receiver) = oneshot::channel();
        (Self::new(Completion::Channel(sender)), receiver)
    }

    /// Creates a call whose result is passed to `callback`.
    pub(crate) fn with_callback(callback: CallCallback<Resp>) -> Arc<Self> {
        Self::new(Completion::Callback(callback))
    }

    /// Attaches the task driving the call. If the call already finished the
    /// task is aborted right away.
    pub(crate) fn set_task(&self, task: AbortHandle) {
        let mut inner = self.inner.lock();
        if inner.state == CallState::Pending {
            inner.task = Some(task);
        } else {
            task.abort();
        }
    }

    /// Completes the call with `result`. Returns `false` if the call was
    /// already finished or cancelled.
    pub(crate) fn complete(&self, result: Result<Resp, GaxError>) -> bool {
        let completion = {
            let mut inner = self.inner.lock();
            if inner.state != CallState::Pending {
                return false;
            }
            inner.state = if result.is_ok() {
                CallState::Succeeded
            } else {
                CallState::Failed
            };
            inner.task = None;
            inner.completion.take()
        };
        if let Some(completion) = completion {
            completion.deliver(result);
        }
        true
    }

    /// Cancels the call. Returns `false` if it was already finished.
    pub(crate) fn cancel(&self) -> bool {
        let (completion, task) = {
            let mut inner = self.inner.lock();
            if inner.state != CallState::Pending {
                return false;
            }
            inner.state = CallState::Cancelled;
            (inner.completion.take(), inner.task.take())
        };
        if let Some(task) = task {
            task.abort();
        }
        tracing::debug!("Call cancelled");
        if let Some(completion) = completion {
            completion.deliver(Err(GaxError::Cancelled));
        }
        true
    }

    pub(crate) fn state(&self) -> CallState {
        self.inner.lock().state
    }
}

/// Handle to a call started with a completion callback.
pub struct CallHandle<Resp> {
    call: Arc<OngoingCall<Resp>>,
}

impl<Resp> CallHandle<Resp> {
    pub(crate) fn new(call: Arc<OngoingCall<Resp>>) -> Self {
        Self { call }
    }

    /// Cancels the call. The callback receives [`GaxError::Cancelled`]
    /// unless the call already finished. Calling this more than once has no
    /// further effect.
    pub fn cancel(&self) {
        self.call.cancel();
    }

    /// Current state of the call.
    pub fn state(&self) -> CallState {
        self.call.state()
    }
}

impl<Resp> Clone for CallHandle<Resp> {
    fn clone(&self) -> Self {
        Self {
            call: self.call.clone(),
        }
    }
}

impl<Resp> fmt::Debug for CallHandle<Resp> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallHandle")
            .field("state", &self.state())
            .finish()
    }
}

/// A call in flight that can be awaited or cancelled.
///
/// Dropping a `CancellableCall` does not cancel the call; use
/// [`CancellableCall::cancel`] for that.
#[must_use = "a CancellableCall does nothing unless awaited or cancelled"]
pub struct CancellableCall<Resp> {
    receiver: oneshot::Receiver<Result<Resp, GaxError>>,
    call: Arc<OngoingCall<Resp>>,
}

impl<Resp> CancellableCall<Resp> {
    pub(crate) fn new(
        call: Arc<OngoingCall<Resp>>,
        receiver: oneshot::Receiver<Result<Resp, GaxError>>,
    ) -> Self {
        Self { receiver, call }
    }

    /// Cancels the call; awaiting it then yields [`GaxError::Cancelled`].
    /// Has no effect once the call finished.
    pub fn cancel(&self) {
        self.call.cancel();
    }

    /// Current state of the call.
    pub fn state(&self) -> CallState {
        self.call.state()
    }

    /// Returns a handle that can cancel the call from elsewhere.
    pub fn handle(&self) -> CallHandle<Resp> {
        CallHandle::new(self.call.clone())
    }
}

impl<Resp> Future for CancellableCall<Resp> {
    type Output = Result<Resp, GaxError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.receiver).poll(cx).map(|received| {
            received.unwrap_or_else(|_| {
                Err(GaxError::Rpc(RpcStatus::new(
                    Code::Internal,
                    "call finished without delivering a result",
                )))
            })
        })
    }
}

impl<Resp> fmt::Debug for CancellableCall<Resp> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancellableCall")
            .field("state", &self.state())
            .finish()
    }
}
