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

//! The stream handed to callers of a server-streaming method.

use crate::error::GaxError;
use futures_util::Stream;
use std::fmt;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tokio::task::AbortHandle;

/// Responses of a server-streaming call.
///
/// Yields `Ok` for every response, at most one `Err` for the terminal
/// error, then ends. Retries and resumption happen behind the stream and are
/// invisible to the consumer. Dropping the stream cancels the call.
pub struct CallStream<Resp> {
    receiver: mpsc::Receiver<Result<Resp, GaxError>>,
    cancel: StreamCancelHandle,
}

/// Cancels a [`CallStream`] from another task.
#[derive(Clone)]
pub struct StreamCancelHandle {
    cancelled: Arc<AtomicBool>,
    task: Option<AbortHandle>,
}

impl StreamCancelHandle {
    /// Terminates the transport stream. The `CallStream` ends without
    /// yielding anything further. Idempotent.
    pub fn cancel(&self) {
        if self.cancelled.swap(true, Ordering::SeqCst) {
            return;
        }
        tracing::debug!("Stream cancelled");
        if let Some(task) = &self.task {
            task.abort();
        }
    }

    /// Returns `true` once the stream was cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

impl fmt::Debug for StreamCancelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamCancelHandle")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

impl<Resp> CallStream<Resp> {
    pub(crate) fn new(receiver: mpsc::Receiver<Result<Resp, GaxError>>, task: AbortHandle) -> Self {
        Self {
            receiver,
            cancel: StreamCancelHandle {
                cancelled: Arc::new(AtomicBool::new(false)),
                task: Some(task),
            },
        }
    }

    /// A stream that fails right away with `error`.
    pub(crate) fn failed(error: GaxError) -> Self {
        let (sender, receiver) = mpsc::channel(1);
        // A fresh channel with capacity one always has room.
        let _ = sender.try_send(Err(error));
        Self {
            receiver,
            cancel: StreamCancelHandle {
                cancelled: Arc::new(AtomicBool::new(false)),
                task: None,
            },
        }
    }

    /// Cancels the call. See [`StreamCancelHandle::cancel`].
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Returns `true` once the stream was cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Returns a handle that can cancel the stream from elsewhere.
    pub fn cancel_handle(&self) -> StreamCancelHandle {
        self.cancel.clone()
    }
}

impl<Resp> Stream for CallStream<Resp> {
    type Item = Result<Resp, GaxError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.cancel.is_cancelled() {
            return Poll::Ready(None);
        }
        self.receiver.poll_recv(cx)
    }
}

impl<Resp> Drop for CallStream<Resp> {
    fn drop(&mut self) {
        if let Some(task) = &self.cancel.task {
            task.abort();
        }
    }
}

impl<Resp> fmt::Debug for CallStream<Resp> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallStream")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::StreamExt;

    #[tokio::test]
    async fn test_failed_stream_yields_one_error() {
        let mut stream = CallStream::<u32>::failed(GaxError::configuration("bad"));
        assert!(stream.next().await.unwrap().unwrap_err().is_configuration());
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn test_cancel_suppresses_buffered_items() {
        let (sender, receiver) = mpsc::channel(4);
        let task = tokio::spawn(async move {
            sender.send(Ok(1u32)).await.unwrap();
            sender.send(Ok(2u32)).await.unwrap();
            std::future::pending::<()>().await;
        });
        let mut stream = CallStream::new(receiver, task.abort_handle());
        assert_eq!(stream.next().await, Some(Ok(1)));

        let handle = stream.cancel_handle();
        handle.cancel();
        handle.cancel();
        assert!(stream.is_cancelled());
        assert_eq!(stream.next().await, None);
        assert!(task.await.unwrap_err().is_cancelled());
    }
}
