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

//! Re-establishment and resumption of broken server streams.

use crate::call::StreamDescriptor;
use crate::error::GaxError;
use crate::retry::BackoffPolicy;
use crate::rpc::{CallContext, StreamCallFn};
use crate::settings::{OtherArgs, RetryOptions};
use crate::status::RpcStatus;
use futures_util::StreamExt;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;

/// What to do after a stream broke.
#[derive(Debug)]
enum Recovery {
    Reopen { delay: Duration },
    Surface(GaxError),
}

/// Drives one logical server stream over as many transport streams as
/// needed.
///
/// Responses are forwarded to the consumer channel as they arrive. When a
/// transport stream fails with a transient error the controller waits for
/// the backoff delay and opens a new one:
///
/// - with a resumption builder the new request is built from the original
///   request and the last response seen;
/// - advanced retries without a builder restart from the original request;
/// - legacy retries only re-open a stream that has not produced data yet.
///
/// The attempt counter driving the backoff resets whenever data arrives;
/// the total timeout is measured from the start of the call.
pub(crate) struct StreamingCallController<Req, Resp> {
    func: StreamCallFn<Req, Resp>,
    request: Req,
    retry: Option<RetryOptions<Req, Resp>>,
    descriptor: StreamDescriptor,
    timeout: Duration,
    other_args: OtherArgs,
    api_name: Option<String>,
}

impl<Req, Resp> StreamingCallController<Req, Resp>
where
    Req: Clone + Send + 'static,
    Resp: Clone + Send + 'static,
{
    pub(crate) fn new(
        func: StreamCallFn<Req, Resp>,
        request: Req,
        retry: Option<RetryOptions<Req, Resp>>,
        descriptor: StreamDescriptor,
        timeout: Duration,
        other_args: OtherArgs,
        api_name: Option<String>,
    ) -> Self {
        Self {
            func,
            request,
            retry,
            descriptor,
            timeout,
            other_args,
            api_name,
        }
    }

    /// Runs the stream to completion, forwarding every item to `sender`.
    /// Returns early when the consumer goes away.
    pub(crate) async fn run(self, sender: mpsc::Sender<Result<Resp, GaxError>>) {
        let api_name = self.api_name.as_deref().unwrap_or("unknown");
        let backoff = self
            .retry
            .as_ref()
            .map(|retry| BackoffPolicy::new(retry.backoff.clone()));
        let policy = backoff.as_ref();
        let resumption = self.retry.as_ref().and_then(|r| r.resumption.as_ref());
        let keep_last = resumption.is_some();
        let start = Instant::now();

        let mut request = self.request.clone();
        let mut last_response: Option<Resp> = None;
        let mut received_data = false;
        let mut attempt = 1u32;

        loop {
            let context = CallContext::with_timeout(Some(self.timeout), self.other_args.clone());
            let mut stream = (self.func)(request, context);

            let status = loop {
                match stream.next().await {
                    Some(Ok(response)) => {
                        received_data = true;
                        attempt = 1;
                        if keep_last {
                            last_response = Some(response.clone());
                        }
                        if sender.send(Ok(response)).await.is_err() {
                            return;
                        }
                    }
                    Some(Err(status)) => break status,
                    None => return,
                }
            };
            // The broken stream is released before waiting.
            drop(stream);

            match self.recover(&status, policy, start, attempt, received_data) {
                Recovery::Reopen { delay } => {
                    tracing::warn!(
                        api_name,
                        attempt,
                        code = %status.code,
                        delay = ?delay,
                        "Stream failed with a transient error, re-establishing"
                    );
                    tokio::time::sleep(delay).await;
                }
                Recovery::Surface(error) => {
                    tracing::debug!(api_name, attempt, error = %error, "Stream failed");
                    let _ = sender.send(Err(error)).await;
                    return;
                }
            }

            request = match resumption {
                Some(resume) => resume(&self.request, last_response.as_ref()),
                None => self.request.clone(),
            };
            attempt += 1;
        }
    }

    fn recover(
        &self,
        status: &RpcStatus,
        policy: Option<&BackoffPolicy>,
        start: Instant,
        attempt: u32,
        received_data: bool,
    ) -> Recovery {
        let (Some(retry), Some(policy)) = (&self.retry, policy) else {
            return Recovery::Surface(GaxError::Rpc(status.clone()));
        };
        if !retry.is_retryable(status, start.elapsed()) {
            return Recovery::Surface(GaxError::Rpc(status.clone()));
        }
        if received_data && !self.descriptor.gax_streaming_retries {
            return Recovery::Surface(GaxError::Rpc(status.clone()));
        }

        let backoff = policy.settings();
        if let Some(max_retries) = backoff.max_retries {
            if attempt > max_retries {
                return Recovery::Surface(GaxError::DeadlineExceeded {
                    timeout: start.elapsed(),
                    message: format!(
                        "Exceeded maximum number of retries ({max_retries}) retrying error {status}"
                    ),
                });
            }
        }

        let delay = policy.next_delay(attempt);
        if let Some(total) = backoff.total_timeout {
            if start.elapsed().saturating_add(delay) >= total {
                return Recovery::Surface(GaxError::DeadlineExceeded {
                    timeout: total,
                    message: format!(
                        "Total timeout of {} milliseconds exceeded retrying error {status}",
                        total.as_millis()
                    ),
                });
            }
        }
        Recovery::Reopen { delay }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc::stream_fn;
    use crate::settings::BackoffSettings;
    use crate::status::Code;
    use parking_lot::Mutex;
    use std::sync::Arc;

    fn backoff() -> BackoffSettings {
        BackoffSettings::builder()
            .initial_retry_delay(Duration::from_millis(10))
            .max_retry_delay(Duration::from_millis(10))
            .jitter(false)
            .build()
    }

    /// Serves `[request, request + 1]` then fails with UNAVAILABLE on the
    /// first connection; later connections complete normally.
    fn flaky(requests: Arc<Mutex<Vec<u32>>>) -> StreamCallFn<u32, u32> {
        stream_fn(move |request: u32, _| {
            let first = {
                let mut seen = requests.lock();
                seen.push(request);
                seen.len() == 1
            };
            let mut items = vec![Ok(request), Ok(request + 1)];
            if first {
                items.push(Err(RpcStatus::new(Code::Unavailable, "broken")));
            }
            futures_util::stream::iter(items)
        })
    }

    fn resume_after(_original: &u32, last: Option<&u32>) -> u32 {
        last.map_or(0, |last| last + 1)
    }

    async fn collect(controller: StreamingCallController<u32, u32>) -> Vec<Result<u32, GaxError>> {
        let (sender, mut receiver) = mpsc::channel(16);
        controller.run(sender).await;
        let mut items = Vec::new();
        while let Some(item) = receiver.recv().await {
            items.push(item);
        }
        items
    }

    #[tokio::test(start_paused = true)]
    async fn test_resumes_from_last_response() {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let retry = RetryOptions::new(vec![Code::Unavailable], backoff())
            .with_resumption(resume_after);
        let controller = StreamingCallController::new(
            flaky(requests.clone()),
            10,
            Some(retry),
            StreamDescriptor::new(true),
            Duration::from_secs(30),
            OtherArgs::default(),
            None,
        );

        let items = collect(controller).await;
        assert_eq!(items, vec![Ok(10), Ok(11), Ok(12), Ok(13)]);
        assert_eq!(*requests.lock(), vec![10, 12]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_advanced_without_builder_restarts() {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let controller = StreamingCallController::new(
            flaky(requests.clone()),
            10,
            Some(RetryOptions::new(vec![Code::Unavailable], backoff())),
            StreamDescriptor::new(true),
            Duration::from_secs(30),
            OtherArgs::default(),
            None,
        );

        let items = collect(controller).await;
        assert_eq!(items, vec![Ok(10), Ok(11), Ok(10), Ok(11)]);
        assert_eq!(*requests.lock(), vec![10, 10]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_legacy_surfaces_after_data() {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let controller = StreamingCallController::new(
            flaky(requests.clone()),
            10,
            Some(RetryOptions::new(vec![Code::Unavailable], backoff())),
            StreamDescriptor::new(false),
            Duration::from_secs(30),
            OtherArgs::default(),
            None,
        );

        let items = collect(controller).await;
        assert_eq!(items.len(), 3);
        assert_eq!(items[2].as_ref().unwrap_err().code(), Code::Unavailable);
        assert_eq!(requests.lock().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_max_retries_exhausted() {
        let attempts = Arc::new(Mutex::new(0u32));
        let attempts_clone = attempts.clone();
        let func: StreamCallFn<u32, u32> = stream_fn(move |_: u32, _| {
            *attempts_clone.lock() += 1;
            futures_util::stream::iter(vec![Err(RpcStatus::new(Code::Unavailable, "down"))])
        });
        let mut settings = backoff();
        settings.max_retries = Some(2);
        let controller = StreamingCallController::new(
            func,
            1,
            Some(RetryOptions::new(vec![Code::Unavailable], settings)),
            StreamDescriptor::new(true),
            Duration::from_secs(30),
            OtherArgs::default(),
            None,
        );

        let items = collect(controller).await;
        assert_eq!(items.len(), 1);
        assert!(items[0].as_ref().unwrap_err().is_deadline_exceeded());
        assert_eq!(*attempts.lock(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_retry_options_surfaces_error() {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let controller = StreamingCallController::new(
            flaky(requests.clone()),
            10,
            None,
            StreamDescriptor::new(true),
            Duration::from_secs(30),
            OtherArgs::default(),
            None,
        );

        let items = collect(controller).await;
        assert_eq!(items.len(), 3);
        assert!(items[2].is_err());
    }
}
