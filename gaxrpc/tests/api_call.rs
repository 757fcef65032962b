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

//! Integration tests for `create_api_call`: settings merging, cancellation,
//! callbacks, pagination and bundling.

use async_trait::async_trait;
use gaxrpc::call::{BundleDescriptor, BundleExecutor, PageDescriptor};
use gaxrpc::observability::Diagnostics;
use gaxrpc::rpc::{CallFnSource, DecoratedCall};
use gaxrpc::settings::{BackoffSettings, CallOptions, CallSettings, RetryOptions};
use gaxrpc::{
    CallContext, CallState, Code, Descriptor, GaxError, RpcStatus, UnaryCallFn, create_api_call,
    unary_fn,
};
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tokio::sync::oneshot;

type EchoFn = UnaryCallFn<String, String>;

async fn echo(request: String, _ctx: CallContext) -> Result<String, RpcStatus> {
    Ok(request)
}

async fn shout(request: String, _ctx: CallContext) -> Result<String, RpcStatus> {
    Ok(request.to_uppercase())
}

async fn exclaim(request: String, _ctx: CallContext) -> Result<String, RpcStatus> {
    Ok(format!("{request}!"))
}

fn always_unavailable(attempts: Arc<AtomicU32>) -> UnaryCallFn<String, String> {
    unary_fn(move |_request: String, _ctx| {
        let attempts = attempts.clone();
        async move {
            attempts.fetch_add(1, Ordering::SeqCst);
            Err(RpcStatus::new(Code::Unavailable, "backend unavailable"))
        }
    })
}

fn retry_settings(backoff: BackoffSettings) -> CallSettings<String, String> {
    CallSettings {
        timeout: Duration::from_secs(10),
        retry: Some(RetryOptions::new(vec![Code::Unavailable], backoff)),
        ..Default::default()
    }
}

/// A source whose transport function arrives through the returned sender.
fn late_source() -> (oneshot::Sender<EchoFn>, CallFnSource<EchoFn>) {
    let (sender, receiver) = oneshot::channel();
    let source = CallFnSource::pending(async move {
        receiver
            .await
            .map_err(|_| GaxError::configuration("transport never became ready"))
    });
    (sender, source)
}

/// Test that merging options never modifies the base settings.
#[test]
fn test_merge_leaves_base_untouched() {
    let backoff = BackoffSettings::builder()
        .total_timeout(Duration::from_secs(60))
        .build();
    let mut base = retry_settings(backoff);
    let (name, value) = ("x-goog-api-client", "gl-rust");
    let headers = &mut base.other_args.headers;
    headers.insert(name.to_string(), value.to_string());
    let snapshot = format!("{base:?}");

    let options = CallOptions::new()
        .timeout(Duration::from_secs(1))
        .max_retries(3)
        .page_size(50)
        .header("x-goog-request-params", "name=a");
    let merged = base.merge(&options);

    assert_eq!(format!("{base:?}"), snapshot);
    assert_eq!(merged.timeout, Duration::from_secs(1));
    assert_eq!(merged.page_size, Some(50));
    let backoff = &merged.retry.as_ref().unwrap().backoff;
    assert_eq!(backoff.max_retries, Some(3));
    assert_eq!(backoff.total_timeout, None);
    assert_eq!(merged.other_args.headers.len(), 2);
}

/// Test that per-call headers reach the transport.
#[tokio::test]
async fn test_headers_forwarded_to_transport() {
    let seen: Arc<Mutex<Option<CallContext>>> = Arc::new(Mutex::new(None));
    let sink = seen.clone();
    let call = create_api_call(
        unary_fn(move |request: String, ctx: CallContext| {
            *sink.lock() = Some(ctx);
            async move { Ok(request) }
        }),
        CallSettings::default(),
        Descriptor::Unary,
    );

    let options = CallOptions::new().header("x-trace", "1");
    call.call("a".to_string(), options).await.unwrap();

    let ctx = seen.lock().clone().unwrap();
    let trace = ctx.other_args.headers.get("x-trace");
    assert_eq!(trace.map(String::as_str), Some("1"));
    assert_eq!(ctx.timeout, Some(Duration::from_secs(30)));
}

/// Test that cancelling during a backoff wait yields `Cancelled` and stops
/// further attempts.
#[tokio::test(start_paused = true)]
async fn test_cancel_during_backoff() {
    let attempts = Arc::new(AtomicU32::new(0));
    let backoff = BackoffSettings::builder()
        .initial_retry_delay(Duration::from_secs(10))
        .jitter(false)
        .total_timeout(Duration::from_secs(600))
        .build();
    let call = create_api_call(
        always_unavailable(attempts.clone()),
        retry_settings(backoff),
        Descriptor::Unary,
    );

    let pending = call.call("req".to_string(), CallOptions::new());
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(pending.state(), CallState::Pending);
    pending.cancel();
    assert_eq!(pending.state(), CallState::Cancelled);

    let error = pending.await.unwrap_err();
    assert!(error.is_cancelled());

    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(attempts.load(Ordering::SeqCst), 1);
}

/// Test that the callback receives the result exactly once.
#[tokio::test]
async fn test_callback_receives_result() {
    let call = create_api_call(unary_fn(shout), CallSettings::default(), Descriptor::Unary);

    let (sender, receiver) = oneshot::channel();
    let callback = move |result| {
        let _ = sender.send(result);
    };
    let (request, options) = ("hello".to_string(), CallOptions::new());
    let handle = call.call_with_callback(request, options, callback);

    assert_eq!(receiver.await.unwrap().unwrap(), "HELLO");
    assert_eq!(handle.state(), CallState::Succeeded);

    // Cancelling a finished call has no effect
    handle.cancel();
    assert_eq!(handle.state(), CallState::Succeeded);
}

/// Test that a cancelled callback call receives `Cancelled`.
#[tokio::test(start_paused = true)]
async fn test_callback_cancelled() {
    let call = create_api_call(
        unary_fn(|request: String, _ctx| async move {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(request)
        }),
        CallSettings::default(),
        Descriptor::Unary,
    );

    let (sender, receiver) = oneshot::channel();
    let callback = move |result| {
        let _ = sender.send(result);
    };
    let (request, options) = ("x".to_string(), CallOptions::new());
    let handle = call.call_with_callback(request, options, callback);
    handle.cancel();
    handle.cancel();

    assert_eq!(receiver.await.unwrap(), Err(GaxError::Cancelled));
    assert_eq!(handle.state(), CallState::Cancelled);
}

/// Test that a transport function resolved later is used by every call.
#[tokio::test]
async fn test_pending_function_source() {
    let (sender, source) = late_source();
    let call = create_api_call(source, CallSettings::default(), Descriptor::Unary);

    let first = call.call("one".to_string(), CallOptions::new());
    let second = call.call("two".to_string(), CallOptions::new());
    let _ = sender.send(unary_fn(exclaim));

    assert_eq!(first.await.unwrap(), "one!");
    assert_eq!(second.await.unwrap(), "two!");
}

/// Test that cancelling while the transport function is still unresolved
/// never reaches the transport.
#[tokio::test(start_paused = true)]
async fn test_cancel_before_function_resolves() {
    let (sender, source) = late_source();
    let call = create_api_call(source, CallSettings::default(), Descriptor::Unary);

    let pending = call.call("one".to_string(), CallOptions::new());
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(pending.state(), CallState::Pending);
    pending.cancel();
    assert_eq!(pending.state(), CallState::Cancelled);

    let calls = Arc::new(AtomicU32::new(0));
    let counter = calls.clone();
    let _ = sender.send(unary_fn(move |request: String, _ctx| {
        counter.fetch_add(1, Ordering::SeqCst);
        async move { Ok(request) }
    }));

    assert_eq!(pending.await, Err(GaxError::Cancelled));
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

/// Test that a failing function source fails the call.
#[tokio::test]
async fn test_failed_function_source() {
    let status = RpcStatus::new(Code::Unauthenticated, "no credentials");
    let failing = async move { Err(GaxError::Rpc(status)) };
    let source: CallFnSource<EchoFn> = CallFnSource::pending(failing);
    let call = create_api_call(source, CallSettings::default(), Descriptor::Unary);

    let pending = call.call("x".to_string(), CallOptions::new());
    let error = pending.await.unwrap_err();
    assert_eq!(error.code(), Code::Unauthenticated);
}

/// Test that a predicate on a unary call is rejected before any attempt.
#[tokio::test]
async fn test_unary_predicate_rejected() {
    let attempts = Arc::new(AtomicU32::new(0));
    let retry = RetryOptions::new(vec![], BackoffSettings::default())
        .with_should_retry(|_, _| true);
    let call = create_api_call(
        always_unavailable(attempts.clone()),
        CallSettings {
            retry: Some(retry),
            ..Default::default()
        },
        Descriptor::Unary,
    )
    .with_diagnostics(Diagnostics::new());

    let pending = call.call("x".to_string(), CallOptions::new());
    let error = pending.await.unwrap_err();
    assert!(error.is_configuration());
    assert_eq!(attempts.load(Ordering::SeqCst), 0);
}

#[derive(Debug, Clone, Default)]
struct ListRequest {
    page_token: String,
    page_size: i32,
}

#[derive(Debug, Default)]
struct ListResponse {
    items: Vec<u32>,
    next_page_token: String,
}

fn list_call(requests: Arc<Mutex<Vec<ListRequest>>>) -> UnaryCallFn<ListRequest, ListResponse> {
    unary_fn(move |request: ListRequest, _ctx| {
        requests.lock().push(request.clone());
        async move {
            let (items, next) = match request.page_token.as_str() {
                "" => (vec![1, 2], "p2"),
                "p2" => (vec![3, 4], "p3"),
                _ => (vec![5], ""),
            };
            Ok(ListResponse {
                items,
                next_page_token: next.to_string(),
            })
        }
    })
}

fn set_page_size(request: &mut ListRequest, size: i32) {
    request.page_size = size;
}

fn merge_pages(merged: &mut ListResponse, next: ListResponse) {
    merged.items.extend(next.items);
    merged.next_page_token = next.next_page_token;
}

fn page_descriptor() -> Descriptor<ListRequest, ListResponse> {
    let pages = PageDescriptor::new(
        |request: &mut ListRequest, token| request.page_token = token,
        |response: &ListResponse| Some(response.next_page_token.clone()),
        merge_pages,
    );
    Descriptor::Paginated(pages.with_page_size(set_page_size))
}

/// Test that auto-pagination collects every page.
#[tokio::test]
async fn test_auto_pagination() {
    let requests = Arc::new(Mutex::new(Vec::new()));
    let transport = list_call(requests.clone());
    let call = create_api_call(transport, CallSettings::default(), page_descriptor());

    let options = CallOptions::new().page_size(2);
    let response = call.call(ListRequest::default(), options).await.unwrap();

    assert_eq!(response.items, vec![1, 2, 3, 4, 5]);
    let requests = requests.lock();
    assert_eq!(requests.len(), 3);
    assert!(requests.iter().all(|request| request.page_size == 2));
}

/// Test that disabling auto-pagination returns one page from the given token.
#[tokio::test]
async fn test_single_page_from_token() {
    let requests = Arc::new(Mutex::new(Vec::new()));
    let transport = list_call(requests.clone());
    let call = create_api_call(transport, CallSettings::default(), page_descriptor());

    let options = CallOptions::new().auto_paginate(false).page_token("p2");
    let response = call.call(ListRequest::default(), options).await.unwrap();

    assert_eq!(response.items, vec![3, 4]);
    assert_eq!(response.next_page_token, "p3");
    assert_eq!(requests.lock().len(), 1);
}

struct CountingBundler {
    scheduled: Arc<AtomicU32>,
}

#[async_trait]
impl BundleExecutor<String, String> for CountingBundler {
    async fn schedule(
        &self,
        call: DecoratedCall<String, String>,
        request: String,
    ) -> Result<String, GaxError> {
        self.scheduled.fetch_add(1, Ordering::SeqCst);
        call(request).await
    }
}

/// Test that bundled methods go through the bundler unless bundling is
/// disabled for the call.
#[tokio::test]
async fn test_bundling_bypass() {
    let scheduled = Arc::new(AtomicU32::new(0));
    let bundler: Arc<dyn BundleExecutor<String, String>> = Arc::new(CountingBundler {
        scheduled: scheduled.clone(),
    });
    let descriptor = Descriptor::Bundling(BundleDescriptor::new(bundler));
    let call = create_api_call(unary_fn(echo), CallSettings::default(), descriptor);

    let bundled = call.call("a".to_string(), CallOptions::new());
    assert_eq!(bundled.await.unwrap(), "a");
    assert_eq!(scheduled.load(Ordering::SeqCst), 1);

    let options = CallOptions::new().bundling(false);
    let direct = call.call("b".to_string(), options).await.unwrap();
    assert_eq!(direct, "b");
    assert_eq!(scheduled.load(Ordering::SeqCst), 1);
}
