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

//! Callers: how a decorated call is driven for each kind of method.

use super::descriptor::{BundleDescriptor, Descriptor, PageDescriptor};
use crate::error::GaxError;
use crate::rpc::DecoratedCall;
use crate::settings::CallSettings;

/// Runs `request` through the caller selected by `descriptor`.
pub(crate) async fn dispatch<Req, Resp>(
    descriptor: &Descriptor<Req, Resp>,
    call: DecoratedCall<Req, Resp>,
    request: Req,
    settings: &CallSettings<Req, Resp>,
) -> Result<Resp, GaxError>
where
    Req: Clone + Send + 'static,
    Resp: Send + 'static,
{
    match descriptor {
        Descriptor::Unary => call(request).await,
        Descriptor::Paginated(page) => call_paged(page, call, request, settings).await,
        Descriptor::Bundling(bundle) => call_bundled(bundle, call, request).await,
        Descriptor::Streaming(_) => Err(GaxError::configuration(
            "streaming methods must be created with create_streaming_api_call",
        )),
    }
}

/// Fetches a page, and with auto-pagination every following page, merging
/// them into the first response.
async fn call_paged<Req, Resp>(
    page: &PageDescriptor<Req, Resp>,
    call: DecoratedCall<Req, Resp>,
    mut request: Req,
    settings: &CallSettings<Req, Resp>,
) -> Result<Resp, GaxError>
where
    Req: Clone,
{
    if let Some(token) = &settings.page_token {
        (page.set_page_token)(&mut request, token.clone());
    }
    if let (Some(size), Some(set_page_size)) = (settings.page_size, &page.set_page_size) {
        set_page_size(&mut request, size);
    }

    let mut merged = call(request.clone()).await?;
    if !settings.auto_paginate {
        return Ok(merged);
    }

    let mut pages = 1u32;
    let mut next_token = (page.next_page_token)(&merged);
    while let Some(token) = next_token.filter(|token| !token.is_empty()) {
        tracing::debug!(page = pages + 1, "Fetching next page");
        let mut next_request = request.clone();
        (page.set_page_token)(&mut next_request, token);
        let next = call(next_request).await?;
        next_token = (page.next_page_token)(&next);
        (page.merge_page)(&mut merged, next);
        pages += 1;
    }
    Ok(merged)
}

async fn call_bundled<Req, Resp>(
    bundle: &BundleDescriptor<Req, Resp>,
    call: DecoratedCall<Req, Resp>,
    request: Req,
) -> Result<Resp, GaxError> {
    bundle.executor.schedule(call, request).await
}
