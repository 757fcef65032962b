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

//! Descriptors selecting how an API method is called.

use crate::error::GaxError;
use crate::rpc::DecoratedCall;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

/// How an API method is invoked.
pub enum Descriptor<Req, Resp> {
    /// One request, one response.
    Unary,
    /// A list method whose responses carry a next-page token.
    Paginated(PageDescriptor<Req, Resp>),
    /// A server-streaming method.
    Streaming(StreamDescriptor),
    /// A method whose requests are batched by a bundler.
    Bundling(BundleDescriptor<Req, Resp>),
}

impl<Req, Resp> Descriptor<Req, Resp> {
    /// Returns the streaming descriptor, if this is a streaming method.
    pub fn streaming(&self) -> Option<StreamDescriptor> {
        match self {
            Self::Streaming(descriptor) => Some(*descriptor),
            _ => None,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::Unary => "Unary",
            Self::Paginated(_) => "Paginated",
            Self::Streaming(_) => "Streaming",
            Self::Bundling(_) => "Bundling",
        }
    }
}

impl<Req, Resp> Clone for Descriptor<Req, Resp> {
    fn clone(&self) -> Self {
        match self {
            Self::Unary => Self::Unary,
            Self::Paginated(page) => Self::Paginated(page.clone()),
            Self::Streaming(stream) => Self::Streaming(*stream),
            Self::Bundling(bundle) => Self::Bundling(bundle.clone()),
        }
    }
}

impl<Req, Resp> fmt::Debug for Descriptor<Req, Resp> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Streaming(stream) => f.debug_tuple("Streaming").field(stream).finish(),
            other => f.write_str(other.kind()),
        }
    }
}

/// Streaming method descriptor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamDescriptor {
    /// Advanced retries: streams that already produced data may be resumed.
    pub gax_streaming_retries: bool,
}

impl StreamDescriptor {
    /// Creates a streaming descriptor.
    pub fn new(gax_streaming_retries: bool) -> Self {
        Self {
            gax_streaming_retries,
        }
    }
}

type SetPageToken<Req> = Arc<dyn Fn(&mut Req, String) + Send + Sync>;
type SetPageSize<Req> = Arc<dyn Fn(&mut Req, i32) + Send + Sync>;
type NextPageToken<Resp> = Arc<dyn Fn(&Resp) -> Option<String> + Send + Sync>;
type MergePage<Resp> = Arc<dyn Fn(&mut Resp, Resp) + Send + Sync>;

/// Accessors of the pagination fields of a list method.
///
/// # Examples
///
/// ```rust
/// use gaxrpc::call::PageDescriptor;
///
/// #[derive(Clone, Default)]
/// struct ListRequest { page_token: String, page_size: i32 }
/// #[derive(Default)]
/// struct ListResponse { items: Vec<u32>, next_page_token: String }
///
/// let page = PageDescriptor::new(
///     |request: &mut ListRequest, token| request.page_token = token,
///     |response: &ListResponse| Some(response.next_page_token.clone()),
///     |merged: &mut ListResponse, next: ListResponse| merged.items.extend(next.items),
/// )
/// .with_page_size(|request: &mut ListRequest, size| request.page_size = size);
/// ```
pub struct PageDescriptor<Req, Resp> {
    pub(crate) set_page_token: SetPageToken<Req>,
    pub(crate) set_page_size: Option<SetPageSize<Req>>,
    pub(crate) next_page_token: NextPageToken<Resp>,
    pub(crate) merge_page: MergePage<Resp>,
}

impl<Req, Resp> PageDescriptor<Req, Resp> {
    /// Creates a page descriptor.
    ///
    /// An absent or empty next-page token ends pagination. `merge_page`
    /// appends a later page to the first response.
    pub fn new<T, N, M>(set_page_token: T, next_page_token: N, merge_page: M) -> Self
    where
        T: Fn(&mut Req, String) + Send + Sync + 'static,
        N: Fn(&Resp) -> Option<String> + Send + Sync + 'static,
        M: Fn(&mut Resp, Resp) + Send + Sync + 'static,
    {
        Self {
            set_page_token: Arc::new(set_page_token),
            set_page_size: None,
            next_page_token: Arc::new(next_page_token),
            merge_page: Arc::new(merge_page),
        }
    }

    /// Sets the page size accessor.
    #[must_use]
    pub fn with_page_size<S>(mut self, set_page_size: S) -> Self
    where
        S: Fn(&mut Req, i32) + Send + Sync + 'static,
    {
        self.set_page_size = Some(Arc::new(set_page_size));
        self
    }
}

impl<Req, Resp> Clone for PageDescriptor<Req, Resp> {
    fn clone(&self) -> Self {
        Self {
            set_page_token: self.set_page_token.clone(),
            set_page_size: self.set_page_size.clone(),
            next_page_token: self.next_page_token.clone(),
            merge_page: self.merge_page.clone(),
        }
    }
}

/// Batches requests of a bundling method.
///
/// The batching policy lives outside this crate. The executor receives the
/// already decorated call (retries and timeouts applied) and decides when
/// and with which merged request to invoke it.
#[async_trait]
pub trait BundleExecutor<Req, Resp>: Send + Sync {
    /// Schedules `request` and resolves with its share of the response.
    async fn schedule(
        &self,
        call: DecoratedCall<Req, Resp>,
        request: Req,
    ) -> Result<Resp, GaxError>;
}

/// Bundling method descriptor.
pub struct BundleDescriptor<Req, Resp> {
    pub(crate) executor: Arc<dyn BundleExecutor<Req, Resp>>,
}

impl<Req, Resp> BundleDescriptor<Req, Resp> {
    /// Creates a bundling descriptor around an executor.
    pub fn new(executor: Arc<dyn BundleExecutor<Req, Resp>>) -> Self {
        Self { executor }
    }
}

impl<Req, Resp> Clone for BundleDescriptor<Req, Resp> {
    fn clone(&self) -> Self {
        Self {
            executor: self.executor.clone(),
        }
    }
}
