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

//! HTTP request encoding for clients that cannot use gRPC.
//!
//! [`FallbackEncoder`] turns a method selector and a JSON request into an
//! [`http::Request`] in one of two modes:
//!
//! - **REST**: the request is transcoded with the method's HTTP rule.
//! - **Proto over HTTP**: the whole request is posted to
//!   `/$rpc/<service>/<method>`. Methods without an HTTP rule always use
//!   this mode.
//!
//! Sending the request is left to the caller's HTTP client.
//!
//! # Examples
//!
//! ```rust
//! use gaxrpc::fallback::{FallbackEncoder, FallbackMode};
//! use gaxrpc::settings::OtherArgs;
//! use gaxrpc::transcoding::{HttpMethod, HttpRule, MethodRegistry};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! let mut registry = MethodRegistry::new();
//! registry.register(
//!     "google.example.library.v1.LibraryService.GetBook",
//!     Some(HttpRule::new(HttpMethod::Get, "/v1/{name=shelves/*/books/*}")),
//! );
//!
//! let encoder = FallbackEncoder::new(Arc::new(registry), "https://library.example.com", FallbackMode::Rest);
//! let request = encoder
//!     .encode(
//!         "google.example.library.v1.LibraryService.GetBook",
//!         &json!({"name": "shelves/1/books/2", "view": "FULL"}),
//!         &OtherArgs::default(),
//!     )
//!     .unwrap();
//!
//! assert_eq!(request.method(), http::Method::GET);
//! assert_eq!(
//!     request.uri().to_string(),
//!     "https://library.example.com/v1/shelves/1/books/2?view=FULL"
//! );
//! ```

use crate::settings::OtherArgs;
use crate::transcoding::{MethodRegistry, TranscodingError, transcode};
use http::header::CONTENT_TYPE;
use serde_json::Value;
use std::sync::Arc;

const JSON_CONTENT_TYPE: &str = "application/json";

/// Encoding used by a [`FallbackEncoder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FallbackMode {
    /// Transcode requests with the methods' HTTP rules.
    #[default]
    Rest,
    /// Post every request to the generic `$rpc` endpoint.
    Proto,
}

/// Builds HTTP requests for registered methods.
#[derive(Debug, Clone)]
pub struct FallbackEncoder {
    registry: Arc<MethodRegistry>,
    base_url: String,
    mode: FallbackMode,
}

impl FallbackEncoder {
    /// Creates an encoder for the methods in `registry`, addressing
    /// `base_url` (scheme and authority, optionally a path prefix).
    pub fn new(
        registry: Arc<MethodRegistry>,
        base_url: impl Into<String>,
        mode: FallbackMode,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            registry,
            base_url,
            mode,
        }
    }

    /// The encoding mode.
    pub fn mode(&self) -> FallbackMode {
        self.mode
    }

    /// Encodes a call of `selector` with `request`.
    ///
    /// # Errors
    ///
    /// - [`TranscodingError::UnknownMethod`] if `selector` is not registered.
    /// - [`TranscodingError::NoMatchingBinding`] if no binding of the
    ///   method's rule matches the request.
    /// - [`TranscodingError::InvalidHttpMethod`] if the matched binding uses
    ///   a verb that is not a valid HTTP method.
    pub fn encode(
        &self,
        selector: &str,
        request: &Value,
        other_args: &OtherArgs,
    ) -> Result<http::Request<String>, TranscodingError> {
        if !self.registry.contains(selector) {
            return Err(TranscodingError::UnknownMethod(selector.to_string()));
        }
        match (self.mode, self.registry.rule(selector)) {
            (FallbackMode::Rest, Some(rule)) => {
                let transcoded = transcode(request, rule).ok_or_else(|| {
                    TranscodingError::NoMatchingBinding {
                        selector: selector.to_string(),
                    }
                })?;
                let verb = transcoded.http_method.to_string();
                let method = http::Method::from_bytes(verb.as_bytes())
                    .map_err(|_| TranscodingError::InvalidHttpMethod(verb.clone()))?;
                let mut uri = format!("{}{}", self.base_url, transcoded.url);
                if !transcoded.query_string.is_empty() {
                    uri.push('?');
                    uri.push_str(&transcoded.query_string);
                }
                let body = match &transcoded.body {
                    Value::String(text) if text.is_empty() => String::new(),
                    body => serde_json::to_string(body)?,
                };
                tracing::trace!(selector, %method, %uri, "encoded REST request");
                self.build(method, &uri, body, other_args)
            }
            _ => {
                let uri = format!("{}/$rpc/{}", self.base_url, rpc_path(selector));
                let body = serde_json::to_string(request)?;
                tracing::trace!(selector, %uri, "encoded proto-over-HTTP request");
                self.build(http::Method::POST, &uri, body, other_args)
            }
        }
    }

    fn build(
        &self,
        method: http::Method,
        uri: &str,
        body: String,
        other_args: &OtherArgs,
    ) -> Result<http::Request<String>, TranscodingError> {
        let mut builder = http::Request::builder()
            .method(method)
            .uri(uri)
            .header(CONTENT_TYPE, JSON_CONTENT_TYPE);
        for (name, value) in &other_args.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        Ok(builder.body(body)?)
    }
}

/// `pkg.Service.Method` becomes `pkg.Service/Method`.
fn rpc_path(selector: &str) -> String {
    match selector.rsplit_once('.') {
        Some((service, method)) => format!("{service}/{method}"),
        None => selector.to_string(),
    }
}
