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

//! HTTP/JSON transcoding.
//!
//! Maps a JSON request onto an HTTP binding of a method: a verb, a URL whose
//! path captures request fields, a query string built from the leftovers,
//! and an optional body.
//!
//! # Examples
//!
//! ```rust
//! use gaxrpc::transcoding::{transcode, HttpMethod, HttpRule};
//! use serde_json::json;
//!
//! let rule = HttpRule::new(HttpMethod::Get, "/v3/{parent=projects/*}/supportedLanguages");
//! let request = json!({"parent": "projects/project", "displayLanguageCode": "en"});
//!
//! let transcoded = transcode(&request, &rule).unwrap();
//! assert_eq!(transcoded.http_method, HttpMethod::Get);
//! assert_eq!(transcoded.url, "/v3/projects/project/supportedLanguages");
//! assert_eq!(transcoded.query_string, "displayLanguageCode=en");
//! assert_eq!(transcoded.body, json!(""));
//! ```

mod error;
mod fields;
mod query;
mod registry;
mod rule;
mod template;

pub use self::error::TranscodingError;
pub use self::registry::MethodRegistry;
pub use self::rule::{CustomPattern, HttpMethod, HttpRule};
pub use self::template::{
    PathTemplate, TemplateMatch, apply_pattern, encode_with_slashes, encode_without_slashes,
};

use self::fields::{delete_field, get_field};
use serde_json::Value;

/// Body marker meaning "the whole remaining request".
const WHOLE_REQUEST: &str = "*";

/// A request mapped onto an HTTP binding.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscodedRequest {
    /// Verb of the matched binding.
    pub http_method: HttpMethod,
    /// Encoded URL path.
    pub url: String,
    /// Query string without the leading `?`. Empty when nothing is left.
    pub query_string: String,
    /// Body value, or the empty string when there is none.
    pub body: Value,
}

/// Transcodes `request` with the first binding of `rule` that matches.
///
/// The primary binding is tried first, then `additional_bindings` in order.
/// A binding with a malformed path template is skipped. `request` is never
/// modified. Returns `None` if no binding matches.
pub fn transcode(request: &Value, rule: &HttpRule) -> Option<TranscodedRequest> {
    rule.bindings()
        .find_map(|binding| transcode_binding(request, binding))
}

fn transcode_binding(request: &Value, binding: &HttpRule) -> Option<TranscodedRequest> {
    let (http_method, path) = binding.pattern()?;
    let template = match PathTemplate::parse(path) {
        Ok(template) => template,
        Err(error) => {
            tracing::warn!(%error, "skipping HTTP binding");
            return None;
        }
    };
    let matched = template.expand(request)?;

    let mut remaining = request.clone();
    for field in &matched.matched_fields {
        delete_field(&mut remaining, field);
    }

    let (body, query_string) = match binding.body.as_deref() {
        Some(WHOLE_REQUEST) => (remaining, String::new()),
        Some(field) if !field.is_empty() => {
            let body = match get_field(&remaining, field) {
                None | Some(Value::Null) => empty_body(),
                Some(Value::Object(object)) if object.is_empty() => empty_body(),
                Some(value) => value.clone(),
            };
            delete_field(&mut remaining, field);
            (body, query::query_string(&remaining))
        }
        _ => (empty_body(), query::query_string(&remaining)),
    };

    Some(TranscodedRequest {
        http_method,
        url: matched.url,
        query_string,
        body,
    })
}

fn empty_body() -> Value {
    Value::String(String::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_named_body_field_removed_from_query() {
        let rule = HttpRule::new(HttpMethod::Post, "/v3/{parent=projects/*}/translate")
            .with_body("contents");
        let request = json!({
            "parent": "projects/p",
            "contents": {"text": "hi"},
            "mime_type": "text/plain"
        });
        let transcoded = transcode(&request, &rule).unwrap();
        assert_eq!(transcoded.url, "/v3/projects/p/translate");
        assert_eq!(transcoded.body, json!({"text": "hi"}));
        assert_eq!(transcoded.query_string, "mime_type=text/plain");
    }

    #[test]
    fn test_empty_named_body_becomes_empty_string() {
        let rule = HttpRule::new(HttpMethod::Patch, "/v1/{name}");
        let rule = rule.with_body("resource");
        let request = json!({"name": "n", "resource": {}});
        let transcoded = transcode(&request, &rule).unwrap();
        assert_eq!(transcoded.body, json!(""));
        assert_eq!(transcoded.query_string, "");
    }

    #[test]
    fn test_malformed_binding_is_skipped() {
        let rule = HttpRule::new(HttpMethod::Get, "/v1/{name")
            .with_binding(HttpRule::new(HttpMethod::Get, "/v1/{name}"));
        let transcoded = transcode(&json!({"name": "n"}), &rule).unwrap();
        assert_eq!(transcoded.url, "/v1/n");
    }

    #[test]
    fn test_rule_without_pattern() {
        assert_eq!(transcode(&json!({}), &HttpRule::default()), None);
    }
}
