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

//! HTTP rules in the `google.api.http` JSON shape.

use serde::{Deserialize, Serialize};
use std::fmt;

/// HTTP verb of a binding.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    /// `GET`
    Get,
    /// `PUT`
    Put,
    /// `POST`
    Post,
    /// `DELETE`
    Delete,
    /// `PATCH`
    Patch,
    /// Any other verb, from a `custom` pattern.
    Custom(String),
}

impl HttpMethod {
    /// Lower-case name of the verb.
    pub fn as_lowercase(&self) -> String {
        match self {
            Self::Get => "get".to_string(),
            Self::Put => "put".to_string(),
            Self::Post => "post".to_string(),
            Self::Delete => "delete".to_string(),
            Self::Patch => "patch".to_string(),
            Self::Custom(kind) => kind.to_ascii_lowercase(),
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_lowercase().to_ascii_uppercase())
    }
}

/// A `custom` pattern: a verb outside the standard set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomPattern {
    /// Verb name.
    pub kind: String,
    /// Path template.
    pub path: String,
}

/// An HTTP rule: one primary binding plus additional bindings.
///
/// Exactly one pattern field (`get`, `put`, `post`, `delete`, `patch`,
/// `custom`) is expected to be set. `body` is `*` for the whole request, a
/// field name, or absent.
///
/// # Examples
///
/// ```rust
/// use gaxrpc::transcoding::{HttpMethod, HttpRule};
///
/// let rule: HttpRule = serde_json::from_str(r#"{
///     "get": "/v1/{name=projects/*}",
///     "additional_bindings": [{"post": "/v1/{name=projects/*}:get", "body": "*"}]
/// }"#).unwrap();
///
/// assert_eq!(rule.pattern(), Some((HttpMethod::Get, "/v1/{name=projects/*}")));
/// assert_eq!(rule.additional_bindings.len(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct HttpRule {
    /// Fully-qualified method the rule applies to. Only used by overrides.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub get: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub put: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delete: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom: Option<CustomPattern>,
    /// Request field sent as the body, or `*`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    /// Alternative bindings tried in order after this one.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub additional_bindings: Vec<HttpRule>,
}

impl HttpRule {
    /// Creates a rule with a single pattern.
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        let mut rule = Self::default();
        rule.set_pattern(method, path.into());
        rule
    }

    /// Sets the body field.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Appends an additional binding.
    #[must_use]
    pub fn with_binding(mut self, binding: HttpRule) -> Self {
        self.additional_bindings.push(binding);
        self
    }

    /// Sets the selector.
    #[must_use]
    pub fn with_selector(mut self, selector: impl Into<String>) -> Self {
        self.selector = Some(selector.into());
        self
    }

    /// The verb and path template of this binding, if a pattern is set.
    pub fn pattern(&self) -> Option<(HttpMethod, &str)> {
        let standard = [
            (HttpMethod::Get, &self.get),
            (HttpMethod::Put, &self.put),
            (HttpMethod::Post, &self.post),
            (HttpMethod::Delete, &self.delete),
            (HttpMethod::Patch, &self.patch),
        ];
        standard
            .into_iter()
            .find_map(|(method, path)| path.as_deref().map(|path| (method, path)))
            .or_else(|| {
                let custom = self.custom.as_ref()?;
                let method = HttpMethod::Custom(custom.kind.clone());
                Some((method, custom.path.as_str()))
            })
    }

    /// Replaces the pattern with `method` and `path`.
    pub fn set_pattern(&mut self, method: HttpMethod, path: String) {
        self.get = None;
        self.put = None;
        self.post = None;
        self.delete = None;
        self.patch = None;
        self.custom = None;
        match method {
            HttpMethod::Get => self.get = Some(path),
            HttpMethod::Put => self.put = Some(path),
            HttpMethod::Post => self.post = Some(path),
            HttpMethod::Delete => self.delete = Some(path),
            HttpMethod::Patch => self.patch = Some(path),
            HttpMethod::Custom(kind) => self.custom = Some(CustomPattern { kind, path }),
        }
    }

    /// This rule followed by its additional bindings, in match order.
    pub fn bindings(&self) -> impl Iterator<Item = &HttpRule> {
        std::iter::once(self).chain(self.additional_bindings.iter())
    }
}
