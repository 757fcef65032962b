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

//! Registry of methods and their HTTP rules.

use super::rule::HttpRule;
use std::collections::HashMap;

/// Maps fully-qualified method selectors to their HTTP rules.
///
/// A method may be registered without a rule; such methods can only be
/// reached through proto-over-HTTP encoding.
///
/// The registry is built at client setup and is read-only once shared.
/// [`override_http_rules`](Self::override_http_rules) takes `&mut self` for
/// that reason.
#[derive(Debug, Clone, Default)]
pub struct MethodRegistry {
    methods: HashMap<String, Option<HttpRule>>,
}

impl MethodRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a method, replacing any previous entry.
    pub fn register(&mut self, selector: impl Into<String>, rule: Option<HttpRule>) {
        self.methods.insert(selector.into(), rule);
    }

    /// Returns `true` if `selector` is registered.
    pub fn contains(&self, selector: &str) -> bool {
        self.methods.contains_key(selector)
    }

    /// The HTTP rule of `selector`, if it is registered and has one.
    pub fn rule(&self, selector: &str) -> Option<&HttpRule> {
        self.methods.get(selector).and_then(Option::as_ref)
    }

    /// Number of registered methods.
    pub fn len(&self) -> usize {
        self.methods.len()
    }

    /// Returns `true` if no method is registered.
    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    /// Applies rule overrides, typically loaded from service configuration.
    ///
    /// Each override names its target through `selector`. Overrides without
    /// a selector, for unknown methods, or for methods that have no HTTP rule
    /// are skipped. Otherwise the method's pattern is replaced, its body is
    /// replaced when the override sets one, and the override's additional
    /// bindings are appended to the existing ones.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use gaxrpc::transcoding::{HttpMethod, HttpRule, MethodRegistry};
    ///
    /// let mut registry = MethodRegistry::new();
    /// registry.register("svc.Echo", Some(HttpRule::new(HttpMethod::Get, "/v1/echo")));
    ///
    /// registry.override_http_rules(&[
    ///     HttpRule::new(HttpMethod::Post, "/v2/echo").with_selector("svc.Echo").with_body("*"),
    /// ]);
    ///
    /// let rule = registry.rule("svc.Echo").unwrap();
    /// assert_eq!(rule.pattern(), Some((HttpMethod::Post, "/v2/echo")));
    /// assert_eq!(rule.body.as_deref(), Some("*"));
    /// ```
    pub fn override_http_rules(&mut self, overrides: &[HttpRule]) {
        for override_rule in overrides {
            let Some(selector) = override_rule.selector.as_deref() else {
                tracing::debug!("skipping HTTP rule override without a selector");
                continue;
            };
            let Some(Some(rule)) = self.methods.get_mut(selector) else {
                tracing::debug!(selector, "skipping override for a method without rules");
                continue;
            };
            if let Some((method, path)) = override_rule.pattern() {
                rule.set_pattern(method, path.to_string());
            }
            if let Some(body) = &override_rule.body {
                rule.body = Some(body.clone());
            }
            rule.additional_bindings
                .extend(override_rule.additional_bindings.iter().cloned());
            tracing::debug!(selector, "applied HTTP rule override");
        }
    }
}

impl<S: Into<String>> FromIterator<(S, Option<HttpRule>)> for MethodRegistry {
    fn from_iter<I: IntoIterator<Item = (S, Option<HttpRule>)>>(iter: I) -> Self {
        Self {
            methods: iter
                .into_iter()
                .map(|(selector, rule)| (selector.into(), rule))
                .collect(),
        }
    }
}
