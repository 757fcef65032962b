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

//! URL path templates such as `/v1/{name=projects/*/locations/*}/jobs`.

use super::TranscodingError;
use super::fields::{get_field, scalar_text};
use serde_json::Value;

/// Percent-encodes everything except `A-Z a-z 0-9 - . _ ~`, slashes included.
pub fn encode_with_slashes(text: &str) -> String {
    urlencoding::encode(text).into_owned()
}

/// Percent-encodes like [`encode_with_slashes`] but keeps `/` separators.
pub fn encode_without_slashes(text: &str) -> String {
    text.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Part {
    Literal(String),
    Capture { field: String, pattern: String },
}

/// A parsed path template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate {
    parts: Vec<Part>,
}

/// The result of matching a request against a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateMatch {
    /// The expanded, encoded URL path.
    pub url: String,
    /// Dotted paths of the request fields consumed by captures.
    pub matched_fields: Vec<String>,
}

impl PathTemplate {
    /// Parses a template. A capture without `=pattern` matches a single
    /// segment.
    pub fn parse(template: &str) -> Result<Self, TranscodingError> {
        let malformed = |reason: &str| TranscodingError::MalformedTemplate {
            template: template.to_string(),
            reason: reason.to_string(),
        };

        let mut parts = Vec::new();
        let mut rest = template;
        while let Some(open) = rest.find('{') {
            if open > 0 {
                parts.push(Part::Literal(rest[..open].to_string()));
            }
            let after = &rest[open + 1..];
            let Some(close) = after.find('}') else {
                return Err(malformed("unterminated capture"));
            };
            let capture = &after[..close];
            if capture.contains('{') {
                return Err(malformed("nested capture"));
            }
            let (field, pattern) = match capture.split_once('=') {
                Some((field, pattern)) => (field.trim(), pattern.trim()),
                None => (capture.trim(), "*"),
            };
            if field.is_empty() {
                return Err(malformed("capture without a field name"));
            }
            if pattern.is_empty() {
                return Err(malformed("capture with an empty pattern"));
            }
            parts.push(Part::Capture {
                field: field.to_string(),
                pattern: pattern.to_string(),
            });
            rest = &after[close + 1..];
        }
        if rest.contains('}') {
            return Err(malformed("unbalanced '}'"));
        }
        if !rest.is_empty() {
            parts.push(Part::Literal(rest.to_string()));
        }
        Ok(Self { parts })
    }

    /// Dotted paths of the fields captured by this template.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().filter_map(|part| match part {
            Part::Capture { field, .. } => Some(field.as_str()),
            Part::Literal(_) => None,
        })
    }

    /// Expands the template with values from `request`.
    ///
    /// Returns `None` if a captured field is absent, null or not a scalar,
    /// or if its value does not fit the capture's pattern.
    pub fn expand(&self, request: &Value) -> Option<TemplateMatch> {
        let mut url = String::new();
        let mut matched_fields = Vec::new();
        for part in &self.parts {
            match part {
                Part::Literal(text) => url.push_str(text),
                Part::Capture { field, pattern } => {
                    let value = scalar_text(get_field(request, field)?)?;
                    url.push_str(&apply_pattern(pattern, &value)?);
                    matched_fields.push(field.clone());
                }
            }
        }
        Some(TemplateMatch {
            url,
            matched_fields,
        })
    }
}

/// Checks `value` against a capture pattern and returns its encoded form.
///
/// `*` alone accepts any non-empty value and escapes its slashes. Any other
/// pattern is matched segment by segment: `*` is one non-empty segment, `**`
/// one or more segments, anything else a literal segment.
pub fn apply_pattern(pattern: &str, value: &str) -> Option<String> {
    if value.is_empty() {
        return None;
    }
    if pattern == "*" {
        return Some(encode_with_slashes(value));
    }
    let pattern_segments: Vec<&str> = pattern.split('/').collect();
    let value_segments: Vec<&str> = value.split('/').collect();
    if segments_match(&pattern_segments, &value_segments) {
        Some(encode_without_slashes(value))
    } else {
        None
    }
}

fn segments_match(pattern: &[&str], value: &[&str]) -> bool {
    match pattern.split_first() {
        None => value.is_empty(),
        Some((&"**", rest)) => (1..=value.len()).any(|taken| {
            value[..taken].iter().all(|segment| !segment.is_empty())
                && segments_match(rest, &value[taken..])
        }),
        Some((&"*", rest)) => match value.split_first() {
            Some((segment, remaining)) => !segment.is_empty() && segments_match(rest, remaining),
            None => false,
        },
        Some((literal, rest)) => match value.split_first() {
            Some((segment, remaining)) => segment == literal && segments_match(rest, remaining),
            None => false,
        },
    }
}
