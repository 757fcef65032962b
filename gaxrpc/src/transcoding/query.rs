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

//! Query string construction from the fields left over after matching.

use super::fields::scalar_text;
use super::template::encode_without_slashes;
use serde_json::Value;

/// Flattens nested objects into dotted keys, keeping field order.
///
/// Arrays stay as arrays; nulls are dropped.
pub(crate) fn flatten(value: &Value) -> Vec<(String, Value)> {
    let mut flat = Vec::new();
    if let Value::Object(object) = value {
        for (key, value) in object {
            flatten_into(key.clone(), value, &mut flat);
        }
    }
    flat
}

fn flatten_into(key: String, value: &Value, flat: &mut Vec<(String, Value)>) {
    match value {
        Value::Null => {}
        Value::Object(object) => {
            for (child, value) in object {
                flatten_into(format!("{key}.{child}"), value, flat);
            }
        }
        other => flat.push((key, other.clone())),
    }
}

/// Builds `key=value` components. A repeated field yields one component per
/// element.
///
/// Query parameters carry scalars only: array elements that are objects,
/// arrays or null are left out of the query.
pub(crate) fn query_components(value: &Value) -> Vec<String> {
    let mut components = Vec::new();
    for (key, value) in flatten(value) {
        let key = encode_without_slashes(&key);
        match &value {
            Value::Array(items) => {
                for item in items {
                    match scalar_text(item) {
                        Some(text) => components.push(component(&key, &text)),
                        None => {
                            tracing::debug!(key = key.as_str(), "Dropping non-scalar element");
                        }
                    }
                }
            }
            scalar => {
                if let Some(text) = scalar_text(scalar) {
                    components.push(component(&key, &text));
                }
            }
        }
    }
    components
}

fn component(key: &str, value: &str) -> String {
    format!("{key}={}", encode_without_slashes(value))
}

/// Builds the query string (without the leading `?`).
pub(crate) fn query_string(value: &Value) -> String {
    query_components(value).join("&")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flatten() {
        assert!(flatten(&json!({})).is_empty());
        let request = json!({"field": "value", "nested": {"subfield": "subvalue"}, "gone": null});
        assert_eq!(
            flatten(&request),
            vec![
                ("field".to_string(), json!("value")),
                ("nested.subfield".to_string(), json!("subvalue")),
            ]
        );
    }

    #[test]
    fn test_query_components() {
        let single = json!({"field": "value"});
        assert_eq!(query_components(&single), vec!["field=value"]);
        assert_eq!(
            query_components(&json!({"field": "value", "a": 42})),
            vec!["field=value", "a=42"]
        );
        assert_eq!(
            query_components(&json!({
                "field": "value",
                "repeated": [1, 2, "z z z"],
                "obj": {"subfield": "string", "y": "z"}
            })),
            vec![
                "field=value",
                "repeated=1",
                "repeated=2",
                "repeated=z%20z%20z",
                "obj.subfield=string",
                "obj.y=z",
            ]
        );
    }

    #[test]
    fn test_non_scalar_array_elements_dropped() {
        let request = json!({"ids": [1, {"nested": true}, [2], null, "x"]});
        assert_eq!(query_components(&request), vec!["ids=1", "ids=x"]);
    }

    #[test]
    fn test_query_string() {
        let request = json!({"field": "value", "a": 42});
        assert_eq!(query_string(&request), "field=value&a=42");
        assert_eq!(query_string(&json!({})), "");
    }
}
