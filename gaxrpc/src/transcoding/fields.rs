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

//! Dotted field paths over JSON requests.
//!
//! Rules name fields in `snake_case` while JSON requests usually carry
//! `camelCase` keys. Each path segment is looked up verbatim first, then in
//! its camel-case form. Keys that a rule does not mention are never touched.

use serde_json::{Map, Value};

/// Converts `snake_case` to `camelCase`. The first word is kept as is.
pub(crate) fn camel_case(name: &str) -> String {
    let mut words = name.split('_');
    let mut camel = words.next().unwrap_or_default().to_string();
    for word in words {
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            camel.extend(first.to_uppercase());
            camel.push_str(chars.as_str());
        }
    }
    camel
}

/// Finds the key actually used in `object` for the rule field `name`.
fn resolve_key(object: &Map<String, Value>, name: &str) -> Option<String> {
    if object.contains_key(name) {
        return Some(name.to_string());
    }
    let camel = camel_case(name);
    object.contains_key(&camel).then_some(camel)
}

/// Returns the value at the dotted `path`, or `None` if any segment is
/// missing or traverses a non-object.
pub(crate) fn get_field<'a>(request: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(request, |current, segment| {
        let object = current.as_object()?;
        let key = resolve_key(object, segment)?;
        object.get(&key)
    })
}

/// Renders a scalar JSON value as path or query text. Objects, arrays and
/// nulls have no scalar form.
pub(crate) fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Removes the field at the dotted `path`. Parents are left in place even
/// when they become empty. Missing paths are ignored.
pub(crate) fn delete_field(request: &mut Value, path: &str) {
    let (parents, leaf) = match path.rsplit_once('.') {
        Some((parents, leaf)) => (Some(parents), leaf),
        None => (None, path),
    };

    let mut current = request;
    if let Some(parents) = parents {
        for segment in parents.split('.') {
            let Some(object) = current.as_object_mut() else {
                return;
            };
            let Some(key) = resolve_key(object, segment) else {
                return;
            };
            let Some(next) = object.get_mut(&key) else {
                return;
            };
            current = next;
        }
    }

    if let Some(object) = current.as_object_mut() {
        if let Some(key) = resolve_key(object, leaf) {
            // shift_remove keeps the order of the remaining keys.
            object.shift_remove(&key);
        }
    }
}
