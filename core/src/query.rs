//! Query-string serialization.
//!
//! # Design
//! Parameters are a JSON object so callers can mix scalars, arrays and nested
//! objects. Nested objects flatten to `parent[child]` keys; arrays follow the
//! configured `ArrayFormat`. Percent-encoding is applied per key segment and
//! per value, so the brackets introduced by flattening stay literal.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// How array values are written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArrayFormat {
    /// `tags=a&tags=b`
    #[default]
    Repeat,
    /// `tags[]=a&tags[]=b`
    Brackets,
    /// `tags=a,b`
    Comma,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryOptions {
    pub array_format: ArrayFormat,
    /// Drop null values instead of writing `key=`.
    pub skip_null: bool,
    /// Sort keys alphabetically at every nesting level.
    pub sort: bool,
    /// Percent-encode keys and values.
    pub encode: bool,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            array_format: ArrayFormat::Repeat,
            skip_null: true,
            sort: true,
            encode: true,
        }
    }
}

/// Serialize `params` to `key=value&...` without a leading `?`.
///
/// Returns an empty string when nothing survives filtering.
pub fn serialize(params: &Map<String, Value>, options: &QueryOptions) -> String {
    let mut pairs = Vec::new();
    for (key, value) in entries(params, options) {
        let key = encode(key, options);
        push_value(&key, value, options, &mut pairs);
    }
    pairs
        .into_iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("&")
}

fn entries<'a>(map: &'a Map<String, Value>, options: &QueryOptions) -> Vec<(&'a str, &'a Value)> {
    let mut entries: Vec<_> = map.iter().map(|(k, v)| (k.as_str(), v)).collect();
    if options.sort {
        entries.sort_by(|a, b| a.0.cmp(b.0));
    }
    entries
}

fn encode(raw: &str, options: &QueryOptions) -> String {
    if options.encode {
        urlencoding::encode(raw).into_owned()
    } else {
        raw.to_string()
    }
}

fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Null => Some(String::new()),
        Value::Array(_) | Value::Object(_) => None,
    }
}

fn push_value(key: &str, value: &Value, options: &QueryOptions, out: &mut Vec<(String, String)>) {
    match value {
        Value::Null if options.skip_null => {}
        Value::Array(items) => push_array(key, items, options, out),
        Value::Object(map) => {
            for (child, nested) in entries(map, options) {
                let nested_key = format!("{key}[{}]", encode(child, options));
                push_value(&nested_key, nested, options, out);
            }
        }
        other => {
            if let Some(raw) = scalar(other) {
                out.push((key.to_string(), encode(&raw, options)));
            }
        }
    }
}

fn push_array(key: &str, items: &[Value], options: &QueryOptions, out: &mut Vec<(String, String)>) {
    match options.array_format {
        ArrayFormat::Repeat => {
            for item in items {
                push_value(key, item, options, out);
            }
        }
        ArrayFormat::Brackets => {
            let bracket_key = format!("{key}[]");
            for item in items {
                push_value(&bracket_key, item, options, out);
            }
        }
        ArrayFormat::Comma => {
            let joined: Vec<String> = items
                .iter()
                .filter(|item| !(item.is_null() && options.skip_null))
                .map(|item| match scalar(item) {
                    Some(raw) => encode(&raw, options),
                    None => encode(&item.to_string(), options),
                })
                .collect();
            if !joined.is_empty() {
                out.push((key.to_string(), joined.join(",")));
            }
        }
    }
}
