//! Reference token resolution
//!
//! Supported tokens:
//! - `[webform_submission:values:KEY]` - record value, `:`-separated for nested keys
//! - `[webform_submission:sid]`, `[webform_submission:uuid]`, `[webform_submission:state]`
//! - `[webform:id]` - id of the form the record belongs to
//!
//! Supported tokens without a value resolve to an empty string. Any other
//! bracketed text is left as is.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde_json::Value;

use crate::record::Record;

static TOKEN_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[([a-z_]+):([^\[\]\s]+)\]").expect("token pattern is valid")
});

/// Token referencing a record value
pub fn value_token(key: &str) -> String {
    format!("[webform_submission:values:{}]", key)
}

/// Replace every token in `pattern` with its value from `record`
pub fn resolve(pattern: &str, record: &Record) -> String {
    if !pattern.contains('[') {
        return pattern.to_string();
    }

    TOKEN_PATTERN
        .replace_all(pattern, |caps: &Captures| {
            lookup(&caps[1], &caps[2], record).unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// Resolve tokens in every string inside `value`
pub fn resolve_value(value: &Value, record: &Record) -> Value {
    match value {
        Value::String(s) => Value::String(resolve(s, record)),
        Value::Array(items) => Value::Array(items.iter().map(|v| resolve_value(v, record)).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), resolve_value(v, record)))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Render a record value as token output
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        Value::Array(items) => items
            .iter()
            .map(value_to_string)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        Value::Object(_) => value.to_string(),
    }
}

fn lookup(token_type: &str, name: &str, record: &Record) -> Option<String> {
    match (token_type, name) {
        ("webform_submission", "sid") => Some(record.sid.to_string()),
        ("webform_submission", "uuid") => Some(record.uuid.to_string()),
        ("webform_submission", "state") => Some(record.state.as_str().to_string()),
        ("webform", "id") => Some(record.webform_id.clone()),
        ("webform_submission", path) => {
            let path = path.strip_prefix("values:")?;
            Some(
                lookup_path(record, path)
                    .map(value_to_string)
                    .unwrap_or_default(),
            )
        }
        _ => None,
    }
}

fn lookup_path<'a>(record: &'a Record, path: &str) -> Option<&'a Value> {
    let mut segments = path.split(':');
    let mut current = record.element_data(segments.next()?)?;

    for segment in segments {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }

    Some(current)
}
