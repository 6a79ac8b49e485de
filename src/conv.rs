//! Coercion helpers for loosely typed configuration values.
//!
//! Options reach the generator from INI files, command line flags and JSON
//! alike, so a "list" may arrive as a comma separated string or an array and
//! a "bool" as `"True"` or `1`. These helpers fold such values into the
//! shape the caller expects.

use regex::Regex;
use serde_json::Value;

use crate::error::Result;
use crate::file::abspath;

/// Empty, zero, false and null values are falsy.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

fn as_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Strings are true only when they read `true` (any case); everything else
/// follows truthiness.
pub fn conv_bool(value: &Value) -> bool {
    match value {
        Value::String(s) => s.eq_ignore_ascii_case("true"),
        other => is_truthy(other),
    }
}

/// Split a value into a list of non-empty, trimmed items.
///
/// Array items are treated as lines; `sep` and line breaks both separate
/// items.
pub fn conv_list(value: &Value, sep: &str) -> Vec<String> {
    if !is_truthy(value) {
        return Vec::new();
    }

    let text = match value {
        Value::Array(items) => items.iter().map(as_text).collect::<Vec<_>>().join("\n"),
        other => as_text(other),
    };

    text.replace(sep, "\n")
        .lines()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Lower-case strings; falsy values become `""`, other values pass through.
pub fn conv_lower(value: &Value) -> Value {
    if !is_truthy(value) {
        return Value::String(String::new());
    }
    match value {
        Value::String(s) => Value::String(s.to_lowercase()),
        other => other.clone(),
    }
}

/// Resolve a path or list of paths with [`abspath`].
pub fn conv_path(value: &Value) -> Value {
    fn resolve(s: &str) -> Value {
        Value::String(abspath(s).to_string_lossy().into_owned())
    }

    match value {
        Value::String(s) => resolve(s),
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| match item {
                    Value::String(s) => resolve(s),
                    other => other.clone(),
                })
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Replace every occurrence of each key with its value in a single pass.
///
/// Keys are tried in the given order at each position, so an earlier key
/// wins when two keys match at the same offset. Empty keys are ignored.
pub fn replace_all<K, V>(text: &str, replacements: &[(K, V)]) -> Result<String>
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    let pattern = replacements
        .iter()
        .map(|(k, _)| k.as_ref())
        .filter(|k| !k.is_empty())
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join("|");
    if pattern.is_empty() {
        return Ok(text.to_string());
    }

    let rx = Regex::new(&pattern)?;
    let replaced = rx.replace_all(text, |caps: &regex::Captures| {
        let matched = &caps[0];
        replacements
            .iter()
            .find(|(k, _)| k.as_ref() == matched)
            .map(|(_, v)| v.as_ref().to_string())
            .unwrap_or_else(|| matched.to_string())
    });
    Ok(replaced.into_owned())
}
