//! Message-of-the-day normalization.
//!
//! The `description` field is either a plain string or a chat component
//! `{ "text": ..., "extra": [...] }` whose `extra` entries may nest
//! further. Components are flattened depth-first, inline `§x` formatting
//! codes are removed and surrounding whitespace is trimmed.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

/// Placeholder shown when a server has no usable MOTD.
pub const NO_MOTD: &str = "No MOTD";

static FORMAT_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("§[0-9A-Za-z]").expect("format code pattern is valid"));

/// Flatten, strip and trim a `description` value.
pub fn normalize_motd(description: Option<&Value>) -> String {
    let mut raw = String::new();
    if let Some(component) = description {
        flatten(component, &mut raw);
    }
    let stripped = strip_format_codes(&raw);
    match stripped.trim() {
        "" => NO_MOTD.to_string(),
        text => text.to_string(),
    }
}

/// Remove every section-sign formatting code.
pub fn strip_format_codes(text: &str) -> String {
    FORMAT_CODE.replace_all(text, "").into_owned()
}

fn flatten(component: &Value, out: &mut String) {
    match component {
        Value::String(text) => out.push_str(text),
        Value::Object(map) => {
            if let Some(Value::String(text)) = map.get("text") {
                out.push_str(text);
            }
            if let Some(Value::Array(extra)) = map.get("extra") {
                for child in extra {
                    flatten(child, out);
                }
            }
        }
        Value::Array(parts) => {
            for part in parts {
                flatten(part, out);
            }
        }
        _ => {}
    }
}
