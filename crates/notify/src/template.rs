//! `{{placeholder}}` template expansion.
//!
//! Substitutions come from the record's well-known keys, its custom data
//! map, and caller-supplied extra context. Unresolved placeholders are left
//! verbatim; silently blanking unknown placeholders would hide
//! misconfigured templates from the administrator debugging them.

use std::collections::BTreeMap;

use serde_json::Value;

use recordflow_core::Record;

/// Build the substitution map for one record.
///
/// Precedence: well-known keys (`record_number`, `id`, `status`), then the
/// record's custom data fields, then `extra`; earlier sources win.
pub fn substitutions(
    record: &Record,
    extra: &BTreeMap<String, String>,
) -> BTreeMap<String, String> {
    let mut map = BTreeMap::new();

    if let Some(number) = record.record_number() {
        map.insert("record_number".to_string(), number.to_string());
    }
    if let Some(id) = record.id() {
        map.insert("id".to_string(), id.to_string());
    }
    if let Some(status) = record.status() {
        map.insert("status".to_string(), status.to_string());
    }

    if let Some(data) = record.data() {
        for (key, value) in data {
            map.entry(key.clone()).or_insert_with(|| render_value(value));
        }
    }

    for (key, value) in extra {
        map.entry(key.clone()).or_insert_with(|| value.clone());
    }

    map
}

/// Expand `{{key}}` placeholders; unknown keys stay verbatim.
pub fn expand_template(template: &str, subs: &BTreeMap<String, String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find("}}") {
            Some(end) => {
                let key = after[..end].trim();
                match subs.get(key) {
                    Some(value) => out.push_str(value),
                    None => {
                        // Unknown placeholder: keep it literal.
                        out.push_str(&rest[start..start + 2 + end + 2]);
                    }
                }
                rest = &after[end + 2..];
            }
            None => {
                // Unterminated opener: emit the remainder as-is.
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

fn render_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
