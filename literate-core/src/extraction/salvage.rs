//! Line-based recovery of objects from output that is not valid JSON.
//!
//! Models sometimes run out of tokens mid-object or emit trailing commas.
//! This scans line by line for a `"name"` field followed later by a
//! `"description"` field and builds an object from each complete pair.
//! It is not a JSON parser and never fails; it just finds fewer objects.

use crate::narrative::NarrativeObject;

/// Recover whatever complete name/description pairs can be found.
pub fn salvage_objects(text: &str) -> Vec<NarrativeObject> {
    let mut objects = Vec::new();
    let mut current_name: Option<String> = None;

    for line in text.lines().map(str::trim) {
        if line.contains(r#""name""#) && line.contains(':') {
            if let Some(name) = field_value(line).and_then(quoted_value) {
                current_name = Some(name.to_string());
            }
        } else if line.contains(r#""description""#) && line.contains(':') {
            let Some(name) = current_name.as_deref() else {
                continue;
            };
            let Some(description) = field_value(line).and_then(description_value) else {
                continue;
            };
            if !name.is_empty() && !description.is_empty() {
                objects.push(NarrativeObject::new(name, description, Vec::new()));
                current_name = None;
            }
        }
    }

    if !objects.is_empty() {
        tracing::debug!(count = objects.len(), "salvaged objects from malformed response");
    }
    objects
}

/// Everything after the first `:` on the line, trimmed.
fn field_value(line: &str) -> Option<&str> {
    line.split_once(':').map(|(_, value)| value.trim())
}

/// A value written as `"..."` or `"...",`, without the quotes and comma.
fn quoted_value(value: &str) -> Option<&str> {
    let inner = value.strip_prefix('"')?;
    inner
        .strip_suffix("\",")
        .or_else(|| inner.strip_suffix('"'))
}

/// A description value: starts with a quote and ends in a quote or `",`.
/// Trailing quotes and commas are all stripped.
fn description_value(value: &str) -> Option<&str> {
    let inner = value.strip_prefix('"')?;
    if !(value.len() >= 2 && (value.ends_with("\",") || value.ends_with('"'))) {
        return None;
    }
    Some(inner.trim_end_matches(['"', ',']))
}
