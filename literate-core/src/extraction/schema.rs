//! Structural validation and best-effort repair of parsed model output.
//!
//! The expected shape is:
//!
//! ```text
//! {"objects": [{"name": str, "description": str,
//!               "relationships": [{"target": str, "description": str}]}]}
//! ```

use serde_json::{json, Map, Value};

/// Maximum length of an object name, in characters.
pub const MAX_NAME_LEN: usize = 100;

/// Maximum length of an object description, in characters.
pub const MAX_DESCRIPTION_LEN: usize = 500;

/// Maximum length of a relationship target, in characters.
pub const MAX_TARGET_LEN: usize = 100;

/// Maximum length of a relationship description, in characters.
pub const MAX_RELATIONSHIP_DESCRIPTION_LEN: usize = 200;

const TRUNCATION_MARKER: &str = "...";

/// Check parsed data against the expected shape.
///
/// Every violation is reported, each prefixed with the object (and
/// relationship) index it was found at.
pub fn validate_response(data: &Value) -> Result<(), Vec<String>> {
    let Some(top) = data.as_object() else {
        return Err(vec!["Response must be a JSON object".to_string()]);
    };
    let Some(objects) = top.get("objects") else {
        return Err(vec!["Response missing required 'objects' field".to_string()]);
    };
    let Some(objects) = objects.as_array() else {
        return Err(vec!["'objects' field must be an array".to_string()]);
    };

    let mut errors = Vec::new();
    for (i, obj) in objects.iter().enumerate() {
        validate_object(obj, i, &mut errors);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_object(obj: &Value, index: usize, errors: &mut Vec<String>) {
    let prefix = format!("Object {index}: ");

    let Some(obj) = obj.as_object() else {
        errors.push(format!("{prefix}must be a JSON object"));
        return;
    };

    check_string_field(obj, "name", MAX_NAME_LEN, &prefix, errors);
    check_string_field(obj, "description", MAX_DESCRIPTION_LEN, &prefix, errors);

    if let Some(relationships) = obj.get("relationships") {
        match relationships.as_array() {
            Some(relationships) => {
                for (j, rel) in relationships.iter().enumerate() {
                    validate_relationship(rel, index, j, errors);
                }
            }
            None => errors.push(format!("{prefix}'relationships' must be an array")),
        }
    }
}

fn validate_relationship(rel: &Value, obj_index: usize, rel_index: usize, errors: &mut Vec<String>) {
    let prefix = format!("Object {obj_index}, Relationship {rel_index}: ");

    let Some(rel) = rel.as_object() else {
        errors.push(format!("{prefix}must be a JSON object"));
        return;
    };

    check_string_field(rel, "target", MAX_TARGET_LEN, &prefix, errors);
    check_string_field(rel, "description", MAX_RELATIONSHIP_DESCRIPTION_LEN, &prefix, errors);
}

fn check_string_field(
    obj: &Map<String, Value>,
    field: &str,
    max_len: usize,
    prefix: &str,
    errors: &mut Vec<String>,
) {
    match obj.get(field) {
        None => errors.push(format!("{prefix}missing required '{field}' field")),
        Some(value) => match value.as_str() {
            Some(s) if !s.trim().is_empty() => {
                if s.chars().count() > max_len {
                    errors.push(format!("{prefix}'{field}' too long (max {max_len} characters)"));
                }
            }
            _ => errors.push(format!("{prefix}'{field}' must be a non-empty string")),
        },
    }
}

/// Repair data so it matches the expected shape, dropping what cannot be saved.
///
/// A malformed top level becomes `{"objects": []}`. Objects without a usable
/// name are dropped; a missing description is synthesized from the name;
/// over-long text is truncated with a trailing `...`.
pub fn sanitize_response(data: &Value) -> Value {
    let Some(objects) = data
        .as_object()
        .and_then(|top| top.get("objects"))
        .and_then(Value::as_array)
    else {
        return json!({ "objects": [] });
    };

    let objects: Vec<Value> = objects.iter().filter_map(sanitize_object).collect();
    json!({ "objects": objects })
}

fn sanitize_object(obj: &Value) -> Option<Value> {
    let obj = obj.as_object()?;

    let name = obj.get("name")?.as_str()?.trim();
    if name.is_empty() || name.chars().count() > MAX_NAME_LEN {
        return None;
    }

    let description = match obj.get("description").and_then(Value::as_str).map(str::trim) {
        Some(d) if !d.is_empty() => d.to_string(),
        _ => format!("A {} mentioned in the text.", name.to_lowercase()),
    };

    let relationships: Vec<Value> = obj
        .get("relationships")
        .and_then(Value::as_array)
        .map(|rels| rels.iter().filter_map(sanitize_relationship).collect())
        .unwrap_or_default();

    Some(json!({
        "name": name,
        "description": truncate(&description, MAX_DESCRIPTION_LEN),
        "relationships": relationships,
    }))
}

fn sanitize_relationship(rel: &Value) -> Option<Value> {
    let rel = rel.as_object()?;

    let target = rel.get("target").and_then(Value::as_str).unwrap_or("").trim();
    if target.is_empty() || target.chars().count() > MAX_TARGET_LEN {
        return None;
    }

    let description = rel.get("description").and_then(Value::as_str).unwrap_or("").trim();
    if description.is_empty() {
        return None;
    }

    Some(json!({
        "target": target,
        "description": truncate(description, MAX_RELATIONSHIP_DESCRIPTION_LEN),
    }))
}

/// Cut `text` to at most `max_len` characters, ending in `...` if it was cut.
fn truncate(text: &str, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        return text.to_string();
    }
    let keep = max_len - TRUNCATION_MARKER.len();
    let mut out: String = text.chars().take(keep).collect();
    out.push_str(TRUNCATION_MARKER);
    out
}
