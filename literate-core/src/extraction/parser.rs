//! Turning raw model text into validated narrative objects.

use super::salvage::salvage_objects;
use super::sanitize::{clean_response, is_placeholder_response};
use super::schema::{sanitize_response, validate_response};
use crate::narrative::{NarrativeObject, Relationship};
use serde_json::Value;
use std::collections::HashSet;
use thiserror::Error;

/// Names that are template tokens rather than real objects.
const PLACEHOLDER_NAMES: &[&str] = &["string", "name", "object"];

/// Descriptions that are template tokens rather than real descriptions.
const PLACEHOLDER_DESCRIPTIONS: &[&str] = &["string", "description"];

/// Generic nouns that do not name anything specific.
const GENERIC_NAMES: &[&str] = &["person", "character", "object"];

/// Words that mark a lowercase name as a concrete place or thing worth keeping.
const CONCRETE_NOUNS: &[&str] = &["library", "castle", "park", "school", "book", "sword", "map"];

const MIN_NAME_CHARS: usize = 2;
const MIN_DESCRIPTION_CHARS: usize = 5;

/// Errors from converting validated data into objects.
///
/// Malformed model output never produces one of these; it degrades to fewer
/// objects instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Object {index} is missing required field '{field}'")]
    MissingField { index: usize, field: &'static str },
}

/// Parses model responses into narrative objects.
#[derive(Debug, Clone, Copy, Default)]
pub struct NarrativeParser;

impl NarrativeParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse a raw model response.
    ///
    /// Empty input, placeholder echoes and unparseable output all yield an
    /// empty (or salvaged) list. Only a conversion failure on data that
    /// already passed validation is an error.
    pub fn parse_response(&self, raw: &str) -> Result<Vec<NarrativeObject>, ParseError> {
        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }

        let cleaned = clean_response(raw);

        if is_placeholder_response(&cleaned) {
            tracing::debug!("placeholder response detected, ignoring");
            return Ok(Vec::new());
        }

        let data: Value = match serde_json::from_str(&cleaned) {
            Ok(data) => data,
            Err(e) => {
                tracing::debug!(error = %e, "response is not valid JSON, attempting salvage");
                return Ok(salvage_objects(&cleaned));
            }
        };

        let data = match validate_response(&data) {
            Ok(()) => data,
            Err(errors) => {
                tracing::debug!(?errors, "schema validation failed, sanitizing");
                sanitize_response(&data)
            }
        };

        let objects = convert_objects(&data)?;
        Ok(self.filter_quality(objects))
    }

    /// Drop objects that look like template tokens or generic phrases.
    ///
    /// Kept: capitalized names that are not article-led ("The ...") or generic
    /// nouns, plus any name containing a concrete-noun keyword.
    pub fn filter_quality(&self, objects: Vec<NarrativeObject>) -> Vec<NarrativeObject> {
        let before = objects.len();
        let kept: Vec<_> = objects.into_iter().filter(is_quality_object).collect();
        if kept.len() < before {
            tracing::debug!(dropped = before - kept.len(), "quality filter dropped objects");
        }
        kept
    }

    /// Drop relationships whose target is not one of the given objects.
    ///
    /// Self-references are kept.
    pub fn validate_relationships(&self, mut objects: Vec<NarrativeObject>) -> Vec<NarrativeObject> {
        let names: HashSet<String> = objects.iter().map(|o| o.name.clone()).collect();
        let names: HashSet<&str> = names.iter().map(String::as_str).collect();

        for obj in &mut objects {
            let dropped = obj.retain_targets(&names);
            if dropped > 0 {
                tracing::debug!(object = %obj.name, dropped, "removed dangling relationships");
            }
        }
        objects
    }
}

fn is_quality_object(obj: &NarrativeObject) -> bool {
    let name_lower = obj.name.to_lowercase();
    let description_lower = obj.description.to_lowercase();

    if PLACEHOLDER_NAMES.contains(&name_lower.as_str())
        || PLACEHOLDER_DESCRIPTIONS.contains(&description_lower.as_str())
        || obj.name.trim().chars().count() < MIN_NAME_CHARS
        || obj.description.trim().chars().count() < MIN_DESCRIPTION_CHARS
    {
        return false;
    }

    let is_proper_name = obj.name.chars().next().is_some_and(char::is_uppercase)
        && !name_lower.starts_with("the ")
        && !GENERIC_NAMES.contains(&name_lower.as_str());

    is_proper_name || CONCRETE_NOUNS.iter().any(|word| name_lower.contains(word))
}

fn convert_objects(data: &Value) -> Result<Vec<NarrativeObject>, ParseError> {
    let Some(items) = data.get("objects").and_then(Value::as_array) else {
        return Ok(Vec::new());
    };

    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let name = required_str(item, "name", index)?;
            let description = required_str(item, "description", index)?;

            let relationships = item
                .get("relationships")
                .and_then(Value::as_array)
                .map(|rels| {
                    rels.iter()
                        .map(|rel| {
                            Ok(Relationship::new(
                                required_str(rel, "target", index)?,
                                required_str(rel, "description", index)?,
                            ))
                        })
                        .collect::<Result<Vec<_>, ParseError>>()
                })
                .transpose()?
                .unwrap_or_default();

            Ok(NarrativeObject::new(name, description, relationships))
        })
        .collect()
}

fn required_str<'a>(value: &'a Value, field: &'static str, index: usize) -> Result<&'a str, ParseError> {
    value
        .get(field)
        .and_then(Value::as_str)
        .ok_or(ParseError::MissingField { index, field })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: &str) -> Vec<NarrativeObject> {
        NarrativeParser::new().parse_response(raw).unwrap()
    }

    fn names(objects: &[NarrativeObject]) -> Vec<&str> {
        objects.iter().map(|o| o.name.as_str()).collect()
    }

    #[test]
    fn test_parse_valid_response() {
        let objects = parse(
            r#"```json
{"objects": [
  {"name": "Alice", "description": "A brilliant scientist",
   "relationships": [{"target": "Bob", "description": "works with"}]},
  {"name": "Bob", "description": "A lab assistant"}
]}
```"#,
        );

        assert_eq!(names(&objects), vec!["Alice", "Bob"]);
        assert_eq!(objects[0].description, "A brilliant scientist");
        assert_eq!(objects[0].relationships, vec![Relationship::new("Bob", "works with")]);
        assert!(objects[1].relationships.is_empty());
    }

    #[test]
    fn test_parse_empty_and_placeholder() {
        assert!(parse("   \n").is_empty());
        assert!(parse(r#"{"objects": [{"name": "string", "description": "string"}]}"#).is_empty());
        assert!(parse(r#"{"objects": []}"#).is_empty());
    }

    #[test]
    fn test_parse_invalid_schema_is_sanitized() {
        let objects = parse(r#"{"objects": [{"name": " Castle Rock "}, {"description": "no name"}]}"#);
        assert_eq!(names(&objects), vec!["Castle Rock"]);
        assert_eq!(objects[0].description, "A castle rock mentioned in the text.");
    }

    #[test]
    fn test_parse_falls_back_to_salvage() {
        let objects = parse("{\"objects\": [\n{\"name\": \"alice\",\n\"description\": \"A scientist\",\n");
        // Salvaged objects skip the quality filter.
        assert_eq!(names(&objects), vec!["alice"]);
    }

    #[test]
    fn test_parse_non_object_json() {
        assert!(parse("[1, 2, 3]").is_empty());
        assert!(parse("\"just a string\"").is_empty());
    }

    #[test]
    fn test_quality_filter() {
        let parser = NarrativeParser::new();
        let objects = vec![
            NarrativeObject::new("Alice", "A scientist", Vec::new()),
            NarrativeObject::new("Object", "A real description", Vec::new()),
            NarrativeObject::new("Bob", "string", Vec::new()),
            NarrativeObject::new("X", "A single letter", Vec::new()),
            NarrativeObject::new("Eve", "Spy", Vec::new()),
            NarrativeObject::new("The Tower", "A tall tower", Vec::new()),
            NarrativeObject::new("Person", "Someone unnamed", Vec::new()),
            NarrativeObject::new("old library", "Dusty shelves", Vec::new()),
            NarrativeObject::new("the magic sword", "Glows blue", Vec::new()),
            NarrativeObject::new("a stranger", "Nobody knows him", Vec::new()),
        ];

        let kept = parser.filter_quality(objects);
        assert_eq!(names(&kept), vec!["Alice", "old library", "the magic sword"]);
    }

    #[test]
    fn test_validate_relationships() {
        let parser = NarrativeParser::new();
        let objects = vec![
            NarrativeObject::new("Alice", "A scientist", Vec::new())
                .with_relationship(Relationship::new("Bob", "colleague"))
                .with_relationship(Relationship::new("Alice", "talks to herself"))
                .with_relationship(Relationship::new("Zed", "mentioned once")),
            NarrativeObject::new("Bob", "A pilot", Vec::new()),
        ];

        let objects = parser.validate_relationships(objects);
        let targets: Vec<_> = objects[0].relationships.iter().map(|r| r.target.as_str()).collect();
        assert_eq!(targets, vec!["Bob", "Alice"]);
    }

    #[test]
    fn test_convert_missing_field() {
        let data = serde_json::json!({"objects": [{"name": "Alice"}]});
        assert_eq!(
            convert_objects(&data).unwrap_err(),
            ParseError::MissingField {
                index: 0,
                field: "description"
            }
        );
    }
}
