//! Prompt builders for extraction and correction requests.

/// System prompt shared by both request kinds.
pub const SYSTEM_PROMPT: &str =
    "You extract named people, places, things and events from fiction. Reply with JSON only.";

/// Build the prompt asking for every named object in `text`.
pub fn extraction_prompt(text: &str) -> String {
    format!(
        r#"Extract narrative objects ONLY from this text. Do not add any objects not explicitly mentioned.

Text: "{text}"

Return valid JSON with this structure:
{{
  "objects": [
    {{
      "name": "string",
      "description": "string",
      "relationships": [{{"target": "string", "description": "string"}}]
    }}
  ]
}}

Rules:
- Only extract entities that have a specific name in the text
- Skip unnamed people and things ("the detective", "a woman", "someone")
- Never invent names and never use generic names like "person" or "object"
- Use names exactly as written in the text
- Descriptions state only facts found in the text
- Relationship targets must be names of other extracted objects

Return only the JSON:"#
    )
}

/// Build the prompt asking for a single corrected version of `name`.
pub fn correction_prompt(name: &str, full_text: &str) -> String {
    format!(
        r#"The narrative object "{name}" extracted from this text needs correction.

Original text: "{full_text}"

"{name}" is wrong, incomplete or inaccurate. Provide ONE corrected object that
better represents what the text says.

Return ONLY valid JSON with exactly one object:
{{
  "objects": [
    {{
      "name": "CorrectedName",
      "description": "Accurate description taken from the text",
      "relationships": []
    }}
  ]
}}

Rules:
- Exactly one object
- Use a more accurate name if the original was wrong
- Only include relationships the text clearly states

JSON response:"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::sanitize::is_placeholder_response;

    #[test]
    fn test_extraction_prompt_embeds_text() {
        let prompt = extraction_prompt("Alice met Bob.");
        assert!(prompt.contains(r#"Text: "Alice met Bob.""#));
        // A model echoing the template back is recognised as a placeholder.
        assert!(is_placeholder_response(&prompt));
    }

    #[test]
    fn test_correction_prompt_names_object() {
        let prompt = correction_prompt("Alise", "Alice met Bob.");
        assert!(prompt.contains(r#"The narrative object "Alise""#));
        assert!(prompt.contains("Alice met Bob."));
    }
}
