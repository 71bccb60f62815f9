//! Cleanup of raw model output before it is parsed.

/// Literal strings that only appear when a model echoes the prompt's example
/// template instead of extracting anything.
pub const PLACEHOLDER_MARKERS: &[&str] = &[
    r#""name": "string""#,
    r#""description": "string""#,
    "ExactNameFromText",
    "Brief description based only on what the text says",
];

const FENCE: &str = "```";

/// Strip one surrounding markdown code fence (with an optional language tag)
/// and trim whitespace.
pub fn clean_response(raw: &str) -> String {
    let mut text = raw.trim();

    if let Some(rest) = text.strip_prefix(FENCE) {
        text = rest.trim_start_matches(|c: char| c.is_ascii_alphabetic());
    }

    if let Some(rest) = text.strip_suffix(FENCE) {
        text = rest;
    }

    text.trim().to_string()
}

/// Whether the text echoes the example template rather than real content.
pub fn is_placeholder_response(text: &str) -> bool {
    PLACEHOLDER_MARKERS.iter().any(|marker| text.contains(marker))
}
