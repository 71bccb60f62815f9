//! The text-generation collaborator behind extraction and correction.

use crate::prompts::{correction_prompt, extraction_prompt, SYSTEM_PROMPT};
use async_trait::async_trait;
use llm_client::{Client, Prompt};
use std::borrow::Cow;

/// Default cap on how much text is sent for extraction, in characters.
pub const DEFAULT_MAX_INPUT_CHARS: usize = 2000;

/// Something that can turn text into raw extraction output.
///
/// Implementations return the model's raw text; parsing happens elsewhere.
#[async_trait]
pub trait NarrativeModel: Send + Sync {
    /// Ask for every named object in `text`.
    async fn extract(&self, text: &str) -> Result<String, llm_client::Error>;

    /// Ask for a single corrected version of the object called `name`.
    async fn correct(&self, name: &str, full_text: &str) -> Result<String, llm_client::Error>;
}

/// [`NarrativeModel`] backed by an [`llm_client::Client`].
#[derive(Debug, Clone)]
pub struct LlmNarrativeModel {
    client: Client,
    max_input_chars: usize,
}

impl LlmNarrativeModel {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            max_input_chars: DEFAULT_MAX_INPUT_CHARS,
        }
    }

    pub fn with_max_input_chars(mut self, max_input_chars: usize) -> Self {
        self.max_input_chars = max_input_chars;
        self
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    async fn send(&self, user: String) -> Result<String, llm_client::Error> {
        let prompt = Prompt::new(user).with_system(SYSTEM_PROMPT);
        self.client.complete(&prompt).await
    }
}

#[async_trait]
impl NarrativeModel for LlmNarrativeModel {
    async fn extract(&self, text: &str) -> Result<String, llm_client::Error> {
        if text.trim().is_empty() {
            return Ok(String::new());
        }
        let text = truncate_input(text, self.max_input_chars);
        self.send(extraction_prompt(&text)).await
    }

    async fn correct(&self, name: &str, full_text: &str) -> Result<String, llm_client::Error> {
        if full_text.trim().is_empty() {
            return Ok(String::new());
        }
        self.send(correction_prompt(name, full_text)).await
    }
}

/// Cut `text` to `max_chars` characters, appending `...` if anything was cut.
pub fn truncate_input(text: &str, max_chars: usize) -> Cow<'_, str> {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => Cow::Owned(format!("{}...", &text[..byte_index])),
        None => Cow::Borrowed(text),
    }
}
