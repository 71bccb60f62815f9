//! Anthropic Messages API backend.

use crate::{Client, Error, Prompt};
use serde::{Deserialize, Serialize};

const API_VERSION: &str = "2023-06-01";

#[derive(Debug, Serialize)]
pub(crate) struct ApiRequest<'a> {
    model: &'a str,
    max_tokens: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: Vec<ApiMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ApiMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiResponse {
    content: Vec<ApiContent>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ApiContent {
    Text {
        text: String,
    },
    #[serde(other)]
    Other,
}

pub(crate) fn build_request<'a>(client: &'a Client, prompt: &'a Prompt) -> ApiRequest<'a> {
    ApiRequest {
        model: &client.model,
        max_tokens: prompt.max_tokens,
        system: prompt.system.as_deref(),
        messages: vec![ApiMessage {
            role: "user",
            content: &prompt.user,
        }],
        temperature: client.temperature,
    }
}

pub(crate) fn extract_text(response: ApiResponse) -> String {
    response
        .content
        .into_iter()
        .filter_map(|block| match block {
            ApiContent::Text { text } => Some(text),
            ApiContent::Other => None,
        })
        .collect()
}

pub(crate) async fn complete(client: &Client, prompt: &Prompt) -> Result<String, Error> {
    let api_key = client.require_api_key()?;
    let url = format!("{}/messages", client.base_url);

    let request = client
        .http
        .post(&url)
        .header("x-api-key", api_key)
        .header("anthropic-version", API_VERSION)
        .json(&build_request(client, prompt));

    let response = client.send(&url, request).await?;
    let body: ApiResponse = client.decode(&url, response).await?;
    Ok(extract_text(body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Provider;

    #[test]
    fn test_request_shape() {
        let client = Client::new(Provider::Anthropic).with_model("claude-test");
        let prompt = Prompt::new("Extract this").with_system("You are terse");
        let json = serde_json::to_value(build_request(&client, &prompt)).unwrap();

        assert_eq!(json["model"], "claude-test");
        assert_eq!(json["system"], "You are terse");
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "Extract this");
        assert_eq!(json["max_tokens"], 500);
    }

    #[test]
    fn test_system_omitted_when_absent() {
        let client = Client::new(Provider::Anthropic);
        let prompt = Prompt::new("hi");
        let json = serde_json::to_value(build_request(&client, &prompt)).unwrap();
        assert!(json.get("system").is_none());
    }

    #[test]
    fn test_extract_text_skips_non_text_blocks() {
        let response: ApiResponse = serde_json::from_str(
            r#"{"content": [
                {"type": "text", "text": "{\"objects\": "},
                {"type": "tool_use", "id": "x", "name": "y", "input": {}},
                {"type": "text", "text": "[]}"}
            ]}"#,
        )
        .unwrap();

        assert_eq!(extract_text(response), r#"{"objects": []}"#);
    }
}
