//! OpenAI Chat Completions backend.

use crate::{Client, Error, Prompt};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub(crate) struct ApiRequest<'a> {
    model: &'a str,
    messages: Vec<ApiMessage<'a>>,
    temperature: f32,
    max_tokens: usize,
}

#[derive(Debug, Serialize)]
struct ApiMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiResponse {
    choices: Vec<ApiChoice>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ApiChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

pub(crate) fn build_request<'a>(client: &'a Client, prompt: &'a Prompt) -> ApiRequest<'a> {
    let mut messages = Vec::with_capacity(2);
    if let Some(system) = prompt.system.as_deref() {
        messages.push(ApiMessage {
            role: "system",
            content: system,
        });
    }
    messages.push(ApiMessage {
        role: "user",
        content: &prompt.user,
    });

    ApiRequest {
        model: &client.model,
        messages,
        temperature: client.temperature,
        max_tokens: prompt.max_tokens,
    }
}

pub(crate) fn extract_text(response: ApiResponse) -> Result<String, Error> {
    response
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content.unwrap_or_default())
        .ok_or_else(|| Error::Parse("response contained no choices".to_string()))
}

pub(crate) async fn complete(client: &Client, prompt: &Prompt) -> Result<String, Error> {
    let api_key = client.require_api_key()?;
    let url = format!("{}/chat/completions", client.base_url);

    let request = client
        .http
        .post(&url)
        .bearer_auth(api_key)
        .json(&build_request(client, prompt));

    let response = client.send(&url, request).await?;
    let body: ApiResponse = client.decode(&url, response).await?;
    extract_text(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Provider;

    #[test]
    fn test_system_message_comes_first() {
        let client = Client::new(Provider::OpenAi);
        let prompt = Prompt::new("text").with_system("rules");
        let json = serde_json::to_value(build_request(&client, &prompt)).unwrap();

        assert_eq!(json["model"], "gpt-3.5-turbo");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][0]["content"], "rules");
        assert_eq!(json["messages"][1]["role"], "user");
    }

    #[test]
    fn test_extract_first_choice() {
        let response: ApiResponse = serde_json::from_str(
            r#"{"choices": [{"message": {"role": "assistant", "content": "hello"}}]}"#,
        )
        .unwrap();
        assert_eq!(extract_text(response).unwrap(), "hello");
    }

    #[test]
    fn test_extract_no_choices() {
        let response: ApiResponse = serde_json::from_str(r#"{"choices": []}"#).unwrap();
        assert!(matches!(extract_text(response), Err(Error::Parse(_))));
    }
}
