//! Local Ollama backend.

use crate::{Client, Error, Prompt};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub(crate) struct ApiRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    stream: bool,
    options: ApiOptions,
}

/// Sampling options tuned for short, deterministic JSON output.
#[derive(Debug, Serialize)]
struct ApiOptions {
    temperature: f32,
    top_k: u32,
    top_p: f32,
    repeat_penalty: f32,
    num_predict: usize,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiResponse {
    #[serde(default)]
    response: String,
}

pub(crate) fn build_request<'a>(client: &'a Client, prompt: &'a Prompt) -> ApiRequest<'a> {
    ApiRequest {
        model: &client.model,
        prompt: &prompt.user,
        system: prompt.system.as_deref(),
        stream: false,
        options: ApiOptions {
            temperature: client.temperature,
            top_k: 10,
            top_p: 0.3,
            repeat_penalty: 1.1,
            num_predict: prompt.max_tokens,
        },
    }
}

pub(crate) async fn complete(client: &Client, prompt: &Prompt) -> Result<String, Error> {
    let url = format!("{}/api/generate", client.base_url);
    let request = client.http.post(&url).json(&build_request(client, prompt));

    let response = client.send(&url, request).await?;
    let body: ApiResponse = client.decode(&url, response).await?;
    Ok(body.response)
}

/// Check the server is up by listing installed models.
pub(crate) async fn ping(client: &Client) -> Result<(), Error> {
    let url = format!("{}/api/tags", client.base_url);
    client.send(&url, client.http.get(&url)).await.map(|_| ())
}
