//! Minimal text-generation client.
//!
//! This crate provides a focused, non-streaming client for three backends:
//! - Anthropic Messages API
//! - OpenAI Chat Completions API
//! - A local Ollama server (`/api/generate`)
//!
//! Every backend is reduced to the same shape: send one prompt, get back the
//! raw generated text. Failures are classified so callers can tell a dead
//! server from a slow one from a rejected API key.

mod anthropic;
mod ollama;
mod openai;

use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_TEMPERATURE: f32 = 0.1;
const DEFAULT_MAX_TOKENS: usize = 500;

/// Errors that can occur when talking to a text-generation backend.
#[derive(Debug, Clone, Error)]
pub enum Error {
    #[error("API key not configured (set {0})")]
    NoApiKey(&'static str),

    #[error("Failed to connect to {provider} at {url}: {message}")]
    Connection {
        provider: Provider,
        url: String,
        message: String,
    },

    #[error("Request to {provider} timed out after {}s", .timeout.as_secs())]
    Timeout { provider: Provider, timeout: Duration },

    #[error("{provider} authentication failed, check your API key: {message}")]
    Authentication { provider: Provider, message: String },

    #[error("{provider} rate limit exceeded: {message}")]
    RateLimited { provider: Provider, message: String },

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl Error {
    /// Classify a non-success HTTP status.
    pub fn from_status(provider: Provider, status: u16, body: String) -> Self {
        match status {
            401 | 403 => Error::Authentication {
                provider,
                message: body,
            },
            429 => Error::RateLimited {
                provider,
                message: body,
            },
            _ => Error::Api {
                status,
                message: body,
            },
        }
    }

    fn from_reqwest(provider: Provider, url: &str, timeout: Duration, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Error::Timeout { provider, timeout }
        } else if err.is_decode() {
            Error::Parse(err.to_string())
        } else {
            Error::Connection {
                provider,
                url: url.to_string(),
                message: err.to_string(),
            }
        }
    }

    /// Whether retrying the same request later could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Error::Connection { .. } | Error::Timeout { .. } | Error::RateLimited { .. }
        )
    }
}

/// Which backend a [`Client`] talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Provider {
    Anthropic,
    OpenAi,
    #[default]
    Ollama,
}

impl Provider {
    /// Get the display name for this provider.
    pub fn name(&self) -> &'static str {
        match self {
            Provider::Anthropic => "Anthropic",
            Provider::OpenAi => "OpenAI",
            Provider::Ollama => "Ollama",
        }
    }

    /// Model used when none is configured.
    pub fn default_model(&self) -> &'static str {
        match self {
            Provider::Anthropic => "claude-3-5-haiku-20241022",
            Provider::OpenAi => "gpt-3.5-turbo",
            Provider::Ollama => "gemma3:1b",
        }
    }

    /// Base URL used when none is configured.
    pub fn default_base_url(&self) -> &'static str {
        match self {
            Provider::Anthropic => "https://api.anthropic.com/v1",
            Provider::OpenAi => "https://api.openai.com/v1",
            Provider::Ollama => "http://localhost:11434",
        }
    }

    /// Environment variable holding the API key, if this provider needs one.
    pub fn api_key_var(&self) -> Option<&'static str> {
        match self {
            Provider::Anthropic => Some("ANTHROPIC_API_KEY"),
            Provider::OpenAi => Some("OPENAI_API_KEY"),
            Provider::Ollama => None,
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Provider {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "anthropic" | "claude" => Ok(Provider::Anthropic),
            "openai" => Ok(Provider::OpenAi),
            "ollama" => Ok(Provider::Ollama),
            other => Err(Error::Config(format!("unknown provider '{other}'"))),
        }
    }
}

/// A single prompt to send to a backend.
#[derive(Debug, Clone)]
pub struct Prompt {
    pub system: Option<String>,
    pub user: String,
    pub max_tokens: usize,
}

impl Prompt {
    /// Create a prompt with the given user text.
    pub fn new(user: impl Into<String>) -> Self {
        Self {
            system: None,
            user: user.into(),
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

/// Text-generation client.
#[derive(Clone)]
pub struct Client {
    http: reqwest::Client,
    provider: Provider,
    base_url: String,
    api_key: Option<String>,
    model: String,
    temperature: f32,
    timeout: Duration,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("provider", &self.provider)
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Create a client for the given provider with default settings and no API key.
    pub fn new(provider: Provider) -> Self {
        let http = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .unwrap_or_default();

        Self {
            http,
            provider,
            base_url: provider.default_base_url().to_string(),
            api_key: None,
            model: provider.default_model().to_string(),
            temperature: DEFAULT_TEMPERATURE,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Create a client, reading the provider's API key from the environment.
    pub fn from_env(provider: Provider) -> Result<Self, Error> {
        let client = Self::new(provider);
        match provider.api_key_var() {
            Some(var) => {
                let key = std::env::var(var)
                    .ok()
                    .filter(|k| !k.trim().is_empty())
                    .ok_or(Error::NoApiKey(var))?;
                Ok(client.with_api_key(key))
            }
            None => Ok(client),
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature.clamp(0.0, 1.0);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn provider(&self) -> Provider {
        self.provider
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Send a prompt and return the generated text.
    pub async fn complete(&self, prompt: &Prompt) -> Result<String, Error> {
        tracing::debug!(
            provider = %self.provider,
            model = %self.model,
            prompt_chars = prompt.user.len(),
            "sending completion request"
        );

        let text = match self.provider {
            Provider::Anthropic => anthropic::complete(self, prompt).await?,
            Provider::OpenAi => openai::complete(self, prompt).await?,
            Provider::Ollama => ollama::complete(self, prompt).await?,
        };

        tracing::debug!(response_chars = text.len(), "completion received");
        Ok(text)
    }

    /// Check whether the backend is reachable and accepts our credentials.
    pub async fn ping(&self) -> bool {
        let result = match self.provider {
            Provider::Ollama => ollama::ping(self).await,
            Provider::Anthropic | Provider::OpenAi => self
                .complete(&Prompt::new("test").with_max_tokens(1))
                .await
                .map(|_| ()),
        };

        if let Err(e) = &result {
            tracing::warn!(provider = %self.provider, error = %e, "connection test failed");
        }
        result.is_ok()
    }

    fn require_api_key(&self) -> Result<&str, Error> {
        match (self.api_key.as_deref(), self.provider.api_key_var()) {
            (Some(key), _) => Ok(key),
            (None, Some(var)) => Err(Error::NoApiKey(var)),
            (None, None) => Ok(""),
        }
    }

    /// Send a prepared request and turn transport failures and bad statuses into [`Error`].
    async fn send(
        &self,
        url: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, Error> {
        let response = request
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| Error::from_reqwest(self.provider, url, self.timeout, e))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(provider = %self.provider, status, "backend returned an error status");
            return Err(Error::from_status(self.provider, status, body));
        }

        Ok(response)
    }

    async fn decode<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        response: reqwest::Response,
    ) -> Result<T, Error> {
        response
            .json()
            .await
            .map_err(|e| match Error::from_reqwest(self.provider, url, self.timeout, e) {
                Error::Connection { message, .. } => Error::Parse(message),
                other => other,
            })
    }
}
