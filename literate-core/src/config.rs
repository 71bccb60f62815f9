//! Runtime configuration, from defaults, builder calls or the environment.

use crate::model::{LlmNarrativeModel, DEFAULT_MAX_INPUT_CHARS};
use crate::orchestrator::OrchestratorConfig;
use llm_client::{Client, Provider};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Errors from reading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: '{value}'")]
    InvalidValue { key: &'static str, value: String },

    #[error("Unknown provider '{0}' (expected ollama, openai or anthropic)")]
    UnknownProvider(String),
}

/// Everything needed to build a model, a manager and an orchestrator.
#[derive(Debug, Clone)]
pub struct LiterateConfig {
    pub provider: Provider,
    /// Model name; `None` means the provider's default.
    pub model: Option<String>,
    /// Backend URL; `None` means the provider's default.
    pub base_url: Option<String>,
    pub temperature: f32,
    pub request_timeout: Duration,
    /// Quiet period after the last edit before extraction runs.
    pub debounce: Duration,
    /// Extraction input is cut to this many characters.
    pub max_input_chars: usize,
    /// Where the collection is saved after every change, if anywhere.
    pub save_file: Option<PathBuf>,
    /// Drop objects a new extraction no longer mentions.
    pub remove_missing: bool,
}

impl Default for LiterateConfig {
    fn default() -> Self {
        Self {
            provider: Provider::Ollama,
            model: None,
            base_url: None,
            temperature: 0.1,
            request_timeout: Duration::from_secs(30),
            debounce: Duration::from_millis(3000),
            max_input_chars: DEFAULT_MAX_INPUT_CHARS,
            save_file: None,
            remove_missing: false,
        }
    }
}

impl LiterateConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(provider) = var("LITERATE_PROVIDER") {
            config.provider = provider
                .parse()
                .map_err(|_| ConfigError::UnknownProvider(provider))?;
        }

        config.model = var("LITERATE_MODEL").or_else(|| match config.provider {
            Provider::OpenAi => var("OPENAI_MODEL"),
            _ => None,
        });

        if config.provider == Provider::Ollama {
            config.base_url = var("OLLAMA_BASE_URL");
        }

        let temperature_key = if var("LITERATE_TEMPERATURE").is_some() {
            "LITERATE_TEMPERATURE"
        } else {
            "OPENAI_TEMPERATURE"
        };
        if let Some(value) = var(temperature_key) {
            config.temperature = parse_value(temperature_key, &value)?;
        }

        if let Some(value) = var("LITERATE_TIMEOUT_SECS") {
            config.request_timeout = Duration::from_secs(parse_value("LITERATE_TIMEOUT_SECS", &value)?);
        }
        if let Some(value) = var("LITERATE_DEBOUNCE_MS") {
            config.debounce = Duration::from_millis(parse_value("LITERATE_DEBOUNCE_MS", &value)?);
        }
        if let Some(value) = var("LITERATE_MAX_INPUT_CHARS") {
            config.max_input_chars = parse_value("LITERATE_MAX_INPUT_CHARS", &value)?;
        }
        if let Some(value) = var("LITERATE_REMOVE_MISSING") {
            config.remove_missing = parse_bool("LITERATE_REMOVE_MISSING", &value)?;
        }
        config.save_file = var("LITERATE_SAVE_FILE").map(PathBuf::from);

        Ok(config)
    }

    pub fn with_provider(mut self, provider: Provider) -> Self {
        self.provider = provider;
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn with_save_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.save_file = Some(path.into());
        self
    }

    pub fn with_remove_missing(mut self, remove_missing: bool) -> Self {
        self.remove_missing = remove_missing;
        self
    }

    /// The model name that will actually be used.
    pub fn model_name(&self) -> &str {
        self.model
            .as_deref()
            .unwrap_or_else(|| self.provider.default_model())
    }

    /// Build the text-generation client, reading API keys from the environment.
    pub fn build_client(&self) -> Result<Client, llm_client::Error> {
        let mut client = Client::from_env(self.provider)?
            .with_model(self.model_name())
            .with_temperature(self.temperature)
            .with_timeout(self.request_timeout);
        if let Some(base_url) = &self.base_url {
            client = client.with_base_url(base_url.as_str());
        }
        Ok(client)
    }

    /// Build the model collaborator over a fresh client.
    pub fn build_model(&self) -> Result<LlmNarrativeModel, llm_client::Error> {
        Ok(LlmNarrativeModel::new(self.build_client()?).with_max_input_chars(self.max_input_chars))
    }

    pub fn orchestrator_config(&self) -> OrchestratorConfig {
        OrchestratorConfig::new().with_debounce(self.debounce)
    }
}

fn parse_value<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key,
        value: value.to_string(),
    })
}

fn parse_bool(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key,
            value: value.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_pairs(pairs: &[(&str, &str)]) -> Result<LiterateConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        LiterateConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = from_pairs(&[]).unwrap();
        assert_eq!(config.provider, Provider::Ollama);
        assert_eq!(config.model_name(), "gemma3:1b");
        assert_eq!(config.debounce, Duration::from_secs(3));
        assert_eq!(config.max_input_chars, 2000);
        assert!(!config.remove_missing);
        assert!(config.save_file.is_none());
    }

    #[test]
    fn test_openai_from_env() {
        let config = from_pairs(&[
            ("LITERATE_PROVIDER", "openai"),
            ("OPENAI_MODEL", "gpt-4o-mini"),
            ("OPENAI_TEMPERATURE", "0.3"),
            ("OLLAMA_BASE_URL", "http://ignored:1"),
            ("LITERATE_DEBOUNCE_MS", "500"),
            ("LITERATE_REMOVE_MISSING", "yes"),
            ("LITERATE_SAVE_FILE", "objects.json"),
        ])
        .unwrap();

        assert_eq!(config.provider, Provider::OpenAi);
        assert_eq!(config.model_name(), "gpt-4o-mini");
        assert!((config.temperature - 0.3).abs() < f32::EPSILON);
        assert!(config.base_url.is_none());
        assert_eq!(config.debounce, Duration::from_millis(500));
        assert!(config.remove_missing);
        assert_eq!(config.save_file, Some(PathBuf::from("objects.json")));
    }

    #[test]
    fn test_literate_model_wins() {
        let config = from_pairs(&[
            ("LITERATE_PROVIDER", "openai"),
            ("LITERATE_MODEL", "gpt-4o"),
            ("OPENAI_MODEL", "gpt-4o-mini"),
        ])
        .unwrap();
        assert_eq!(config.model_name(), "gpt-4o");
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            from_pairs(&[("LITERATE_PROVIDER", "bard")]),
            Err(ConfigError::UnknownProvider(p)) if p == "bard"
        ));
        assert!(matches!(
            from_pairs(&[("LITERATE_DEBOUNCE_MS", "soon")]),
            Err(ConfigError::InvalidValue { key: "LITERATE_DEBOUNCE_MS", .. })
        ));
        assert!(matches!(
            from_pairs(&[("LITERATE_REMOVE_MISSING", "maybe")]),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_ollama_client_needs_no_key() {
        let config = LiterateConfig::new().with_base_url("http://gpu-box:11434");
        let client = config.build_client().unwrap();
        assert_eq!(client.base_url(), "http://gpu-box:11434");
        assert_eq!(client.model(), "gemma3:1b");
    }
}
