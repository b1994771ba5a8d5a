//! Provider settings and the persistence seam used by retry remediation.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default maximum diff length, in characters, sent to the model.
pub const DEFAULT_DIFF_LEN: usize = 32768;

fn default_diff_len() -> usize {
    DEFAULT_DIFF_LEN
}

/// One provider entry after merging `config.yml` with `config.local.yml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default)]
    pub base_url: String,
    #[serde(default)]
    pub model: String,
    #[serde(default = "default_diff_len")]
    pub diff_len: usize,
    /// `None` means the provider has not been probed yet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub can_disable_reasoning: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl ProviderConfig {
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            api_key: None,
            base_url: base_url.into(),
            model: model.into(),
            diff_len: DEFAULT_DIFF_LEN,
            can_disable_reasoning: None,
            max_tokens: None,
        }
    }

    /// The API key, if one is set and non-blank.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }

    /// Check the fields a request cannot be made without.
    pub fn ensure_ready(&self) -> Result<(), ConfigError> {
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::MissingBaseUrl(self.name.clone()));
        }
        if self.model.trim().is_empty() {
            return Err(ConfigError::MissingModel(self.name.clone()));
        }
        Ok(())
    }

    /// `{base_url}/{path}` without doubling the slash.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }
}

/// Persistence used by the completion client to remember what a provider
/// accepts. Writes target a single provider entry.
#[cfg_attr(test, mockall::automock)]
pub trait ProviderStore {
    fn set_can_disable_reasoning(&self, provider: &str, value: bool) -> Result<(), ConfigError>;

    fn set_max_tokens(&self, provider: &str, value: u32) -> Result<(), ConfigError>;

    /// Re-read a provider entry, merged with its local overrides.
    fn load_provider(&self, provider: &str) -> Result<ProviderConfig, ConfigError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_minimal_entry_uses_defaults() {
        let cfg: ProviderConfig = serde_yaml::from_str("name: ollama\n").unwrap();
        assert_eq!(cfg.name, "ollama");
        assert_eq!(cfg.diff_len, DEFAULT_DIFF_LEN);
        assert!(cfg.base_url.is_empty());
        assert!(cfg.can_disable_reasoning.is_none());
        assert!(cfg.max_tokens.is_none());
    }

    #[test]
    fn test_deserialize_tri_state_flag() {
        let cfg: ProviderConfig =
            serde_yaml::from_str("name: x\ncan_disable_reasoning: false\nmax_tokens: 4000\n")
                .unwrap();
        assert_eq!(cfg.can_disable_reasoning, Some(false));
        assert_eq!(cfg.max_tokens, Some(4000));
    }

    #[test]
    fn test_api_key_blank_is_none() {
        let mut cfg = ProviderConfig::new("openai", "https://api.openai.com/v1", "gpt-4o-mini");
        assert!(cfg.api_key().is_none());
        cfg.api_key = Some("  ".to_string());
        assert!(cfg.api_key().is_none());
        cfg.api_key = Some("sk-test".to_string());
        assert_eq!(cfg.api_key(), Some("sk-test"));
    }

    #[test]
    fn test_ensure_ready() {
        let cfg = ProviderConfig::new("openai", "https://api.openai.com/v1", "gpt-4o-mini");
        assert!(cfg.ensure_ready().is_ok());

        let no_model = ProviderConfig::new("openai", "https://api.openai.com/v1", "");
        assert!(matches!(
            no_model.ensure_ready(),
            Err(ConfigError::MissingModel(name)) if name == "openai"
        ));

        let no_url = ProviderConfig::new("custom", "", "m");
        assert!(matches!(no_url.ensure_ready(), Err(ConfigError::MissingBaseUrl(_))));
    }

    #[test]
    fn test_endpoint_joins_paths() {
        let cfg = ProviderConfig::new("x", "http://127.0.0.1:8080/v1/", "m");
        assert_eq!(cfg.endpoint("chat/completions"), "http://127.0.0.1:8080/v1/chat/completions");
        let cfg = ProviderConfig::new("x", "http://127.0.0.1:8080/v1", "m");
        assert_eq!(cfg.endpoint("models"), "http://127.0.0.1:8080/v1/models");
    }
}
