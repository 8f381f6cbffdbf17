//! Relay configuration.
//!
//! Read from an optional TOML file (`~/.lumina/relay.toml` unless a path is
//! given). The provider key may be a `$VAR` reference and otherwise falls back
//! to `OPENAI_API_KEY` or `VITE_OPENAI_API_KEY`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::settings::resolve_secret;

/// Environment variables consulted for the provider key.
pub const PROVIDER_KEY_ENV_VARS: &[&str] = &["OPENAI_API_KEY", "VITE_OPENAI_API_KEY"];

/// Get the path to the default relay config file.
pub fn relay_config_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".lumina")
        .join("relay.toml")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    pub host: String,
    pub port: u16,
    pub provider: ProviderConfig,
    pub rate_limit: RateLimitConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub base_url: String,
    /// Provider API key (supports $ENV_VAR syntax)
    pub api_key: Option<String>,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_secs: u64,
}

/// Fixed count per rolling window per caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    pub max_requests: usize,
    pub window_secs: u64,
    /// Key callers by the first `x-forwarded-for` entry instead of the peer
    /// address. Only safe behind a proxy that sets the header.
    pub trust_forwarded_for: bool,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            provider: ProviderConfig::default(),
            rate_limit: RateLimitConfig::default(),
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: None,
            model: "gpt-4o-mini".to_string(),
            temperature: 0.8,
            max_tokens: 1000,
            timeout_secs: 60,
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 20,
            window_secs: 60 * 60,
            trust_forwarded_for: false,
        }
    }
}

impl RateLimitConfig {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

impl ProviderConfig {
    /// Configured key with `$VAR` expansion and environment fallback.
    pub fn resolved_api_key(&self) -> Option<String> {
        resolve_secret(self.api_key.as_deref(), PROVIDER_KEY_ENV_VARS)
    }
}

impl RelayConfig {
    /// Load from `path`, or from the default location if it exists.
    ///
    /// An explicit path that does not exist is an error; a missing default
    /// file just means defaults.
    pub async fn load(path: Option<&Path>) -> Result<Self> {
        let (path, required) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (relay_config_path(), false),
        };

        if !required && !path.exists() {
            tracing::debug!("[relay] No config at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let contents = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read relay config {}", path.display()))?;
        let config: RelayConfig =
            toml::from_str(&contents).context("Failed to deserialize relay config")?;

        tracing::info!("[relay] Loaded config from {:?}", path);
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_match_upstream_relay() {
        let config = RelayConfig::default();
        assert_eq!(config.port, 3000);
        assert_eq!(config.rate_limit.max_requests, 20);
        assert_eq!(config.rate_limit.window(), Duration::from_secs(3600));
        assert_eq!(config.provider.model, "gpt-4o-mini");
        assert_eq!(config.provider.max_tokens, 1000);
    }

    #[test]
    fn test_parse_partial_toml() {
        let toml = r#"
            port = 8787

            [rate_limit]
            max_requests = 5
        "#;

        let config: RelayConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.port, 8787);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.rate_limit.max_requests, 5);
        assert_eq!(config.rate_limit.window_secs, 3600);
    }

    #[test]
    fn test_key_reference_resolves() {
        std::env::set_var("LUMINA_RELAY_TEST_KEY", "sk-relay");
        let provider = ProviderConfig {
            api_key: Some("$LUMINA_RELAY_TEST_KEY".to_string()),
            ..ProviderConfig::default()
        };
        assert_eq!(provider.resolved_api_key(), Some("sk-relay".to_string()));
        std::env::remove_var("LUMINA_RELAY_TEST_KEY");
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("relay.toml");
        std::fs::write(&path, "host = \"0.0.0.0\"\n[provider]\nmodel = \"gpt-4o\"\n").unwrap();

        let config = RelayConfig::load(Some(&path)).await.unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.provider.model, "gpt-4o");
    }

    #[tokio::test]
    async fn test_missing_explicit_file_is_error() {
        let dir = TempDir::new().unwrap();
        assert!(RelayConfig::load(Some(&dir.path().join("nope.toml")))
            .await
            .is_err());
    }
}
