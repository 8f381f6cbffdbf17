//! Settings schema definitions for Lumina.
//!
//! All settings structs use `#[serde(default)]` so a record written by an
//! older version (or by the extension, which has no `ai` section) still loads.
//! Missing fields are filled with defaults.

use serde::{Deserialize, Serialize};

use crate::models::{Language, Persona};

/// Root settings record, stored under `lumina_settings`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    /// Voice used to steer generation
    pub persona: Persona,

    /// Output language for drafts
    pub language: Language,

    /// Show the in-page capture icon
    pub enable_spark_icon: bool,

    /// Domains captures are refused from (subdomains included)
    pub blacklisted_domains: Vec<String>,

    /// Completion endpoint configuration
    pub ai: AiSettings,
}

/// Where completion requests go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndpointMode {
    /// Trusted local relay holding the provider key
    #[default]
    Relay,
    /// Straight to the provider with a locally held key
    Direct,
}

impl std::fmt::Display for EndpointMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EndpointMode::Relay => write!(f, "relay"),
            EndpointMode::Direct => write!(f, "direct"),
        }
    }
}

/// Completion endpoint settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AiSettings {
    pub mode: EndpointMode,

    /// Relay endpoint (relay mode)
    pub relay_url: String,

    /// Provider base URL (direct mode)
    pub base_url: String,

    /// Provider API key (supports $ENV_VAR syntax)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    pub model: String,

    pub temperature: f32,

    pub max_tokens: u32,

    /// Upper bound on a single completion request
    pub timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            persona: Persona::default(),
            language: Language::En,
            enable_spark_icon: true,
            blacklisted_domains: Vec::new(),
            ai: AiSettings::default(),
        }
    }
}

impl Default for AiSettings {
    fn default() -> Self {
        Self {
            mode: EndpointMode::Relay,
            relay_url: "http://localhost:3000/api/generate".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: None,
            model: "gpt-4o-mini".to_string(),
            temperature: 0.8,
            max_tokens: 1000,
            timeout_secs: 60,
        }
    }
}
