//! Settings loading, saving, and environment variable interpolation.
//!
//! The `SettingsManager` handles:
//! - Loading the `lumina_settings` record, falling back to defaults
//! - Dot-notation reads and writes for the CLI
//! - Resolving `$VAR` and `${VAR}` references in the API key

use serde_json::Value;
use tokio::sync::RwLock;

use crate::error::{LuminaError, Result};
use crate::storage::LocalStore;

use super::schema::{AiSettings, Settings};

/// Storage key for the settings record.
pub const SETTINGS_KEY: &str = "lumina_settings";

/// Environment variables consulted when no API key is configured.
const API_KEY_ENV_VARS: &[&str] = &["OPENAI_API_KEY", "LUMINA_API_KEY"];

/// Manages settings loading and persistence.
pub struct SettingsManager {
    /// Cached settings, exactly as stored
    settings: RwLock<Settings>,

    store: LocalStore,
}

impl SettingsManager {
    /// Create a SettingsManager, loading the stored record if present.
    pub async fn load(store: LocalStore) -> Result<Self> {
        let settings = Self::read_record(&store).await?;

        Ok(Self {
            settings: RwLock::new(settings),
            store,
        })
    }

    async fn read_record(store: &LocalStore) -> Result<Settings> {
        match store.read::<Settings>(SETTINGS_KEY).await? {
            Some(settings) => {
                tracing::debug!("Loaded settings record");
                Ok(settings)
            }
            None => {
                tracing::debug!("No settings record, using defaults");
                Ok(Settings::default())
            }
        }
    }

    /// Get the current settings (read-only).
    pub async fn get(&self) -> Settings {
        self.settings.read().await.clone()
    }

    /// Replace the settings record and persist it.
    pub async fn update(&self, new_settings: Settings) -> Result<()> {
        self.store.write(SETTINGS_KEY, &new_settings).await?;
        *self.settings.write().await = new_settings;
        tracing::info!("Saved settings");
        Ok(())
    }

    /// Get a specific setting by dot-notation key (e.g., "persona.role").
    pub async fn get_value(&self, key: &str) -> Result<Value> {
        let settings = self.settings.read().await;
        let json = serde_json::to_value(&*settings)?;

        let mut current = &json;
        for part in key.split('.') {
            current = current
                .get(part)
                .ok_or_else(|| LuminaError::Settings(format!("Setting '{}' not found", key)))?;
        }

        Ok(current.clone())
    }

    /// Set a specific setting by dot-notation key.
    ///
    /// The result must still deserialize into [`Settings`]; a value of the
    /// wrong type is rejected and nothing is written.
    pub async fn set_value(&self, key: &str, value: Value) -> Result<()> {
        let mut json = serde_json::to_value(self.get().await)?;

        let parts: Vec<&str> = key.split('.').collect();
        set_nested_value(&mut json, &parts, value)?;

        let updated: Settings = serde_json::from_value(json)
            .map_err(|e| LuminaError::Settings(format!("Invalid value for '{}': {}", key, e)))?;

        self.update(updated).await
    }

    /// Reset to defaults and persist.
    pub async fn reset(&self) -> Result<()> {
        self.update(Settings::default()).await
    }

    /// Re-read the record, picking up writes made by another process.
    pub async fn reload(&self) -> Result<()> {
        let settings = Self::read_record(&self.store).await?;
        *self.settings.write().await = settings;
        Ok(())
    }
}

/// Set a value in a nested JSON object using a key path.
///
/// Only existing keys can be set, so typos surface as errors instead of being
/// silently dropped by deserialization.
fn set_nested_value(json: &mut Value, parts: &[&str], value: Value) -> Result<()> {
    let Some((last, parents)) = parts.split_last() else {
        return Err(LuminaError::Settings("Empty key path".to_string()));
    };

    let mut current = json;
    for part in parents {
        current = current.get_mut(*part).ok_or_else(|| {
            LuminaError::Settings(format!("Setting path '{}' not found", parts.join(".")))
        })?;
    }

    let Some(obj) = current.as_object_mut() else {
        return Err(LuminaError::Settings(
            "Cannot set value on non-object".to_string(),
        ));
    };
    // Optional fields are skipped when unset, so allow them to be created
    if !obj.contains_key(*last) && !is_optional_field(parts) {
        return Err(LuminaError::Settings(format!(
            "Setting '{}' not found",
            parts.join(".")
        )));
    }
    obj.insert((*last).to_string(), value);
    Ok(())
}

fn is_optional_field(parts: &[&str]) -> bool {
    parts == ["ai", "apiKey"]
}

/// Resolve a $ENV_VAR or ${ENV_VAR} reference.
///
/// Returns `Some(resolved)` if the value starts with `$` and the env var exists.
/// Returns `None` if no env var reference or env var not set.
fn resolve_env_ref(value: &str) -> Option<String> {
    let trimmed = value.trim();

    let var_name = trimmed.strip_prefix('$')?;
    let var_name = var_name
        .strip_prefix('{')
        .and_then(|v| v.strip_suffix('}'))
        .unwrap_or(var_name);

    std::env::var(var_name).ok()
}

/// Get a setting value with environment variable fallback.
///
/// Priority order:
/// 1. Settings value (if set and non-empty)
/// 2. Environment variable (first match from list)
/// 3. Default value
pub fn get_with_env_fallback(
    setting: &Option<String>,
    env_vars: &[&str],
    default: Option<String>,
) -> Option<String> {
    if let Some(v) = setting {
        if !v.is_empty() {
            return Some(v.clone());
        }
    }

    for env_var in env_vars {
        if let Ok(v) = std::env::var(env_var) {
            if !v.is_empty() {
                return Some(v);
            }
        }
    }

    default
}

/// Resolve a secret from configuration, expanding `$VAR` references, then
/// falling back to the given environment variables.
pub fn resolve_secret(configured: Option<&str>, env_vars: &[&str]) -> Option<String> {
    let configured = configured.and_then(|v| {
        if v.trim().starts_with('$') {
            resolve_env_ref(v)
        } else {
            Some(v.to_string())
        }
    });

    get_with_env_fallback(&configured, env_vars, None)
}

/// API key for direct mode: the configured value, then `OPENAI_API_KEY`,
/// then `LUMINA_API_KEY`.
pub fn resolve_api_key(ai: &AiSettings) -> Option<String> {
    resolve_secret(ai.api_key.as_deref(), API_KEY_ENV_VARS)
}
