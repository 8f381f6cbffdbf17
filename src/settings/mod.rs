//! Settings record for Lumina.
//!
//! Settings live in the local store under `lumina_settings`, next to the
//! spark list. The record is created with defaults on first read, replaced on
//! save, and never deleted. API keys may be written as `$VAR` references and
//! fall back to environment variables.
//!
//! # Usage
//!
//! ```rust,ignore
//! use lumina::settings::{SettingsManager, get_with_env_fallback};
//!
//! let manager = SettingsManager::load(store).await?;
//! let settings = manager.get().await;
//!
//! let api_key = get_with_env_fallback(
//!     &settings.ai.api_key,
//!     &["OPENAI_API_KEY"],
//!     None,
//! );
//! ```

pub mod loader;
pub mod schema;

pub use loader::{
    get_with_env_fallback, resolve_api_key, resolve_secret, SettingsManager, SETTINGS_KEY,
};
pub use schema::{AiSettings, EndpointMode, Settings};
