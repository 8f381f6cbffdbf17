//! Provider call made on behalf of relay callers.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use super::config::ProviderConfig;
use crate::ai::wire::{error_message, ChatCompletionRequest, ChatMessage};

/// Message used when the provider gave no reason.
pub const PROVIDER_FAILURE: &str = "An error occurred during generation";

/// Failure forwarded to the caller with the given status.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ProviderFailure {
    pub status: u16,
    pub message: String,
}

impl ProviderFailure {
    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: 500,
            message: message.into(),
        }
    }
}

/// Trait for the provider behind the relay
#[async_trait]
pub trait ProviderClient: Send + Sync {
    /// Run one chat completion and return the provider's JSON unchanged
    async fn chat_completion(&self, messages: Vec<ChatMessage>) -> Result<Value, ProviderFailure>;

    fn description(&self) -> String;
}

/// OpenAI-compatible `/chat/completions` provider.
pub struct OpenAiUpstream {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl OpenAiUpstream {
    pub fn new(config: &ProviderConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        let api_key = config.resolved_api_key();
        if api_key.is_none() {
            tracing::warn!("[relay] No provider key configured, requests will fail");
        }

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }
}

#[async_trait]
impl ProviderClient for OpenAiUpstream {
    async fn chat_completion(&self, messages: Vec<ChatMessage>) -> Result<Value, ProviderFailure> {
        let Some(api_key) = &self.api_key else {
            return Err(ProviderFailure::internal("Provider API key is not configured"));
        };

        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderFailure::internal(format!("Provider unreachable: {}", e)))?;

        let status = response.status();
        let body: Option<Value> = response.json().await.ok();

        if !status.is_success() {
            let message = body
                .as_ref()
                .and_then(error_message)
                .unwrap_or_else(|| PROVIDER_FAILURE.to_string());
            return Err(ProviderFailure {
                status: status.as_u16(),
                message,
            });
        }

        body.ok_or_else(|| ProviderFailure::internal("Provider returned a non-JSON body"))
    }

    fn description(&self) -> String {
        format!("{} ({})", self.base_url, self.model)
    }
}
