//! Completion client abstraction for draft generation.
//!
//! Two endpoints are supported:
//! - the trusted relay, which holds the provider key and only takes `messages`
//! - the provider's chat-completions API directly, with a locally held key
//!
//! Both return the provider's response shape, so reply handling is shared.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;

use super::wire::{
    error_message, ChatCompletionRequest, ChatCompletionResponse, ChatMessage, GenerateRequest,
    GENERIC_FAILURE,
};
use crate::error::{LuminaError, Result};
use crate::settings::{resolve_api_key, AiSettings, EndpointMode};

/// Message used when a 429 carries no body of its own.
pub const QUOTA_MESSAGE: &str = "Too many requests, please try again later.";

/// Trait for completion backends used by the draft generator
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Send one instruction and return the raw completion text
    async fn complete(&self, instruction: &str) -> Result<String>;

    /// Get a description of this backend for logging
    fn description(&self) -> String;
}

/// Where requests go and what they carry.
#[derive(Clone)]
pub enum Endpoint {
    Relay {
        url: String,
    },
    Direct {
        base_url: String,
        api_key: String,
        model: String,
        temperature: f32,
        max_tokens: u32,
    },
}

// Hand-written so the key never reaches logs
impl std::fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Endpoint::Relay { url } => f.debug_struct("Relay").field("url", url).finish(),
            Endpoint::Direct {
                base_url, model, ..
            } => f
                .debug_struct("Direct")
                .field("base_url", base_url)
                .field("model", model)
                .finish_non_exhaustive(),
        }
    }
}

/// Completion client speaking HTTP to the relay or the provider.
pub struct HttpCompletionClient {
    endpoint: Endpoint,
    http: reqwest::Client,
}

impl HttpCompletionClient {
    pub fn new(endpoint: Endpoint, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { endpoint, http })
    }

    /// Build a client from settings.
    ///
    /// Direct mode without a resolvable key fails with
    /// [`LuminaError::MissingCredential`] before any request is made.
    pub fn from_settings(ai: &AiSettings) -> Result<Self> {
        let endpoint = match ai.mode {
            EndpointMode::Relay => Endpoint::Relay {
                url: ai.relay_url.clone(),
            },
            EndpointMode::Direct => Endpoint::Direct {
                base_url: ai.base_url.trim_end_matches('/').to_string(),
                api_key: resolve_api_key(ai).ok_or(LuminaError::MissingCredential)?,
                model: ai.model.clone(),
                temperature: ai.temperature,
                max_tokens: ai.max_tokens,
            },
        };
        Self::new(endpoint, Duration::from_secs(ai.timeout_secs))
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    fn request(&self, instruction: &str) -> reqwest::RequestBuilder {
        let messages = vec![ChatMessage::user(instruction)];
        match &self.endpoint {
            Endpoint::Relay { url } => self.http.post(url).json(&GenerateRequest {
                messages: Some(messages),
            }),
            Endpoint::Direct {
                base_url,
                api_key,
                model,
                temperature,
                max_tokens,
            } => self
                .http
                .post(format!("{}/chat/completions", base_url))
                .bearer_auth(api_key)
                .json(&ChatCompletionRequest {
                    model: model.clone(),
                    messages,
                    temperature: *temperature,
                    max_tokens: *max_tokens,
                }),
        }
    }
}

#[async_trait]
impl CompletionClient for HttpCompletionClient {
    async fn complete(&self, instruction: &str) -> Result<String> {
        tracing::debug!(
            "[completion] Sending {} chars to {}",
            instruction.len(),
            self.description()
        );

        let response = self.request(instruction).send().await?;
        let status = response.status();
        let body = response.text().await?;

        interpret_reply(status, &body)
    }

    fn description(&self) -> String {
        match &self.endpoint {
            Endpoint::Relay { url } => format!("relay ({})", url),
            Endpoint::Direct {
                base_url, model, ..
            } => format!("direct ({}, {})", base_url, model),
        }
    }
}

/// Map an HTTP reply to completion text or a typed error.
fn interpret_reply(status: StatusCode, body: &str) -> Result<String> {
    let json: Option<Value> = serde_json::from_str(body).ok();

    if status == StatusCode::TOO_MANY_REQUESTS {
        let message = json
            .as_ref()
            .and_then(error_message)
            .unwrap_or_else(|| QUOTA_MESSAGE.to_string());
        tracing::warn!("[completion] Quota exceeded: {}", message);
        return Err(LuminaError::QuotaExceeded(message));
    }

    if !status.is_success() {
        let message = json
            .as_ref()
            .and_then(error_message)
            .unwrap_or_else(|| GENERIC_FAILURE.to_string());
        tracing::warn!("[completion] Endpoint returned {}: {}", status, message);
        return Err(LuminaError::Upstream {
            status: status.as_u16(),
            message,
        });
    }

    let reply: ChatCompletionResponse = json
        .and_then(|v| serde_json::from_value(v).ok())
        .ok_or(LuminaError::EmptyCompletion)?;

    reply
        .first_content()
        .map(str::to_string)
        .ok_or(LuminaError::EmptyCompletion)
}

/// Create a completion client from settings
pub fn create_completion_client(ai: &AiSettings) -> Result<Arc<dyn CompletionClient>> {
    let client = HttpCompletionClient::from_settings(ai)?;
    tracing::info!("[completion] Using {}", client.description());
    Ok(Arc::new(client))
}
