//! HTTP handlers for the relay.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{ConnectInfo, Request, State},
    http::{header::RETRY_AFTER, HeaderMap, HeaderName, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use super::config::RateLimitConfig;
use super::rate_limit::{Decision, RateLimiter};
use super::types::{ErrorResponse, HealthResponse, ProviderErrorResponse};
use super::upstream::ProviderClient;
use crate::ai::llm_client::QUOTA_MESSAGE;
use crate::ai::wire::GenerateRequest;

pub const MESSAGES_REQUIRED: &str = "Messages are required";

/// State shared across all handlers
pub struct RelayState {
    pub limiter: RateLimiter,
    pub provider: Arc<dyn ProviderClient>,
    pub trust_forwarded_for: bool,
    /// Shutdown token for graceful server shutdown
    pub shutdown_token: CancellationToken,
}

impl RelayState {
    pub fn new(
        rate_limit: &RateLimitConfig,
        provider: Arc<dyn ProviderClient>,
    ) -> (Arc<Self>, CancellationToken) {
        let shutdown_token = CancellationToken::new();
        let state = Arc::new(Self {
            limiter: RateLimiter::new(rate_limit),
            provider,
            trust_forwarded_for: rate_limit.trust_forwarded_for,
            shutdown_token: shutdown_token.clone(),
        });
        (state, shutdown_token)
    }
}

/// `GET /health`
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

/// `POST /api/generate`
///
/// Body `{"messages": [...]}`. Model, temperature and token limit are the
/// relay's; the provider's JSON comes back unchanged.
pub async fn generate(
    State(state): State<Arc<RelayState>>,
    body: Bytes,
) -> Result<Json<Value>, Response> {
    let messages = serde_json::from_slice::<GenerateRequest>(&body)
        .ok()
        .and_then(|req| req.messages)
        .filter(|messages| !messages.is_empty());

    let Some(messages) = messages else {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(MESSAGES_REQUIRED)),
        )
            .into_response());
    };

    tracing::debug!("[relay] Forwarding {} messages", messages.len());

    match state.provider.chat_completion(messages).await {
        Ok(completion) => Ok(Json(completion)),
        Err(failure) => {
            tracing::error!("[relay] Provider error ({}): {}", failure.status, failure.message);
            let status =
                StatusCode::from_u16(failure.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            Err((status, Json(ProviderErrorResponse::new(failure.message))).into_response())
        }
    }
}

/// Quota middleware: one count per request, rejected requests get 429.
pub async fn rate_limit(
    State(state): State<Arc<RelayState>>,
    request: Request,
    next: Next,
) -> Response {
    let caller = caller_id(&request, state.trust_forwarded_for);
    let decision = state.limiter.check(&caller);

    if !decision.allowed {
        tracing::warn!("[relay] Quota exceeded for {}", caller);
        let mut response = (
            StatusCode::TOO_MANY_REQUESTS,
            Json(ErrorResponse::new(QUOTA_MESSAGE)),
        )
            .into_response();
        let headers = response.headers_mut();
        headers.insert(RETRY_AFTER, HeaderValue::from(decision.reset.as_secs().max(1)));
        quota_headers(headers, &decision, &state.limiter);
        return response;
    }

    let mut response = next.run(request).await;
    quota_headers(response.headers_mut(), &decision, &state.limiter);
    response
}

/// Identify the caller: peer address, or the first `x-forwarded-for` entry
/// when trusted or when no peer address is known.
fn caller_id(request: &Request, trust_forwarded_for: bool) -> String {
    let forwarded = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string());

    match (trust_forwarded_for, forwarded, peer) {
        (true, Some(forwarded), _) => forwarded.to_string(),
        (_, _, Some(peer)) => peer,
        (_, Some(forwarded), None) => forwarded.to_string(),
        _ => "unknown".to_string(),
    }
}

/// IETF draft-7 `RateLimit` / `RateLimit-Policy` headers.
fn quota_headers(headers: &mut HeaderMap, decision: &Decision, limiter: &RateLimiter) {
    let policy = format!("{};w={}", decision.limit, limiter.window().as_secs());
    let state = format!(
        "limit={}, remaining={}, reset={}",
        decision.limit,
        decision.remaining,
        decision.reset.as_secs()
    );

    if let Ok(value) = HeaderValue::from_str(&policy) {
        headers.insert(HeaderName::from_static("ratelimit-policy"), value);
    }
    if let Ok(value) = HeaderValue::from_str(&state) {
        headers.insert(HeaderName::from_static("ratelimit"), value);
    }
}
