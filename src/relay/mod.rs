//! Local relay holding the provider credential.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | /health | Health check |
//! | POST | /api/generate | Forward `messages` to the provider (quota enforced) |
//!
//! Callers never see the provider key. Each caller gets a fixed number of
//! requests per rolling window and a 429 with `retry-after` beyond that.
//!
//! # Feature Flag
//!
//! This module is only available when the `relay` feature is enabled.

pub mod config;
mod handlers;
pub mod rate_limit;
pub mod types;
pub mod upstream;

pub use config::{ProviderConfig, RateLimitConfig, RelayConfig};
pub use handlers::{RelayState, MESSAGES_REQUIRED};
pub use rate_limit::{Decision, RateLimiter};
pub use types::{ErrorResponse, HealthResponse, ProviderErrorResponse};
pub use upstream::{OpenAiUpstream, ProviderClient, ProviderFailure};

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// How often idle callers are dropped from the rate limiter.
const PRUNE_INTERVAL_SECS: u64 = 5 * 60;

/// Start the relay.
///
/// Returns the bound address (useful with port 0), a token that shuts the
/// server down gracefully when cancelled, and the serve task. Await the task
/// after cancelling to let in-flight requests finish.
pub async fn start_server(
    config: &RelayConfig,
    provider: Arc<dyn ProviderClient>,
) -> anyhow::Result<(SocketAddr, CancellationToken, JoinHandle<()>)> {
    let (state, shutdown_token) = RelayState::new(&config.rate_limit, provider);

    let app = create_router(state.clone());

    let listener = TcpListener::bind((config.host.as_str(), config.port)).await?;
    let actual_addr = listener.local_addr()?;

    tracing::info!(
        "[relay] Listening on {} (forwarding to {})",
        actual_addr,
        state.provider.description()
    );

    let prune_state = state.clone();
    let prune_shutdown = shutdown_token.clone();
    tokio::spawn(async move {
        let mut interval =
            tokio::time::interval(tokio::time::Duration::from_secs(PRUNE_INTERVAL_SECS));
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let pruned = prune_state.limiter.prune();
                    if pruned > 0 {
                        tracing::debug!("[relay] Pruned {} idle callers", pruned);
                    }
                }
                _ = prune_shutdown.cancelled() => break,
            }
        }
    });

    let server_shutdown = shutdown_token.clone();
    let server = tokio::spawn(async move {
        if let Err(e) = axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(server_shutdown.cancelled_owned())
        .await
        {
            tracing::error!("[relay] Server error: {}", e);
        }
    });

    Ok((actual_addr, shutdown_token, server))
}

/// Create the router with all routes configured.
pub fn create_router(state: Arc<RelayState>) -> Router {
    let limited = Router::new()
        .route("/api/generate", post(handlers::generate))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            handlers::rate_limit,
        ));

    Router::new()
        .route("/health", get(handlers::health))
        .merge(limited)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::wire::ChatMessage;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use parking_lot::Mutex;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    /// Echoes the message count, or fails with the scripted error.
    #[derive(Default)]
    struct StubProvider {
        failure: Option<ProviderFailure>,
        seen: Mutex<Vec<Vec<ChatMessage>>>,
    }

    #[async_trait]
    impl ProviderClient for StubProvider {
        async fn chat_completion(
            &self,
            messages: Vec<ChatMessage>,
        ) -> Result<Value, ProviderFailure> {
            self.seen.lock().push(messages.clone());
            match &self.failure {
                Some(failure) => Err(failure.clone()),
                None => Ok(json!({
                    "id": "chatcmpl-stub",
                    "object": "chat.completion",
                    "choices": [{"index": 0, "message": {"role": "assistant", "content": "ok"}}],
                    "usage": {"total_tokens": messages.len()}
                })),
            }
        }

        fn description(&self) -> String {
            "stub".to_string()
        }
    }

    fn router_with(provider: StubProvider, max_requests: usize) -> (Router, Arc<RelayState>) {
        let config = RateLimitConfig {
            max_requests,
            ..RateLimitConfig::default()
        };
        let (state, _) = RelayState::new(&config, Arc::new(provider));
        (create_router(state.clone()), state)
    }

    fn generate_request(body: &str, forwarded_for: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/generate")
            .header("content-type", "application/json")
            .header("x-forwarded-for", forwarded_for)
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    const VALID: &str = r#"{"messages":[{"role":"user","content":"hi"}]}"#;

    #[tokio::test]
    async fn health_endpoint_works() {
        let (app, _) = router_with(StubProvider::default(), 20);

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn generate_passes_provider_json_through() {
        let (app, _) = router_with(StubProvider::default(), 20);

        let response = app.oneshot(generate_request(VALID, "10.0.0.1")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("ratelimit"));
        let body = body_json(response).await;
        assert_eq!(body["id"], "chatcmpl-stub");
        assert_eq!(body["choices"][0]["message"]["content"], "ok");
    }

    #[tokio::test]
    async fn generate_requires_messages() {
        for body in ["{}", r#"{"messages":[]}"#, "not json", ""] {
            let (app, _) = router_with(StubProvider::default(), 20);
            let response = app.oneshot(generate_request(body, "10.0.0.1")).await.unwrap();

            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body: {}", body);
            assert_eq!(
                body_json(response).await,
                json!({"error": "Messages are required"})
            );
        }
    }

    #[tokio::test]
    async fn generate_rejects_after_quota() {
        let (app, state) = router_with(StubProvider::default(), 2);

        for _ in 0..2 {
            let response = app
                .clone()
                .oneshot(generate_request(VALID, "10.0.0.1"))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }

        let response = app
            .clone()
            .oneshot(generate_request(VALID, "10.0.0.1"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert!(response.headers().contains_key("retry-after"));
        assert_eq!(
            body_json(response).await,
            json!({"error": "Too many requests, please try again later."})
        );

        // Another caller still has its full quota
        let response = app.oneshot(generate_request(VALID, "10.0.0.2")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(state.limiter.tracked_callers(), 2);
    }

    #[tokio::test]
    async fn health_is_not_counted() {
        let (app, state) = router_with(StubProvider::default(), 1);
        for _ in 0..3 {
            let response = app
                .clone()
                .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }
        assert_eq!(state.limiter.tracked_callers(), 0);
    }

    #[tokio::test]
    async fn provider_failure_keeps_status() {
        let provider = StubProvider {
            failure: Some(ProviderFailure {
                status: 401,
                message: "Incorrect API key provided".to_string(),
            }),
            ..StubProvider::default()
        };
        let (app, _) = router_with(provider, 20);

        let response = app.oneshot(generate_request(VALID, "10.0.0.1")).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            body_json(response).await,
            json!({"error": {"message": "Incorrect API key provided"}})
        );
    }

    mod server_tests {
        use super::*;

        #[tokio::test]
        async fn start_server_binds_and_shuts_down() {
            let config = RelayConfig {
                port: 0,
                ..RelayConfig::default()
            };
            let (addr, shutdown, server) =
                start_server(&config, Arc::new(StubProvider::default()))
                    .await
                    .expect("Server should start");

            assert!(addr.port() > 0);
            assert!(!shutdown.is_cancelled());

            shutdown.cancel();
            tokio::time::timeout(std::time::Duration::from_secs(5), server)
                .await
                .expect("Server should stop after cancel")
                .expect("Serve task should not panic");
        }

        #[tokio::test]
        async fn client_talks_to_relay() {
            use crate::ai::{CompletionClient, Endpoint, HttpCompletionClient};
            use std::time::Duration;

            let config = RelayConfig {
                port: 0,
                ..RelayConfig::default()
            };
            let (addr, shutdown, server) =
                start_server(&config, Arc::new(StubProvider::default()))
                    .await
                    .unwrap();

            let client = HttpCompletionClient::new(
                Endpoint::Relay {
                    url: format!("http://{}/api/generate", addr),
                },
                Duration::from_secs(5),
            )
            .unwrap();
            assert_eq!(client.complete("hello").await.unwrap(), "ok");

            drop(client);
            shutdown.cancel();
            server.await.unwrap();
        }
    }
}
