//! Plain HTTP query endpoint.
//!
//! `GET /api?query=...` runs the query through the chat session of a fixed
//! API user and answers with JSON. Spawned next to the gateway when
//! `[api] enabled = true`.

use crate::gateway::Gateway;
use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::Json,
    routing::get,
    Router,
};
use kora_core::config::ApiConfig;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, error, info};

/// Session and history key shared by every HTTP caller.
pub const API_USER: &str = "api";

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    gateway: Arc<Gateway>,
    api_key: Option<String>,
}

impl ApiState {
    /// An empty `api_key` disables authentication.
    pub fn new(gateway: Arc<Gateway>, api_key: &str) -> Self {
        Self {
            gateway,
            api_key: Some(api_key.to_string()).filter(|k| !k.is_empty()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct AskParams {
    query: Option<String>,
}

/// Constant-time string comparison for token checks.
fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.bytes()
        .zip(b.bytes())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}

/// Check bearer token auth. Returns `None` if authorized.
fn check_auth(headers: &HeaderMap, api_key: Option<&str>) -> Option<(StatusCode, Json<Value>)> {
    let key = api_key?;

    let token = headers
        .get("authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    match token {
        Some(token) if constant_time_eq(token, key) => None,
        Some(_) => Some((
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": "invalid token"})),
        )),
        None => Some((
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": "missing Authorization header"})),
        )),
    }
}

/// `GET /api?query=...`: one chat turn for the API user.
async fn ask(
    headers: HeaderMap,
    State(state): State<ApiState>,
    Query(params): Query<AskParams>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    if let Some(err) = check_auth(&headers, state.api_key.as_deref()) {
        return Err(err);
    }

    let query = params
        .query
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or((
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "No query provided"})),
        ))?;

    debug!("api query ({} chars)", query.chars().count());
    match state.gateway.ask(API_USER, query).await {
        Ok(response) => Ok(Json(json!({ "response": response }))),
        // Details already went to the log and the admin.
        Err(_) => Err((
            StatusCode::BAD_GATEWAY,
            Json(json!({"error": "AI backend unavailable, try again later"})),
        )),
    }
}

pub fn build_router(state: ApiState) -> Router {
    Router::new().route("/api", get(ask)).with_state(state)
}

/// Bind and serve until the task is aborted. Bind failures are logged and
/// leave the gateway running without the API.
pub async fn serve(config: ApiConfig, gateway: Arc<Gateway>) {
    let app = build_router(ApiState::new(gateway, &config.api_key));
    let addr = format!("{}:{}", config.host, config.port);

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            error!("API server failed to bind to {addr}: {e}");
            return;
        }
    };

    info!("API server listening on {addr}");

    if let Err(e) = axum::serve(listener, app).await {
        error!("API server error: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::tests::{harness, Harness, MockChannel, MockProvider};
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use kora_core::{
        error::KoraError,
        turn::{MessageType, Sender},
    };
    use tower::ServiceExt;

    async fn api_harness(provider: MockProvider) -> Harness {
        harness(MockChannel::default(), provider, false).await
    }

    async fn body_json(resp: axum::response::Response) -> Value {
        let body = resp.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_missing_query_is_bad_request() {
        let h = api_harness(MockProvider::default()).await;

        for uri in ["/api", "/api?query=", "/api?query=%20%20"] {
            let app = build_router(ApiState::new(h.gateway.clone(), ""));
            let req = Request::get(uri).body(Body::empty()).unwrap();
            let resp = app.oneshot(req).await.unwrap();
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{uri}");
            assert_eq!(body_json(resp).await["error"], "No query provided");
        }
        assert!(h.provider.contexts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_query_runs_chat_and_records_turns() {
        let h = api_harness(MockProvider::queue(vec![Ok("Paris.".into())])).await;
        let app = build_router(ApiState::new(h.gateway.clone(), ""));

        let req = Request::get("/api?query=capital%20of%20France%3F")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await["response"], "Paris.");

        let contexts = h.provider.contexts.lock().unwrap().clone();
        assert_eq!(contexts[0].current_message, "capital of France?");

        let history = h.store.history(API_USER, 10).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].sender, Sender::User);
        assert_eq!(history[0].message, "capital of France?");
        assert_eq!(history[1].sender, Sender::Bot);
        assert_eq!(history[1].message, "Paris.");
        assert_eq!(history[1].message_type, MessageType::Text);
    }

    #[tokio::test]
    async fn test_backend_failure_is_bad_gateway_without_details() {
        let provider = MockProvider::queue(vec![Err(KoraError::Provider(
            "gemini returned 500: internal".into(),
        ))]);
        let h = api_harness(provider).await;
        let app = build_router(ApiState::new(h.gateway.clone(), ""));

        let req = Request::get("/api?query=hello").body(Body::empty()).unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);

        let json = body_json(resp).await;
        let error = json["error"].as_str().unwrap();
        assert!(!error.contains("gemini"), "{error}");
        assert_eq!(h.notifier.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_api_key_is_enforced() {
        let h = api_harness(MockProvider::default()).await;

        let app = build_router(ApiState::new(h.gateway.clone(), "secret"));
        let req = Request::get("/api?query=hi").body(Body::empty()).unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let app = build_router(ApiState::new(h.gateway.clone(), "secret"));
        let req = Request::get("/api?query=hi")
            .header("Authorization", "Bearer wrong")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let app = build_router(ApiState::new(h.gateway.clone(), "secret"));
        let req = Request::get("/api?query=hi")
            .header("Authorization", "Bearer secret")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await["response"], "default reply");
    }
}
