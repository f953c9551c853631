//! Model gateway HTTP tests against a local stand-in for the provider APIs.

use axum::extract::Path;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use chrono::Utc;
use serde_json::{json, Value};
use shared_types::{Document, Provider, Turn, TurnRole};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;

use prd_guru::gateway::catalog::{ProviderCatalog, ProviderEntry};
use prd_guru::gateway::{CompletionRequest, GatewayError, GatewayRegistry};

const GOOD_KEY: &str = "test-key";

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

async fn anthropic_messages(headers: HeaderMap, Json(body): Json<Value>) -> impl IntoResponse {
    if header(&headers, "x-api-key") != Some(GOOD_KEY) {
        return (StatusCode::UNAUTHORIZED, Json(json!({"error": "bad key"})));
    }
    if header(&headers, "anthropic-version") != Some("2023-06-01") || body["system"].is_null() {
        return (StatusCode::BAD_REQUEST, Json(json!({"error": "bad request"})));
    }
    let turns = body["messages"].as_array().map(Vec::len).unwrap_or(0);
    (
        StatusCode::OK,
        Json(json!({
            "content": [{"type": "text", "text": format!("claude saw {turns} messages")}]
        })),
    )
}

async fn openai_completions(headers: HeaderMap, Json(body): Json<Value>) -> impl IntoResponse {
    if header(&headers, "authorization") != Some("Bearer test-key") {
        return (StatusCode::UNAUTHORIZED, Json(json!({"error": "bad key"})));
    }
    let first_role = body["messages"][0]["role"].as_str().unwrap_or_default().to_string();
    (
        StatusCode::OK,
        Json(json!({
            "choices": [{"message": {"role": "assistant", "content": format!("gpt first role {first_role}")}}]
        })),
    )
}

async fn gemini_generate(
    Path(rest): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    if header(&headers, "x-goog-api-key") != Some(GOOD_KEY) {
        return (StatusCode::FORBIDDEN, Json(json!({"error": "bad key"})));
    }
    if rest != "gemini-test:generateContent" {
        return (StatusCode::NOT_FOUND, Json(json!({"error": rest})));
    }
    let roles: Vec<String> = body["contents"]
        .as_array()
        .map(|contents| {
            contents
                .iter()
                .filter_map(|c| c["role"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default();
    (
        StatusCode::OK,
        Json(json!({
            "candidates": [{"content": {"parts": [{"text": "gemini roles "}, {"text": roles.join(",")}]}}]
        })),
    )
}

async fn start_mock_provider() -> (SocketAddr, tokio::task::JoinHandle<()>) {
    let app = Router::new()
        .route("/v1/messages", post(anthropic_messages))
        .route("/v1/chat/completions", post(openai_completions))
        .route("/v1beta/models/{*rest}", post(gemini_generate));
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind listener");
    let addr = listener.local_addr().expect("Failed to get addr");
    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Mock server failed");
    });
    (addr, handle)
}

fn registry(addr: SocketAddr) -> GatewayRegistry {
    let entry = |model: &str| ProviderEntry {
        base_url: format!("http://{addr}/"),
        model: model.to_string(),
        max_tokens: 256,
        platform_key_env: None,
    };
    let catalog = ProviderCatalog::default()
        .with_entry(Provider::Anthropic, entry("claude-test"))
        .with_entry(Provider::OpenAi, entry("gpt-test"))
        .with_entry(Provider::Gemini, entry("gemini-test"));
    GatewayRegistry::from_catalog(&catalog, Duration::from_secs(5)).expect("Failed to build client")
}

fn completion_request() -> CompletionRequest {
    let turn = |id, role, content: &str| Turn {
        id,
        role,
        content: content.to_string(),
        created_at: Utc::now(),
    };
    CompletionRequest {
        system_prompt: "You help write PRDs.".to_string(),
        history: vec![
            turn(1, TurnRole::User, "I want a todo app"),
            turn(2, TurnRole::Assistant, "What platforms?"),
        ],
        message: "Web only".to_string(),
        document: Document::default(),
    }
}

#[tokio::test]
async fn test_each_provider_round_trip() {
    let (addr, handle) = start_mock_provider().await;
    let registry = registry(addr);
    let request = completion_request();

    let anthropic = registry.get(Provider::Anthropic).unwrap();
    assert_eq!(
        anthropic.complete(GOOD_KEY, &request).await.unwrap(),
        "claude saw 3 messages"
    );

    let openai = registry.get(Provider::OpenAi).unwrap();
    assert_eq!(
        openai.complete(GOOD_KEY, &request).await.unwrap(),
        "gpt first role system"
    );

    let gemini = registry.get(Provider::Gemini).unwrap();
    assert_eq!(
        gemini.complete(GOOD_KEY, &request).await.unwrap(),
        "gemini roles user,model,user"
    );

    handle.abort();
}

#[tokio::test]
async fn test_rejected_key_is_status_error() {
    let (addr, handle) = start_mock_provider().await;
    let registry = registry(addr);

    let err = registry
        .get(Provider::Anthropic)
        .unwrap()
        .complete("wrong-key", &completion_request())
        .await
        .unwrap_err();

    match err {
        GatewayError::Status { provider, status, body } => {
            assert_eq!(provider, Provider::Anthropic);
            assert_eq!(status, 401);
            assert!(body.contains("bad key"));
        }
        other => panic!("expected status error, got {other:?}"),
    }

    handle.abort();
}

#[tokio::test]
async fn test_unreachable_provider_is_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = registry(addr)
        .get(Provider::OpenAi)
        .unwrap()
        .complete(GOOD_KEY, &completion_request())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        GatewayError::Transport {
            provider: Provider::OpenAi,
            ..
        }
    ));
}
