//! Shared setup for the HTTP integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::Value;
use shared_types::Provider;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

use prd_guru::api::auth::USER_ID_HEADER;
use prd_guru::config::Config;
use prd_guru::gateway::{CompletionRequest, GatewayError, GatewayRegistry, ModelGateway};
use prd_guru::store::Store;
use prd_guru::AppState;

pub const PLATFORM_KEY: &str = "sk-ant-platform-key-000000";

/// Anthropic stand-in that replays scripted replies and records requests.
#[derive(Default)]
pub struct ScriptedGateway {
    replies: Mutex<VecDeque<Result<String, GatewayError>>>,
    calls: Mutex<Vec<(String, CompletionRequest)>>,
}

impl ScriptedGateway {
    pub fn push_reply(&self, reply: &str) {
        self.replies.lock().unwrap().push_back(Ok(reply.to_string()));
    }

    pub fn push_failure(&self) {
        self.replies.lock().unwrap().push_back(Err(GatewayError::Timeout {
            provider: Provider::Anthropic,
        }));
    }

    /// `(api_key, request)` for every call so far.
    pub fn calls(&self) -> Vec<(String, CompletionRequest)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModelGateway for ScriptedGateway {
    fn provider(&self) -> Provider {
        Provider::Anthropic
    }

    async fn complete(
        &self,
        api_key: &str,
        request: &CompletionRequest,
    ) -> Result<String, GatewayError> {
        self.calls
            .lock()
            .unwrap()
            .push((api_key.to_string(), request.clone()));
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok("Noted.".to_string()))
    }
}

pub struct TestApp {
    pub app: axum::Router,
    pub state: Arc<AppState>,
    pub gateway: Arc<ScriptedGateway>,
    _temp_dir: tempfile::TempDir,
}

pub async fn setup_test_app() -> TestApp {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
    let db_path = temp_dir.path().join("prd-guru-test.db");
    let db_path_str = db_path.to_str().expect("Invalid database path");

    let store = Store::connect(db_path_str)
        .await
        .expect("Failed to open store");

    let mut config = Config {
        database_url: db_path_str.to_string(),
        update_label: "update".to_string(),
        ..Config::default()
    };
    config
        .platform_keys
        .insert(Provider::Anthropic, PLATFORM_KEY.to_string());

    let gateway = Arc::new(ScriptedGateway::default());
    let gateways = GatewayRegistry::new().with_gateway(gateway.clone());
    let state = Arc::new(AppState::new(config, store, gateways));

    TestApp {
        app: prd_guru::app(Arc::clone(&state)),
        state,
        gateway,
        _temp_dir: temp_dir,
    }
}

pub fn request(method: &str, uri: &str, user: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header(USER_ID_HEADER, user);
    }
    match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub async fn json_response(app: &axum::Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(req).await.expect("Request failed");
    let status = response.status();
    let body = response
        .into_body()
        .collect()
        .await
        .expect("Failed to read body")
        .to_bytes();
    let value = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).expect("Invalid JSON response")
    };
    (status, value)
}

pub async fn create_session(app: &axum::Router, user: &str) -> String {
    let (status, body) = json_response(app, request("POST", "/api/sessions", Some(user), None)).await;
    assert_eq!(status, StatusCode::CREATED);
    body["sessionId"].as_str().unwrap().to_string()
}
