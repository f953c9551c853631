//! User Settings API Integration Tests

mod common;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use serde_json::json;

use common::{json_response, request, setup_test_app};

#[tokio::test]
async fn test_settings_start_empty() {
    let test = setup_test_app().await;

    let (status, body) =
        json_response(&test.app, request("GET", "/api/user/settings", Some("alice"), None)).await;

    assert_eq!(status, StatusCode::OK);
    let entries = body.as_array().unwrap();
    assert_eq!(entries.len(), 3);
    assert!(entries.iter().all(|entry| entry["hasApiKey"] == false));
    assert_eq!(entries[1]["provider"], "openai");
}

#[tokio::test]
async fn test_store_key_returns_only_masked_value() {
    let test = setup_test_app().await;
    let api_key = "sk-ant-REDACTED";

    let (status, body) = json_response(
        &test.app,
        request(
            "POST",
            "/api/user/settings",
            Some("alice"),
            Some(json!({ "provider": "anthropic", "apiKey": api_key })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["maskedKey"], "sk-ant-...12345678");

    let (_, body) =
        json_response(&test.app, request("GET", "/api/user/settings", Some("alice"), None)).await;
    assert_eq!(body[0]["provider"], "anthropic");
    assert_eq!(body[0]["hasApiKey"], true);
    assert_eq!(body[0]["maskedKey"], "sk-ant-...12345678");
    assert!(!body.to_string().contains(api_key));
}

#[tokio::test]
async fn test_malformed_key_is_rejected() {
    let test = setup_test_app().await;

    let (status, body) = json_response(
        &test.app,
        request(
            "POST",
            "/api/user/settings",
            Some("alice"),
            Some(json!({ "provider": "openai", "apiKey": "pk-live-123" })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_REQUEST");
    assert_eq!(body["error"]["message"], "Invalid openai API key format");
}

#[tokio::test]
async fn test_delete_key() {
    let test = setup_test_app().await;
    json_response(
        &test.app,
        request(
            "POST",
            "/api/user/settings",
            Some("alice"),
            Some(json!({ "provider": "gemini", "apiKey": "AIzaSyExampleKey" })),
        ),
    )
    .await;

    let (status, _) = json_response(
        &test.app,
        request("DELETE", "/api/user/settings/gemini", Some("alice"), None),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = json_response(
        &test.app,
        request("DELETE", "/api/user/settings/gemini", Some("alice"), None),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = json_response(
        &test.app,
        request("DELETE", "/api/user/settings/mistral", Some("alice"), None),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_REQUEST");
}

#[tokio::test]
async fn test_subscription_status() {
    let test = setup_test_app().await;

    let (status, body) = json_response(
        &test.app,
        request("GET", "/api/user/subscription", Some("alice"), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["isSubscribed"], false);
    assert_eq!(body["status"], "inactive");
    assert!(body["currentPeriodEnd"].is_null());

    test.state
        .store
        .upsert_subscription("alice", "active", Some(Utc::now() + Duration::days(30)))
        .await
        .unwrap();

    let (_, body) = json_response(
        &test.app,
        request("GET", "/api/user/subscription", Some("alice"), None),
    )
    .await;
    assert_eq!(body["isSubscribed"], true);
    assert_eq!(body["status"], "active");
    assert!(body["currentPeriodEnd"].is_string());
}
