//! HTTP API routes for PRD Guru.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{delete, get, patch, post};
use axum::{Json, Router};
use serde_json::json;
use std::sync::Arc;

pub mod auth;
pub mod documents;
pub mod error;
pub mod sessions;
pub mod settings;
pub mod websocket;

use crate::AppState;

/// Configure all API routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health_check))
        // Chat sessions
        .route("/api/sessions", post(sessions::create_session))
        .route(
            "/api/sessions/{id}",
            get(sessions::get_session).delete(sessions::close_session),
        )
        .route("/api/sessions/{id}/messages", post(sessions::send_message))
        .route("/api/sessions/{id}/reset", post(sessions::reset_session))
        .route("/api/sessions/{id}/load", post(sessions::load_document))
        .route("/api/sessions/{id}/document", patch(sessions::update_field))
        .route("/api/sessions/{id}/save", post(sessions::save_session))
        .route("/api/sessions/{id}/preview", get(sessions::preview_session))
        .route("/ws/sessions/{id}", get(websocket::session_websocket))
        // Persisted documents
        .route(
            "/api/prds",
            get(documents::list_documents).post(documents::save_document),
        )
        .route("/api/prds/{id}", get(documents::get_document))
        // User settings
        .route(
            "/api/user/settings",
            get(settings::get_settings).post(settings::set_api_key),
        )
        .route(
            "/api/user/settings/{provider}",
            delete(settings::delete_api_key),
        )
        .route("/api/user/subscription", get(settings::get_subscription))
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "prd-guru",
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}
