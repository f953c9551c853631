//! PRD Guru: a chat assistant that drafts product requirements documents.

use axum::http::{header, HeaderName, HeaderValue, Method};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod api;
pub mod config;
pub mod conversation;
pub mod entitlement;
pub mod extract;
pub mod gateway;
pub mod preview;
pub mod prompt;
pub mod state;
pub mod store;

pub use state::AppState;

/// The full HTTP application: routes, CORS for the configured UI origins,
/// request tracing.
pub fn app(state: Arc<AppState>) -> Router {
    let allowed_origins = state
        .config
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(origin = %origin, error = %e, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect::<Vec<_>>();

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed_origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::DELETE,
            Method::PATCH,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::AUTHORIZATION,
            HeaderName::from_static(api::auth::USER_ID_HEADER),
        ])
        .max_age(std::time::Duration::from_secs(3600));

    api::router()
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
