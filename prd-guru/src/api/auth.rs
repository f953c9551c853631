//! Caller identity.
//!
//! Authentication happens upstream; the fronting proxy forwards the verified
//! user id in [`USER_ID_HEADER`]. Requests without it are rejected.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use super::error::{ApiError, ApiErrorCode};

pub const USER_ID_HEADER: &str = "x-prd-guru-user-id";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser(pub String);

impl AuthenticatedUser {
    pub fn id(&self) -> &str {
        &self.0
    }
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(|id| AuthenticatedUser(id.to_string()))
            .ok_or_else(|| ApiError::new(ApiErrorCode::Unauthorized, "Not authenticated"))
    }
}
