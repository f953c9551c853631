//! Machine-readable API errors: `{"error": {"code", "message"}}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::conversation::SendError;
use crate::store::StoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorCode {
    Unauthorized,
    NotFound,
    InvalidRequest,
    UnknownField,
    SessionBusy,
    StoreError,
    Internal,
}

impl ApiErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiErrorCode::Unauthorized => "UNAUTHORIZED",
            ApiErrorCode::NotFound => "NOT_FOUND",
            ApiErrorCode::InvalidRequest => "INVALID_REQUEST",
            ApiErrorCode::UnknownField => "UNKNOWN_FIELD",
            ApiErrorCode::SessionBusy => "SESSION_BUSY",
            ApiErrorCode::StoreError => "STORE_ERROR",
            ApiErrorCode::Internal => "INTERNAL",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiErrorCode::NotFound => StatusCode::NOT_FOUND,
            ApiErrorCode::InvalidRequest => StatusCode::BAD_REQUEST,
            ApiErrorCode::UnknownField => StatusCode::BAD_REQUEST,
            ApiErrorCode::SessionBusy => StatusCode::CONFLICT,
            ApiErrorCode::StoreError => StatusCode::INTERNAL_SERVER_ERROR,
            ApiErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApiError {
    pub code: ApiErrorCode,
    pub message: String,
}

#[derive(Debug, Serialize)]
struct ApiErrorDetail<'a> {
    code: &'static str,
    message: &'a str,
}

#[derive(Debug, Serialize)]
struct ApiErrorResponse<'a> {
    error: ApiErrorDetail<'a>,
}

impl ApiError {
    pub fn new(code: ApiErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(what: &str) -> Self {
        Self::new(ApiErrorCode::NotFound, format!("{what} not found"))
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ApiErrorCode::InvalidRequest, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ApiErrorResponse {
            error: ApiErrorDetail {
                code: self.code.as_str(),
                message: &self.message,
            },
        });
        (self.code.status_code(), body).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => Self::not_found("Document"),
            StoreError::Database(e) => {
                tracing::error!(error = %e, "Store operation failed");
                Self::new(ApiErrorCode::StoreError, "Failed to access document store")
            }
        }
    }
}

impl From<SendError> for ApiError {
    fn from(err: SendError) -> Self {
        let code = match err {
            SendError::EmptyMessage => ApiErrorCode::InvalidRequest,
            SendError::Busy => ApiErrorCode::SessionBusy,
            SendError::Interrupted => ApiErrorCode::Internal,
        };
        Self::new(code, err.to_string())
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
