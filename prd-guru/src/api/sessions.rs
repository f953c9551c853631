//! Session endpoints: the chat loop and draft editing.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use shared_types::{
    CreateSessionResponse, Document, DocumentField, DocumentPreview, LoadDocumentRequest,
    SaveDocumentResponse, SendMessageRequest, SendMessageResponse, SessionSnapshot,
    UpdateFieldRequest,
};
use std::sync::Arc;

use super::auth::AuthenticatedUser;
use super::error::{ApiError, ApiErrorCode, ApiResult};
use crate::conversation::SessionHandle;
use crate::preview;
use crate::AppState;

fn session_for(
    state: &AppState,
    user: &AuthenticatedUser,
    session_id: &str,
) -> ApiResult<Arc<SessionHandle>> {
    state
        .sessions
        .get(user.id(), session_id)
        .ok_or_else(|| ApiError::not_found("Session"))
}

/// POST /api/sessions
pub async fn create_session(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
) -> impl IntoResponse {
    let session = state.sessions.create(user.id());
    (
        StatusCode::CREATED,
        Json(CreateSessionResponse {
            session_id: session.id().to_string(),
        }),
    )
}

/// GET /api/sessions/{id}
pub async fn get_session(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Path(session_id): Path<String>,
) -> ApiResult<Json<SessionSnapshot>> {
    let session = session_for(&state, &user, &session_id)?;
    Ok(Json(session.snapshot().await))
}

/// DELETE /api/sessions/{id}
pub async fn close_session(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Path(session_id): Path<String>,
) -> ApiResult<StatusCode> {
    if state.sessions.remove(user.id(), &session_id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found("Session"))
    }
}

/// POST /api/sessions/{id}/messages
pub async fn send_message(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Path(session_id): Path<String>,
    Json(req): Json<SendMessageRequest>,
) -> ApiResult<Json<SendMessageResponse>> {
    let session = session_for(&state, &user, &session_id)?;
    let response = state.driver.send(&session, &req.message).await?;
    Ok(Json(response))
}

/// POST /api/sessions/{id}/reset
pub async fn reset_session(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Path(session_id): Path<String>,
) -> ApiResult<Json<SessionSnapshot>> {
    let session = session_for(&state, &user, &session_id)?;
    session.lock().await.reset();
    Ok(Json(session.snapshot().await))
}

/// POST /api/sessions/{id}/load
pub async fn load_document(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Path(session_id): Path<String>,
    Json(req): Json<LoadDocumentRequest>,
) -> ApiResult<Json<SessionSnapshot>> {
    let session = session_for(&state, &user, &session_id)?;
    let persisted = state.store.get_document(user.id(), &req.document_id).await?;
    session.lock().await.load(persisted.document);
    Ok(Json(session.snapshot().await))
}

/// PATCH /api/sessions/{id}/document
pub async fn update_field(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Path(session_id): Path<String>,
    Json(req): Json<UpdateFieldRequest>,
) -> ApiResult<Json<Document>> {
    let session = session_for(&state, &user, &session_id)?;
    let field = DocumentField::from_key(&req.field).ok_or_else(|| {
        ApiError::new(
            ApiErrorCode::UnknownField,
            format!("Unknown document field: {}", req.field),
        )
    })?;

    let mut conversation = session.lock().await;
    conversation.update_field(field, req.value);
    Ok(Json(conversation.draft().clone()))
}

/// POST /api/sessions/{id}/save
///
/// The session lock is held across the write so the id lands on the draft
/// that was saved.
pub async fn save_session(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Path(session_id): Path<String>,
) -> ApiResult<Json<SaveDocumentResponse>> {
    let session = session_for(&state, &user, &session_id)?;
    let mut conversation = session.lock().await;
    let id = state.store.save_document(user.id(), conversation.draft()).await?;
    conversation.mark_saved(&id);
    tracing::info!(session_id = %session.id(), document_id = %id, "Draft saved");
    Ok(Json(SaveDocumentResponse { id }))
}

/// GET /api/sessions/{id}/preview
pub async fn preview_session(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Path(session_id): Path<String>,
) -> ApiResult<Json<DocumentPreview>> {
    let session = session_for(&state, &user, &session_id)?;
    let conversation = session.lock().await;
    Ok(Json(preview::render(conversation.draft())))
}
