use axum::extract::{Path, State};
use axum::Json;
use shared_types::{Document, PersistedDocument, SaveDocumentResponse};
use std::sync::Arc;

use super::auth::AuthenticatedUser;
use super::error::ApiResult;
use crate::AppState;

/// GET /api/prds
pub async fn list_documents(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
) -> ApiResult<Json<Vec<PersistedDocument>>> {
    Ok(Json(state.store.list_documents(user.id()).await?))
}

/// GET /api/prds/{id}
pub async fn get_document(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Path(document_id): Path<String>,
) -> ApiResult<Json<PersistedDocument>> {
    Ok(Json(state.store.get_document(user.id(), &document_id).await?))
}

/// POST /api/prds
pub async fn save_document(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Json(document): Json<Document>,
) -> ApiResult<Json<SaveDocumentResponse>> {
    let id = state.store.save_document(user.id(), &document).await?;
    Ok(Json(SaveDocumentResponse { id }))
}
