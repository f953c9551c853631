//! User provider keys and subscription status.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use shared_types::{ApiKeyStatus, Provider, SetApiKeyRequest, SubscriptionStatus};
use std::sync::Arc;

use super::auth::AuthenticatedUser;
use super::error::{ApiError, ApiResult};
use crate::entitlement::{mask_api_key, validate_api_key};
use crate::store::subscriptions::subscription_status;
use crate::AppState;

/// GET /api/user/settings
///
/// One entry per provider; keys are only ever returned masked.
pub async fn get_settings(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
) -> ApiResult<Json<Vec<ApiKeyStatus>>> {
    let keys = state.store.api_keys(user.id()).await?;
    let statuses = Provider::ALL
        .into_iter()
        .map(|provider| {
            let masked_key = keys.get(&provider).map(|key| mask_api_key(key));
            ApiKeyStatus {
                provider,
                has_api_key: masked_key.is_some(),
                masked_key,
            }
        })
        .collect();
    Ok(Json(statuses))
}

/// POST /api/user/settings
pub async fn set_api_key(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Json(req): Json<SetApiKeyRequest>,
) -> ApiResult<Json<ApiKeyStatus>> {
    validate_api_key(req.provider, &req.api_key).map_err(ApiError::invalid_request)?;
    let api_key = req.api_key.trim();
    state
        .store
        .set_api_key(user.id(), req.provider, api_key)
        .await?;
    tracing::info!(owner = %user.id(), provider = %req.provider, "API key stored");

    Ok(Json(ApiKeyStatus {
        provider: req.provider,
        has_api_key: true,
        masked_key: Some(mask_api_key(api_key)),
    }))
}

/// DELETE /api/user/settings/{provider}
pub async fn delete_api_key(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Path(provider): Path<String>,
) -> ApiResult<StatusCode> {
    let provider: Provider = provider.parse().map_err(ApiError::invalid_request)?;
    if state.store.delete_api_key(user.id(), provider).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found("API key"))
    }
}

/// GET /api/user/subscription
pub async fn get_subscription(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
) -> ApiResult<Json<SubscriptionStatus>> {
    let record = state.store.subscription(user.id()).await?;
    Ok(Json(subscription_status(record.as_ref(), Utc::now())))
}
