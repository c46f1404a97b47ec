use axum::Json;
use serde::{Deserialize, Serialize};

use crate::database::manager::DatabaseManager;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::auth_service::{self, LoginOutcome};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// POST /auth/login - Authenticate and receive an access/refresh token pair
///
/// Five consecutive bad passwords lock the account for the configured
/// window; attempts during the window answer 423 ACCOUNT_LOCKED.
pub async fn login(Json(payload): Json<LoginRequest>) -> ApiResult<LoginOutcome> {
    let pool = DatabaseManager::pool().await?;
    let outcome = auth_service::login(&pool, payload.email.trim(), &payload.password).await?;

    tracing::info!(user = %outcome.user.email, "user logged in");
    Ok(ApiResponse::success(outcome))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    #[serde(alias = "refresh_token")]
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshOutcome {
    pub access_token: String,
}

/// POST /auth/refresh - Exchange a refresh token for a new access token
pub async fn refresh(Json(payload): Json<RefreshRequest>) -> ApiResult<RefreshOutcome> {
    let pool = DatabaseManager::pool().await?;
    let access_token = auth_service::refresh(&pool, &payload.refresh_token).await?;

    Ok(ApiResponse::success(RefreshOutcome { access_token }))
}
