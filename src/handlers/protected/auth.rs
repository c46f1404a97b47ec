use axum::Extension;

use crate::database::manager::DatabaseManager;
use crate::database::models::user::User;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::user_service;

/// GET /api/auth/whoami - The authenticated user's own record
pub async fn whoami(Extension(auth_user): Extension<AuthUser>) -> ApiResult<User> {
    let pool = DatabaseManager::pool().await?;
    let user = user_service::get_user(&pool, auth_user.id).await?;

    Ok(ApiResponse::success(user))
}
