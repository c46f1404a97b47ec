use axum::{
    extract::{Path, Query},
    Extension, Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::database::manager::DatabaseManager;
use crate::database::models::user::User;
use crate::error::ApiError;
use crate::handlers::{page_limit, PageQuery};
use crate::middleware::{ApiResponse, ApiResult, AuthUser, Pagination};
use crate::policy::{self, Action, Resource};
use crate::services::user_service::{self, NewUser, UserChanges};
use crate::types::Role;

/// GET /api/users - List active users (manager only)
pub async fn list(
    Query(query): Query<PageQuery>,
    Extension(auth_user): Extension<AuthUser>,
) -> ApiResult<Vec<User>> {
    policy::authorize(&auth_user, Action::Read, Resource::Users, None)?;

    let pool = DatabaseManager::pool().await?;
    let (page, limit) = page_limit(&query);
    let (users, total) = user_service::list_users(&pool, page, limit).await?;

    Ok(ApiResponse::paginated(users, Pagination::new(page, limit, total)))
}

/// GET /api/users/:id - One user record (managers, or the user themself)
pub async fn get(
    Path(id): Path<Uuid>,
    Extension(auth_user): Extension<AuthUser>,
) -> ApiResult<User> {
    policy::authorize(&auth_user, Action::Read, Resource::Users, Some(id))?;

    let pool = DatabaseManager::pool().await?;
    let user = user_service::get_user(&pool, id).await?;

    Ok(ApiResponse::success(user))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    pub role: String,
    #[serde(alias = "manager_id")]
    pub manager_id: Option<Uuid>,
}

/// POST /api/users - Create a user (manager only)
pub async fn create(
    Extension(auth_user): Extension<AuthUser>,
    Json(payload): Json<CreateUserRequest>,
) -> ApiResult<User> {
    policy::authorize(&auth_user, Action::Create, Resource::Users, None)?;

    let pool = DatabaseManager::pool().await?;
    let user = user_service::create_user(
        &pool,
        NewUser {
            email: payload.email.trim().to_string(),
            password: payload.password,
            name: payload.name,
            role: Role::parse(&payload.role)?,
            manager_id: payload.manager_id,
        },
    )
    .await?;

    Ok(ApiResponse::created(user))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub role: Option<String>,
    #[serde(alias = "is_active")]
    pub is_active: Option<bool>,
    #[serde(alias = "manager_id")]
    pub manager_id: Option<Uuid>,
}

/// PUT /api/users/:id - Update a user
///
/// Non-managers may only rename themselves; role, activation and manager
/// assignment stay manager-only even on the user's own record.
pub async fn update(
    Path(id): Path<Uuid>,
    Extension(auth_user): Extension<AuthUser>,
    Json(payload): Json<UpdateUserRequest>,
) -> ApiResult<User> {
    policy::authorize(&auth_user, Action::Update, Resource::Users, Some(id))?;

    if auth_user.role != Role::Manager
        && (payload.role.is_some() || payload.is_active.is_some() || payload.manager_id.is_some())
    {
        return Err(ApiError::insufficient_permissions(
            "Only managers can change roles or account status",
        ));
    }

    let role = payload.role.as_deref().map(Role::parse).transpose()?;

    let pool = DatabaseManager::pool().await?;
    let user = user_service::update_user(
        &pool,
        id,
        UserChanges {
            name: payload.name,
            role,
            is_active: payload.is_active,
            manager_id: payload.manager_id,
        },
    )
    .await?;

    Ok(ApiResponse::success(user))
}

/// DELETE /api/users/:id - Soft delete a user (manager only)
///
/// Refused with 409 LAST_MANAGER when the target is the only active manager.
pub async fn remove(
    Path(id): Path<Uuid>,
    Extension(auth_user): Extension<AuthUser>,
) -> ApiResult<serde_json::Value> {
    policy::authorize(&auth_user, Action::Delete, Resource::Users, None)?;

    let pool = DatabaseManager::pool().await?;
    user_service::delete_user(&pool, id).await?;

    Ok(ApiResponse::success(serde_json::json!({ "deleted": true })))
}
