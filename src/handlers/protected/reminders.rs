use axum::{
    extract::{Path, Query},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::database::manager::DatabaseManager;
use crate::database::models::reminder::Reminder;
use crate::handlers::page_limit;
use crate::middleware::{ApiResponse, ApiResult, AuthUser, Pagination};
use crate::policy::{self, Action, Resource};
use crate::services::reminder_service::{self, NewReminder, ReminderChanges, ReminderFilters};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListRemindersQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    #[serde(alias = "is_completed")]
    pub is_completed: Option<bool>,
    #[serde(alias = "due_before")]
    pub due_before: Option<DateTime<Utc>>,
    #[serde(alias = "client_id")]
    pub client_id: Option<Uuid>,
}

/// GET /api/reminders - List reminders; agents see their own only
pub async fn list(
    Query(query): Query<ListRemindersQuery>,
    Extension(auth_user): Extension<AuthUser>,
) -> ApiResult<Vec<Reminder>> {
    let scope = policy::read_scope(&auth_user, Resource::Reminders)?;

    let pool = DatabaseManager::pool().await?;
    let page_query = crate::handlers::PageQuery {
        page: query.page,
        limit: query.limit,
    };
    let (page, limit) = page_limit(&page_query);
    let filters = ReminderFilters {
        is_completed: query.is_completed,
        due_before: query.due_before,
        client_id: query.client_id,
    };
    let (reminders, total) =
        reminder_service::list_reminders(&pool, scope, &filters, page, limit).await?;

    Ok(ApiResponse::paginated(reminders, Pagination::new(page, limit, total)))
}

/// GET /api/reminders/:id
pub async fn get(
    Path(id): Path<Uuid>,
    Extension(auth_user): Extension<AuthUser>,
) -> ApiResult<Reminder> {
    let pool = DatabaseManager::pool().await?;
    let reminder = reminder_service::get_reminder(&pool, id).await?;
    policy::authorize(&auth_user, Action::Read, Resource::Reminders, Some(reminder.agent_id))?;

    Ok(ApiResponse::success(reminder))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReminderRequest {
    #[serde(alias = "agent_id")]
    pub agent_id: Option<Uuid>,
    #[serde(alias = "client_id")]
    pub client_id: Option<Uuid>,
    pub title: String,
    pub description: Option<String>,
    #[serde(alias = "due_at")]
    pub due_at: DateTime<Utc>,
}

/// POST /api/reminders
pub async fn create(
    Extension(auth_user): Extension<AuthUser>,
    Json(payload): Json<CreateReminderRequest>,
) -> ApiResult<Reminder> {
    let agent_id = payload.agent_id.unwrap_or(auth_user.id);
    policy::authorize(&auth_user, Action::Create, Resource::Reminders, Some(agent_id))?;

    let pool = DatabaseManager::pool().await?;
    let reminder = reminder_service::create_reminder(
        &pool,
        NewReminder {
            agent_id,
            client_id: payload.client_id,
            title: payload.title,
            description: payload.description,
            due_at: payload.due_at,
        },
    )
    .await?;

    Ok(ApiResponse::created(reminder))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateReminderRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(alias = "due_at")]
    pub due_at: Option<DateTime<Utc>>,
    #[serde(alias = "is_completed")]
    pub is_completed: Option<bool>,
}

/// PUT /api/reminders/:id
pub async fn update(
    Path(id): Path<Uuid>,
    Extension(auth_user): Extension<AuthUser>,
    Json(payload): Json<UpdateReminderRequest>,
) -> ApiResult<Reminder> {
    let pool = DatabaseManager::pool().await?;
    let existing = reminder_service::get_reminder(&pool, id).await?;
    policy::authorize(&auth_user, Action::Update, Resource::Reminders, Some(existing.agent_id))?;

    let reminder = reminder_service::update_reminder(
        &pool,
        id,
        ReminderChanges {
            title: payload.title,
            description: payload.description,
            due_at: payload.due_at,
            is_completed: payload.is_completed,
        },
    )
    .await?;

    Ok(ApiResponse::success(reminder))
}

/// POST /api/reminders/:id/complete
pub async fn complete(
    Path(id): Path<Uuid>,
    Extension(auth_user): Extension<AuthUser>,
) -> ApiResult<Reminder> {
    let pool = DatabaseManager::pool().await?;
    let existing = reminder_service::get_reminder(&pool, id).await?;
    policy::authorize(&auth_user, Action::Update, Resource::Reminders, Some(existing.agent_id))?;

    let reminder = reminder_service::complete_reminder(&pool, id).await?;
    Ok(ApiResponse::success(reminder))
}

/// DELETE /api/reminders/:id - Soft delete
pub async fn remove(
    Path(id): Path<Uuid>,
    Extension(auth_user): Extension<AuthUser>,
) -> ApiResult<serde_json::Value> {
    let pool = DatabaseManager::pool().await?;
    let existing = reminder_service::get_reminder(&pool, id).await?;
    policy::authorize(&auth_user, Action::Delete, Resource::Reminders, Some(existing.agent_id))?;

    reminder_service::delete_reminder(&pool, id).await?;
    Ok(ApiResponse::success(serde_json::json!({ "deleted": true })))
}
