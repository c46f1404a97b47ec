use axum::{
    extract::{Path, Query},
    Extension, Json,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use crate::database::manager::DatabaseManager;
use crate::database::models::goal::Goal;
use crate::handlers::page_limit;
use crate::middleware::{ApiResponse, ApiResult, AuthUser, Pagination};
use crate::policy::{self, Action, Resource};
use crate::server::AppState;
use crate::services::goal_service::{self, GoalChanges, GoalFilters, NewGoal};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListGoalsQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    #[serde(alias = "goal_type")]
    pub goal_type: Option<String>,
    #[serde(alias = "metric_type")]
    pub metric_type: Option<String>,
    #[serde(alias = "is_active")]
    pub is_active: Option<bool>,
    #[serde(alias = "agent_id")]
    pub agent_id: Option<Uuid>,
}

/// GET /api/goals - List goals with freshly recomputed progress values
pub async fn list(
    Query(query): Query<ListGoalsQuery>,
    Extension(auth_user): Extension<AuthUser>,
    Extension(state): Extension<AppState>,
) -> ApiResult<Vec<Goal>> {
    let scope = policy::read_scope(&auth_user, Resource::Goals)?;

    let pool = DatabaseManager::pool().await?;
    let page_query = crate::handlers::PageQuery {
        page: query.page,
        limit: query.limit,
    };
    let (page, limit) = page_limit(&page_query);
    let filters = GoalFilters {
        goal_type: query.goal_type,
        metric_type: query.metric_type,
        is_active: query.is_active,
        agent_id: query.agent_id,
    };
    let (goals, total) = goal_service::list_goals(
        &pool,
        state.goal_cache.as_ref(),
        scope,
        &filters,
        page,
        limit,
    )
    .await?;

    Ok(ApiResponse::paginated(goals, Pagination::new(page, limit, total)))
}

/// GET /api/goals/:id - One goal, progress recomputed on read
pub async fn get(
    Path(id): Path<Uuid>,
    Extension(auth_user): Extension<AuthUser>,
    Extension(state): Extension<AppState>,
) -> ApiResult<Goal> {
    let pool = DatabaseManager::pool().await?;
    let existing = goal_service::find_goal(&pool, id).await?;
    policy::authorize(&auth_user, Action::Read, Resource::Goals, Some(existing.agent_id))?;

    let goal = goal_service::get_goal(&pool, state.goal_cache.as_ref(), id).await?;
    Ok(ApiResponse::success(goal))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGoalRequest {
    #[serde(alias = "agent_id")]
    pub agent_id: Option<Uuid>,
    pub title: String,
    #[serde(alias = "goal_type")]
    pub goal_type: String,
    #[serde(alias = "metric_type")]
    pub metric_type: String,
    #[serde(alias = "target_value")]
    pub target_value: Decimal,
    #[serde(alias = "start_date")]
    pub start_date: NaiveDate,
    #[serde(alias = "end_date")]
    pub end_date: NaiveDate,
    pub notes: Option<String>,
}

/// POST /api/goals - Create a goal
///
/// Occurrence metrics (sales_count, policies_sold, new_clients) start at
/// zero; the value metrics seed from matching rows already in the window.
pub async fn create(
    Extension(auth_user): Extension<AuthUser>,
    Extension(state): Extension<AppState>,
    Json(payload): Json<CreateGoalRequest>,
) -> ApiResult<Goal> {
    let agent_id = payload.agent_id.unwrap_or(auth_user.id);
    policy::authorize(&auth_user, Action::Create, Resource::Goals, Some(agent_id))?;

    let pool = DatabaseManager::pool().await?;
    let goal = goal_service::create_goal(
        &pool,
        state.goal_cache.as_ref(),
        NewGoal {
            agent_id,
            title: payload.title,
            goal_type: payload.goal_type,
            metric_type: payload.metric_type,
            target_value: payload.target_value,
            start_date: payload.start_date,
            end_date: payload.end_date,
            notes: payload.notes,
        },
    )
    .await?;

    Ok(ApiResponse::created(goal))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateGoalRequest {
    pub title: Option<String>,
    #[serde(alias = "goal_type")]
    pub goal_type: Option<String>,
    #[serde(alias = "target_value")]
    pub target_value: Option<Decimal>,
    #[serde(alias = "start_date")]
    pub start_date: Option<NaiveDate>,
    #[serde(alias = "end_date")]
    pub end_date: Option<NaiveDate>,
    #[serde(alias = "is_active")]
    pub is_active: Option<bool>,
    pub notes: Option<String>,
}

/// PUT /api/goals/:id - Update a goal; progress is recomputed afterwards
pub async fn update(
    Path(id): Path<Uuid>,
    Extension(auth_user): Extension<AuthUser>,
    Extension(state): Extension<AppState>,
    Json(payload): Json<UpdateGoalRequest>,
) -> ApiResult<Goal> {
    let pool = DatabaseManager::pool().await?;
    let existing = goal_service::find_goal(&pool, id).await?;
    policy::authorize(&auth_user, Action::Update, Resource::Goals, Some(existing.agent_id))?;

    let goal = goal_service::update_goal(
        &pool,
        state.goal_cache.as_ref(),
        id,
        GoalChanges {
            title: payload.title,
            goal_type: payload.goal_type,
            target_value: payload.target_value,
            start_date: payload.start_date,
            end_date: payload.end_date,
            is_active: payload.is_active,
            notes: payload.notes,
        },
    )
    .await?;

    Ok(ApiResponse::success(goal))
}

/// DELETE /api/goals/:id - Soft delete
pub async fn remove(
    Path(id): Path<Uuid>,
    Extension(auth_user): Extension<AuthUser>,
    Extension(state): Extension<AppState>,
) -> ApiResult<serde_json::Value> {
    let pool = DatabaseManager::pool().await?;
    let existing = goal_service::find_goal(&pool, id).await?;
    policy::authorize(&auth_user, Action::Delete, Resource::Goals, Some(existing.agent_id))?;

    goal_service::delete_goal(&pool, state.goal_cache.as_ref(), id).await?;
    Ok(ApiResponse::success(serde_json::json!({ "deleted": true })))
}

/// POST /api/goals/:id/recalculate - Recompute progress from source rows
pub async fn recalculate(
    Path(id): Path<Uuid>,
    Extension(auth_user): Extension<AuthUser>,
    Extension(state): Extension<AppState>,
) -> ApiResult<Goal> {
    let pool = DatabaseManager::pool().await?;
    let existing = goal_service::find_goal(&pool, id).await?;
    policy::authorize(&auth_user, Action::Update, Resource::Goals, Some(existing.agent_id))?;

    let goal = goal_service::recalculate(&pool, state.goal_cache.as_ref(), id).await?;
    Ok(ApiResponse::success(goal))
}

/// POST /api/goals/sync-all - Recompute every active goal (manager only)
pub async fn sync_all(
    Extension(auth_user): Extension<AuthUser>,
    Extension(state): Extension<AppState>,
) -> ApiResult<serde_json::Value> {
    policy::authorize(&auth_user, Action::Update, Resource::Goals, None)?;

    let pool = DatabaseManager::pool().await?;
    let synced = goal_service::sync_all(&pool, state.goal_cache.as_ref()).await?;

    Ok(ApiResponse::success(serde_json::json!({ "synced": synced })))
}
