use axum::{
    extract::{Path, Query},
    Extension, Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::database::manager::DatabaseManager;
use crate::database::models::team::{Team, TeamMember};
use crate::handlers::{page_limit, PageQuery};
use crate::middleware::{ApiResponse, ApiResult, AuthUser, Pagination};
use crate::policy::{self, Action, Resource};
use crate::services::team_service::{self, NewTeam, TeamChanges};

/// GET /api/teams - Team roster, readable by every role
pub async fn list(
    Query(query): Query<PageQuery>,
    Extension(auth_user): Extension<AuthUser>,
) -> ApiResult<Vec<Team>> {
    policy::authorize(&auth_user, Action::Read, Resource::Teams, None)?;

    let pool = DatabaseManager::pool().await?;
    let (page, limit) = page_limit(&query);
    let (teams, total) = team_service::list_teams(&pool, page, limit).await?;

    Ok(ApiResponse::paginated(teams, Pagination::new(page, limit, total)))
}

/// GET /api/teams/:id
pub async fn get(
    Path(id): Path<Uuid>,
    Extension(auth_user): Extension<AuthUser>,
) -> ApiResult<Team> {
    policy::authorize(&auth_user, Action::Read, Resource::Teams, None)?;

    let pool = DatabaseManager::pool().await?;
    let team = team_service::get_team(&pool, id).await?;

    Ok(ApiResponse::success(team))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTeamRequest {
    pub name: String,
    #[serde(alias = "manager_id")]
    pub manager_id: Option<Uuid>,
    pub description: Option<String>,
}

/// POST /api/teams - Create a team (manager only)
pub async fn create(
    Extension(auth_user): Extension<AuthUser>,
    Json(payload): Json<CreateTeamRequest>,
) -> ApiResult<Team> {
    policy::authorize(&auth_user, Action::Create, Resource::Teams, None)?;

    let pool = DatabaseManager::pool().await?;
    let team = team_service::create_team(
        &pool,
        NewTeam {
            name: payload.name,
            manager_id: payload.manager_id.unwrap_or(auth_user.id),
            description: payload.description,
        },
    )
    .await?;

    Ok(ApiResponse::created(team))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTeamRequest {
    pub name: Option<String>,
    #[serde(alias = "manager_id")]
    pub manager_id: Option<Uuid>,
    pub description: Option<String>,
}

/// PUT /api/teams/:id - Update a team (manager only)
pub async fn update(
    Path(id): Path<Uuid>,
    Extension(auth_user): Extension<AuthUser>,
    Json(payload): Json<UpdateTeamRequest>,
) -> ApiResult<Team> {
    policy::authorize(&auth_user, Action::Update, Resource::Teams, None)?;

    let pool = DatabaseManager::pool().await?;
    let team = team_service::update_team(
        &pool,
        id,
        TeamChanges {
            name: payload.name,
            manager_id: payload.manager_id,
            description: payload.description,
        },
    )
    .await?;

    Ok(ApiResponse::success(team))
}

/// DELETE /api/teams/:id - Soft delete (manager only)
pub async fn remove(
    Path(id): Path<Uuid>,
    Extension(auth_user): Extension<AuthUser>,
) -> ApiResult<serde_json::Value> {
    policy::authorize(&auth_user, Action::Delete, Resource::Teams, None)?;

    let pool = DatabaseManager::pool().await?;
    team_service::delete_team(&pool, id).await?;

    Ok(ApiResponse::success(serde_json::json!({ "deleted": true })))
}

/// GET /api/teams/:id/members
pub async fn list_members(
    Path(id): Path<Uuid>,
    Extension(auth_user): Extension<AuthUser>,
) -> ApiResult<Vec<TeamMember>> {
    policy::authorize(&auth_user, Action::Read, Resource::Teams, None)?;

    let pool = DatabaseManager::pool().await?;
    let members = team_service::list_members(&pool, id).await?;

    Ok(ApiResponse::success(members))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddMemberRequest {
    #[serde(alias = "user_id")]
    pub user_id: Uuid,
}

/// POST /api/teams/:id/members - Add a member (manager only)
pub async fn add_member(
    Path(id): Path<Uuid>,
    Extension(auth_user): Extension<AuthUser>,
    Json(payload): Json<AddMemberRequest>,
) -> ApiResult<TeamMember> {
    policy::authorize(&auth_user, Action::Update, Resource::Teams, None)?;

    let pool = DatabaseManager::pool().await?;
    let member = team_service::add_member(&pool, id, payload.user_id).await?;

    Ok(ApiResponse::created(member))
}

/// DELETE /api/teams/:id/members/:user_id - Remove a member (manager only)
pub async fn remove_member(
    Path((id, user_id)): Path<(Uuid, Uuid)>,
    Extension(auth_user): Extension<AuthUser>,
) -> ApiResult<serde_json::Value> {
    policy::authorize(&auth_user, Action::Update, Resource::Teams, None)?;

    let pool = DatabaseManager::pool().await?;
    team_service::remove_member(&pool, id, user_id).await?;

    Ok(ApiResponse::success(serde_json::json!({ "removed": true })))
}
