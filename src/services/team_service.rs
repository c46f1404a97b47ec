use sqlx::PgPool;
use uuid::Uuid;

use crate::database::models::team::{Team, TeamMember};
use crate::error::ApiError;
use crate::services::user_service;

pub async fn list_teams(pool: &PgPool, page: i64, limit: i64) -> Result<(Vec<Team>, i64), ApiError> {
    let teams = sqlx::query_as::<_, Team>(
        "SELECT * FROM teams WHERE deleted_at IS NULL ORDER BY name LIMIT $1 OFFSET $2",
    )
    .bind(limit)
    .bind((page - 1) * limit)
    .fetch_all(pool)
    .await?;

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM teams WHERE deleted_at IS NULL")
        .fetch_one(pool)
        .await?;

    Ok((teams, total))
}

pub async fn get_team(pool: &PgPool, id: Uuid) -> Result<Team, ApiError> {
    sqlx::query_as::<_, Team>("SELECT * FROM teams WHERE id = $1 AND deleted_at IS NULL")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ApiError::not_found("TEAM_NOT_FOUND", "Team not found"))
}

#[derive(Debug)]
pub struct NewTeam {
    pub name: String,
    pub manager_id: Uuid,
    pub description: Option<String>,
}

pub async fn create_team(pool: &PgPool, new: NewTeam) -> Result<Team, ApiError> {
    if new.name.trim().is_empty() {
        return Err(ApiError::validation_error("Team name is required", None));
    }
    user_service::get_user(pool, new.manager_id).await?;

    let team = sqlx::query_as::<_, Team>(
        "INSERT INTO teams (id, name, manager_id, description, created_at, updated_at)
         VALUES ($1, $2, $3, $4, now(), now())
         RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(&new.name)
    .bind(new.manager_id)
    .bind(&new.description)
    .fetch_one(pool)
    .await?;

    Ok(team)
}

#[derive(Debug, Default)]
pub struct TeamChanges {
    pub name: Option<String>,
    pub manager_id: Option<Uuid>,
    pub description: Option<String>,
}

pub async fn update_team(pool: &PgPool, id: Uuid, changes: TeamChanges) -> Result<Team, ApiError> {
    if let Some(manager_id) = changes.manager_id {
        user_service::get_user(pool, manager_id).await?;
    }

    let team = sqlx::query_as::<_, Team>(
        "UPDATE teams SET
             name = COALESCE($2, name),
             manager_id = COALESCE($3, manager_id),
             description = COALESCE($4, description),
             updated_at = now()
         WHERE id = $1 AND deleted_at IS NULL
         RETURNING *",
    )
    .bind(id)
    .bind(changes.name)
    .bind(changes.manager_id)
    .bind(changes.description)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| ApiError::not_found("TEAM_NOT_FOUND", "Team not found"))?;

    Ok(team)
}

pub async fn delete_team(pool: &PgPool, id: Uuid) -> Result<(), ApiError> {
    let result =
        sqlx::query("UPDATE teams SET deleted_at = now(), updated_at = now() WHERE id = $1 AND deleted_at IS NULL")
            .bind(id)
            .execute(pool)
            .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("TEAM_NOT_FOUND", "Team not found"));
    }
    Ok(())
}

pub async fn list_members(pool: &PgPool, team_id: Uuid) -> Result<Vec<TeamMember>, ApiError> {
    get_team(pool, team_id).await?;

    let members = sqlx::query_as::<_, TeamMember>(
        "SELECT * FROM team_members WHERE team_id = $1 ORDER BY joined_at",
    )
    .bind(team_id)
    .fetch_all(pool)
    .await?;

    Ok(members)
}

pub async fn add_member(pool: &PgPool, team_id: Uuid, user_id: Uuid) -> Result<TeamMember, ApiError> {
    get_team(pool, team_id).await?;
    let user = user_service::get_user(pool, user_id).await?;
    if !user.is_active {
        return Err(ApiError::validation_error(
            "Cannot add a disabled user to a team",
            None,
        ));
    }

    let exists: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM team_members WHERE team_id = $1 AND user_id = $2")
            .bind(team_id)
            .bind(user_id)
            .fetch_one(pool)
            .await?;
    if exists > 0 {
        return Err(ApiError::conflict(
            "ALREADY_MEMBER",
            "User is already a member of this team",
        ));
    }

    let member = sqlx::query_as::<_, TeamMember>(
        "INSERT INTO team_members (id, team_id, user_id, joined_at)
         VALUES ($1, $2, $3, now())
         RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(team_id)
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    Ok(member)
}

pub async fn remove_member(pool: &PgPool, team_id: Uuid, user_id: Uuid) -> Result<(), ApiError> {
    let result = sqlx::query("DELETE FROM team_members WHERE team_id = $1 AND user_id = $2")
        .bind(team_id)
        .bind(user_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found(
            "USER_NOT_FOUND",
            "User is not a member of this team",
        ));
    }
    Ok(())
}
