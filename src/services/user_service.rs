use sqlx::PgPool;
use uuid::Uuid;

use crate::auth;
use crate::database::models::user::User;
use crate::error::ApiError;
use crate::types::Role;

/// Look up a live (non-deleted) user by id. Used by the auth middleware on
/// every request, so it stays a single indexed lookup.
pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<User>, ApiError> {
    let user = sqlx::query_as::<_, User>(
        "SELECT * FROM users WHERE id = $1 AND deleted_at IS NULL",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(user)
}

pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, ApiError> {
    let user = sqlx::query_as::<_, User>(
        "SELECT * FROM users WHERE lower(email) = lower($1) AND deleted_at IS NULL",
    )
    .bind(email)
    .fetch_optional(pool)
    .await?;

    Ok(user)
}

pub async fn list_users(
    pool: &PgPool,
    page: i64,
    limit: i64,
) -> Result<(Vec<User>, i64), ApiError> {
    let users = sqlx::query_as::<_, User>(
        "SELECT * FROM users WHERE deleted_at IS NULL
         ORDER BY created_at DESC LIMIT $1 OFFSET $2",
    )
    .bind(limit)
    .bind((page - 1) * limit)
    .fetch_all(pool)
    .await?;

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE deleted_at IS NULL")
        .fetch_one(pool)
        .await?;

    Ok((users, total))
}

pub async fn get_user(pool: &PgPool, id: Uuid) -> Result<User, ApiError> {
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| ApiError::not_found("USER_NOT_FOUND", "User not found"))
}

#[derive(Debug)]
pub struct NewUser {
    pub email: String,
    pub password: String,
    pub name: String,
    pub role: Role,
    pub manager_id: Option<Uuid>,
}

pub async fn create_user(pool: &PgPool, new: NewUser) -> Result<User, ApiError> {
    if !new.email.contains('@') {
        return Err(ApiError::validation_error("Invalid email address", None));
    }
    if new.password.len() < 8 {
        return Err(ApiError::validation_error(
            "Password must be at least 8 characters",
            None,
        ));
    }

    if find_by_email(pool, &new.email).await?.is_some() {
        return Err(ApiError::conflict(
            "EMAIL_TAKEN",
            "A user with this email already exists",
        ));
    }

    let password_hash = auth::hash_password(&new.password)?;

    let user = sqlx::query_as::<_, User>(
        "INSERT INTO users (id, email, password_hash, name, role, is_active, manager_id,
                            failed_login_attempts, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, TRUE, $6, 0, now(), now())
         RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(&new.email)
    .bind(&password_hash)
    .bind(&new.name)
    .bind(new.role.as_str())
    .bind(new.manager_id)
    .fetch_one(pool)
    .await?;

    Ok(user)
}

#[derive(Debug, Default)]
pub struct UserChanges {
    pub name: Option<String>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
    pub manager_id: Option<Uuid>,
}

pub async fn update_user(pool: &PgPool, id: Uuid, changes: UserChanges) -> Result<User, ApiError> {
    let mut tx = pool.begin().await?;

    let current = sqlx::query_as::<_, User>(
        "SELECT * FROM users WHERE id = $1 AND deleted_at IS NULL FOR UPDATE",
    )
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| ApiError::not_found("USER_NOT_FOUND", "User not found"))?;

    // Demoting or deactivating a manager is subject to the same invariant
    // as deletion: at least one active manager must remain.
    let loses_manager_role = current.is_manager()
        && current.is_active
        && (changes.role == Some(Role::Agent) || changes.is_active == Some(false));
    if loses_manager_role {
        let others = count_other_active_managers(&mut tx, id).await?;
        ensure_not_last_manager(true, others)?;
    }

    let user = sqlx::query_as::<_, User>(
        "UPDATE users SET
             name = COALESCE($2, name),
             role = COALESCE($3, role),
             is_active = COALESCE($4, is_active),
             manager_id = COALESCE($5, manager_id),
             updated_at = now()
         WHERE id = $1
         RETURNING *",
    )
    .bind(id)
    .bind(changes.name)
    .bind(changes.role.map(|r| r.as_str()))
    .bind(changes.is_active)
    .bind(changes.manager_id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(user)
}

/// Soft delete: the row stays, `deleted_at` is set, and the account drops
/// out of every active listing and login path.
pub async fn delete_user(pool: &PgPool, id: Uuid) -> Result<(), ApiError> {
    let mut tx = pool.begin().await?;

    let user = sqlx::query_as::<_, User>(
        "SELECT * FROM users WHERE id = $1 AND deleted_at IS NULL FOR UPDATE",
    )
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| ApiError::not_found("USER_NOT_FOUND", "User not found"))?;

    if user.is_manager() && user.is_active {
        let others = count_other_active_managers(&mut tx, id).await?;
        ensure_not_last_manager(true, others)?;
    }

    sqlx::query("UPDATE users SET deleted_at = now(), is_active = FALSE, updated_at = now() WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(())
}

async fn count_other_active_managers(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    excluding: Uuid,
) -> Result<i64, ApiError> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM users
         WHERE role = 'manager' AND is_active = TRUE AND deleted_at IS NULL AND id <> $1",
    )
    .bind(excluding)
    .fetch_one(&mut **tx)
    .await?;

    Ok(count)
}

/// Last-manager-standing invariant: removing (or demoting) an active
/// manager requires at least one other active manager to remain.
pub(crate) fn ensure_not_last_manager(
    target_is_active_manager: bool,
    other_active_managers: i64,
) -> Result<(), ApiError> {
    if target_is_active_manager && other_active_managers == 0 {
        return Err(ApiError::conflict(
            "LAST_MANAGER",
            "Cannot remove the only active manager",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_manager_cannot_be_removed() {
        let err = ensure_not_last_manager(true, 0).unwrap_err();
        assert_eq!(err.error_code(), "LAST_MANAGER");
        assert_eq!(err.status_code(), 409);
    }

    #[test]
    fn non_last_manager_can_be_removed() {
        assert!(ensure_not_last_manager(true, 1).is_ok());
        assert!(ensure_not_last_manager(true, 3).is_ok());
    }

    #[test]
    fn agents_are_never_blocked() {
        assert!(ensure_not_last_manager(false, 0).is_ok());
    }
}
