use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::database::models::reminder::Reminder;
use crate::error::ApiError;

#[derive(Debug, Default)]
pub struct ReminderFilters {
    pub is_completed: Option<bool>,
    pub due_before: Option<DateTime<Utc>>,
    pub client_id: Option<Uuid>,
}

fn push_filters(qb: &mut QueryBuilder<Postgres>, scope: Option<Uuid>, filters: &ReminderFilters) {
    qb.push(" WHERE deleted_at IS NULL");

    if let Some(agent_id) = scope {
        qb.push(" AND agent_id = ").push_bind(agent_id);
    }
    if let Some(is_completed) = filters.is_completed {
        qb.push(" AND is_completed = ").push_bind(is_completed);
    }
    if let Some(due_before) = filters.due_before {
        qb.push(" AND due_at <= ").push_bind(due_before);
    }
    if let Some(client_id) = filters.client_id {
        qb.push(" AND client_id = ").push_bind(client_id);
    }
}

pub async fn list_reminders(
    pool: &PgPool,
    scope: Option<Uuid>,
    filters: &ReminderFilters,
    page: i64,
    limit: i64,
) -> Result<(Vec<Reminder>, i64), ApiError> {
    let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM reminders");
    push_filters(&mut qb, scope, filters);
    qb.push(" ORDER BY due_at LIMIT ")
        .push_bind(limit)
        .push(" OFFSET ")
        .push_bind((page - 1) * limit);
    let reminders = qb.build_query_as::<Reminder>().fetch_all(pool).await?;

    let mut count_qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM reminders");
    push_filters(&mut count_qb, scope, filters);
    let total: i64 = count_qb.build_query_scalar().fetch_one(pool).await?;

    Ok((reminders, total))
}

pub async fn get_reminder(pool: &PgPool, id: Uuid) -> Result<Reminder, ApiError> {
    sqlx::query_as::<_, Reminder>("SELECT * FROM reminders WHERE id = $1 AND deleted_at IS NULL")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ApiError::not_found("REMINDER_NOT_FOUND", "Reminder not found"))
}

#[derive(Debug)]
pub struct NewReminder {
    pub agent_id: Uuid,
    pub client_id: Option<Uuid>,
    pub title: String,
    pub description: Option<String>,
    pub due_at: DateTime<Utc>,
}

pub async fn create_reminder(pool: &PgPool, new: NewReminder) -> Result<Reminder, ApiError> {
    if new.title.trim().is_empty() {
        return Err(ApiError::validation_error("Reminder title is required", None));
    }

    let reminder = sqlx::query_as::<_, Reminder>(
        "INSERT INTO reminders (id, agent_id, client_id, title, description, due_at,
                                is_completed, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, FALSE, now(), now())
         RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(new.agent_id)
    .bind(new.client_id)
    .bind(&new.title)
    .bind(&new.description)
    .bind(new.due_at)
    .fetch_one(pool)
    .await?;

    Ok(reminder)
}

#[derive(Debug, Default)]
pub struct ReminderChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub due_at: Option<DateTime<Utc>>,
    pub is_completed: Option<bool>,
}

pub async fn update_reminder(
    pool: &PgPool,
    id: Uuid,
    changes: ReminderChanges,
) -> Result<Reminder, ApiError> {
    let reminder = sqlx::query_as::<_, Reminder>(
        "UPDATE reminders SET
             title = COALESCE($2, title),
             description = COALESCE($3, description),
             due_at = COALESCE($4, due_at),
             is_completed = COALESCE($5, is_completed),
             updated_at = now()
         WHERE id = $1 AND deleted_at IS NULL
         RETURNING *",
    )
    .bind(id)
    .bind(changes.title)
    .bind(changes.description)
    .bind(changes.due_at)
    .bind(changes.is_completed)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| ApiError::not_found("REMINDER_NOT_FOUND", "Reminder not found"))?;

    Ok(reminder)
}

pub async fn complete_reminder(pool: &PgPool, id: Uuid) -> Result<Reminder, ApiError> {
    let reminder = sqlx::query_as::<_, Reminder>(
        "UPDATE reminders SET is_completed = TRUE, updated_at = now()
         WHERE id = $1 AND deleted_at IS NULL
         RETURNING *",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| ApiError::not_found("REMINDER_NOT_FOUND", "Reminder not found"))?;

    Ok(reminder)
}

pub async fn delete_reminder(pool: &PgPool, id: Uuid) -> Result<(), ApiError> {
    let result =
        sqlx::query("UPDATE reminders SET deleted_at = now(), updated_at = now() WHERE id = $1 AND deleted_at IS NULL")
            .bind(id)
            .execute(pool)
            .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("REMINDER_NOT_FOUND", "Reminder not found"));
    }
    Ok(())
}
