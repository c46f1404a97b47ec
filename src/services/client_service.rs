use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::database::models::client::Client;
use crate::database::models::client_note::ClientNote;
use crate::error::ApiError;
use crate::types::ClientStatus;

#[derive(Debug, Default)]
pub struct ClientFilters {
    pub status: Option<String>,
    pub search: Option<String>,
    pub agent_id: Option<Uuid>,
}

fn push_filters(qb: &mut QueryBuilder<Postgres>, scope: Option<Uuid>, filters: &ClientFilters) {
    qb.push(" WHERE deleted_at IS NULL");

    // Role scope wins over any requested agent filter
    if let Some(agent_id) = scope.or(filters.agent_id) {
        qb.push(" AND agent_id = ").push_bind(agent_id);
    }
    if let Some(status) = &filters.status {
        qb.push(" AND status = ").push_bind(status.clone());
    }
    if let Some(search) = &filters.search {
        let pattern = format!("%{}%", search);
        qb.push(" AND (first_name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR last_name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR email ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

pub async fn list_clients(
    pool: &PgPool,
    scope: Option<Uuid>,
    filters: &ClientFilters,
    page: i64,
    limit: i64,
) -> Result<(Vec<Client>, i64), ApiError> {
    if let Some(status) = &filters.status {
        ClientStatus::parse(status)?;
    }

    let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM clients");
    push_filters(&mut qb, scope, filters);
    qb.push(" ORDER BY created_at DESC LIMIT ")
        .push_bind(limit)
        .push(" OFFSET ")
        .push_bind((page - 1) * limit);
    let clients = qb.build_query_as::<Client>().fetch_all(pool).await?;

    let mut count_qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM clients");
    push_filters(&mut count_qb, scope, filters);
    let total: i64 = count_qb.build_query_scalar().fetch_one(pool).await?;

    Ok((clients, total))
}

pub async fn get_client(pool: &PgPool, id: Uuid) -> Result<Client, ApiError> {
    sqlx::query_as::<_, Client>("SELECT * FROM clients WHERE id = $1 AND deleted_at IS NULL")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ApiError::not_found("CLIENT_NOT_FOUND", "Client not found"))
}

#[derive(Debug)]
pub struct NewClient {
    pub agent_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub status: String,
    pub notes: Option<String>,
}

pub async fn create_client(pool: &PgPool, new: NewClient) -> Result<Client, ApiError> {
    ClientStatus::parse(&new.status)?;
    if new.first_name.trim().is_empty() || new.last_name.trim().is_empty() {
        return Err(ApiError::validation_error(
            "Client first and last name are required",
            None,
        ));
    }

    let client = sqlx::query_as::<_, Client>(
        "INSERT INTO clients (id, agent_id, first_name, last_name, email, phone, status, notes,
                              created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, now(), now())
         RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(new.agent_id)
    .bind(&new.first_name)
    .bind(&new.last_name)
    .bind(&new.email)
    .bind(&new.phone)
    .bind(&new.status)
    .bind(&new.notes)
    .fetch_one(pool)
    .await?;

    Ok(client)
}

#[derive(Debug, Default)]
pub struct ClientChanges {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub status: Option<String>,
    pub notes: Option<String>,
}

pub async fn update_client(
    pool: &PgPool,
    id: Uuid,
    changes: ClientChanges,
) -> Result<Client, ApiError> {
    if let Some(status) = &changes.status {
        ClientStatus::parse(status)?;
    }

    let client = sqlx::query_as::<_, Client>(
        "UPDATE clients SET
             first_name = COALESCE($2, first_name),
             last_name = COALESCE($3, last_name),
             email = COALESCE($4, email),
             phone = COALESCE($5, phone),
             status = COALESCE($6, status),
             notes = COALESCE($7, notes),
             updated_at = now()
         WHERE id = $1 AND deleted_at IS NULL
         RETURNING *",
    )
    .bind(id)
    .bind(changes.first_name)
    .bind(changes.last_name)
    .bind(changes.email)
    .bind(changes.phone)
    .bind(changes.status)
    .bind(changes.notes)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| ApiError::not_found("CLIENT_NOT_FOUND", "Client not found"))?;

    Ok(client)
}

pub async fn delete_client(pool: &PgPool, id: Uuid) -> Result<(), ApiError> {
    let result =
        sqlx::query("UPDATE clients SET deleted_at = now(), updated_at = now() WHERE id = $1 AND deleted_at IS NULL")
            .bind(id)
            .execute(pool)
            .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("CLIENT_NOT_FOUND", "Client not found"));
    }
    Ok(())
}

pub async fn list_notes(pool: &PgPool, client_id: Uuid) -> Result<Vec<ClientNote>, ApiError> {
    let notes = sqlx::query_as::<_, ClientNote>(
        "SELECT * FROM client_notes WHERE client_id = $1 ORDER BY created_at DESC",
    )
    .bind(client_id)
    .fetch_all(pool)
    .await?;

    Ok(notes)
}

pub async fn add_note(
    pool: &PgPool,
    client_id: Uuid,
    author_id: Uuid,
    body: &str,
) -> Result<ClientNote, ApiError> {
    if body.trim().is_empty() {
        return Err(ApiError::validation_error("Note body is required", None));
    }

    let note = sqlx::query_as::<_, ClientNote>(
        "INSERT INTO client_notes (id, client_id, author_id, body, created_at)
         VALUES ($1, $2, $3, $4, now())
         RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(client_id)
    .bind(author_id)
    .bind(body)
    .fetch_one(pool)
    .await?;

    Ok(note)
}

/// Client rows created inside a normalized goal window; feeds the client
/// metrics of the goal engine.
pub async fn count_created_in_window(
    pool: &PgPool,
    agent_id: Uuid,
    window_open: DateTime<Utc>,
    window_close: DateTime<Utc>,
) -> Result<i64, ApiError> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM clients
         WHERE agent_id = $1 AND deleted_at IS NULL
           AND created_at >= $2 AND created_at <= $3",
    )
    .bind(agent_id)
    .bind(window_open)
    .bind(window_close)
    .fetch_one(pool)
    .await?;

    Ok(count)
}
