use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::database::models::content::Content;
use crate::error::ApiError;
use crate::policy;

const CONTENT_TYPES: [&str; 4] = ["article", "document", "template", "announcement"];

fn validate_content_type(content_type: &str) -> Result<(), ApiError> {
    if CONTENT_TYPES.contains(&content_type) {
        Ok(())
    } else {
        Err(ApiError::validation_error(
            format!("Unknown content type: {}", content_type),
            None,
        ))
    }
}

#[derive(Debug, Default)]
pub struct ContentFilters {
    pub content_type: Option<String>,
    /// "public" or "mine"
    pub visibility: Option<String>,
    pub author_id: Option<Uuid>,
    pub search: Option<String>,
}

fn push_filters(qb: &mut QueryBuilder<Postgres>, requester_id: Uuid, filters: &ContentFilters) {
    // The visibility rule applies to every role, managers included
    qb.push(" WHERE deleted_at IS NULL AND (is_public = TRUE OR author_id = ")
        .push_bind(requester_id)
        .push(")");

    if let Some(content_type) = &filters.content_type {
        qb.push(" AND content_type = ").push_bind(content_type.clone());
    }
    match filters.visibility.as_deref() {
        Some("public") => {
            qb.push(" AND is_public = TRUE");
        }
        Some("mine") => {
            qb.push(" AND author_id = ").push_bind(requester_id);
        }
        _ => {}
    }
    if let Some(author_id) = filters.author_id {
        qb.push(" AND author_id = ").push_bind(author_id);
    }
    if let Some(search) = &filters.search {
        let pattern = format!("%{}%", search);
        qb.push(" AND title ILIKE ").push_bind(pattern);
    }
}

pub async fn list_content(
    pool: &PgPool,
    requester_id: Uuid,
    filters: &ContentFilters,
    page: i64,
    limit: i64,
) -> Result<(Vec<Content>, i64), ApiError> {
    if let Some(content_type) = &filters.content_type {
        validate_content_type(content_type)?;
    }
    if let Some(visibility) = &filters.visibility {
        if visibility != "public" && visibility != "mine" {
            return Err(ApiError::validation_error(
                "visibility must be 'public' or 'mine'",
                None,
            ));
        }
    }

    let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM content");
    push_filters(&mut qb, requester_id, filters);
    qb.push(" ORDER BY created_at DESC LIMIT ")
        .push_bind(limit)
        .push(" OFFSET ")
        .push_bind((page - 1) * limit);
    let rows = qb.build_query_as::<Content>().fetch_all(pool).await?;

    let mut count_qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM content");
    push_filters(&mut count_qb, requester_id, filters);
    let total: i64 = count_qb.build_query_scalar().fetch_one(pool).await?;

    Ok((rows, total))
}

/// Fetch one content row the requester is allowed to see. Invisible private
/// content reads as absent - existence is not leaked.
pub async fn get_content(
    pool: &PgPool,
    requester_id: Uuid,
    id: Uuid,
) -> Result<Content, ApiError> {
    let content =
        sqlx::query_as::<_, Content>("SELECT * FROM content WHERE id = $1 AND deleted_at IS NULL")
            .bind(id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| ApiError::not_found("CONTENT_NOT_FOUND", "Content not found"))?;

    if !policy::content_visible(requester_id, content.author_id, content.is_public) {
        return Err(ApiError::not_found("CONTENT_NOT_FOUND", "Content not found"));
    }

    Ok(content)
}

#[derive(Debug)]
pub struct NewContent {
    pub title: String,
    pub body: String,
    pub content_type: String,
    pub is_public: bool,
}

pub async fn create_content(
    pool: &PgPool,
    author_id: Uuid,
    new: NewContent,
) -> Result<Content, ApiError> {
    validate_content_type(&new.content_type)?;
    if new.title.trim().is_empty() {
        return Err(ApiError::validation_error("Content title is required", None));
    }

    let content = sqlx::query_as::<_, Content>(
        "INSERT INTO content (id, author_id, title, body, content_type, is_public,
                              created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, now(), now())
         RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(author_id)
    .bind(&new.title)
    .bind(&new.body)
    .bind(&new.content_type)
    .bind(new.is_public)
    .fetch_one(pool)
    .await?;

    Ok(content)
}

#[derive(Debug, Default)]
pub struct ContentChanges {
    pub title: Option<String>,
    pub body: Option<String>,
    pub content_type: Option<String>,
    pub is_public: Option<bool>,
}

pub async fn update_content(
    pool: &PgPool,
    id: Uuid,
    changes: ContentChanges,
) -> Result<Content, ApiError> {
    if let Some(content_type) = &changes.content_type {
        validate_content_type(content_type)?;
    }

    let content = sqlx::query_as::<_, Content>(
        "UPDATE content SET
             title = COALESCE($2, title),
             body = COALESCE($3, body),
             content_type = COALESCE($4, content_type),
             is_public = COALESCE($5, is_public),
             updated_at = now()
         WHERE id = $1 AND deleted_at IS NULL
         RETURNING *",
    )
    .bind(id)
    .bind(changes.title)
    .bind(changes.body)
    .bind(changes.content_type)
    .bind(changes.is_public)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| ApiError::not_found("CONTENT_NOT_FOUND", "Content not found"))?;

    Ok(content)
}

pub async fn delete_content(pool: &PgPool, id: Uuid) -> Result<(), ApiError> {
    let result =
        sqlx::query("UPDATE content SET deleted_at = now(), updated_at = now() WHERE id = $1 AND deleted_at IS NULL")
            .bind(id)
            .execute(pool)
            .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("CONTENT_NOT_FOUND", "Content not found"));
    }
    Ok(())
}
