use axum::{
    extract::{Path, Query},
    Extension, Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::database::manager::DatabaseManager;
use crate::database::models::content::Content;
use crate::handlers::page_limit;
use crate::middleware::{ApiResponse, ApiResult, AuthUser, Pagination};
use crate::policy::{self, Action, Resource};
use crate::services::content_service::{self, ContentChanges, ContentFilters, NewContent};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListContentQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    #[serde(alias = "content_type", alias = "type")]
    pub content_type: Option<String>,
    pub visibility: Option<String>,
    #[serde(alias = "author_id")]
    pub author_id: Option<Uuid>,
    pub search: Option<String>,
}

/// GET /api/content - List content visible to the requester
///
/// Visibility is public-or-mine for every role; a manager never receives
/// another author's private rows.
pub async fn list(
    Query(query): Query<ListContentQuery>,
    Extension(auth_user): Extension<AuthUser>,
) -> ApiResult<Vec<Content>> {
    policy::authorize(&auth_user, Action::Read, Resource::Content, Some(auth_user.id))?;

    let pool = DatabaseManager::pool().await?;
    let page_query = crate::handlers::PageQuery {
        page: query.page,
        limit: query.limit,
    };
    let (page, limit) = page_limit(&page_query);
    let filters = ContentFilters {
        content_type: query.content_type,
        visibility: query.visibility,
        author_id: query.author_id,
        search: query.search,
    };
    let (rows, total) =
        content_service::list_content(&pool, auth_user.id, &filters, page, limit).await?;

    Ok(ApiResponse::paginated(rows, Pagination::new(page, limit, total)))
}

/// GET /api/content/:id
pub async fn get(
    Path(id): Path<Uuid>,
    Extension(auth_user): Extension<AuthUser>,
) -> ApiResult<Content> {
    let pool = DatabaseManager::pool().await?;
    let content = content_service::get_content(&pool, auth_user.id, id).await?;

    Ok(ApiResponse::success(content))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateContentRequest {
    pub title: String,
    pub body: String,
    #[serde(alias = "content_type", alias = "type")]
    pub content_type: String,
    #[serde(alias = "is_public", default)]
    pub is_public: bool,
}

/// POST /api/content - Author new content (private by default)
pub async fn create(
    Extension(auth_user): Extension<AuthUser>,
    Json(payload): Json<CreateContentRequest>,
) -> ApiResult<Content> {
    policy::authorize(&auth_user, Action::Create, Resource::Content, Some(auth_user.id))?;

    let pool = DatabaseManager::pool().await?;
    let content = content_service::create_content(
        &pool,
        auth_user.id,
        NewContent {
            title: payload.title,
            body: payload.body,
            content_type: payload.content_type,
            is_public: payload.is_public,
        },
    )
    .await?;

    Ok(ApiResponse::created(content))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateContentRequest {
    pub title: Option<String>,
    pub body: Option<String>,
    #[serde(alias = "content_type", alias = "type")]
    pub content_type: Option<String>,
    #[serde(alias = "is_public")]
    pub is_public: Option<bool>,
}

/// PUT /api/content/:id - Author, or manager on content they can see
pub async fn update(
    Path(id): Path<Uuid>,
    Extension(auth_user): Extension<AuthUser>,
    Json(payload): Json<UpdateContentRequest>,
) -> ApiResult<Content> {
    let pool = DatabaseManager::pool().await?;
    // Visibility gate first: invisible private content 404s here
    let existing = content_service::get_content(&pool, auth_user.id, id).await?;
    policy::authorize(&auth_user, Action::Update, Resource::Content, Some(existing.author_id))?;

    let content = content_service::update_content(
        &pool,
        id,
        ContentChanges {
            title: payload.title,
            body: payload.body,
            content_type: payload.content_type,
            is_public: payload.is_public,
        },
    )
    .await?;

    Ok(ApiResponse::success(content))
}

/// DELETE /api/content/:id
pub async fn remove(
    Path(id): Path<Uuid>,
    Extension(auth_user): Extension<AuthUser>,
) -> ApiResult<serde_json::Value> {
    let pool = DatabaseManager::pool().await?;
    let existing = content_service::get_content(&pool, auth_user.id, id).await?;
    policy::authorize(&auth_user, Action::Delete, Resource::Content, Some(existing.author_id))?;

    content_service::delete_content(&pool, id).await?;
    Ok(ApiResponse::success(serde_json::json!({ "deleted": true })))
}
