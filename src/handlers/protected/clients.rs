use axum::{
    extract::{Path, Query},
    Extension, Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::database::manager::DatabaseManager;
use crate::database::models::client::Client;
use crate::database::models::client_note::ClientNote;
use crate::handlers::page_limit;
use crate::middleware::{ApiResponse, ApiResult, AuthUser, Pagination};
use crate::policy::{self, Action, Resource};
use crate::server::AppState;
use crate::services::client_service::{self, ClientChanges, ClientFilters, NewClient};
use crate::services::goal_service;
use crate::services::user_service;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListClientsQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub status: Option<String>,
    pub search: Option<String>,
    #[serde(alias = "agent_id")]
    pub agent_id: Option<Uuid>,
}

/// GET /api/clients - List clients; agents see their own book only
pub async fn list(
    Query(query): Query<ListClientsQuery>,
    Extension(auth_user): Extension<AuthUser>,
) -> ApiResult<Vec<Client>> {
    let scope = policy::read_scope(&auth_user, Resource::Clients)?;

    let pool = DatabaseManager::pool().await?;
    let page_query = crate::handlers::PageQuery {
        page: query.page,
        limit: query.limit,
    };
    let (page, limit) = page_limit(&page_query);
    let filters = ClientFilters {
        status: query.status,
        search: query.search,
        agent_id: query.agent_id,
    };
    let (clients, total) = client_service::list_clients(&pool, scope, &filters, page, limit).await?;

    Ok(ApiResponse::paginated(clients, Pagination::new(page, limit, total)))
}

/// GET /api/clients/:id
pub async fn get(
    Path(id): Path<Uuid>,
    Extension(auth_user): Extension<AuthUser>,
) -> ApiResult<Client> {
    let pool = DatabaseManager::pool().await?;
    let client = client_service::get_client(&pool, id).await?;
    policy::authorize(&auth_user, Action::Read, Resource::Clients, Some(client.agent_id))?;

    Ok(ApiResponse::success(client))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateClientRequest {
    #[serde(alias = "agent_id")]
    pub agent_id: Option<Uuid>,
    #[serde(alias = "first_name")]
    pub first_name: String,
    #[serde(alias = "last_name")]
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    #[serde(default = "default_client_status")]
    pub status: String,
    pub notes: Option<String>,
}

fn default_client_status() -> String {
    "prospect".to_string()
}

/// POST /api/clients - Create a client; a manager may create for any agent
pub async fn create(
    Extension(auth_user): Extension<AuthUser>,
    Extension(state): Extension<AppState>,
    Json(payload): Json<CreateClientRequest>,
) -> ApiResult<Client> {
    let agent_id = payload.agent_id.unwrap_or(auth_user.id);
    policy::authorize(&auth_user, Action::Create, Resource::Clients, Some(agent_id))?;

    let pool = DatabaseManager::pool().await?;
    user_service::get_user(&pool, agent_id).await?;

    let client = client_service::create_client(
        &pool,
        NewClient {
            agent_id,
            first_name: payload.first_name,
            last_name: payload.last_name,
            email: payload.email,
            phone: payload.phone,
            status: payload.status,
            notes: payload.notes,
        },
    )
    .await?;

    // A new client row can move new_clients/client_count goals
    goal_service::invalidate_agent_goals(&pool, state.goal_cache.as_ref(), agent_id).await?;

    Ok(ApiResponse::created(client))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateClientRequest {
    #[serde(alias = "first_name")]
    pub first_name: Option<String>,
    #[serde(alias = "last_name")]
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub status: Option<String>,
    pub notes: Option<String>,
}

/// PUT /api/clients/:id
pub async fn update(
    Path(id): Path<Uuid>,
    Extension(auth_user): Extension<AuthUser>,
    Json(payload): Json<UpdateClientRequest>,
) -> ApiResult<Client> {
    let pool = DatabaseManager::pool().await?;
    let existing = client_service::get_client(&pool, id).await?;
    policy::authorize(&auth_user, Action::Update, Resource::Clients, Some(existing.agent_id))?;

    let client = client_service::update_client(
        &pool,
        id,
        ClientChanges {
            first_name: payload.first_name,
            last_name: payload.last_name,
            email: payload.email,
            phone: payload.phone,
            status: payload.status,
            notes: payload.notes,
        },
    )
    .await?;

    Ok(ApiResponse::success(client))
}

/// DELETE /api/clients/:id - Soft delete
pub async fn remove(
    Path(id): Path<Uuid>,
    Extension(auth_user): Extension<AuthUser>,
    Extension(state): Extension<AppState>,
) -> ApiResult<serde_json::Value> {
    let pool = DatabaseManager::pool().await?;
    let existing = client_service::get_client(&pool, id).await?;
    policy::authorize(&auth_user, Action::Delete, Resource::Clients, Some(existing.agent_id))?;

    client_service::delete_client(&pool, id).await?;
    goal_service::invalidate_agent_goals(&pool, state.goal_cache.as_ref(), existing.agent_id)
        .await?;

    Ok(ApiResponse::success(serde_json::json!({ "deleted": true })))
}

/// GET /api/clients/:id/notes
pub async fn list_notes(
    Path(id): Path<Uuid>,
    Extension(auth_user): Extension<AuthUser>,
) -> ApiResult<Vec<ClientNote>> {
    let pool = DatabaseManager::pool().await?;
    let client = client_service::get_client(&pool, id).await?;
    policy::authorize(&auth_user, Action::Read, Resource::Clients, Some(client.agent_id))?;

    let notes = client_service::list_notes(&pool, id).await?;
    Ok(ApiResponse::success(notes))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddNoteRequest {
    pub body: String,
}

/// POST /api/clients/:id/notes
pub async fn add_note(
    Path(id): Path<Uuid>,
    Extension(auth_user): Extension<AuthUser>,
    Json(payload): Json<AddNoteRequest>,
) -> ApiResult<ClientNote> {
    let pool = DatabaseManager::pool().await?;
    let client = client_service::get_client(&pool, id).await?;
    policy::authorize(&auth_user, Action::Update, Resource::Clients, Some(client.agent_id))?;

    let note = client_service::add_note(&pool, id, auth_user.id, &payload.body).await?;
    Ok(ApiResponse::created(note))
}
