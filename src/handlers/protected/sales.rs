use axum::{
    extract::{Path, Query},
    Extension, Json,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use crate::database::manager::DatabaseManager;
use crate::database::models::sale::Sale;
use crate::handlers::page_limit;
use crate::middleware::{ApiResponse, ApiResult, AuthUser, Pagination};
use crate::policy::{self, Action, Resource};
use crate::server::AppState;
use crate::services::goal_service;
use crate::services::sale_service::{self, NewSale, SaleChanges, SaleFilters};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListSalesQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub status: Option<String>,
    #[serde(alias = "client_id")]
    pub client_id: Option<Uuid>,
    #[serde(alias = "product_id")]
    pub product_id: Option<Uuid>,
    #[serde(alias = "agent_id")]
    pub agent_id: Option<Uuid>,
    #[serde(alias = "start_date")]
    pub start_date: Option<NaiveDate>,
    #[serde(alias = "end_date")]
    pub end_date: Option<NaiveDate>,
}

/// GET /api/sales - List sales; agents see their own only
pub async fn list(
    Query(query): Query<ListSalesQuery>,
    Extension(auth_user): Extension<AuthUser>,
) -> ApiResult<Vec<Sale>> {
    let scope = policy::read_scope(&auth_user, Resource::Sales)?;

    let pool = DatabaseManager::pool().await?;
    let page_query = crate::handlers::PageQuery {
        page: query.page,
        limit: query.limit,
    };
    let (page, limit) = page_limit(&page_query);
    let filters = SaleFilters {
        status: query.status,
        client_id: query.client_id,
        product_id: query.product_id,
        agent_id: query.agent_id,
        start_date: query.start_date,
        end_date: query.end_date,
    };
    let (sales, total) = sale_service::list_sales(&pool, scope, &filters, page, limit).await?;

    Ok(ApiResponse::paginated(sales, Pagination::new(page, limit, total)))
}

/// GET /api/sales/:id
pub async fn get(
    Path(id): Path<Uuid>,
    Extension(auth_user): Extension<AuthUser>,
) -> ApiResult<Sale> {
    let pool = DatabaseManager::pool().await?;
    let sale = sale_service::get_sale(&pool, id).await?;
    policy::authorize(&auth_user, Action::Read, Resource::Sales, Some(sale.agent_id))?;

    Ok(ApiResponse::success(sale))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSaleRequest {
    #[serde(alias = "agent_id")]
    pub agent_id: Option<Uuid>,
    #[serde(alias = "client_id")]
    pub client_id: Uuid,
    #[serde(alias = "product_id")]
    pub product_id: Uuid,
    #[serde(alias = "premium_amount")]
    pub premium_amount: Decimal,
    #[serde(alias = "commission_amount")]
    pub commission_amount: Decimal,
    #[serde(alias = "sale_date")]
    pub sale_date: NaiveDate,
    #[serde(default = "default_sale_status")]
    pub status: String,
    pub notes: Option<String>,
}

fn default_sale_status() -> String {
    "active".to_string()
}

/// POST /api/sales - Record a sale against an owned client
pub async fn create(
    Extension(auth_user): Extension<AuthUser>,
    Extension(state): Extension<AppState>,
    Json(payload): Json<CreateSaleRequest>,
) -> ApiResult<Sale> {
    let agent_id = payload.agent_id.unwrap_or(auth_user.id);
    policy::authorize(&auth_user, Action::Create, Resource::Sales, Some(agent_id))?;

    let pool = DatabaseManager::pool().await?;
    let sale = sale_service::create_sale(
        &pool,
        NewSale {
            agent_id,
            client_id: payload.client_id,
            product_id: payload.product_id,
            premium_amount: payload.premium_amount,
            commission_amount: payload.commission_amount,
            sale_date: payload.sale_date,
            status: payload.status,
            notes: payload.notes,
        },
    )
    .await?;

    // Fresh premium/commission rows must not hide behind cached goal values
    goal_service::invalidate_agent_goals(&pool, state.goal_cache.as_ref(), agent_id).await?;

    Ok(ApiResponse::created(sale))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSaleRequest {
    #[serde(alias = "premium_amount")]
    pub premium_amount: Option<Decimal>,
    #[serde(alias = "commission_amount")]
    pub commission_amount: Option<Decimal>,
    #[serde(alias = "sale_date")]
    pub sale_date: Option<NaiveDate>,
    pub status: Option<String>,
    pub notes: Option<String>,
}

/// PUT /api/sales/:id
pub async fn update(
    Path(id): Path<Uuid>,
    Extension(auth_user): Extension<AuthUser>,
    Extension(state): Extension<AppState>,
    Json(payload): Json<UpdateSaleRequest>,
) -> ApiResult<Sale> {
    let pool = DatabaseManager::pool().await?;
    let existing = sale_service::get_sale(&pool, id).await?;
    policy::authorize(&auth_user, Action::Update, Resource::Sales, Some(existing.agent_id))?;

    let sale = sale_service::update_sale(
        &pool,
        id,
        SaleChanges {
            premium_amount: payload.premium_amount,
            commission_amount: payload.commission_amount,
            sale_date: payload.sale_date,
            status: payload.status,
            notes: payload.notes,
        },
    )
    .await?;

    goal_service::invalidate_agent_goals(&pool, state.goal_cache.as_ref(), sale.agent_id).await?;

    Ok(ApiResponse::success(sale))
}

/// DELETE /api/sales/:id - Soft delete
pub async fn remove(
    Path(id): Path<Uuid>,
    Extension(auth_user): Extension<AuthUser>,
    Extension(state): Extension<AppState>,
) -> ApiResult<serde_json::Value> {
    let pool = DatabaseManager::pool().await?;
    let existing = sale_service::get_sale(&pool, id).await?;
    policy::authorize(&auth_user, Action::Delete, Resource::Sales, Some(existing.agent_id))?;

    let sale = sale_service::delete_sale(&pool, id).await?;
    goal_service::invalidate_agent_goals(&pool, state.goal_cache.as_ref(), sale.agent_id).await?;

    Ok(ApiResponse::success(serde_json::json!({ "deleted": true })))
}
