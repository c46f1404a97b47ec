use axum::{
    extract::{Path, Query},
    Extension, Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use crate::database::manager::DatabaseManager;
use crate::database::models::product::Product;
use crate::handlers::{page_limit, PageQuery};
use crate::middleware::{ApiResponse, ApiResult, AuthUser, Pagination};
use crate::policy::{self, Action, Resource};
use crate::services::product_service::{self, NewProduct, ProductChanges};

/// GET /api/products - Product catalog, readable by every role
pub async fn list(
    Query(query): Query<PageQuery>,
    Extension(auth_user): Extension<AuthUser>,
) -> ApiResult<Vec<Product>> {
    policy::authorize(&auth_user, Action::Read, Resource::Products, None)?;

    let pool = DatabaseManager::pool().await?;
    let (page, limit) = page_limit(&query);
    let (products, total) = product_service::list_products(&pool, page, limit).await?;

    Ok(ApiResponse::paginated(products, Pagination::new(page, limit, total)))
}

/// GET /api/products/:id
pub async fn get(
    Path(id): Path<Uuid>,
    Extension(auth_user): Extension<AuthUser>,
) -> ApiResult<Product> {
    policy::authorize(&auth_user, Action::Read, Resource::Products, None)?;

    let pool = DatabaseManager::pool().await?;
    let product = product_service::get_product(&pool, id).await?;

    Ok(ApiResponse::success(product))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    pub name: String,
    pub category: Option<String>,
    pub description: Option<String>,
    #[serde(alias = "base_premium")]
    pub base_premium: Decimal,
    #[serde(alias = "commission_rate")]
    pub commission_rate: Decimal,
}

/// POST /api/products - Create a product (manager only)
pub async fn create(
    Extension(auth_user): Extension<AuthUser>,
    Json(payload): Json<CreateProductRequest>,
) -> ApiResult<Product> {
    policy::authorize(&auth_user, Action::Create, Resource::Products, None)?;

    let pool = DatabaseManager::pool().await?;
    let product = product_service::create_product(
        &pool,
        NewProduct {
            name: payload.name,
            category: payload.category,
            description: payload.description,
            base_premium: payload.base_premium,
            commission_rate: payload.commission_rate,
        },
    )
    .await?;

    Ok(ApiResponse::created(product))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    #[serde(alias = "base_premium")]
    pub base_premium: Option<Decimal>,
    #[serde(alias = "commission_rate")]
    pub commission_rate: Option<Decimal>,
    #[serde(alias = "is_active")]
    pub is_active: Option<bool>,
}

/// PUT /api/products/:id - Update a product (manager only)
pub async fn update(
    Path(id): Path<Uuid>,
    Extension(auth_user): Extension<AuthUser>,
    Json(payload): Json<UpdateProductRequest>,
) -> ApiResult<Product> {
    policy::authorize(&auth_user, Action::Update, Resource::Products, None)?;

    let pool = DatabaseManager::pool().await?;
    let product = product_service::update_product(
        &pool,
        id,
        ProductChanges {
            name: payload.name,
            category: payload.category,
            description: payload.description,
            base_premium: payload.base_premium,
            commission_rate: payload.commission_rate,
            is_active: payload.is_active,
        },
    )
    .await?;

    Ok(ApiResponse::success(product))
}

/// DELETE /api/products/:id - Soft delete (manager only)
pub async fn remove(
    Path(id): Path<Uuid>,
    Extension(auth_user): Extension<AuthUser>,
) -> ApiResult<serde_json::Value> {
    policy::authorize(&auth_user, Action::Delete, Resource::Products, None)?;

    let pool = DatabaseManager::pool().await?;
    product_service::delete_product(&pool, id).await?;

    Ok(ApiResponse::success(serde_json::json!({ "deleted": true })))
}
