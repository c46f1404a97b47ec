use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::models::product::Product;
use crate::error::ApiError;

pub async fn list_products(
    pool: &PgPool,
    page: i64,
    limit: i64,
) -> Result<(Vec<Product>, i64), ApiError> {
    let products = sqlx::query_as::<_, Product>(
        "SELECT * FROM products WHERE deleted_at IS NULL
         ORDER BY name LIMIT $1 OFFSET $2",
    )
    .bind(limit)
    .bind((page - 1) * limit)
    .fetch_all(pool)
    .await?;

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE deleted_at IS NULL")
        .fetch_one(pool)
        .await?;

    Ok((products, total))
}

pub async fn get_product(pool: &PgPool, id: Uuid) -> Result<Product, ApiError> {
    sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1 AND deleted_at IS NULL")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ApiError::not_found("PRODUCT_NOT_FOUND", "Product not found"))
}

#[derive(Debug)]
pub struct NewProduct {
    pub name: String,
    pub category: Option<String>,
    pub description: Option<String>,
    pub base_premium: Decimal,
    pub commission_rate: Decimal,
}

pub async fn create_product(pool: &PgPool, new: NewProduct) -> Result<Product, ApiError> {
    if new.name.trim().is_empty() {
        return Err(ApiError::validation_error("Product name is required", None));
    }
    if new.base_premium < Decimal::ZERO || new.commission_rate < Decimal::ZERO {
        return Err(ApiError::validation_error(
            "Premium and commission rate must be non-negative",
            None,
        ));
    }

    let product = sqlx::query_as::<_, Product>(
        "INSERT INTO products (id, name, category, description, base_premium, commission_rate,
                               is_active, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, TRUE, now(), now())
         RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(&new.name)
    .bind(&new.category)
    .bind(&new.description)
    .bind(new.base_premium)
    .bind(new.commission_rate)
    .fetch_one(pool)
    .await?;

    Ok(product)
}

#[derive(Debug, Default)]
pub struct ProductChanges {
    pub name: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub base_premium: Option<Decimal>,
    pub commission_rate: Option<Decimal>,
    pub is_active: Option<bool>,
}

pub async fn update_product(
    pool: &PgPool,
    id: Uuid,
    changes: ProductChanges,
) -> Result<Product, ApiError> {
    let product = sqlx::query_as::<_, Product>(
        "UPDATE products SET
             name = COALESCE($2, name),
             category = COALESCE($3, category),
             description = COALESCE($4, description),
             base_premium = COALESCE($5, base_premium),
             commission_rate = COALESCE($6, commission_rate),
             is_active = COALESCE($7, is_active),
             updated_at = now()
         WHERE id = $1 AND deleted_at IS NULL
         RETURNING *",
    )
    .bind(id)
    .bind(changes.name)
    .bind(changes.category)
    .bind(changes.description)
    .bind(changes.base_premium)
    .bind(changes.commission_rate)
    .bind(changes.is_active)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| ApiError::not_found("PRODUCT_NOT_FOUND", "Product not found"))?;

    Ok(product)
}

pub async fn delete_product(pool: &PgPool, id: Uuid) -> Result<(), ApiError> {
    let result = sqlx::query(
        "UPDATE products SET deleted_at = now(), is_active = FALSE, updated_at = now()
         WHERE id = $1 AND deleted_at IS NULL",
    )
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("PRODUCT_NOT_FOUND", "Product not found"));
    }
    Ok(())
}
