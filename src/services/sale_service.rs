use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::database::models::sale::Sale;
use crate::error::ApiError;
use crate::services::client_service;
use crate::services::goal_engine::SaleFigures;
use crate::services::product_service;
use crate::types::SaleStatus;

#[derive(Debug, Default)]
pub struct SaleFilters {
    pub status: Option<String>,
    pub client_id: Option<Uuid>,
    pub product_id: Option<Uuid>,
    pub agent_id: Option<Uuid>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

fn push_filters(qb: &mut QueryBuilder<Postgres>, scope: Option<Uuid>, filters: &SaleFilters) {
    qb.push(" WHERE deleted_at IS NULL");

    if let Some(agent_id) = scope.or(filters.agent_id) {
        qb.push(" AND agent_id = ").push_bind(agent_id);
    }
    if let Some(status) = &filters.status {
        qb.push(" AND status = ").push_bind(status.clone());
    }
    if let Some(client_id) = filters.client_id {
        qb.push(" AND client_id = ").push_bind(client_id);
    }
    if let Some(product_id) = filters.product_id {
        qb.push(" AND product_id = ").push_bind(product_id);
    }
    if let Some(start) = filters.start_date {
        qb.push(" AND sale_date >= ").push_bind(start);
    }
    if let Some(end) = filters.end_date {
        qb.push(" AND sale_date <= ").push_bind(end);
    }
}

pub async fn list_sales(
    pool: &PgPool,
    scope: Option<Uuid>,
    filters: &SaleFilters,
    page: i64,
    limit: i64,
) -> Result<(Vec<Sale>, i64), ApiError> {
    if let Some(status) = &filters.status {
        SaleStatus::parse(status)?;
    }

    let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM sales");
    push_filters(&mut qb, scope, filters);
    qb.push(" ORDER BY sale_date DESC, created_at DESC LIMIT ")
        .push_bind(limit)
        .push(" OFFSET ")
        .push_bind((page - 1) * limit);
    let sales = qb.build_query_as::<Sale>().fetch_all(pool).await?;

    let mut count_qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM sales");
    push_filters(&mut count_qb, scope, filters);
    let total: i64 = count_qb.build_query_scalar().fetch_one(pool).await?;

    Ok((sales, total))
}

pub async fn get_sale(pool: &PgPool, id: Uuid) -> Result<Sale, ApiError> {
    sqlx::query_as::<_, Sale>("SELECT * FROM sales WHERE id = $1 AND deleted_at IS NULL")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ApiError::not_found("SALE_NOT_FOUND", "Sale not found"))
}

#[derive(Debug)]
pub struct NewSale {
    pub agent_id: Uuid,
    pub client_id: Uuid,
    pub product_id: Uuid,
    pub premium_amount: Decimal,
    pub commission_amount: Decimal,
    pub sale_date: NaiveDate,
    pub status: String,
    pub notes: Option<String>,
}

pub async fn create_sale(pool: &PgPool, new: NewSale) -> Result<Sale, ApiError> {
    SaleStatus::parse(&new.status)?;
    if new.premium_amount < Decimal::ZERO || new.commission_amount < Decimal::ZERO {
        return Err(ApiError::validation_error(
            "Premium and commission must be non-negative",
            None,
        ));
    }

    // Referential checks before any mutation
    let client = client_service::get_client(pool, new.client_id).await?;
    if client.agent_id != new.agent_id {
        return Err(ApiError::validation_error(
            "Sale agent must own the client",
            None,
        ));
    }
    product_service::get_product(pool, new.product_id).await?;

    let sale = sqlx::query_as::<_, Sale>(
        "INSERT INTO sales (id, agent_id, client_id, product_id, premium_amount,
                            commission_amount, sale_date, status, notes, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, now(), now())
         RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(new.agent_id)
    .bind(new.client_id)
    .bind(new.product_id)
    .bind(new.premium_amount)
    .bind(new.commission_amount)
    .bind(new.sale_date)
    .bind(&new.status)
    .bind(&new.notes)
    .fetch_one(pool)
    .await?;

    Ok(sale)
}

#[derive(Debug, Default)]
pub struct SaleChanges {
    pub premium_amount: Option<Decimal>,
    pub commission_amount: Option<Decimal>,
    pub sale_date: Option<NaiveDate>,
    pub status: Option<String>,
    pub notes: Option<String>,
}

pub async fn update_sale(pool: &PgPool, id: Uuid, changes: SaleChanges) -> Result<Sale, ApiError> {
    if let Some(status) = &changes.status {
        SaleStatus::parse(status)?;
    }

    let sale = sqlx::query_as::<_, Sale>(
        "UPDATE sales SET
             premium_amount = COALESCE($2, premium_amount),
             commission_amount = COALESCE($3, commission_amount),
             sale_date = COALESCE($4, sale_date),
             status = COALESCE($5, status),
             notes = COALESCE($6, notes),
             updated_at = now()
         WHERE id = $1 AND deleted_at IS NULL
         RETURNING *",
    )
    .bind(id)
    .bind(changes.premium_amount)
    .bind(changes.commission_amount)
    .bind(changes.sale_date)
    .bind(changes.status)
    .bind(changes.notes)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| ApiError::not_found("SALE_NOT_FOUND", "Sale not found"))?;

    Ok(sale)
}

pub async fn delete_sale(pool: &PgPool, id: Uuid) -> Result<Sale, ApiError> {
    let sale = sqlx::query_as::<_, Sale>(
        "UPDATE sales SET deleted_at = now(), updated_at = now()
         WHERE id = $1 AND deleted_at IS NULL
         RETURNING *",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| ApiError::not_found("SALE_NOT_FOUND", "Sale not found"))?;

    Ok(sale)
}

/// Sale rows of one agent dated inside an inclusive window, in the shape
/// the goal engine reduces. The status filter is left to the reducer so the
/// cancelled-exclusion rule lives in exactly one place.
pub async fn fetch_window(
    pool: &PgPool,
    agent_id: Uuid,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<SaleFigures>, ApiError> {
    let rows = sqlx::query_as::<_, SaleFigures>(
        "SELECT sale_date, premium_amount, commission_amount, status FROM sales
         WHERE agent_id = $1 AND deleted_at IS NULL
           AND sale_date >= $2 AND sale_date <= $3",
    )
    .bind(agent_id)
    .bind(start)
    .bind(end)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
