use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::cache::GoalValueCache;
use crate::database::models::goal::Goal;
use crate::error::ApiError;
use crate::services::client_service;
use crate::services::goal_engine::{self, MetricKind, MetricType};
use crate::services::sale_service;
use crate::types::GoalType;

#[derive(Debug, Default)]
pub struct GoalFilters {
    pub goal_type: Option<String>,
    pub metric_type: Option<String>,
    pub is_active: Option<bool>,
    pub agent_id: Option<Uuid>,
}

fn push_filters(qb: &mut QueryBuilder<Postgres>, scope: Option<Uuid>, filters: &GoalFilters) {
    qb.push(" WHERE deleted_at IS NULL");

    if let Some(agent_id) = scope.or(filters.agent_id) {
        qb.push(" AND agent_id = ").push_bind(agent_id);
    }
    if let Some(goal_type) = &filters.goal_type {
        qb.push(" AND goal_type = ").push_bind(goal_type.clone());
    }
    if let Some(metric_type) = &filters.metric_type {
        qb.push(" AND metric_type = ").push_bind(metric_type.clone());
    }
    if let Some(is_active) = filters.is_active {
        qb.push(" AND is_active = ").push_bind(is_active);
    }
}

/// Compute a goal's current value from the underlying rows. This is the
/// authoritative path; everything else (the column, the cache) holds copies.
pub async fn compute_value(
    pool: &PgPool,
    agent_id: Uuid,
    metric: MetricType,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Decimal, ApiError> {
    match metric.kind() {
        MetricKind::Clients => {
            let (open, close) = goal_engine::normalize_window(start, end);
            let count = client_service::count_created_in_window(pool, agent_id, open, close).await?;
            Ok(Decimal::from(count))
        }
        MetricKind::Sales(sales_metric) => {
            let rows = sale_service::fetch_window(pool, agent_id, start, end).await?;
            Ok(goal_engine::reduce_sales(sales_metric, start, end, &rows))
        }
    }
}

/// Recompute, persist and cache one goal's value, updating the struct in
/// place. Cache hits skip the recomputation inside the TTL window.
async fn refresh_goal(
    pool: &PgPool,
    cache: &dyn GoalValueCache,
    goal: &mut Goal,
) -> Result<(), ApiError> {
    if let Some(cached) = cache.get(goal.id).await {
        goal.current_value = cached;
        return Ok(());
    }

    let metric = MetricType::parse(&goal.metric_type)?;
    let value = compute_value(pool, goal.agent_id, metric, goal.start_date, goal.end_date).await?;

    sqlx::query("UPDATE goals SET current_value = $2, updated_at = now() WHERE id = $1")
        .bind(goal.id)
        .bind(value)
        .execute(pool)
        .await?;

    cache.set(goal.id, value).await;
    goal.current_value = value;
    Ok(())
}

/// Listing always returns freshly computed progress values.
pub async fn list_goals(
    pool: &PgPool,
    cache: &dyn GoalValueCache,
    scope: Option<Uuid>,
    filters: &GoalFilters,
    page: i64,
    limit: i64,
) -> Result<(Vec<Goal>, i64), ApiError> {
    if let Some(goal_type) = &filters.goal_type {
        GoalType::parse(goal_type)?;
    }
    if let Some(metric_type) = &filters.metric_type {
        MetricType::parse(metric_type)?;
    }

    let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM goals");
    push_filters(&mut qb, scope, filters);
    qb.push(" ORDER BY end_date, created_at LIMIT ")
        .push_bind(limit)
        .push(" OFFSET ")
        .push_bind((page - 1) * limit);
    let mut goals = qb.build_query_as::<Goal>().fetch_all(pool).await?;

    for goal in goals.iter_mut() {
        refresh_goal(pool, cache, goal).await?;
    }

    let mut count_qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM goals");
    push_filters(&mut count_qb, scope, filters);
    let total: i64 = count_qb.build_query_scalar().fetch_one(pool).await?;

    Ok((goals, total))
}

pub async fn get_goal(
    pool: &PgPool,
    cache: &dyn GoalValueCache,
    id: Uuid,
) -> Result<Goal, ApiError> {
    let mut goal = find_goal(pool, id).await?;
    refresh_goal(pool, cache, &mut goal).await?;
    Ok(goal)
}

/// Plain row fetch without the read-path recomputation; used where the
/// caller only needs ownership for an authorization check.
pub async fn find_goal(pool: &PgPool, id: Uuid) -> Result<Goal, ApiError> {
    sqlx::query_as::<_, Goal>("SELECT * FROM goals WHERE id = $1 AND deleted_at IS NULL")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ApiError::not_found("GOAL_NOT_FOUND", "Goal not found"))
}

#[derive(Debug)]
pub struct NewGoal {
    pub agent_id: Uuid,
    pub title: String,
    pub goal_type: String,
    pub metric_type: String,
    pub target_value: Decimal,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub notes: Option<String>,
}

pub async fn create_goal(
    pool: &PgPool,
    cache: &dyn GoalValueCache,
    new: NewGoal,
) -> Result<Goal, ApiError> {
    GoalType::parse(&new.goal_type)?;
    let metric = MetricType::parse(&new.metric_type)?;

    if new.title.trim().is_empty() {
        return Err(ApiError::validation_error("Goal title is required", None));
    }
    if new.start_date > new.end_date {
        return Err(ApiError::validation_error(
            "Goal start date must not be after its end date",
            None,
        ));
    }
    if new.target_value <= Decimal::ZERO {
        return Err(ApiError::validation_error(
            "Goal target must be positive",
            None,
        ));
    }

    // Occurrence metrics track progress made during the goal's life and
    // start from zero; value metrics seed from the rows already in the window.
    let seed = if metric.seeds_from_existing() {
        compute_value(pool, new.agent_id, metric, new.start_date, new.end_date).await?
    } else {
        Decimal::ZERO
    };

    let goal = sqlx::query_as::<_, Goal>(
        "INSERT INTO goals (id, agent_id, title, goal_type, metric_type, target_value,
                            current_value, start_date, end_date, is_active, notes,
                            created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, TRUE, $10, now(), now())
         RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(new.agent_id)
    .bind(&new.title)
    .bind(&new.goal_type)
    .bind(&new.metric_type)
    .bind(new.target_value)
    .bind(seed)
    .bind(new.start_date)
    .bind(new.end_date)
    .bind(&new.notes)
    .fetch_one(pool)
    .await?;

    cache.set(goal.id, goal.current_value).await;
    Ok(goal)
}

#[derive(Debug, Default)]
pub struct GoalChanges {
    pub title: Option<String>,
    pub goal_type: Option<String>,
    pub target_value: Option<Decimal>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub is_active: Option<bool>,
    pub notes: Option<String>,
}

pub async fn update_goal(
    pool: &PgPool,
    cache: &dyn GoalValueCache,
    id: Uuid,
    changes: GoalChanges,
) -> Result<Goal, ApiError> {
    if let Some(goal_type) = &changes.goal_type {
        GoalType::parse(goal_type)?;
    }

    // Validate the effective window before touching the row
    let existing = find_goal(pool, id).await?;
    let start = changes.start_date.unwrap_or(existing.start_date);
    let end = changes.end_date.unwrap_or(existing.end_date);
    if start > end {
        return Err(ApiError::validation_error(
            "Goal start date must not be after its end date",
            None,
        ));
    }

    let mut goal = sqlx::query_as::<_, Goal>(
        "UPDATE goals SET
             title = COALESCE($2, title),
             goal_type = COALESCE($3, goal_type),
             target_value = COALESCE($4, target_value),
             start_date = COALESCE($5, start_date),
             end_date = COALESCE($6, end_date),
             is_active = COALESCE($7, is_active),
             notes = COALESCE($8, notes),
             updated_at = now()
         WHERE id = $1 AND deleted_at IS NULL
         RETURNING *",
    )
    .bind(id)
    .bind(changes.title)
    .bind(changes.goal_type)
    .bind(changes.target_value)
    .bind(changes.start_date)
    .bind(changes.end_date)
    .bind(changes.is_active)
    .bind(changes.notes)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| ApiError::not_found("GOAL_NOT_FOUND", "Goal not found"))?;

    // The window may have moved; recompute rather than trust the old value
    cache.invalidate(goal.id).await;
    refresh_goal(pool, cache, &mut goal).await?;
    Ok(goal)
}

pub async fn delete_goal(
    pool: &PgPool,
    cache: &dyn GoalValueCache,
    id: Uuid,
) -> Result<Goal, ApiError> {
    let goal = sqlx::query_as::<_, Goal>(
        "UPDATE goals SET deleted_at = now(), is_active = FALSE, updated_at = now()
         WHERE id = $1 AND deleted_at IS NULL
         RETURNING *",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| ApiError::not_found("GOAL_NOT_FOUND", "Goal not found"))?;

    cache.invalidate(goal.id).await;
    Ok(goal)
}

/// Explicit per-goal recalculation, bypassing the cache.
pub async fn recalculate(
    pool: &PgPool,
    cache: &dyn GoalValueCache,
    id: Uuid,
) -> Result<Goal, ApiError> {
    let mut goal = find_goal(pool, id).await?;
    cache.invalidate(goal.id).await;
    refresh_goal(pool, cache, &mut goal).await?;
    Ok(goal)
}

/// Recompute and persist every active goal system-wide. Manager-only at the
/// route layer.
pub async fn sync_all(pool: &PgPool, cache: &dyn GoalValueCache) -> Result<u64, ApiError> {
    let mut goals = sqlx::query_as::<_, Goal>(
        "SELECT * FROM goals WHERE is_active = TRUE AND deleted_at IS NULL",
    )
    .fetch_all(pool)
    .await?;

    let mut synced = 0u64;
    for goal in goals.iter_mut() {
        cache.invalidate(goal.id).await;
        refresh_goal(pool, cache, goal).await?;
        synced += 1;
    }

    tracing::info!(count = synced, "synced active goal progress values");
    Ok(synced)
}

/// Drop cached values for every live goal of one agent. Called after sale
/// and client writes so a fresh read inside the TTL window cannot return a
/// stale aggregate.
pub async fn invalidate_agent_goals(
    pool: &PgPool,
    cache: &dyn GoalValueCache,
    agent_id: Uuid,
) -> Result<(), ApiError> {
    let ids: Vec<Uuid> =
        sqlx::query_scalar("SELECT id FROM goals WHERE agent_id = $1 AND deleted_at IS NULL")
            .bind(agent_id)
            .fetch_all(pool)
            .await?;

    cache.invalidate_many(&ids).await;
    Ok(())
}
