use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// A production goal for one agent.
///
/// `current_value` is derived: recomputation over the agent's Sale/Client
/// rows inside the date window is the source of truth, and the column holds
/// the last recomputed value. Read paths refresh it; see
/// services::goal_service.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    pub id: Uuid,
    pub agent_id: Uuid,
    pub title: String,
    pub goal_type: String,
    pub metric_type: String,
    pub target_value: Decimal,
    pub current_value: Decimal,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub is_active: bool,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}
