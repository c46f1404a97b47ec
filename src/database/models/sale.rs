use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// A policy sale. The countable/summable unit behind the sales goal metrics
/// and the reporting aggregator.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    pub id: Uuid,
    pub agent_id: Uuid,
    pub client_id: Uuid,
    pub product_id: Uuid,
    pub premium_amount: Decimal,
    pub commission_amount: Decimal,
    pub sale_date: NaiveDate,
    pub status: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}
