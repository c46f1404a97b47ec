use axum::{extract::Query, Extension};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use crate::database::manager::DatabaseManager;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::policy::{self, Resource};
use crate::services::report_service::{self, Dashboard, GroupBy, ReportFilters, SalesReport};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesReportQuery {
    #[serde(alias = "start_date")]
    pub start_date: Option<NaiveDate>,
    #[serde(alias = "end_date")]
    pub end_date: Option<NaiveDate>,
    #[serde(alias = "agent_id")]
    pub agent_id: Option<Uuid>,
    #[serde(alias = "product_id")]
    pub product_id: Option<Uuid>,
    pub status: Option<String>,
    #[serde(alias = "group_by")]
    pub group_by: Option<String>,
}

/// GET /api/reports/sales - Grouped sales report
///
/// Agents are scoped to their own sales regardless of the agentId filter;
/// managers may filter by any agent.
pub async fn sales(
    Query(query): Query<SalesReportQuery>,
    Extension(auth_user): Extension<AuthUser>,
) -> ApiResult<serde_json::Value> {
    let scope = policy::read_scope(&auth_user, Resource::Reports)?;
    let group_by = match query.group_by.as_deref() {
        Some(s) => GroupBy::parse(s)?,
        None => GroupBy::Month,
    };

    let pool = DatabaseManager::pool().await?;
    let filters = ReportFilters {
        start_date: query.start_date,
        end_date: query.end_date,
        agent_id: query.agent_id,
        product_id: query.product_id,
        status: query.status,
    };
    let report: SalesReport = report_service::sales_report(&pool, scope, &filters, group_by).await?;

    Ok(ApiResponse::success(serde_json::json!({ "report": report })))
}

/// GET /api/reports/dashboard - Month-to-date headline numbers
pub async fn dashboard(Extension(auth_user): Extension<AuthUser>) -> ApiResult<Dashboard> {
    let scope = policy::read_scope(&auth_user, Resource::Reports)?;

    let pool = DatabaseManager::pool().await?;
    let dashboard = report_service::dashboard(&pool, scope).await?;

    Ok(ApiResponse::success(dashboard))
}
