use chrono::{Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{PgPool, Postgres, QueryBuilder};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::database::models::sale::Sale;
use crate::error::ApiError;
use crate::types::SaleStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupBy {
    Day,
    Week,
    Month,
    Quarter,
    Year,
    Agent,
    Product,
}

impl GroupBy {
    pub fn parse(s: &str) -> Result<Self, ApiError> {
        match s {
            "day" => Ok(GroupBy::Day),
            "week" => Ok(GroupBy::Week),
            "month" => Ok(GroupBy::Month),
            "quarter" => Ok(GroupBy::Quarter),
            "year" => Ok(GroupBy::Year),
            "agent" => Ok(GroupBy::Agent),
            "product" => Ok(GroupBy::Product),
            other => Err(ApiError::validation_error(
                format!("Unknown groupBy: {}", other),
                None,
            )),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GroupBy::Day => "day",
            GroupBy::Week => "week",
            GroupBy::Month => "month",
            GroupBy::Quarter => "quarter",
            GroupBy::Year => "year",
            GroupBy::Agent => "agent",
            GroupBy::Product => "product",
        }
    }
}

fn bucket_key(group_by: GroupBy, sale: &Sale) -> String {
    let date = sale.sale_date;
    match group_by {
        GroupBy::Day => date.format("%Y-%m-%d").to_string(),
        GroupBy::Week => {
            let iso = date.iso_week();
            format!("{}-W{:02}", iso.year(), iso.week())
        }
        GroupBy::Month => date.format("%Y-%m").to_string(),
        GroupBy::Quarter => format!("{}-Q{}", date.year(), date.month0() / 3 + 1),
        GroupBy::Year => date.format("%Y").to_string(),
        GroupBy::Agent => sale.agent_id.to_string(),
        GroupBy::Product => sale.product_id.to_string(),
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReportRow {
    pub bucket_key: String,
    pub total_sales: i64,
    pub total_revenue: Decimal,
    pub total_commission: Decimal,
    pub average_premium: Decimal,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub total_sales: i64,
    pub total_revenue: Decimal,
    pub total_commission: Decimal,
    pub average_premium: Decimal,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesReport {
    pub group_by: &'static str,
    pub data: Vec<ReportRow>,
    pub summary: ReportSummary,
}

#[derive(Default)]
struct Accumulator {
    count: i64,
    revenue: Decimal,
    commission: Decimal,
}

impl Accumulator {
    fn add(&mut self, sale: &Sale) {
        self.count += 1;
        self.revenue += sale.premium_amount;
        self.commission += sale.commission_amount;
    }

    fn average_premium(&self) -> Decimal {
        if self.count == 0 {
            Decimal::ZERO
        } else {
            (self.revenue / Decimal::from(self.count)).round_dp(2)
        }
    }
}

/// Group sales into buckets and collapse the same shape across the whole
/// set. Zero input rows produce a zeroed summary, never an error.
pub fn aggregate(group_by: GroupBy, sales: &[Sale]) -> (Vec<ReportRow>, ReportSummary) {
    let mut buckets: BTreeMap<String, Accumulator> = BTreeMap::new();
    let mut overall = Accumulator::default();

    for sale in sales {
        buckets.entry(bucket_key(group_by, sale)).or_default().add(sale);
        overall.add(sale);
    }

    let data = buckets
        .into_iter()
        .map(|(bucket_key, acc)| ReportRow {
            bucket_key,
            total_sales: acc.count,
            total_revenue: acc.revenue,
            total_commission: acc.commission,
            average_premium: acc.average_premium(),
        })
        .collect();

    let summary = ReportSummary {
        total_sales: overall.count,
        total_revenue: overall.revenue,
        total_commission: overall.commission,
        average_premium: overall.average_premium(),
    };

    (data, summary)
}

#[derive(Debug, Default)]
pub struct ReportFilters {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub agent_id: Option<Uuid>,
    pub product_id: Option<Uuid>,
    pub status: Option<String>,
}

/// Grouped sales report over the requester's visible scope.
pub async fn sales_report(
    pool: &PgPool,
    scope: Option<Uuid>,
    filters: &ReportFilters,
    group_by: GroupBy,
) -> Result<SalesReport, ApiError> {
    if let Some(status) = &filters.status {
        SaleStatus::parse(status)?;
    }

    let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM sales WHERE deleted_at IS NULL");
    if let Some(agent_id) = scope.or(filters.agent_id) {
        qb.push(" AND agent_id = ").push_bind(agent_id);
    }
    if let Some(product_id) = filters.product_id {
        qb.push(" AND product_id = ").push_bind(product_id);
    }
    if let Some(status) = &filters.status {
        qb.push(" AND status = ").push_bind(status.clone());
    }
    if let Some(start) = filters.start_date {
        qb.push(" AND sale_date >= ").push_bind(start);
    }
    if let Some(end) = filters.end_date {
        qb.push(" AND sale_date <= ").push_bind(end);
    }
    qb.push(" ORDER BY sale_date");

    let sales = qb.build_query_as::<Sale>().fetch_all(pool).await?;
    let (data, summary) = aggregate(group_by, &sales);

    Ok(SalesReport {
        group_by: group_by.as_str(),
        data,
        summary,
    })
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub month_sales: i64,
    pub month_revenue: Decimal,
    pub month_commission: Decimal,
    pub active_clients: i64,
    pub active_goals: i64,
}

/// Month-to-date headline numbers for the requester's scope.
pub async fn dashboard(pool: &PgPool, scope: Option<Uuid>) -> Result<Dashboard, ApiError> {
    let today = Utc::now().date_naive();
    let month_start = today.with_day(1).unwrap_or(today);

    let (sales, clients, goals) = futures::try_join!(
        month_sales_totals(pool, scope, month_start, today),
        count_active_clients(pool, scope),
        count_active_goals(pool, scope),
    )?;

    Ok(Dashboard {
        month_sales: sales.0,
        month_revenue: sales.1,
        month_commission: sales.2,
        active_clients: clients,
        active_goals: goals,
    })
}

async fn month_sales_totals(
    pool: &PgPool,
    scope: Option<Uuid>,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<(i64, Decimal, Decimal), ApiError> {
    let mut qb = QueryBuilder::<Postgres>::new(
        "SELECT COUNT(*), COALESCE(SUM(premium_amount), 0), COALESCE(SUM(commission_amount), 0)
         FROM sales
         WHERE deleted_at IS NULL AND status <> 'cancelled'",
    );
    if let Some(agent_id) = scope {
        qb.push(" AND agent_id = ").push_bind(agent_id);
    }
    qb.push(" AND sale_date >= ").push_bind(start);
    qb.push(" AND sale_date <= ").push_bind(end);

    let totals = qb
        .build_query_as::<(i64, Decimal, Decimal)>()
        .fetch_one(pool)
        .await?;
    Ok(totals)
}

async fn count_active_clients(pool: &PgPool, scope: Option<Uuid>) -> Result<i64, ApiError> {
    let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM clients WHERE deleted_at IS NULL");
    if let Some(agent_id) = scope {
        qb.push(" AND agent_id = ").push_bind(agent_id);
    }
    let count: i64 = qb.build_query_scalar().fetch_one(pool).await?;
    Ok(count)
}

async fn count_active_goals(pool: &PgPool, scope: Option<Uuid>) -> Result<i64, ApiError> {
    let mut qb = QueryBuilder::<Postgres>::new(
        "SELECT COUNT(*) FROM goals WHERE deleted_at IS NULL AND is_active = TRUE",
    );
    if let Some(agent_id) = scope {
        qb.push(" AND agent_id = ").push_bind(agent_id);
    }
    let count: i64 = qb.build_query_scalar().fetch_one(pool).await?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn sale(date: &str, premium: Decimal, commission: Decimal) -> Sale {
        let created = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        Sale {
            id: Uuid::new_v4(),
            agent_id: Uuid::nil(),
            client_id: Uuid::new_v4(),
            product_id: Uuid::nil(),
            premium_amount: premium,
            commission_amount: commission,
            sale_date: date.parse().unwrap(),
            status: "active".to_string(),
            notes: None,
            created_at: created,
            updated_at: created,
            deleted_at: None,
        }
    }

    #[test]
    fn groups_by_month_in_order() {
        let sales = vec![
            sale("2024-02-10", dec!(200), dec!(20)),
            sale("2024-01-05", dec!(100), dec!(10)),
            sale("2024-01-20", dec!(300), dec!(30)),
        ];

        let (data, summary) = aggregate(GroupBy::Month, &sales);
        assert_eq!(data.len(), 2);
        assert_eq!(data[0].bucket_key, "2024-01");
        assert_eq!(data[0].total_sales, 2);
        assert_eq!(data[0].total_revenue, dec!(400));
        assert_eq!(data[0].average_premium, dec!(200));
        assert_eq!(data[1].bucket_key, "2024-02");

        assert_eq!(summary.total_sales, 3);
        assert_eq!(summary.total_revenue, dec!(600));
        assert_eq!(summary.total_commission, dec!(60));
        assert_eq!(summary.average_premium, dec!(200));
    }

    #[test]
    fn quarter_and_week_bucket_keys() {
        let q = sale("2024-05-15", dec!(1), dec!(0));
        assert_eq!(bucket_key(GroupBy::Quarter, &q), "2024-Q2");
        assert_eq!(bucket_key(GroupBy::Year, &q), "2024");
        assert_eq!(bucket_key(GroupBy::Day, &q), "2024-05-15");

        // 2024-01-01 falls in ISO week 1 of 2024
        let w = sale("2024-01-01", dec!(1), dec!(0));
        assert_eq!(bucket_key(GroupBy::Week, &w), "2024-W01");
    }

    #[test]
    fn groups_by_agent() {
        let mut a = sale("2024-01-05", dec!(100), dec!(10));
        let mut b = sale("2024-01-06", dec!(200), dec!(20));
        let agent_a = Uuid::new_v4();
        let agent_b = Uuid::new_v4();
        a.agent_id = agent_a;
        b.agent_id = agent_b;

        let (data, _) = aggregate(GroupBy::Agent, &[a, b]);
        assert_eq!(data.len(), 2);
        let keys: Vec<_> = data.iter().map(|row| row.bucket_key.clone()).collect();
        assert!(keys.contains(&agent_a.to_string()));
        assert!(keys.contains(&agent_b.to_string()));
    }

    #[test]
    fn zero_rows_zero_summary() {
        let (data, summary) = aggregate(GroupBy::Month, &[]);
        assert!(data.is_empty());
        assert_eq!(summary.total_sales, 0);
        assert_eq!(summary.total_revenue, Decimal::ZERO);
        assert_eq!(summary.total_commission, Decimal::ZERO);
        assert_eq!(summary.average_premium, Decimal::ZERO);
    }

    #[test]
    fn average_premium_is_arithmetic_mean() {
        let sales = vec![
            sale("2024-01-05", dec!(100), dec!(10)),
            sale("2024-01-06", dec!(250), dec!(25)),
        ];
        let (_, summary) = aggregate(GroupBy::Month, &sales);
        assert_eq!(summary.average_premium, dec!(175));
    }

    #[test]
    fn unknown_group_by_is_rejected() {
        assert!(GroupBy::parse("hour").is_err());
        assert_eq!(GroupBy::parse("quarter").unwrap(), GroupBy::Quarter);
    }
}
