//! Pure core of the goal progress engine.
//!
//! Everything here is deterministic over its inputs; the database wiring
//! lives in goal_service. Recomputation over Sale/Client rows is the source
//! of truth for a goal's current value - the persisted column is only the
//! last recomputed result.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;

use crate::error::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricType {
    SalesCount,
    PoliciesSold,
    SalesAmount,
    Commission,
    NewClients,
    ClientCount,
}

/// What a metric is computed from. Client metrics count client rows created
/// in the window; sales metrics reduce sale rows dated in the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Clients,
    Sales(SalesMetric),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SalesMetric {
    Count,
    Premium,
    Commission,
}

impl MetricType {
    /// Parse the stored metric string. An unrecognized value is an explicit
    /// error, never a silent zero.
    pub fn parse(s: &str) -> Result<Self, ApiError> {
        match s {
            "sales_count" => Ok(MetricType::SalesCount),
            "policies_sold" => Ok(MetricType::PoliciesSold),
            "sales_amount" => Ok(MetricType::SalesAmount),
            "commission" => Ok(MetricType::Commission),
            "new_clients" => Ok(MetricType::NewClients),
            "client_count" => Ok(MetricType::ClientCount),
            other => Err(ApiError::unknown_metric_type(other)),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MetricType::SalesCount => "sales_count",
            MetricType::PoliciesSold => "policies_sold",
            MetricType::SalesAmount => "sales_amount",
            MetricType::Commission => "commission",
            MetricType::NewClients => "new_clients",
            MetricType::ClientCount => "client_count",
        }
    }

    pub fn kind(&self) -> MetricKind {
        match self {
            MetricType::NewClients | MetricType::ClientCount => MetricKind::Clients,
            MetricType::SalesCount | MetricType::PoliciesSold => {
                MetricKind::Sales(SalesMetric::Count)
            }
            MetricType::SalesAmount => MetricKind::Sales(SalesMetric::Premium),
            MetricType::Commission => MetricKind::Sales(SalesMetric::Commission),
        }
    }

    /// Seeding policy on goal creation. Metrics that count occurrences
    /// happening during the goal's life start at zero even when matching
    /// rows already exist inside the window; the value metrics seed from a
    /// recomputation at creation time.
    pub fn seeds_from_existing(&self) -> bool {
        !matches!(
            self,
            MetricType::SalesCount | MetricType::PoliciesSold | MetricType::NewClients
        )
    }
}

/// Normalize a goal window to whole days: 00:00:00.000 on the start date
/// through 23:59:59.999 on the end date, both inclusive.
pub fn normalize_window(start: NaiveDate, end: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let close = NaiveTime::from_hms_milli_opt(23, 59, 59, 999).expect("valid wall-clock time");
    (
        start.and_time(NaiveTime::MIN).and_utc(),
        end.and_time(close).and_utc(),
    )
}

/// The slice of a sale row the engine needs.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct SaleFigures {
    pub sale_date: NaiveDate,
    pub premium_amount: Decimal,
    pub commission_amount: Decimal,
    pub status: String,
}

impl SaleFigures {
    fn counts_toward_goals(&self) -> bool {
        // Cancelled policies contribute to no metric; expired ones were
        // still sold and stay in.
        self.status != "cancelled"
    }
}

/// Reduce sale rows to a metric value over an inclusive date window.
/// Absence of matching rows yields zero, never null; the result is always
/// non-negative for non-negative inputs.
pub fn reduce_sales(
    metric: SalesMetric,
    start: NaiveDate,
    end: NaiveDate,
    rows: &[SaleFigures],
) -> Decimal {
    let matching = rows
        .iter()
        .filter(|row| row.sale_date >= start && row.sale_date <= end)
        .filter(|row| row.counts_toward_goals());

    match metric {
        SalesMetric::Count => Decimal::from(matching.count() as i64),
        SalesMetric::Premium => matching.map(|row| row.premium_amount).sum(),
        SalesMetric::Commission => matching.map(|row| row.commission_amount).sum(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sale(date: &str, premium: Decimal, commission: Decimal, status: &str) -> SaleFigures {
        SaleFigures {
            sale_date: date.parse().unwrap(),
            premium_amount: premium,
            commission_amount: commission,
            status: status.to_string(),
        }
    }

    #[test]
    fn unknown_metric_is_an_error() {
        let err = MetricType::parse("velocity").unwrap_err();
        assert_eq!(err.error_code(), "UNKNOWN_METRIC_TYPE");
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn metric_strings_round_trip() {
        for s in [
            "sales_count",
            "policies_sold",
            "sales_amount",
            "commission",
            "new_clients",
            "client_count",
        ] {
            assert_eq!(MetricType::parse(s).unwrap().as_str(), s);
        }
    }

    #[test]
    fn occurrence_metrics_seed_at_zero() {
        assert!(!MetricType::SalesCount.seeds_from_existing());
        assert!(!MetricType::PoliciesSold.seeds_from_existing());
        assert!(!MetricType::NewClients.seeds_from_existing());

        assert!(MetricType::SalesAmount.seeds_from_existing());
        assert!(MetricType::Commission.seeds_from_existing());
        assert!(MetricType::ClientCount.seeds_from_existing());
    }

    #[test]
    fn window_covers_whole_days() {
        let (open, close) = normalize_window(
            "2024-01-01".parse().unwrap(),
            "2024-01-31".parse().unwrap(),
        );
        assert_eq!(open.to_rfc3339(), "2024-01-01T00:00:00+00:00");
        assert_eq!(close.to_rfc3339(), "2024-01-31T23:59:59.999+00:00");
    }

    #[test]
    fn january_scenario_excludes_cancelled() {
        // Two active sales and one cancelled one inside the window
        let rows = vec![
            sale("2024-01-05", dec!(1000), dec!(100), "active"),
            sale("2024-01-20", dec!(2000), dec!(200), "active"),
            sale("2024-01-12", dec!(500), dec!(50), "cancelled"),
        ];
        let start = "2024-01-01".parse().unwrap();
        let end = "2024-01-31".parse().unwrap();

        assert_eq!(
            reduce_sales(SalesMetric::Premium, start, end, &rows),
            dec!(3000)
        );
        assert_eq!(
            reduce_sales(SalesMetric::Count, start, end, &rows),
            dec!(2)
        );
        assert_eq!(
            reduce_sales(SalesMetric::Commission, start, end, &rows),
            dec!(300)
        );
    }

    #[test]
    fn window_boundaries_are_inclusive() {
        let rows = vec![
            sale("2024-01-01", dec!(10), dec!(1), "active"),
            sale("2024-01-31", dec!(20), dec!(2), "active"),
            sale("2023-12-31", dec!(40), dec!(4), "active"),
            sale("2024-02-01", dec!(80), dec!(8), "active"),
        ];
        let start = "2024-01-01".parse().unwrap();
        let end = "2024-01-31".parse().unwrap();

        assert_eq!(
            reduce_sales(SalesMetric::Premium, start, end, &rows),
            dec!(30)
        );
    }

    #[test]
    fn expired_sales_still_count() {
        let rows = vec![sale("2024-01-10", dec!(150), dec!(15), "expired")];
        let start = "2024-01-01".parse().unwrap();
        let end = "2024-01-31".parse().unwrap();

        assert_eq!(reduce_sales(SalesMetric::Count, start, end, &rows), dec!(1));
        assert_eq!(
            reduce_sales(SalesMetric::Premium, start, end, &rows),
            dec!(150)
        );
    }

    #[test]
    fn empty_dataset_yields_zero() {
        let start = "2024-01-01".parse().unwrap();
        let end = "2024-01-31".parse().unwrap();

        for metric in [
            SalesMetric::Count,
            SalesMetric::Premium,
            SalesMetric::Commission,
        ] {
            assert_eq!(reduce_sales(metric, start, end, &[]), Decimal::ZERO);
        }
    }

    #[test]
    fn reduction_is_deterministic() {
        let rows = vec![
            sale("2024-03-03", dec!(123.45), dec!(12.34), "active"),
            sale("2024-03-04", dec!(678.90), dec!(67.89), "active"),
        ];
        let start = "2024-03-01".parse().unwrap();
        let end = "2024-03-31".parse().unwrap();

        let first = reduce_sales(SalesMetric::Premium, start, end, &rows);
        let second = reduce_sales(SalesMetric::Premium, start, end, &rows);
        assert_eq!(first, second);
        assert_eq!(first, dec!(802.35));
        assert!(first >= Decimal::ZERO);
    }
}
