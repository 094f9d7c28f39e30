use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Raised when a resolved date window ends before it starts
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("endDate cannot precede startDate")]
pub struct InvalidDateRange;

/// A date window after applying the shared resolution policy.
/// `start` may be unbounded; `end` is unbounded only when no date was given.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

/// Resolve an optional date range against `today`.
///
/// Only an end date: the lower bound stays open. Only a start date: the end
/// defaults to today. Both: the end must not precede the start.
pub fn resolve_range(
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    today: NaiveDate,
) -> Result<ResolvedRange, InvalidDateRange> {
    let resolved = match (start, end) {
        (Some(start), None) => ResolvedRange {
            start: Some(start),
            end: Some(today),
        },
        (start, end) => ResolvedRange { start, end },
    };

    if let (Some(start), Some(end)) = (resolved.start, resolved.end) {
        if end < start {
            return Err(InvalidDateRange);
        }
    }

    Ok(resolved)
}

/// Total spent on a single calendar day; zero when no expense matched
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DayTotal {
    pub date: NaiveDate,
    #[schema(value_type = f64, example = 50.0)]
    pub total: Decimal,
}

/// Total spent in one category over the requested window
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryTotal {
    pub category: String,
    #[schema(value_type = f64, example = 120.0)]
    pub total: Decimal,
}

/// Single-total summary over a fixed window (monthly)
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PeriodSummary {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[schema(value_type = f64, example = 310.75)]
    pub total_spent: Decimal,
}

/// Trailing-seven-day summary: total plus the fixed-denominator average
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WeeklySummary {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[schema(value_type = f64, example = 210.0)]
    pub total_spent: Decimal,
    /// Weekly total divided by a fixed 7, rounded to 2 decimal places
    #[schema(value_type = f64, example = 30.0)]
    pub average_per_day: Decimal,
}

/// Per-day breakdown over a bounded window; one entry for every calendar
/// day, zero-filled where nothing was spent.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RangeSummary {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[schema(value_type = f64, example = 210.0)]
    pub total_spent: Decimal,
    pub days: Vec<DayTotal>,
}

/// Query parameters accepted by the daily and category summary endpoints
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct SummaryQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// Request body for the custom-range summary; both bounds are required
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomRangeRequest {
    #[schema(format = "date", example = "2024-01-01")]
    pub start_date: NaiveDate,
    #[schema(format = "date", example = "2024-01-31")]
    pub end_date: NaiveDate,
}
