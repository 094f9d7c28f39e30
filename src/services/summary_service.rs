use async_trait::async_trait;
use chrono::{Datelike, Duration, NaiveDate, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use crate::models::expense::{Expense, ExpenseFilters};
use crate::models::summary::{
    resolve_range, CategoryTotal, DayTotal, PeriodSummary, RangeSummary, WeeklySummary,
};
use crate::repositories::expense_repository::ExpenseRepository;

/// Number of days in the trailing window used by the weekly and
/// top-categories summaries; also the fixed average denominator.
const WEEK_DAYS: i64 = 7;

/// Number of categories returned by the top-categories summary
const TOP_CATEGORIES: usize = 3;

/// Summary service errors
#[derive(Debug, thiserror::Error)]
pub enum SummaryError {
    #[error("{0}")]
    InvalidRange(String),

    #[error("Database error: {0}")]
    Database(String),
}

/// Trait defining spending summary operations.
///
/// All aggregation happens here over the owner's expense rows; the
/// repository only filters and sorts.
#[async_trait]
pub trait SummaryService: Send + Sync {
    /// Per-day breakdown; defaults to the trailing seven days when no
    /// bounds are given
    async fn daily(
        &self,
        user_id: Uuid,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<RangeSummary, SummaryError>;

    /// Trailing-seven-day total with a fixed-denominator daily average
    async fn weekly(&self, user_id: Uuid) -> Result<WeeklySummary, SummaryError>;

    /// Total from the first of the current month through today
    async fn monthly(&self, user_id: Uuid) -> Result<PeriodSummary, SummaryError>;

    /// Per-day breakdown over an explicit window; both bounds required
    async fn custom_range(
        &self,
        user_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<RangeSummary, SummaryError>;

    /// Per-category totals over an optional window, largest first
    async fn by_category(
        &self,
        user_id: Uuid,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<CategoryTotal>, SummaryError>;

    /// The top three spending categories over the trailing seven days
    async fn top_categories(&self, user_id: Uuid) -> Result<Vec<CategoryTotal>, SummaryError>;
}

/// Implementation of SummaryService
pub struct SummaryServiceImpl {
    expenses: Arc<dyn ExpenseRepository>,
}

impl SummaryServiceImpl {
    pub fn new(expenses: Arc<dyn ExpenseRepository>) -> Self {
        Self { expenses }
    }

    async fn fetch(
        &self,
        user_id: Uuid,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<Expense>, SummaryError> {
        let filters = ExpenseFilters {
            start_date: start,
            end_date: end,
            category: None,
        };

        self.expenses
            .find_for_user(user_id, &filters)
            .await
            .map_err(|e| SummaryError::Database(e.to_string()))
    }

    /// Per-day breakdown over a bounded window, one entry per calendar day
    async fn breakdown(
        &self,
        user_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<RangeSummary, SummaryError> {
        let expenses = self.fetch(user_id, Some(start), Some(end)).await?;

        let mut per_day: HashMap<NaiveDate, Decimal> = HashMap::new();
        for expense in &expenses {
            *per_day.entry(expense.date).or_insert(Decimal::ZERO) += expense.amount;
        }

        let num_days = (end - start).num_days() + 1;
        let days = (0..num_days)
            .map(|offset| {
                let date = start + Duration::days(offset);
                DayTotal {
                    date,
                    total: per_day.get(&date).copied().unwrap_or(Decimal::ZERO),
                }
            })
            .collect();

        Ok(RangeSummary {
            start_date: start,
            end_date: end,
            total_spent: expenses.iter().map(|e| e.amount).sum(),
            days,
        })
    }

    /// Per-category totals sorted largest first, ties broken by name
    async fn category_totals(
        &self,
        user_id: Uuid,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<CategoryTotal>, SummaryError> {
        let expenses = self.fetch(user_id, start, end).await?;

        let mut per_category: HashMap<String, Decimal> = HashMap::new();
        for expense in expenses {
            *per_category
                .entry(expense.category)
                .or_insert(Decimal::ZERO) += expense.amount;
        }

        let mut totals: Vec<CategoryTotal> = per_category
            .into_iter()
            .map(|(category, total)| CategoryTotal { category, total })
            .collect();
        totals.sort_by(|a, b| b.total.cmp(&a.total).then(a.category.cmp(&b.category)));

        Ok(totals)
    }
}

/// The trailing window includes today as its last day
fn trailing_week(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    (today - Duration::days(WEEK_DAYS - 1), today)
}

#[async_trait]
impl SummaryService for SummaryServiceImpl {
    #[instrument(skip(self))]
    async fn daily(
        &self,
        user_id: Uuid,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<RangeSummary, SummaryError> {
        let today = Utc::now().date_naive();

        let (start, end) = match (start, end) {
            (None, None) => trailing_week(today),
            (None, Some(_)) => {
                return Err(SummaryError::InvalidRange(
                    "startDate is required when endDate is provided".to_string(),
                ))
            }
            (Some(start), end) => {
                let range = resolve_range(Some(start), end, today)
                    .map_err(|e| SummaryError::InvalidRange(e.to_string()))?;
                // Both bounds are concrete after resolution
                (start, range.end.unwrap_or(today))
            }
        };

        self.breakdown(user_id, start, end).await
    }

    #[instrument(skip(self))]
    async fn weekly(&self, user_id: Uuid) -> Result<WeeklySummary, SummaryError> {
        let (start, end) = trailing_week(Utc::now().date_naive());
        let expenses = self.fetch(user_id, Some(start), Some(end)).await?;

        let total_spent: Decimal = expenses.iter().map(|e| e.amount).sum();
        // Fixed denominator of 7, even for brand-new accounts
        let average_per_day = (total_spent / Decimal::from(WEEK_DAYS))
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);

        Ok(WeeklySummary {
            start_date: start,
            end_date: end,
            total_spent,
            average_per_day,
        })
    }

    #[instrument(skip(self))]
    async fn monthly(&self, user_id: Uuid) -> Result<PeriodSummary, SummaryError> {
        let today = Utc::now().date_naive();
        let start = today - Duration::days(i64::from(today.day()) - 1);

        let expenses = self.fetch(user_id, Some(start), Some(today)).await?;

        Ok(PeriodSummary {
            start_date: start,
            end_date: today,
            total_spent: expenses.iter().map(|e| e.amount).sum(),
        })
    }

    #[instrument(skip(self))]
    async fn custom_range(
        &self,
        user_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<RangeSummary, SummaryError> {
        if end < start {
            return Err(SummaryError::InvalidRange(
                "endDate cannot precede startDate".to_string(),
            ));
        }

        self.breakdown(user_id, start, end).await
    }

    #[instrument(skip(self))]
    async fn by_category(
        &self,
        user_id: Uuid,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<CategoryTotal>, SummaryError> {
        let range = resolve_range(start, end, Utc::now().date_naive())
            .map_err(|e| SummaryError::InvalidRange(e.to_string()))?;

        self.category_totals(user_id, range.start, range.end).await
    }

    #[instrument(skip(self))]
    async fn top_categories(&self, user_id: Uuid) -> Result<Vec<CategoryTotal>, SummaryError> {
        let (start, end) = trailing_week(Utc::now().date_naive());

        let mut totals = self.category_totals(user_id, Some(start), Some(end)).await?;
        totals.truncate(TOP_CATEGORIES);
        Ok(totals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::expense::PaymentMethod;
    use crate::repositories::expense_repository::InMemoryExpenseRepository;
    use std::str::FromStr;

    fn fixture() -> (SummaryServiceImpl, Arc<InMemoryExpenseRepository>) {
        let repo = Arc::new(InMemoryExpenseRepository::new());
        (SummaryServiceImpl::new(repo.clone()), repo)
    }

    async fn insert(
        repo: &InMemoryExpenseRepository,
        user_id: Uuid,
        amount: &str,
        category: &str,
        date: NaiveDate,
    ) {
        let now = Utc::now();
        repo.insert(Expense {
            id: Uuid::new_v4(),
            user_id,
            amount: Decimal::from_str(amount).unwrap(),
            title: "Test expense".to_string(),
            category: category.to_string(),
            date,
            notes: None,
            payment_method: PaymentMethod::Cash,
            recurring: false,
            created_at: now,
            updated_at: now,
        })
        .await
        .unwrap();
    }

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[tokio::test]
    async fn test_weekly_total_and_fixed_average() {
        let (service, repo) = fixture();
        let user_id = Uuid::new_v4();
        let today = Utc::now().date_naive();

        insert(&repo, user_id, "30", "food", today).await;
        insert(&repo, user_id, "20", "travel", today - Duration::days(3)).await;
        // Just outside the trailing window
        insert(&repo, user_id, "100", "rent", today - Duration::days(7)).await;

        let summary = service.weekly(user_id).await.unwrap();

        assert_eq!(summary.start_date, today - Duration::days(6));
        assert_eq!(summary.end_date, today);
        assert_eq!(summary.total_spent, dec("50"));
        // 50 / 7 rounded half away from zero
        assert_eq!(summary.average_per_day, dec("7.14"));
    }

    #[tokio::test]
    async fn test_weekly_empty_window_averages_zero() {
        let (service, _) = fixture();

        let summary = service.weekly(Uuid::new_v4()).await.unwrap();
        assert_eq!(summary.total_spent, Decimal::ZERO);
        assert_eq!(summary.average_per_day, dec("0.00"));
    }

    #[tokio::test]
    async fn test_daily_defaults_to_trailing_week_zero_filled() {
        let (service, repo) = fixture();
        let user_id = Uuid::new_v4();
        let today = Utc::now().date_naive();

        insert(&repo, user_id, "10", "food", today).await;
        insert(&repo, user_id, "15", "food", today).await;

        let summary = service.daily(user_id, None, None).await.unwrap();

        assert_eq!(summary.days.len(), 7);
        assert_eq!(summary.days[0].date, today - Duration::days(6));
        assert_eq!(summary.days[0].total, Decimal::ZERO);
        assert_eq!(summary.days[6].date, today);
        assert_eq!(summary.days[6].total, dec("25"));
        assert_eq!(summary.total_spent, dec("25"));
    }

    #[tokio::test]
    async fn test_daily_end_without_start_is_rejected() {
        let (service, _) = fixture();
        let today = Utc::now().date_naive();

        let result = service.daily(Uuid::new_v4(), None, Some(today)).await;
        assert!(matches!(result, Err(SummaryError::InvalidRange(_))));
    }

    #[tokio::test]
    async fn test_daily_start_only_runs_through_today() {
        let (service, repo) = fixture();
        let user_id = Uuid::new_v4();
        let today = Utc::now().date_naive();

        insert(&repo, user_id, "10", "food", today - Duration::days(2)).await;

        let summary = service
            .daily(user_id, Some(today - Duration::days(2)), None)
            .await
            .unwrap();

        assert_eq!(summary.days.len(), 3);
        assert_eq!(summary.end_date, today);
        assert_eq!(summary.total_spent, dec("10"));
    }

    #[tokio::test]
    async fn test_custom_range_covers_every_calendar_day() {
        let (service, repo) = fixture();
        let user_id = Uuid::new_v4();
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();

        insert(&repo, user_id, "40", "food", NaiveDate::from_ymd_opt(2024, 1, 5).unwrap()).await;

        let summary = service.custom_range(user_id, start, end).await.unwrap();

        assert_eq!(summary.days.len(), 10);
        assert_eq!(summary.total_spent, dec("40"));
        assert_eq!(summary.days[4].total, dec("40"));
        assert!(summary
            .days
            .iter()
            .filter(|d| d.date != NaiveDate::from_ymd_opt(2024, 1, 5).unwrap())
            .all(|d| d.total == Decimal::ZERO));
    }

    #[tokio::test]
    async fn test_custom_range_rejects_inverted_bounds() {
        let (service, _) = fixture();
        let start = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();

        let result = service.custom_range(Uuid::new_v4(), start, end).await;
        assert!(matches!(result, Err(SummaryError::InvalidRange(_))));
    }

    #[tokio::test]
    async fn test_monthly_starts_on_the_first() {
        let (service, repo) = fixture();
        let user_id = Uuid::new_v4();
        let today = Utc::now().date_naive();
        let first = today - Duration::days(i64::from(today.day()) - 1);

        insert(&repo, user_id, "60", "rent", first).await;
        insert(&repo, user_id, "15", "food", today).await;

        let summary = service.monthly(user_id).await.unwrap();

        assert_eq!(summary.start_date, first);
        assert_eq!(summary.end_date, today);
        assert_eq!(summary.total_spent, dec("75"));
    }

    #[tokio::test]
    async fn test_by_category_sorts_largest_first() {
        let (service, repo) = fixture();
        let user_id = Uuid::new_v4();
        let today = Utc::now().date_naive();

        insert(&repo, user_id, "10", "food", today).await;
        insert(&repo, user_id, "25", "food", today).await;
        insert(&repo, user_id, "50", "rent", today).await;
        insert(&repo, user_id, "5", "travel", today).await;

        let totals = service.by_category(user_id, None, None).await.unwrap();

        assert_eq!(totals.len(), 3);
        assert_eq!(totals[0], CategoryTotal { category: "rent".to_string(), total: dec("50") });
        assert_eq!(totals[1], CategoryTotal { category: "food".to_string(), total: dec("35") });
        assert_eq!(totals[2], CategoryTotal { category: "travel".to_string(), total: dec("5") });
    }

    #[tokio::test]
    async fn test_top_categories_truncates_to_three_in_window() {
        let (service, repo) = fixture();
        let user_id = Uuid::new_v4();
        let today = Utc::now().date_naive();

        insert(&repo, user_id, "40", "food", today).await;
        insert(&repo, user_id, "30", "rent", today).await;
        insert(&repo, user_id, "20", "travel", today).await;
        insert(&repo, user_id, "10", "fun", today).await;
        // Outside the trailing window, must not influence the ranking
        insert(&repo, user_id, "500", "vacation", today - Duration::days(10)).await;

        let totals = service.top_categories(user_id).await.unwrap();

        assert_eq!(totals.len(), 3);
        assert_eq!(totals[0].category, "food");
        assert_eq!(totals[1].category, "rent");
        assert_eq!(totals[2].category, "travel");
    }
}
