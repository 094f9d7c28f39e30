use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::models::expense::{Expense, ExpenseFilters, PaymentMethod};

/// Repository errors for database operations
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Resource not found")]
    NotFound,

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),
}

/// Trait defining expense repository operations
#[async_trait]
pub trait ExpenseRepository: Send + Sync {
    /// Persist a new expense
    async fn insert(&self, expense: Expense) -> Result<Expense, RepositoryError>;

    /// Replace an existing expense; `NotFound` if the row is absent
    async fn update(&self, expense: Expense) -> Result<Expense, RepositoryError>;

    /// Find an expense by ID
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Expense>, RepositoryError>;

    /// Find a user's expenses matching the filters, sorted by date descending
    async fn find_for_user(
        &self,
        user_id: Uuid,
        filters: &ExpenseFilters,
    ) -> Result<Vec<Expense>, RepositoryError>;

    /// Delete an expense by ID; `NotFound` if the row is absent
    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError>;
}

/// PostgreSQL implementation of ExpenseRepository
pub struct PostgresExpenseRepository {
    pool: PgPool,
}

impl PostgresExpenseRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn expense_from_row(row: &PgRow) -> Result<Expense, RepositoryError> {
    let payment_method: String = row.get("payment_method");

    Ok(Expense {
        id: row.get("id"),
        user_id: row.get("user_id"),
        amount: row.get("amount"),
        title: row.get("title"),
        category: row.get("category"),
        date: row.get("date"),
        notes: row.get("notes"),
        payment_method: PaymentMethod::from_db_string(&payment_method).ok_or_else(|| {
            RepositoryError::DatabaseError(format!("unknown payment method '{}'", payment_method))
        })?,
        recurring: row.get("recurring"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

#[async_trait]
impl ExpenseRepository for PostgresExpenseRepository {
    #[instrument(skip(self, expense))]
    async fn insert(&self, expense: Expense) -> Result<Expense, RepositoryError> {
        debug!(expense_id = %expense.id, user_id = %expense.user_id, "Inserting expense");

        let row = sqlx::query(
            r#"
            INSERT INTO expenses (
                id, user_id, amount, title, category, date, notes,
                payment_method, recurring, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING id, user_id, amount, title, category, date, notes,
                      payment_method, recurring, created_at, updated_at
            "#,
        )
        .bind(expense.id)
        .bind(expense.user_id)
        .bind(expense.amount)
        .bind(&expense.title)
        .bind(&expense.category)
        .bind(expense.date)
        .bind(&expense.notes)
        .bind(expense.payment_method.to_db_string())
        .bind(expense.recurring)
        .bind(expense.created_at)
        .bind(expense.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to insert expense");
            RepositoryError::DatabaseError(e.to_string())
        })?;

        expense_from_row(&row)
    }

    #[instrument(skip(self, expense))]
    async fn update(&self, expense: Expense) -> Result<Expense, RepositoryError> {
        let row = sqlx::query(
            r#"
            UPDATE expenses
            SET amount = $2,
                title = $3,
                category = $4,
                date = $5,
                notes = $6,
                payment_method = $7,
                recurring = $8,
                updated_at = $9
            WHERE id = $1
            RETURNING id, user_id, amount, title, category, date, notes,
                      payment_method, recurring, created_at, updated_at
            "#,
        )
        .bind(expense.id)
        .bind(expense.amount)
        .bind(&expense.title)
        .bind(&expense.category)
        .bind(expense.date)
        .bind(&expense.notes)
        .bind(expense.payment_method.to_db_string())
        .bind(expense.recurring)
        .bind(expense.updated_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, expense_id = %expense.id, "Failed to update expense");
            RepositoryError::DatabaseError(e.to_string())
        })?;

        match row {
            Some(row) => expense_from_row(&row),
            None => Err(RepositoryError::NotFound),
        }
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Expense>, RepositoryError> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, amount, title, category, date, notes,
                   payment_method, recurring, created_at, updated_at
            FROM expenses
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        row.as_ref().map(expense_from_row).transpose()
    }

    #[instrument(skip(self, filters))]
    async fn find_for_user(
        &self,
        user_id: Uuid,
        filters: &ExpenseFilters,
    ) -> Result<Vec<Expense>, RepositoryError> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, amount, title, category, date, notes,
                   payment_method, recurring, created_at, updated_at
            FROM expenses
            WHERE user_id = $1
              AND ($2::date IS NULL OR date >= $2)
              AND ($3::date IS NULL OR date <= $3)
              AND ($4::text IS NULL OR category = $4)
            ORDER BY date DESC, created_at DESC
            "#,
        )
        .bind(user_id)
        .bind(filters.start_date)
        .bind(filters.end_date)
        .bind(filters.category.as_deref())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        rows.iter().map(expense_from_row).collect()
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM expenses WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                warn!(error = %e, expense_id = %id, "Failed to delete expense");
                RepositoryError::DatabaseError(e.to_string())
            })?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}

/// In-memory implementation of ExpenseRepository for development and testing
pub struct InMemoryExpenseRepository {
    expenses: Mutex<HashMap<Uuid, Expense>>,
}

impl Default for InMemoryExpenseRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryExpenseRepository {
    pub fn new() -> Self {
        Self {
            expenses: Mutex::new(HashMap::new()),
        }
    }
}

fn matches_filters(expense: &Expense, filters: &ExpenseFilters) -> bool {
    if let Some(start) = filters.start_date {
        if expense.date < start {
            return false;
        }
    }
    if let Some(end) = filters.end_date {
        if expense.date > end {
            return false;
        }
    }
    if let Some(category) = &filters.category {
        if &expense.category != category {
            return false;
        }
    }
    true
}

#[async_trait]
impl ExpenseRepository for InMemoryExpenseRepository {
    async fn insert(&self, expense: Expense) -> Result<Expense, RepositoryError> {
        let mut expenses = self.expenses.lock().unwrap();
        expenses.insert(expense.id, expense.clone());
        Ok(expense)
    }

    async fn update(&self, expense: Expense) -> Result<Expense, RepositoryError> {
        let mut expenses = self.expenses.lock().unwrap();
        if !expenses.contains_key(&expense.id) {
            return Err(RepositoryError::NotFound);
        }
        expenses.insert(expense.id, expense.clone());
        Ok(expense)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Expense>, RepositoryError> {
        let expenses = self.expenses.lock().unwrap();
        Ok(expenses.get(&id).cloned())
    }

    async fn find_for_user(
        &self,
        user_id: Uuid,
        filters: &ExpenseFilters,
    ) -> Result<Vec<Expense>, RepositoryError> {
        let expenses = self.expenses.lock().unwrap();
        let mut matching: Vec<Expense> = expenses
            .values()
            .filter(|e| e.user_id == user_id && matches_filters(e, filters))
            .cloned()
            .collect();

        matching.sort_by(|a, b| b.date.cmp(&a.date).then(b.created_at.cmp(&a.created_at)));
        Ok(matching)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError> {
        let mut expenses = self.expenses.lock().unwrap();
        if expenses.remove(&id).is_none() {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn expense(user_id: Uuid, amount: &str, category: &str, date: NaiveDate) -> Expense {
        let now = Utc::now();
        Expense {
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
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn test_find_for_user_applies_date_and_category_filters() {
        let repo = InMemoryExpenseRepository::new();
        let user_id = Uuid::new_v4();

        repo.insert(expense(user_id, "10", "food", date(2024, 1, 5)))
            .await
            .unwrap();
        repo.insert(expense(user_id, "20", "food", date(2024, 1, 15)))
            .await
            .unwrap();
        repo.insert(expense(user_id, "30", "travel", date(2024, 1, 15)))
            .await
            .unwrap();

        let filters = ExpenseFilters {
            start_date: Some(date(2024, 1, 10)),
            end_date: Some(date(2024, 1, 31)),
            category: Some("food".to_string()),
        };

        let found = repo.find_for_user(user_id, &filters).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].amount, Decimal::from_str("20").unwrap());
    }

    #[tokio::test]
    async fn test_find_for_user_sorts_date_descending() {
        let repo = InMemoryExpenseRepository::new();
        let user_id = Uuid::new_v4();

        repo.insert(expense(user_id, "10", "food", date(2024, 1, 5)))
            .await
            .unwrap();
        repo.insert(expense(user_id, "20", "food", date(2024, 1, 20)))
            .await
            .unwrap();

        let found = repo
            .find_for_user(user_id, &ExpenseFilters::default())
            .await
            .unwrap();
        assert_eq!(found[0].date, date(2024, 1, 20));
        assert_eq!(found[1].date, date(2024, 1, 5));
    }

    #[tokio::test]
    async fn test_update_missing_expense_is_not_found() {
        let repo = InMemoryExpenseRepository::new();
        let result = repo
            .update(expense(Uuid::new_v4(), "10", "food", date(2024, 1, 5)))
            .await;
        assert!(matches!(result, Err(RepositoryError::NotFound)));
    }

    #[tokio::test]
    async fn test_delete_missing_expense_is_not_found() {
        let repo = InMemoryExpenseRepository::new();
        let result = repo.delete(Uuid::new_v4()).await;
        assert!(matches!(result, Err(RepositoryError::NotFound)));
    }
}
