use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::models::expense::{
    CreateExpenseRequest, Expense, ExpenseFilters, ExpenseQuery, UpdateExpenseRequest,
};
use crate::models::summary::resolve_range;
use crate::repositories::expense_repository::{ExpenseRepository, RepositoryError};

/// Expense service errors
#[derive(Debug, thiserror::Error)]
pub enum ExpenseError {
    #[error("All fields are required")]
    MissingFields,

    #[error("Amount must be greater than zero")]
    InvalidAmount,

    #[error("endDate cannot precede startDate")]
    InvalidRange,

    #[error("Expense not found")]
    NotFound,

    #[error("Database error: {0}")]
    Database(String),
}

impl From<RepositoryError> for ExpenseError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::NotFound => ExpenseError::NotFound,
            e => ExpenseError::Database(e.to_string()),
        }
    }
}

/// Trait defining expense operations.
///
/// Every operation is scoped to the calling user; an expense owned by
/// someone else is indistinguishable from one that does not exist.
#[async_trait]
pub trait ExpenseService: Send + Sync {
    /// Record a new expense for the user
    async fn create(
        &self,
        user_id: Uuid,
        request: CreateExpenseRequest,
    ) -> Result<Expense, ExpenseError>;

    /// Apply a partial update to one of the user's expenses
    async fn update(
        &self,
        user_id: Uuid,
        expense_id: Uuid,
        request: UpdateExpenseRequest,
    ) -> Result<Expense, ExpenseError>;

    /// Delete one of the user's expenses
    async fn delete(&self, user_id: Uuid, expense_id: Uuid) -> Result<(), ExpenseError>;

    /// List the user's expenses, newest first, optionally filtered
    async fn list(
        &self,
        user_id: Uuid,
        query: ExpenseQuery,
    ) -> Result<Vec<Expense>, ExpenseError>;
}

/// Implementation of ExpenseService
pub struct ExpenseServiceImpl {
    expenses: Arc<dyn ExpenseRepository>,
}

impl ExpenseServiceImpl {
    pub fn new(expenses: Arc<dyn ExpenseRepository>) -> Self {
        Self { expenses }
    }

    /// Fetch the expense and confirm the caller owns it
    async fn owned_expense(
        &self,
        user_id: Uuid,
        expense_id: Uuid,
    ) -> Result<Expense, ExpenseError> {
        let expense = self
            .expenses
            .find_by_id(expense_id)
            .await?
            .ok_or(ExpenseError::NotFound)?;

        if expense.user_id != user_id {
            return Err(ExpenseError::NotFound);
        }

        Ok(expense)
    }
}

fn normalized_notes(notes: Option<String>) -> Option<String> {
    notes
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
}

#[async_trait]
impl ExpenseService for ExpenseServiceImpl {
    #[instrument(skip(self, request))]
    async fn create(
        &self,
        user_id: Uuid,
        request: CreateExpenseRequest,
    ) -> Result<Expense, ExpenseError> {
        let title = request.title.trim().to_string();
        let category = request.category.trim().to_string();

        if title.is_empty() || category.is_empty() {
            return Err(ExpenseError::MissingFields);
        }
        if request.amount <= Decimal::ZERO {
            return Err(ExpenseError::InvalidAmount);
        }

        let now = Utc::now();
        let expense = Expense {
            id: Uuid::new_v4(),
            user_id,
            amount: request.amount,
            title,
            category,
            date: request.date,
            notes: normalized_notes(request.notes),
            payment_method: request.payment_method.unwrap_or_default(),
            recurring: request.recurring.unwrap_or(false),
            created_at: now,
            updated_at: now,
        };

        let created = self.expenses.insert(expense).await?;
        debug!(expense_id = %created.id, user_id = %user_id, "Expense created");
        Ok(created)
    }

    #[instrument(skip(self, request))]
    async fn update(
        &self,
        user_id: Uuid,
        expense_id: Uuid,
        request: UpdateExpenseRequest,
    ) -> Result<Expense, ExpenseError> {
        let mut expense = self.owned_expense(user_id, expense_id).await?;

        if let Some(title) = request.title {
            let title = title.trim().to_string();
            if title.is_empty() {
                return Err(ExpenseError::MissingFields);
            }
            expense.title = title;
        }
        if let Some(category) = request.category {
            let category = category.trim().to_string();
            if category.is_empty() {
                return Err(ExpenseError::MissingFields);
            }
            expense.category = category;
        }
        if let Some(amount) = request.amount {
            if amount <= Decimal::ZERO {
                return Err(ExpenseError::InvalidAmount);
            }
            expense.amount = amount;
        }
        if let Some(date) = request.date {
            expense.date = date;
        }
        if let Some(notes) = request.notes {
            expense.notes = normalized_notes(Some(notes));
        }
        if let Some(payment_method) = request.payment_method {
            expense.payment_method = payment_method;
        }
        if let Some(recurring) = request.recurring {
            expense.recurring = recurring;
        }
        expense.updated_at = Utc::now();

        Ok(self.expenses.update(expense).await?)
    }

    #[instrument(skip(self))]
    async fn delete(&self, user_id: Uuid, expense_id: Uuid) -> Result<(), ExpenseError> {
        self.owned_expense(user_id, expense_id).await?;
        self.expenses.delete(expense_id).await?;
        debug!(expense_id = %expense_id, user_id = %user_id, "Expense deleted");
        Ok(())
    }

    #[instrument(skip(self, query))]
    async fn list(
        &self,
        user_id: Uuid,
        query: ExpenseQuery,
    ) -> Result<Vec<Expense>, ExpenseError> {
        let range = resolve_range(query.start_date, query.end_date, Utc::now().date_naive())
            .map_err(|_| ExpenseError::InvalidRange)?;

        let filters = ExpenseFilters {
            start_date: range.start,
            end_date: range.end,
            category: query
                .category
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty()),
        };

        Ok(self.expenses.find_for_user(user_id, &filters).await?)
    }
}
