use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::validation::{validate_optional_positive_amount, validate_positive_amount};

/// How an expense was paid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum PaymentMethod {
    #[serde(rename = "cash")]
    Cash,
    #[serde(rename = "credit card")]
    CreditCard,
    #[serde(rename = "debit card")]
    DebitCard,
    #[serde(rename = "upi")]
    Upi,
    #[serde(rename = "net banking")]
    NetBanking,
    #[serde(rename = "other")]
    Other,
}

impl PaymentMethod {
    pub fn to_db_string(&self) -> String {
        match self {
            PaymentMethod::Cash => "cash".to_string(),
            PaymentMethod::CreditCard => "credit card".to_string(),
            PaymentMethod::DebitCard => "debit card".to_string(),
            PaymentMethod::Upi => "upi".to_string(),
            PaymentMethod::NetBanking => "net banking".to_string(),
            PaymentMethod::Other => "other".to_string(),
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "cash" => Some(PaymentMethod::Cash),
            "credit card" => Some(PaymentMethod::CreditCard),
            "debit card" => Some(PaymentMethod::DebitCard),
            "upi" => Some(PaymentMethod::Upi),
            "net banking" => Some(PaymentMethod::NetBanking),
            "other" => Some(PaymentMethod::Other),
            _ => None,
        }
    }
}

impl Default for PaymentMethod {
    fn default() -> Self {
        PaymentMethod::Cash
    }
}

/// Expense entity representing a single spending record.
///
/// Visible to and mutable by the owning user only.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    pub id: Uuid,
    pub user_id: Uuid,
    #[schema(value_type = f64, example = 42.50)]
    pub amount: Decimal,
    pub title: String,
    pub category: String,
    pub date: NaiveDate,
    pub notes: Option<String>,
    pub payment_method: PaymentMethod,
    pub recurring: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request payload for creating a new expense
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateExpenseRequest {
    pub title: String,

    #[validate(custom(function = "validate_positive_amount"))]
    #[schema(value_type = f64, minimum = 0.01, example = 42.50)]
    pub amount: Decimal,

    pub category: String,

    #[schema(format = "date", example = "2024-01-15")]
    pub date: NaiveDate,

    pub notes: Option<String>,

    pub payment_method: Option<PaymentMethod>,

    #[schema(default = false)]
    pub recurring: Option<bool>,
}

/// Request payload for updating an existing expense; any subset of fields
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateExpenseRequest {
    pub title: Option<String>,

    #[validate(custom(function = "validate_optional_positive_amount"))]
    #[schema(value_type = f64, minimum = 0.01, example = 45.00)]
    pub amount: Option<Decimal>,

    pub category: Option<String>,

    #[schema(format = "date", example = "2024-01-16")]
    pub date: Option<NaiveDate>,

    pub notes: Option<String>,

    pub payment_method: Option<PaymentMethod>,

    pub recurring: Option<bool>,
}

/// Query parameters accepted by the expense list endpoint
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ExpenseQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub category: Option<String>,
}

/// Resolved repository-level filter over one user's expenses
#[derive(Debug, Clone, Default)]
pub struct ExpenseFilters {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub category: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_method_db_round_trip() {
        for method in [
            PaymentMethod::Cash,
            PaymentMethod::CreditCard,
            PaymentMethod::DebitCard,
            PaymentMethod::Upi,
            PaymentMethod::NetBanking,
            PaymentMethod::Other,
        ] {
            let stored = method.to_db_string();
            assert_eq!(PaymentMethod::from_db_string(&stored), Some(method));
        }
        assert_eq!(PaymentMethod::from_db_string("wire transfer"), None);
    }

    #[test]
    fn test_payment_method_json_values_match_api_contract() {
        let json = serde_json::to_string(&PaymentMethod::NetBanking).unwrap();
        assert_eq!(json, "\"net banking\"");

        let parsed: PaymentMethod = serde_json::from_str("\"credit card\"").unwrap();
        assert_eq!(parsed, PaymentMethod::CreditCard);
    }
}
