use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::handlers::validation_message;
use crate::middleware::auth_middleware::AuthenticatedUser;
use crate::models::expense::{
    CreateExpenseRequest, Expense, ExpenseQuery, UpdateExpenseRequest,
};
use crate::models::summary::{
    CategoryTotal, CustomRangeRequest, PeriodSummary, RangeSummary, SummaryQuery, WeeklySummary,
};
use crate::response::{ApiResponse, ErrorBody};
use crate::services::expense_service::ExpenseError;
use crate::services::summary_service::SummaryError;

/// Convert ExpenseError to HTTP response
impl IntoResponse for ExpenseError {
    fn into_response(self) -> Response {
        let status = match self {
            ExpenseError::MissingFields
            | ExpenseError::InvalidAmount
            | ExpenseError::InvalidRange => StatusCode::BAD_REQUEST,
            ExpenseError::NotFound => StatusCode::NOT_FOUND,
            ExpenseError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let message = match self {
            ExpenseError::Database(_) => "Internal server error".to_string(),
            e => e.to_string(),
        };

        ErrorBody::new(status, &message).into_response()
    }
}

/// Convert SummaryError to HTTP response
impl IntoResponse for SummaryError {
    fn into_response(self) -> Response {
        match self {
            SummaryError::InvalidRange(message) => {
                ErrorBody::new(StatusCode::BAD_REQUEST, &message).into_response()
            }
            SummaryError::Database(_) => {
                ErrorBody::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
                    .into_response()
            }
        }
    }
}

/// Handler for recording a new expense
#[utoipa::path(
    post,
    path = "/api/v1/expenses/add",
    request_body = CreateExpenseRequest,
    responses(
        (status = 201, description = "Expense created", body = Expense),
        (status = 400, description = "Missing fields or non-positive amount"),
        (status = 401, description = "Missing or invalid access token")
    ),
    tag = "expenses"
)]
pub async fn add_expense_handler(
    State(state): State<AppState>,
    Extension(authenticated): Extension<AuthenticatedUser>,
    Json(request): Json<CreateExpenseRequest>,
) -> Result<ApiResponse<Expense>, Response> {
    if let Err(errors) = request.validate() {
        return Err(
            ErrorBody::new(StatusCode::BAD_REQUEST, &validation_message(&errors)).into_response(),
        );
    }

    let expense = state
        .expense_service
        .create(authenticated.user.id, request)
        .await
        .map_err(|e| e.into_response())?;

    Ok(ApiResponse::created(expense, "Expense created successfully"))
}

/// Handler for listing the caller's expenses, newest first
#[utoipa::path(
    get,
    path = "/api/v1/expenses",
    params(ExpenseQuery),
    responses(
        (status = 200, description = "Matching expenses", body = [Expense]),
        (status = 400, description = "endDate precedes startDate"),
        (status = 401, description = "Missing or invalid access token")
    ),
    tag = "expenses"
)]
pub async fn list_expenses_handler(
    State(state): State<AppState>,
    Extension(authenticated): Extension<AuthenticatedUser>,
    Query(query): Query<ExpenseQuery>,
) -> Result<ApiResponse<Vec<Expense>>, Response> {
    let expenses = state
        .expense_service
        .list(authenticated.user.id, query)
        .await
        .map_err(|e| e.into_response())?;

    Ok(ApiResponse::ok(expenses, "Expenses fetched successfully"))
}

/// Handler for updating one of the caller's expenses
#[utoipa::path(
    put,
    path = "/api/v1/expenses/{id}",
    request_body = UpdateExpenseRequest,
    params(("id" = Uuid, Path, description = "Expense ID")),
    responses(
        (status = 200, description = "Updated expense", body = Expense),
        (status = 400, description = "Blank field or non-positive amount"),
        (status = 404, description = "No such expense for this user")
    ),
    tag = "expenses"
)]
pub async fn update_expense_handler(
    State(state): State<AppState>,
    Extension(authenticated): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateExpenseRequest>,
) -> Result<ApiResponse<Expense>, Response> {
    if let Err(errors) = request.validate() {
        return Err(
            ErrorBody::new(StatusCode::BAD_REQUEST, &validation_message(&errors)).into_response(),
        );
    }

    let expense = state
        .expense_service
        .update(authenticated.user.id, id, request)
        .await
        .map_err(|e| e.into_response())?;

    Ok(ApiResponse::ok(expense, "Expense updated successfully"))
}

/// Handler for deleting one of the caller's expenses
#[utoipa::path(
    delete,
    path = "/api/v1/expenses/{id}",
    params(("id" = Uuid, Path, description = "Expense ID")),
    responses(
        (status = 200, description = "Expense deleted"),
        (status = 404, description = "No such expense for this user")
    ),
    tag = "expenses"
)]
pub async fn delete_expense_handler(
    State(state): State<AppState>,
    Extension(authenticated): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<()>, Response> {
    state
        .expense_service
        .delete(authenticated.user.id, id)
        .await
        .map_err(|e| e.into_response())?;

    Ok(ApiResponse::ok((), "Expense deleted successfully"))
}

/// Handler for the per-day spending breakdown
#[utoipa::path(
    get,
    path = "/api/v1/expenses/summary/daily",
    params(SummaryQuery),
    responses(
        (status = 200, description = "Per-day totals", body = RangeSummary),
        (status = 400, description = "Invalid date window")
    ),
    tag = "summaries"
)]
pub async fn daily_summary_handler(
    State(state): State<AppState>,
    Extension(authenticated): Extension<AuthenticatedUser>,
    Query(query): Query<SummaryQuery>,
) -> Result<ApiResponse<RangeSummary>, Response> {
    let summary = state
        .summary_service
        .daily(authenticated.user.id, query.start_date, query.end_date)
        .await
        .map_err(|e| e.into_response())?;

    Ok(ApiResponse::ok(summary, "Daily summary fetched successfully"))
}

/// Handler for the trailing-seven-day summary
#[utoipa::path(
    get,
    path = "/api/v1/expenses/summary/weekly",
    responses(
        (status = 200, description = "Weekly total and daily average", body = WeeklySummary)
    ),
    tag = "summaries"
)]
pub async fn weekly_summary_handler(
    State(state): State<AppState>,
    Extension(authenticated): Extension<AuthenticatedUser>,
) -> Result<ApiResponse<WeeklySummary>, Response> {
    let summary = state
        .summary_service
        .weekly(authenticated.user.id)
        .await
        .map_err(|e| e.into_response())?;

    Ok(ApiResponse::ok(
        summary,
        "Weekly summary fetched successfully",
    ))
}

/// Handler for the month-to-date summary
#[utoipa::path(
    get,
    path = "/api/v1/expenses/summary/monthly",
    responses(
        (status = 200, description = "Month-to-date total", body = PeriodSummary)
    ),
    tag = "summaries"
)]
pub async fn monthly_summary_handler(
    State(state): State<AppState>,
    Extension(authenticated): Extension<AuthenticatedUser>,
) -> Result<ApiResponse<PeriodSummary>, Response> {
    let summary = state
        .summary_service
        .monthly(authenticated.user.id)
        .await
        .map_err(|e| e.into_response())?;

    Ok(ApiResponse::ok(
        summary,
        "Monthly summary fetched successfully",
    ))
}

/// Handler for the explicit-window per-day breakdown
#[utoipa::path(
    post,
    path = "/api/v1/expenses/summary/custom",
    request_body = CustomRangeRequest,
    responses(
        (status = 200, description = "Per-day totals over the window", body = RangeSummary),
        (status = 400, description = "endDate precedes startDate")
    ),
    tag = "summaries"
)]
pub async fn custom_range_summary_handler(
    State(state): State<AppState>,
    Extension(authenticated): Extension<AuthenticatedUser>,
    Json(request): Json<CustomRangeRequest>,
) -> Result<ApiResponse<RangeSummary>, Response> {
    let summary = state
        .summary_service
        .custom_range(authenticated.user.id, request.start_date, request.end_date)
        .await
        .map_err(|e| e.into_response())?;

    Ok(ApiResponse::ok(
        summary,
        "Custom range summary fetched successfully",
    ))
}

/// Handler for per-category totals
#[utoipa::path(
    get,
    path = "/api/v1/expenses/summary/category",
    params(SummaryQuery),
    responses(
        (status = 200, description = "Per-category totals, largest first", body = [CategoryTotal]),
        (status = 400, description = "Invalid date window")
    ),
    tag = "summaries"
)]
pub async fn category_summary_handler(
    State(state): State<AppState>,
    Extension(authenticated): Extension<AuthenticatedUser>,
    Query(query): Query<SummaryQuery>,
) -> Result<ApiResponse<Vec<CategoryTotal>>, Response> {
    let totals = state
        .summary_service
        .by_category(authenticated.user.id, query.start_date, query.end_date)
        .await
        .map_err(|e| e.into_response())?;

    Ok(ApiResponse::ok(
        totals,
        "Category summary fetched successfully",
    ))
}

/// Handler for the top three categories over the trailing week
#[utoipa::path(
    get,
    path = "/api/v1/expenses/summary/top-categories",
    responses(
        (status = 200, description = "Up to three categories, largest first", body = [CategoryTotal])
    ),
    tag = "summaries"
)]
pub async fn top_categories_handler(
    State(state): State<AppState>,
    Extension(authenticated): Extension<AuthenticatedUser>,
) -> Result<ApiResponse<Vec<CategoryTotal>>, Response> {
    let totals = state
        .summary_service
        .top_categories(authenticated.user.id)
        .await
        .map_err(|e| e.into_response())?;

    Ok(ApiResponse::ok(
        totals,
        "Top categories fetched successfully",
    ))
}
