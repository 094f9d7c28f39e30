use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;

use crate::handlers::auth_handlers::{
    login_handler, logout_all_handler, logout_handler, refresh_access_token_handler,
    signup_handler,
};
use crate::handlers::expense_handlers::{
    add_expense_handler, category_summary_handler, custom_range_summary_handler,
    daily_summary_handler, delete_expense_handler, list_expenses_handler,
    monthly_summary_handler, top_categories_handler, update_expense_handler,
    weekly_summary_handler,
};
use crate::middleware::auth_middleware::auth_middleware;
use crate::services::auth_service::AuthService;
use crate::services::expense_service::ExpenseService;
use crate::services::summary_service::SummaryService;

/// Shared application state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<dyn AuthService>,
    pub expense_service: Arc<dyn ExpenseService>,
    pub summary_service: Arc<dyn SummaryService>,
}

/// Build the full router over the given state
pub fn app(state: AppState) -> Router {
    let guard = middleware::from_fn_with_state(state.auth_service.clone(), auth_middleware);

    let user_routes = Router::new()
        .route("/signup", post(signup_handler))
        .route("/login", post(login_handler))
        .route("/logout", post(logout_handler))
        .route("/refresh-access-token", post(refresh_access_token_handler))
        .merge(
            Router::new()
                .route("/logoutall", post(logout_all_handler))
                .route_layer(guard.clone()),
        );

    let expense_routes = Router::new()
        .route("/add", post(add_expense_handler))
        .route("/", get(list_expenses_handler))
        .route(
            "/:id",
            put(update_expense_handler).delete(delete_expense_handler),
        )
        .route("/summary/daily", get(daily_summary_handler))
        .route("/summary/weekly", get(weekly_summary_handler))
        .route("/summary/monthly", get(monthly_summary_handler))
        .route("/summary/custom", post(custom_range_summary_handler))
        .route("/summary/category", get(category_summary_handler))
        .route("/summary/top-categories", get(top_categories_handler))
        .route_layer(guard);

    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1/users", user_routes)
        .nest("/api/v1/expenses", expense_routes)
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
