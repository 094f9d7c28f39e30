use axum::{routing::get, Json};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use utoipa::OpenApi;

use expense_tracker::app::{app, AppState};
use expense_tracker::config::Config;
use expense_tracker::models::auth::{AccessToken, AuthResponse, LoginRequest};
use expense_tracker::models::expense::{
    CreateExpenseRequest, Expense, PaymentMethod, UpdateExpenseRequest,
};
use expense_tracker::models::summary::{
    CategoryTotal, CustomRangeRequest, DayTotal, PeriodSummary, RangeSummary, WeeklySummary,
};
use expense_tracker::models::user::{AccountStatus, Role, SignupRequest, Theme, UserProfile};
use expense_tracker::repositories::expense_repository::PostgresExpenseRepository;
use expense_tracker::repositories::refresh_token_repository::PostgresRefreshTokenRepository;
use expense_tracker::repositories::user_repository::PostgresUserRepository;
use expense_tracker::services::auth_service::AuthServiceImpl;
use expense_tracker::services::expense_service::ExpenseServiceImpl;
use expense_tracker::services::session_service::SessionServiceImpl;
use expense_tracker::services::summary_service::SummaryServiceImpl;
use expense_tracker::services::token_service::TokenService;

/// OpenAPI documentation structure
#[derive(OpenApi)]
#[openapi(
    paths(
        expense_tracker::handlers::auth_handlers::signup_handler,
        expense_tracker::handlers::auth_handlers::login_handler,
        expense_tracker::handlers::auth_handlers::logout_handler,
        expense_tracker::handlers::auth_handlers::logout_all_handler,
        expense_tracker::handlers::auth_handlers::refresh_access_token_handler,
        expense_tracker::handlers::expense_handlers::add_expense_handler,
        expense_tracker::handlers::expense_handlers::list_expenses_handler,
        expense_tracker::handlers::expense_handlers::update_expense_handler,
        expense_tracker::handlers::expense_handlers::delete_expense_handler,
        expense_tracker::handlers::expense_handlers::daily_summary_handler,
        expense_tracker::handlers::expense_handlers::weekly_summary_handler,
        expense_tracker::handlers::expense_handlers::monthly_summary_handler,
        expense_tracker::handlers::expense_handlers::custom_range_summary_handler,
        expense_tracker::handlers::expense_handlers::category_summary_handler,
        expense_tracker::handlers::expense_handlers::top_categories_handler,
    ),
    components(schemas(
        UserProfile,
        Role,
        AccountStatus,
        Theme,
        SignupRequest,
        LoginRequest,
        AuthResponse,
        AccessToken,
        Expense,
        PaymentMethod,
        CreateExpenseRequest,
        UpdateExpenseRequest,
        DayTotal,
        CategoryTotal,
        PeriodSummary,
        WeeklySummary,
        RangeSummary,
        CustomRangeRequest,
    )),
    tags(
        (name = "auth", description = "Signup, login and session endpoints"),
        (name = "expenses", description = "Expense CRUD endpoints"),
        (name = "summaries", description = "Spending summary endpoints")
    ),
    info(
        title = "Expense Tracker API",
        version = "0.1.0",
        description = "REST API for tracking personal expenses",
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "expense_tracker=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;
    info!("Connected to database");

    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("Migrations completed");

    let user_repository = Arc::new(PostgresUserRepository::new(pool.clone()));
    let refresh_token_repository = Arc::new(PostgresRefreshTokenRepository::new(pool.clone()));
    let expense_repository = Arc::new(PostgresExpenseRepository::new(pool));

    let token_service = Arc::new(TokenService::new(
        config.access_token_secret.clone(),
        config.refresh_token_secret.clone(),
    ));
    let session_service = Arc::new(SessionServiceImpl::new(
        token_service.clone(),
        refresh_token_repository,
    ));

    let state = AppState {
        auth_service: Arc::new(AuthServiceImpl::new(
            user_repository,
            session_service,
            token_service,
        )),
        expense_service: Arc::new(ExpenseServiceImpl::new(expense_repository.clone())),
        summary_service: Arc::new(SummaryServiceImpl::new(expense_repository)),
    };

    let router = app(state)
        .route(
            "/api/docs/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server running on http://{}", addr);

    axum::serve(listener, router).await?;

    Ok(())
}
