pub mod auth;
pub mod expense;
pub mod summary;
pub mod user;

pub use auth::{AccessToken, AuthResponse, AuthSession, LoginRequest, RefreshTokenEntry};
pub use expense::{
    CreateExpenseRequest, Expense, ExpenseFilters, ExpenseQuery, PaymentMethod,
    UpdateExpenseRequest,
};
pub use summary::{
    resolve_range, CategoryTotal, CustomRangeRequest, DayTotal, InvalidDateRange, PeriodSummary,
    RangeSummary, ResolvedRange, SummaryQuery, WeeklySummary,
};
pub use user::{AccountStatus, NewUser, Role, SignupRequest, Theme, User, UserProfile};
