pub mod auth_service;
pub mod expense_service;
pub mod session_service;
pub mod summary_service;
pub mod token_service;
