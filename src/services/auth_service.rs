use async_trait::async_trait;
use bcrypt::{hash, verify, DEFAULT_COST};
use std::sync::Arc;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::models::auth::{AccessToken, AuthSession, LoginRequest};
use crate::models::user::{NewUser, SignupRequest, UserProfile};
use crate::repositories::user_repository::{RepositoryError, UserRepository};
use crate::services::session_service::SessionService;
use crate::services::token_service::{TokenError, TokenService};

/// Authentication errors
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("All fields are required")]
    MissingFields,

    #[error("User already exists")]
    EmailTaken,

    #[error("User not found")]
    UserNotFound,

    #[error("Invalid credentials")]
    InvalidPassword,

    #[error("Unauthorized: Invalid or expired token")]
    InvalidAccessToken,

    #[error("No refresh token found")]
    MissingRefreshToken,

    #[error("Invalid refresh token")]
    InvalidRefreshToken,

    #[error("Unauthorized: Invalid or expired refresh token")]
    RefreshNotActive,

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Trait defining authentication operations
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Register a new account and open a session for the signing-up device
    async fn signup(&self, request: SignupRequest) -> Result<AuthSession, AuthError>;

    /// Verify credentials and open (or replace) a session for the device
    async fn login(&self, request: LoginRequest) -> Result<AuthSession, AuthError>;

    /// Close the single session identified by the refresh token
    async fn logout(&self, refresh_token: &str) -> Result<(), AuthError>;

    /// Close every session the user holds; returns how many were closed
    async fn logout_all(&self, user_id: Uuid) -> Result<u64, AuthError>;

    /// Mint a fresh access token for the holder of a live refresh token
    async fn refresh_access_token(&self, refresh_token: &str) -> Result<AccessToken, AuthError>;

    /// Resolve an access token to the user it identifies
    async fn authenticate(&self, access_token: &str) -> Result<UserProfile, AuthError>;
}

/// Implementation of AuthService
pub struct AuthServiceImpl {
    users: Arc<dyn UserRepository>,
    sessions: Arc<dyn SessionService>,
    tokens: Arc<TokenService>,
}

impl AuthServiceImpl {
    pub fn new(
        users: Arc<dyn UserRepository>,
        sessions: Arc<dyn SessionService>,
        tokens: Arc<TokenService>,
    ) -> Self {
        Self {
            users,
            sessions,
            tokens,
        }
    }

    /// Verify a refresh token's signature and extract the user it belongs to
    fn refresh_token_owner(&self, refresh_token: &str) -> Result<Uuid, TokenError> {
        let claims = self.tokens.verify_refresh_token(refresh_token)?;
        Uuid::parse_str(&claims.sub).map_err(|_| TokenError::Invalid)
    }
}

/// Device label falls back to "unknown" when the client sends none
fn normalize_device_info(device_info: Option<String>) -> String {
    match device_info.as_deref().map(str::trim) {
        Some(info) if !info.is_empty() => info.to_string(),
        _ => "unknown".to_string(),
    }
}

#[async_trait]
impl AuthService for AuthServiceImpl {
    #[instrument(skip(self, request))]
    async fn signup(&self, request: SignupRequest) -> Result<AuthSession, AuthError> {
        let full_name = request.full_name.trim().to_string();
        let email = request.email.trim().to_lowercase();
        let password = request.password.trim().to_string();

        if full_name.is_empty() || email.is_empty() || password.is_empty() {
            return Err(AuthError::MissingFields);
        }

        // The plaintext password never reaches the repository
        let password_hash =
            hash(&password, DEFAULT_COST).map_err(|e| AuthError::Internal(e.to_string()))?;

        let user = self
            .users
            .create(NewUser {
                email,
                full_name,
                password_hash,
            })
            .await
            .map_err(|e| match e {
                RepositoryError::ConstraintViolation(_) => AuthError::EmailTaken,
                e => AuthError::Internal(e.to_string()),
            })?;

        debug!(user_id = %user.id, "User registered");

        let (token, expires_at) = self
            .tokens
            .sign_access_token(&user)
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        let refresh_token = self
            .sessions
            .issue(user.id, &normalize_device_info(request.device_info))
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        Ok(AuthSession {
            user: user.into(),
            access_token: AccessToken { token, expires_at },
            refresh_token,
        })
    }

    #[instrument(skip(self, request))]
    async fn login(&self, request: LoginRequest) -> Result<AuthSession, AuthError> {
        let email = request.email.trim().to_lowercase();
        let password = request.password.trim().to_string();

        if email.is_empty() || password.is_empty() {
            return Err(AuthError::MissingFields);
        }

        let user = self
            .users
            .find_by_email(&email)
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))?
            .ok_or(AuthError::UserNotFound)?;

        let password_matches = verify(&password, &user.password_hash)
            .map_err(|e| AuthError::Internal(e.to_string()))?;
        if !password_matches {
            warn!(user_id = %user.id, "Login with wrong password");
            return Err(AuthError::InvalidPassword);
        }

        let (token, expires_at) = self
            .tokens
            .sign_access_token(&user)
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        let refresh_token = self
            .sessions
            .issue(user.id, &normalize_device_info(request.device_info))
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        debug!(user_id = %user.id, "User logged in");

        Ok(AuthSession {
            user: user.into(),
            access_token: AccessToken { token, expires_at },
            refresh_token,
        })
    }

    #[instrument(skip(self, refresh_token))]
    async fn logout(&self, refresh_token: &str) -> Result<(), AuthError> {
        let user_id = self
            .refresh_token_owner(refresh_token)
            .map_err(|_| AuthError::InvalidRefreshToken)?;

        self.users
            .find_by_id(user_id)
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))?
            .ok_or(AuthError::UserNotFound)?;

        let removed = self
            .sessions
            .revoke(user_id, refresh_token)
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        if !removed {
            return Err(AuthError::InvalidRefreshToken);
        }

        debug!(user_id = %user_id, "User logged out");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn logout_all(&self, user_id: Uuid) -> Result<u64, AuthError> {
        let removed = self
            .sessions
            .revoke_all(user_id)
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        debug!(user_id = %user_id, removed, "Logged out from all devices");
        Ok(removed)
    }

    #[instrument(skip(self, refresh_token))]
    async fn refresh_access_token(&self, refresh_token: &str) -> Result<AccessToken, AuthError> {
        let user_id = self
            .refresh_token_owner(refresh_token)
            .map_err(|_| AuthError::RefreshNotActive)?;

        // A verified signature is not enough: the token must still be a
        // live session, not one revoked by logout or logoutall.
        self.sessions
            .find(user_id, refresh_token)
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))?
            .ok_or(AuthError::RefreshNotActive)?;

        let user = self
            .users
            .find_by_id(user_id)
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))?
            .ok_or(AuthError::UserNotFound)?;

        let (token, expires_at) = self
            .tokens
            .sign_access_token(&user)
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        Ok(AccessToken { token, expires_at })
    }

    #[instrument(skip(self, access_token))]
    async fn authenticate(&self, access_token: &str) -> Result<UserProfile, AuthError> {
        let claims = self
            .tokens
            .verify_access_token(access_token)
            .map_err(|_| AuthError::InvalidAccessToken)?;

        let user_id =
            Uuid::parse_str(&claims.sub).map_err(|_| AuthError::InvalidAccessToken)?;

        let user = self
            .users
            .find_by_id(user_id)
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))?
            .ok_or(AuthError::UserNotFound)?;

        Ok(user.into())
    }
}
