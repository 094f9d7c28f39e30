use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::models::auth::RefreshTokenEntry;
use crate::repositories::refresh_token_repository::RefreshTokenRepository;
use crate::services::token_service::TokenService;

/// Session service errors
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Token error: {0}")]
    Token(String),

    #[error("Database error: {0}")]
    Database(String),
}

/// Trait defining session store operations.
///
/// Each session is a refresh token bound to a (user, device) pair. A user
/// may hold sessions on any number of devices at once, but a repeat login
/// from a known device replaces that device's session instead of adding
/// another.
#[async_trait]
pub trait SessionService: Send + Sync {
    /// Mint a refresh token for the device and persist it, replacing any
    /// existing session for the same (user, device) pair
    async fn issue(
        &self,
        user_id: Uuid,
        device_info: &str,
    ) -> Result<RefreshTokenEntry, SessionError>;

    /// Remove the exactly-matching session; returns whether one existed
    async fn revoke(&self, user_id: Uuid, token: &str) -> Result<bool, SessionError>;

    /// Remove every session for the user; returns how many were removed
    async fn revoke_all(&self, user_id: Uuid) -> Result<u64, SessionError>;

    /// Exact-match lookup of a live session
    async fn find(
        &self,
        user_id: Uuid,
        token: &str,
    ) -> Result<Option<RefreshTokenEntry>, SessionError>;
}

/// Implementation of SessionService backed by the refresh token repository
pub struct SessionServiceImpl {
    tokens: Arc<TokenService>,
    refresh_tokens: Arc<dyn RefreshTokenRepository>,
}

impl SessionServiceImpl {
    pub fn new(
        tokens: Arc<TokenService>,
        refresh_tokens: Arc<dyn RefreshTokenRepository>,
    ) -> Self {
        Self {
            tokens,
            refresh_tokens,
        }
    }
}

#[async_trait]
impl SessionService for SessionServiceImpl {
    #[instrument(skip(self))]
    async fn issue(
        &self,
        user_id: Uuid,
        device_info: &str,
    ) -> Result<RefreshTokenEntry, SessionError> {
        let (token, expires_at) = self
            .tokens
            .sign_refresh_token(user_id)
            .map_err(|e| SessionError::Token(e.to_string()))?;

        let entry = RefreshTokenEntry {
            user_id,
            token,
            device_info: device_info.to_string(),
            expires_at,
        };

        self.refresh_tokens
            .upsert(entry.clone())
            .await
            .map_err(|e| SessionError::Database(e.to_string()))?;

        debug!(user_id = %user_id, device_info = %device_info, "Issued session");
        Ok(entry)
    }

    #[instrument(skip(self, token))]
    async fn revoke(&self, user_id: Uuid, token: &str) -> Result<bool, SessionError> {
        self.refresh_tokens
            .delete(user_id, token)
            .await
            .map_err(|e| SessionError::Database(e.to_string()))
    }

    #[instrument(skip(self))]
    async fn revoke_all(&self, user_id: Uuid) -> Result<u64, SessionError> {
        self.refresh_tokens
            .delete_all(user_id)
            .await
            .map_err(|e| SessionError::Database(e.to_string()))
    }

    #[instrument(skip(self, token))]
    async fn find(
        &self,
        user_id: Uuid,
        token: &str,
    ) -> Result<Option<RefreshTokenEntry>, SessionError> {
        self.refresh_tokens
            .find(user_id, token)
            .await
            .map_err(|e| SessionError::Database(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::refresh_token_repository::InMemoryRefreshTokenRepository;
    use chrono::{Duration, Utc};

    fn service_with_repo() -> (SessionServiceImpl, Arc<InMemoryRefreshTokenRepository>) {
        let tokens = Arc::new(TokenService::new(
            "access_secret".to_string(),
            "refresh_secret".to_string(),
        ));
        let repo = Arc::new(InMemoryRefreshTokenRepository::new());
        (SessionServiceImpl::new(tokens, repo.clone()), repo)
    }

    #[tokio::test]
    async fn test_issue_creates_findable_session() {
        let (service, _) = service_with_repo();
        let user_id = Uuid::new_v4();

        let entry = service.issue(user_id, "phone").await.unwrap();
        let found = service.find(user_id, &entry.token).await.unwrap();

        assert_eq!(found, Some(entry));
    }

    #[tokio::test]
    async fn test_issue_expiry_is_about_seven_days_out() {
        let (service, _) = service_with_repo();

        let entry = service.issue(Uuid::new_v4(), "phone").await.unwrap();
        let expected = Utc::now() + Duration::days(7);
        assert!((entry.expires_at - expected).num_seconds().abs() < 60);
    }

    #[tokio::test]
    async fn test_repeat_login_from_known_device_replaces_session() {
        let (service, repo) = service_with_repo();
        let user_id = Uuid::new_v4();

        let first = service.issue(user_id, "phone").await.unwrap();
        service.issue(user_id, "phone").await.unwrap();

        // Still exactly one session, bound to the latest token
        let entries = repo.list_for_user(user_id).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].device_info, first.device_info);
    }

    #[tokio::test]
    async fn test_logins_from_different_devices_coexist() {
        let (service, repo) = service_with_repo();
        let user_id = Uuid::new_v4();

        service.issue(user_id, "phone").await.unwrap();
        service.issue(user_id, "laptop").await.unwrap();

        assert_eq!(repo.list_for_user(user_id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_revoke_removes_only_that_session() {
        let (service, repo) = service_with_repo();
        let user_id = Uuid::new_v4();

        let phone = service.issue(user_id, "phone").await.unwrap();
        service.issue(user_id, "laptop").await.unwrap();

        assert!(service.revoke(user_id, &phone.token).await.unwrap());
        assert!(!service.revoke(user_id, &phone.token).await.unwrap());

        let entries = repo.list_for_user(user_id).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].device_info, "laptop");
    }

    #[tokio::test]
    async fn test_revoke_all_clears_every_device() {
        let (service, repo) = service_with_repo();
        let user_id = Uuid::new_v4();

        service.issue(user_id, "phone").await.unwrap();
        service.issue(user_id, "laptop").await.unwrap();
        service.issue(user_id, "tablet").await.unwrap();

        let removed = service.revoke_all(user_id).await.unwrap();
        assert_eq!(removed, 3);
        assert!(repo.list_for_user(user_id).await.unwrap().is_empty());
    }
}
