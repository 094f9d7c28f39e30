use async_trait::async_trait;
use sqlx::{PgPool, Row};
use std::sync::Mutex;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::models::auth::RefreshTokenEntry;

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

/// Trait defining refresh token repository operations.
///
/// The backing store enforces at most one entry per (user, device); `upsert`
/// must replace an existing device entry atomically so that two concurrent
/// logins from different devices never lose each other's update.
#[async_trait]
pub trait RefreshTokenRepository: Send + Sync {
    /// Insert the entry, or replace the token and expiry of the existing
    /// entry for the same (user, device) pair
    async fn upsert(&self, entry: RefreshTokenEntry) -> Result<(), RepositoryError>;

    /// Exact-match lookup of a live entry
    async fn find(
        &self,
        user_id: Uuid,
        token: &str,
    ) -> Result<Option<RefreshTokenEntry>, RepositoryError>;

    /// Delete the exactly-matching entry; returns whether one was removed
    async fn delete(&self, user_id: Uuid, token: &str) -> Result<bool, RepositoryError>;

    /// Delete every entry for the user; returns how many were removed
    async fn delete_all(&self, user_id: Uuid) -> Result<u64, RepositoryError>;

    /// All live entries for the user, oldest first
    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<RefreshTokenEntry>, RepositoryError>;
}

/// PostgreSQL implementation of RefreshTokenRepository
pub struct PostgresRefreshTokenRepository {
    pool: PgPool,
}

impl PostgresRefreshTokenRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RefreshTokenRepository for PostgresRefreshTokenRepository {
    #[instrument(skip(self, entry))]
    async fn upsert(&self, entry: RefreshTokenEntry) -> Result<(), RepositoryError> {
        debug!(user_id = %entry.user_id, device_info = %entry.device_info, "Upserting refresh token");

        // Single atomic statement: the replace-by-device read-modify-write
        // must not interleave with a concurrent login on another device.
        sqlx::query(
            r#"
            INSERT INTO refresh_tokens (user_id, device_info, token, expires_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id, device_info)
            DO UPDATE SET token = EXCLUDED.token, expires_at = EXCLUDED.expires_at
            "#,
        )
        .bind(entry.user_id)
        .bind(&entry.device_info)
        .bind(&entry.token)
        .bind(entry.expires_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to upsert refresh token");
            RepositoryError::DatabaseError(e.to_string())
        })?;

        Ok(())
    }

    #[instrument(skip(self, token))]
    async fn find(
        &self,
        user_id: Uuid,
        token: &str,
    ) -> Result<Option<RefreshTokenEntry>, RepositoryError> {
        let row = sqlx::query(
            r#"
            SELECT user_id, device_info, token, expires_at
            FROM refresh_tokens
            WHERE user_id = $1 AND token = $2
            "#,
        )
        .bind(user_id)
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        Ok(row.map(|row| RefreshTokenEntry {
            user_id: row.get("user_id"),
            device_info: row.get("device_info"),
            token: row.get("token"),
            expires_at: row.get("expires_at"),
        }))
    }

    #[instrument(skip(self, token))]
    async fn delete(&self, user_id: Uuid, token: &str) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE user_id = $1 AND token = $2")
            .bind(user_id)
            .bind(token)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                warn!(error = %e, user_id = %user_id, "Failed to delete refresh token");
                RepositoryError::DatabaseError(e.to_string())
            })?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self))]
    async fn delete_all(&self, user_id: Uuid) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                warn!(error = %e, user_id = %user_id, "Failed to clear refresh tokens");
                RepositoryError::DatabaseError(e.to_string())
            })?;

        debug!(user_id = %user_id, removed = result.rows_affected(), "Cleared refresh tokens");
        Ok(result.rows_affected())
    }

    #[instrument(skip(self))]
    async fn list_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<RefreshTokenEntry>, RepositoryError> {
        let rows = sqlx::query(
            r#"
            SELECT user_id, device_info, token, expires_at
            FROM refresh_tokens
            WHERE user_id = $1
            ORDER BY created_at
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(|row| RefreshTokenEntry {
                user_id: row.get("user_id"),
                device_info: row.get("device_info"),
                token: row.get("token"),
                expires_at: row.get("expires_at"),
            })
            .collect())
    }
}

/// In-memory implementation of RefreshTokenRepository for development and
/// testing. Keeps entries in insertion order, mirroring the ordered
/// collection the persistence layer maintains per user.
pub struct InMemoryRefreshTokenRepository {
    entries: Mutex<Vec<RefreshTokenEntry>>,
}

impl Default for InMemoryRefreshTokenRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryRefreshTokenRepository {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl RefreshTokenRepository for InMemoryRefreshTokenRepository {
    async fn upsert(&self, entry: RefreshTokenEntry) -> Result<(), RepositoryError> {
        let mut entries = self.entries.lock().unwrap();

        match entries
            .iter_mut()
            .find(|e| e.user_id == entry.user_id && e.device_info == entry.device_info)
        {
            Some(existing) => {
                existing.token = entry.token;
                existing.expires_at = entry.expires_at;
            }
            None => entries.push(entry),
        }

        Ok(())
    }

    async fn find(
        &self,
        user_id: Uuid,
        token: &str,
    ) -> Result<Option<RefreshTokenEntry>, RepositoryError> {
        let entries = self.entries.lock().unwrap();
        Ok(entries
            .iter()
            .find(|e| e.user_id == user_id && e.token == token)
            .cloned())
    }

    async fn delete(&self, user_id: Uuid, token: &str) -> Result<bool, RepositoryError> {
        let mut entries = self.entries.lock().unwrap();
        let before = entries.len();
        entries.retain(|e| !(e.user_id == user_id && e.token == token));
        Ok(entries.len() < before)
    }

    async fn delete_all(&self, user_id: Uuid) -> Result<u64, RepositoryError> {
        let mut entries = self.entries.lock().unwrap();
        let before = entries.len();
        entries.retain(|e| e.user_id != user_id);
        Ok((before - entries.len()) as u64)
    }

    async fn list_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<RefreshTokenEntry>, RepositoryError> {
        let entries = self.entries.lock().unwrap();
        Ok(entries
            .iter()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn entry(user_id: Uuid, device_info: &str, token: &str) -> RefreshTokenEntry {
        RefreshTokenEntry {
            user_id,
            token: token.to_string(),
            device_info: device_info.to_string(),
            expires_at: Utc::now() + Duration::days(7),
        }
    }

    #[tokio::test]
    async fn test_upsert_replaces_entry_for_known_device() {
        let repo = InMemoryRefreshTokenRepository::new();
        let user_id = Uuid::new_v4();

        repo.upsert(entry(user_id, "phone", "token-1")).await.unwrap();
        repo.upsert(entry(user_id, "phone", "token-2")).await.unwrap();

        let entries = repo.list_for_user(user_id).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].token, "token-2");
    }

    #[tokio::test]
    async fn test_upsert_appends_entry_for_new_device() {
        let repo = InMemoryRefreshTokenRepository::new();
        let user_id = Uuid::new_v4();

        repo.upsert(entry(user_id, "phone", "token-1")).await.unwrap();
        repo.upsert(entry(user_id, "laptop", "token-2")).await.unwrap();

        let entries = repo.list_for_user(user_id).await.unwrap();
        assert_eq!(entries.len(), 2);
    }

    #[tokio::test]
    async fn test_delete_removes_exact_token_only() {
        let repo = InMemoryRefreshTokenRepository::new();
        let user_id = Uuid::new_v4();

        repo.upsert(entry(user_id, "phone", "token-1")).await.unwrap();
        repo.upsert(entry(user_id, "laptop", "token-2")).await.unwrap();

        assert!(repo.delete(user_id, "token-1").await.unwrap());
        assert!(!repo.delete(user_id, "token-1").await.unwrap());

        let entries = repo.list_for_user(user_id).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].device_info, "laptop");
    }

    #[tokio::test]
    async fn test_delete_all_clears_only_that_user() {
        let repo = InMemoryRefreshTokenRepository::new();
        let user_a = Uuid::new_v4();
        let user_b = Uuid::new_v4();

        repo.upsert(entry(user_a, "phone", "a-1")).await.unwrap();
        repo.upsert(entry(user_a, "laptop", "a-2")).await.unwrap();
        repo.upsert(entry(user_b, "phone", "b-1")).await.unwrap();

        let removed = repo.delete_all(user_a).await.unwrap();
        assert_eq!(removed, 2);
        assert!(repo.list_for_user(user_a).await.unwrap().is_empty());
        assert_eq!(repo.list_for_user(user_b).await.unwrap().len(), 1);
    }
}
