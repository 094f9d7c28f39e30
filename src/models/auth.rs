use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::user::UserProfile;

/// Request payload for user login
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    #[schema(example = "iPhone 15")]
    pub device_info: Option<String>,
}

/// Short-lived credential proving identity for a single request
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccessToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// One live refresh token for a (user, device) pair.
///
/// At most one entry exists per distinct `device_info` value per user;
/// re-issuing for a known device replaces the token and expiry in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshTokenEntry {
    pub user_id: Uuid,
    pub token: String,
    pub device_info: String,
    pub expires_at: DateTime<Utc>,
}

/// Outcome of a successful signup or login: the sanitized user, a fresh
/// access token, and the device-scoped refresh token destined for a cookie.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user: UserProfile,
    pub access_token: AccessToken,
    pub refresh_token: RefreshTokenEntry,
}

/// Response body for signup and login; the refresh token travels only in
/// the httpOnly cookie, never in the body.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub user: UserProfile,
    pub access_token: String,
}
