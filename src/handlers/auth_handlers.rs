use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use validator::Validate;

use crate::app::AppState;
use crate::handlers::validation_message;
use crate::middleware::auth_middleware::AuthenticatedUser;
use crate::models::auth::{AccessToken, AuthResponse, LoginRequest};
use crate::models::user::SignupRequest;
use crate::response::{ApiResponse, ErrorBody};
use crate::services::auth_service::AuthError;

const REFRESH_COOKIE: &str = "refreshToken";

/// Convert AuthError to HTTP response
impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = match self {
            AuthError::MissingFields
            | AuthError::MissingRefreshToken
            | AuthError::InvalidRefreshToken => StatusCode::BAD_REQUEST,
            AuthError::InvalidPassword
            | AuthError::InvalidAccessToken
            | AuthError::RefreshNotActive => StatusCode::UNAUTHORIZED,
            AuthError::UserNotFound => StatusCode::NOT_FOUND,
            AuthError::EmailTaken => StatusCode::CONFLICT,
            AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let message = match self {
            AuthError::Internal(_) => "Internal server error".to_string(),
            e => e.to_string(),
        };

        ErrorBody::new(status, &message).into_response()
    }
}

/// The refresh token travels only in this httpOnly cookie, scoped to the
/// whole site and pinned to the token's own seven-day lifetime.
fn refresh_cookie(token: &str) -> Cookie<'static> {
    Cookie::build((REFRESH_COOKIE, token.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Strict)
        .max_age(time::Duration::days(7))
        .build()
}

fn clear_refresh_cookie(jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build(REFRESH_COOKIE).path("/").build())
}

/// Handler for user signup
///
/// Registers a new account and opens a session for the signing-up device.
#[utoipa::path(
    post,
    path = "/api/v1/users/signup",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "User registered", body = AuthResponse),
        (status = 400, description = "Missing or invalid fields"),
        (status = 409, description = "Email already registered")
    ),
    tag = "auth"
)]
pub async fn signup_handler(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(request): Json<SignupRequest>,
) -> Result<(CookieJar, ApiResponse<AuthResponse>), Response> {
    if let Err(errors) = request.validate() {
        return Err(
            ErrorBody::new(StatusCode::BAD_REQUEST, &validation_message(&errors)).into_response(),
        );
    }

    let session = state
        .auth_service
        .signup(request)
        .await
        .map_err(|e| e.into_response())?;

    let jar = jar.add(refresh_cookie(&session.refresh_token.token));
    let body = AuthResponse {
        user: session.user,
        access_token: session.access_token.token,
    };

    Ok((
        jar,
        ApiResponse::created(body, "User registered successfully"),
    ))
}

/// Handler for user login
///
/// Verifies credentials and opens (or replaces) the device's session.
#[utoipa::path(
    post,
    path = "/api/v1/users/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Wrong password"),
        (status = 404, description = "No account for that email")
    ),
    tag = "auth"
)]
pub async fn login_handler(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(request): Json<LoginRequest>,
) -> Result<(CookieJar, ApiResponse<AuthResponse>), Response> {
    let session = state
        .auth_service
        .login(request)
        .await
        .map_err(|e| e.into_response())?;

    let jar = jar.add(refresh_cookie(&session.refresh_token.token));
    let body = AuthResponse {
        user: session.user,
        access_token: session.access_token.token,
    };

    Ok((jar, ApiResponse::ok(body, "User logged in successfully")))
}

/// Handler for logging out the current device
#[utoipa::path(
    post,
    path = "/api/v1/users/logout",
    responses(
        (status = 200, description = "Session closed"),
        (status = 400, description = "Missing or unknown refresh token")
    ),
    tag = "auth"
)]
pub async fn logout_handler(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, ApiResponse<()>), Response> {
    let token = jar
        .get(REFRESH_COOKIE)
        .map(|c| c.value().to_string())
        .ok_or_else(|| AuthError::MissingRefreshToken.into_response())?;

    state
        .auth_service
        .logout(&token)
        .await
        .map_err(|e| e.into_response())?;

    Ok((
        clear_refresh_cookie(jar),
        ApiResponse::ok((), "User logged out successfully"),
    ))
}

/// Handler for logging out every device at once
#[utoipa::path(
    post,
    path = "/api/v1/users/logoutall",
    responses(
        (status = 200, description = "All sessions closed"),
        (status = 401, description = "Missing or invalid access token")
    ),
    tag = "auth"
)]
pub async fn logout_all_handler(
    State(state): State<AppState>,
    Extension(authenticated): Extension<AuthenticatedUser>,
    jar: CookieJar,
) -> Result<(CookieJar, ApiResponse<()>), Response> {
    state
        .auth_service
        .logout_all(authenticated.user.id)
        .await
        .map_err(|e| e.into_response())?;

    Ok((
        clear_refresh_cookie(jar),
        ApiResponse::ok((), "Logged out from all devices successfully"),
    ))
}

/// Handler for minting a fresh access token from the refresh cookie
#[utoipa::path(
    post,
    path = "/api/v1/users/refresh-access-token",
    responses(
        (status = 200, description = "Fresh access token", body = AccessToken),
        (status = 400, description = "No refresh token cookie"),
        (status = 401, description = "Refresh token expired or revoked")
    ),
    tag = "auth"
)]
pub async fn refresh_access_token_handler(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<ApiResponse<AccessToken>, Response> {
    let token = jar
        .get(REFRESH_COOKIE)
        .map(|c| c.value().to_string())
        .ok_or_else(|| AuthError::MissingRefreshToken.into_response())?;

    let access_token = state
        .auth_service
        .refresh_access_token(&token)
        .await
        .map_err(|e| e.into_response())?;

    Ok(ApiResponse::ok(
        access_token,
        "Access token refreshed successfully",
    ))
}
