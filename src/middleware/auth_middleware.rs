use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;

use crate::models::user::UserProfile;
use crate::response::ErrorBody;
use crate::services::auth_service::{AuthError, AuthService};

/// Extension type carrying the authenticated user into protected handlers
#[derive(Clone, Debug)]
pub struct AuthenticatedUser {
    pub user: UserProfile,
}

/// Gateway middleware guarding every protected route.
///
/// The access token is read from the `accessToken` cookie first, then from
/// the `Authorization: Bearer` header. Verification is stateless; only the
/// user lookup touches the database.
pub async fn auth_middleware(
    State(auth_service): State<Arc<dyn AuthService>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, GatewayError> {
    let token = jar
        .get("accessToken")
        .map(|c| c.value().to_string())
        .or_else(|| bearer_token(request.headers()))
        .ok_or(GatewayError::MissingToken)?;

    let user = auth_service
        .authenticate(&token)
        .await
        .map_err(|e| match e {
            AuthError::UserNotFound => GatewayError::UserNotFound,
            // Every verification failure collapses into one response so a
            // caller cannot distinguish expired from forged tokens
            _ => GatewayError::InvalidToken,
        })?;

    request.extensions_mut().insert(AuthenticatedUser { user });

    Ok(next.run(request).await)
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|t| t.to_string())
}

/// Gateway errors
#[derive(Debug)]
pub enum GatewayError {
    MissingToken,
    InvalidToken,
    UserNotFound,
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            GatewayError::MissingToken => {
                (StatusCode::UNAUTHORIZED, "Unauthorized: No token provided")
            }
            GatewayError::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                "Unauthorized: Invalid or expired token",
            ),
            GatewayError::UserNotFound => (StatusCode::NOT_FOUND, "User not found"),
        };

        ErrorBody::new(status, message).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::SignupRequest;
    use crate::repositories::refresh_token_repository::InMemoryRefreshTokenRepository;
    use crate::repositories::user_repository::InMemoryUserRepository;
    use crate::services::auth_service::AuthServiceImpl;
    use crate::services::session_service::SessionServiceImpl;
    use crate::services::token_service::TokenService;
    use axum::{
        body::Body,
        http::Request,
        middleware,
        routing::get,
        Extension, Json, Router,
    };
    use serde_json::json;
    use tower::ServiceExt;

    async fn protected_handler(
        Extension(authenticated): Extension<AuthenticatedUser>,
    ) -> Json<serde_json::Value> {
        Json(json!({ "email": authenticated.user.email }))
    }

    struct Fixture {
        app: Router,
        auth_service: Arc<dyn AuthService>,
        users: Arc<InMemoryUserRepository>,
    }

    fn fixture() -> Fixture {
        let tokens = Arc::new(TokenService::new(
            "access_secret".to_string(),
            "refresh_secret".to_string(),
        ));
        let users = Arc::new(InMemoryUserRepository::new());
        let sessions = Arc::new(SessionServiceImpl::new(
            tokens.clone(),
            Arc::new(InMemoryRefreshTokenRepository::new()),
        ));
        let auth_service: Arc<dyn AuthService> =
            Arc::new(AuthServiceImpl::new(users.clone(), sessions, tokens));

        let app = Router::new()
            .route("/protected", get(protected_handler))
            .layer(middleware::from_fn_with_state(
                auth_service.clone(),
                auth_middleware,
            ));

        Fixture {
            app,
            auth_service,
            users,
        }
    }

    async fn signup(auth_service: &Arc<dyn AuthService>) -> crate::models::auth::AuthSession {
        auth_service
            .signup(SignupRequest {
                full_name: "Test User".to_string(),
                email: "test@example.com".to_string(),
                password: "secret123".to_string(),
                device_info: None,
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_request_with_bearer_token_passes() {
        let f = fixture();
        let session = signup(&f.auth_service).await;

        let request = Request::builder()
            .uri("/protected")
            .header(
                "Authorization",
                format!("Bearer {}", session.access_token.token),
            )
            .body(Body::empty())
            .unwrap();

        let response = f.app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["email"], "test@example.com");
    }

    #[tokio::test]
    async fn test_request_with_cookie_token_passes() {
        let f = fixture();
        let session = signup(&f.auth_service).await;

        let request = Request::builder()
            .uri("/protected")
            .header(
                "Cookie",
                format!("accessToken={}", session.access_token.token),
            )
            .body(Body::empty())
            .unwrap();

        let response = f.app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_request_without_token_is_unauthorized() {
        let f = fixture();

        let request = Request::builder()
            .uri("/protected")
            .body(Body::empty())
            .unwrap();

        let response = f.app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["message"], "Unauthorized: No token provided");
    }

    #[tokio::test]
    async fn test_request_with_garbage_token_is_unauthorized() {
        let f = fixture();

        let request = Request::builder()
            .uri("/protected")
            .header("Authorization", "Bearer garbage")
            .body(Body::empty())
            .unwrap();

        let response = f.app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["message"], "Unauthorized: Invalid or expired token");
    }

    #[tokio::test]
    async fn test_token_for_deleted_user_is_not_found() {
        let f = fixture();
        let session = signup(&f.auth_service).await;

        f.users.remove(session.user.id);

        let request = Request::builder()
            .uri("/protected")
            .header(
                "Authorization",
                format!("Bearer {}", session.access_token.token),
            )
            .body(Body::empty())
            .unwrap();

        let response = f.app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
