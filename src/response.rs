use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Success envelope returned by every endpoint: `{status, data, message}`
/// with the HTTP status mirroring the logical status.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    #[serde(skip)]
    code: StatusCode,
    pub status: u16,
    pub data: T,
    pub message: String,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(code: StatusCode, data: T, message: &str) -> Self {
        Self {
            code,
            status: code.as_u16(),
            data,
            message: message.to_string(),
        }
    }

    pub fn ok(data: T, message: &str) -> Self {
        Self::new(StatusCode::OK, data, message)
    }

    pub fn created(data: T, message: &str) -> Self {
        Self::new(StatusCode::CREATED, data, message)
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (self.code, Json(self)).into_response()
    }
}

/// Error envelope: `{status, message}`
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub status: u16,
    pub message: String,
}

impl ErrorBody {
    pub fn new(code: StatusCode, message: &str) -> Self {
        Self {
            status: code.as_u16(),
            message: message.to_string(),
        }
    }

    pub fn into_response(self) -> Response {
        let code = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (code, Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_envelope_mirrors_status() {
        let response = ApiResponse::created(serde_json::json!({"id": 1}), "created");
        assert_eq!(response.status, 201);
        let http = response.into_response();
        assert_eq!(http.status(), StatusCode::CREATED);
    }

    #[test]
    fn test_error_envelope_mirrors_status() {
        let body = ErrorBody::new(StatusCode::CONFLICT, "Email already exists");
        assert_eq!(body.status, 409);
        let http = body.into_response();
        assert_eq!(http.status(), StatusCode::CONFLICT);
    }
}
