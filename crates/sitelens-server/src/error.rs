//! API errors and their HTTP mapping.

use std::time::Duration;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use sitelens::ExtractError;

#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    MalformedInput(String),

    #[error("extraction did not finish within {}ms", .0.as_millis())]
    Timeout(Duration),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::MalformedInput(_) => "malformed_input",
            ApiError::Timeout(_) => "timeout",
            ApiError::Internal(_) => "internal",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MalformedInput(_) => StatusCode::BAD_REQUEST,
            ApiError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ExtractError> for ApiError {
    fn from(e: ExtractError) -> Self {
        match e {
            ExtractError::MalformedInput(msg) => ApiError::MalformedInput(msg),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "error": { "code": self.code(), "message": self.to_string() }
        });
        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_and_statuses() {
        let e: ApiError = ExtractError::MalformedInput("bad".into()).into();
        assert_eq!(e.code(), "malformed_input");
        assert_eq!(e.status(), StatusCode::BAD_REQUEST);
        let t = ApiError::Timeout(Duration::from_secs(120));
        assert_eq!(t.status(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(t.to_string(), "extraction did not finish within 120000ms");
    }
}
