//! Request-boundary errors and the JSON body extractor.
//!
//! Every failure leaves the handler as `{"error": "..."}` with one of four statuses.

use std::fmt::Display;

use async_trait::async_trait;
use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::de::DeserializeOwned;

pub const ENDPOINT_NOT_FOUND: &str = "Endpoint not found";
pub const INVALID_JSON: &str = "Invalid JSON payload";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    ServiceUnavailable(String),
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    /// Log `source` at error level and build a 500. The client sees `public`, plus the
    /// source text only when `expose` is set.
    pub fn internal(public: &str, source: &dyn Display, expose: bool) -> Self {
        tracing::error!("{}: {}", public, source);
        if expose {
            ApiError::Internal(format!("{}: {}", public, source))
        } else {
            ApiError::Internal(public.to_string())
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        // Internal errors are logged with their source where they are built.
        if !matches!(self, ApiError::Internal(_)) {
            tracing::warn!("{} {}", status.as_u16(), self);
        }
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

/// JSON body parsed without regard to `Content-Type`. Any read or decode failure,
/// including wrong field types, is a uniform 400.
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state).await.map_err(|e| {
            tracing::warn!("Unreadable request body: {}", e);
            ApiError::Validation(INVALID_JSON.to_string())
        })?;
        serde_json::from_slice(&bytes).map(JsonBody).map_err(|e| {
            tracing::warn!("Rejected JSON body: {}", e);
            ApiError::Validation(INVALID_JSON.to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses() {
        assert_eq!(ApiError::Validation("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::NotFound("x".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::ServiceUnavailable("x".into()).status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(ApiError::Internal("x".into()).status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn internal_hides_source_unless_exposed() {
        let source = std::io::Error::new(std::io::ErrorKind::Other, "disk on fire");
        assert_eq!(ApiError::internal("Launch failed", &source, false).to_string(), "Launch failed");
        assert_eq!(
            ApiError::internal("Launch failed", &source, true).to_string(),
            "Launch failed: disk on fire"
        );
    }
}
