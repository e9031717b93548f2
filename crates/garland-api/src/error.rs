//! API error responses.
//!
//! Clients see a status code and a short message in a fixed JSON shape;
//! the underlying cause stays in the logs.

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use garland_store::StoreError;
use serde_json::json;

use crate::pipeline::PipelineError;

/// Result alias for handler functions.
pub type ApiResult<T> = Result<T, ApiError>;

/// An error carried to the client as `{"error": true, "message": ...}`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    /// Optional `Cache-Control` for cacheable negative responses.
    pub cache_control: Option<&'static str>,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            cache_control: None,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    /// A 500 whose public message is `context`; the cause goes to the
    /// logs only.
    pub fn internal(context: &str, err: impl std::fmt::Display) -> Self {
        tracing::error!(error = %err, "{context}");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, context)
    }

    /// Attach a `Cache-Control` header to the error response.
    pub fn with_cache_control(mut self, value: &'static str) -> Self {
        self.cache_control = Some(value);
        self
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": true,
            "message": self.message,
        }));
        let mut response = (self.status, body).into_response();
        if let Some(cc) = self.cache_control {
            response
                .headers_mut()
                .insert(header::CACHE_CONTROL, HeaderValue::from_static(cc));
        }
        response
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::internal("storage error", err)
    }
}

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::InvalidProof { .. } => {
                ApiError::bad_request("Unable to generate proof for tree")
            }
            PipelineError::Merkle(_) => ApiError::bad_request("No leaves provided"),
            PipelineError::Cancelled | PipelineError::Join => {
                ApiError::internal("proof generation failed", err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn error_body_shape() {
        let response = ApiError::bad_request("missing root").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], true);
        assert_eq!(body["message"], "missing root");
    }

    #[test]
    fn cache_control_is_attached() {
        let response = ApiError::not_found("root not found for proofs")
            .with_cache_control("public, max-age=60")
            .into_response();
        assert_eq!(
            response.headers().get(header::CACHE_CONTROL).unwrap(),
            "public, max-age=60"
        );
    }
}
