use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
/// Every variant short-circuits the request; suggestion failures never reach
/// this type (see `llm_client::LlmError`).
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Extraction(String),

    #[error("Could not extract or clean text from the file.")]
    EmptyContent,

    #[error("{0}")]
    ModelUnavailable(String),

    #[error("Rate limit exceeded. Please try again later.")]
    RateLimited,

    #[error("Result store error: {0}")]
    Store(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::EmptyContent => StatusCode::BAD_REQUEST,
            AppError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            AppError::Extraction(_)
            | AppError::ModelUnavailable(_)
            | AppError::Store(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            AppError::Validation(msg) => {
                tracing::warn!("File validation failed: {msg}");
                msg.clone()
            }
            AppError::EmptyContent => {
                tracing::warn!("Could not extract or clean text from file");
                self.to_string()
            }
            AppError::RateLimited => {
                tracing::warn!("Rate limit exceeded");
                self.to_string()
            }
            AppError::Extraction(msg) => {
                tracing::error!("Text extraction error: {msg}");
                msg.clone()
            }
            AppError::ModelUnavailable(msg) => {
                tracing::error!("Model unavailable: {msg}");
                msg.clone()
            }
            AppError::Store(msg) => {
                tracing::error!("Result store error: {msg}");
                "Could not store the analysis result. Please try again.".to_string()
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                format!("An error occurred: {e}")
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            AppError::Validation("No selected file".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AppError::EmptyContent.status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::RateLimited.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            AppError::ModelUnavailable("missing".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::Extraction("bad pdf".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_error_body_shape() {
        let response = AppError::Validation("Invalid PDF file".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["error"], "Invalid PDF file");
    }
}
