//! Domain-specific error types for study-guide

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Main error type for the study-guide service and client
#[derive(Error, Debug)]
pub enum StudyGuideError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("{message}")]
    Validation { message: String },

    #[error("Model error: {message}")]
    Model { message: String },

    #[error("Storage error: {message}")]
    Storage { message: String },

    #[error("Serialization error: {message}")]
    Serialization { message: String },

    #[error("HTTP request failed: {message}")]
    Http { message: String },

    #[error("Server returned {status}: {message}")]
    Upstream { status: u16, message: String },

    #[error("Timeout error: {operation} timed out after {timeout_ms}ms")]
    Timeout { operation: String, timeout_ms: u64 },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl StudyGuideError {
    pub fn validation(message: impl Into<String>) -> Self {
        StudyGuideError::Validation {
            message: message.into(),
        }
    }

    /// HTTP status this error maps to when returned from a handler
    pub fn status_code(&self) -> StatusCode {
        match self {
            StudyGuideError::Validation { .. } => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<anyhow::Error> for StudyGuideError {
    fn from(err: anyhow::Error) -> Self {
        StudyGuideError::Internal {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for StudyGuideError {
    fn from(err: serde_json::Error) -> Self {
        StudyGuideError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<reqwest::Error> for StudyGuideError {
    fn from(err: reqwest::Error) -> Self {
        StudyGuideError::Http {
            message: err.to_string(),
        }
    }
}

/// Unreadable request bodies are reported like any other bad input
impl From<JsonRejection> for StudyGuideError {
    fn from(rejection: JsonRejection) -> Self {
        StudyGuideError::Validation {
            message: format!("Invalid request body: {}", rejection.body_text()),
        }
    }
}

impl From<std::io::Error> for StudyGuideError {
    fn from(err: std::io::Error) -> Self {
        StudyGuideError::Storage {
            message: err.to_string(),
        }
    }
}

/// Convert StudyGuideError to the `{"error": ...}` body the page expects
impl IntoResponse for StudyGuideError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("request failed: {}", self);
        } else {
            tracing::debug!("request rejected: {}", self);
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// Result type alias for study-guide operations
pub type Result<T> = std::result::Result<T, StudyGuideError>;
