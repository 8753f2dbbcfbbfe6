//! Error types and handling
//!
//! Common error types used across the application, and their mapping onto
//! the dashboard's `{status, code, message}` responses.

use crate::export::ExportError;
use crate::recorder::UnsupportedAction;
use crate::telemetry::StoreError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Application-wide error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Unknown channel: {0}")]
    UnknownChannel(String),

    #[error("Missing field: {0}")]
    MissingField(String),

    #[error("Unsupported recording action: {0}")]
    UnsupportedAction(String),

    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for AppError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::UnknownChannel(name) => AppError::UnknownChannel(name),
        }
    }
}

impl From<UnsupportedAction> for AppError {
    fn from(error: UnsupportedAction) -> Self {
        AppError::UnsupportedAction(error.0)
    }
}

impl AppError {
    pub fn code(&self) -> &'static str {
        match self {
            AppError::UnknownChannel(_) => "UNKNOWN_CHANNEL",
            AppError::MissingField(_) => "MISSING_FIELD",
            AppError::UnsupportedAction(_) => "UNSUPPORTED_ACTION",
            AppError::Export(_) => "EXPORT_ERROR",
            AppError::Serialization(_) => "SERIALIZATION_ERROR",
            AppError::Config(_) => "CONFIG_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::UnknownChannel(_) => StatusCode::NOT_FOUND,
            AppError::MissingField(_) | AppError::UnsupportedAction(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Error response for frontend
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: String,
    pub code: String,
    pub message: String,
}

impl From<&AppError> for ErrorResponse {
    fn from(error: &AppError) -> Self {
        // The dashboard script matches on this literal for bad actions
        let status = match error {
            AppError::UnsupportedAction(_) => "unknown action",
            _ => "error",
        };

        ErrorResponse {
            status: status.to_string(),
            code: error.code().to_string(),
            message: error.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("{}", self);
        } else {
            tracing::debug!("Rejected request: {}", self);
        }

        (status, Json(ErrorResponse::from(&self))).into_response()
    }
}

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;
