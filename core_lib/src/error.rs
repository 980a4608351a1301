//! Application error types and handling

use crate::methods::MethodError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Invalid check")]
    InvalidCheck,

    #[error("Invalid method identifier: {0}")]
    InvalidMethod(String),

    #[error("Method not found: {0}")]
    MethodNotFound(String),

    #[error("Check '{check}' failed: {source}")]
    CheckFailed {
        check: String,
        #[source]
        source: MethodError,
    },

    #[error("Duplicate check name: {0}")]
    DuplicateCheck(String),

    #[error("Check name '{0}' collides with a report field")]
    ReservedCheckName(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid route path '{path}': {reason}")]
    InvalidRoute { path: String, reason: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized | AppError::Authentication(_) => StatusCode::UNAUTHORIZED,
            AppError::CheckFailed { source, .. } => source.status(),
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_message = match self {
            AppError::Unauthorized => "Unauthorized".to_string(),
            AppError::Authentication(msg) => msg,
            AppError::InvalidCheck => "Invalid check".to_string(),
            AppError::InvalidMethod(msg) => {
                tracing::error!("Invalid method identifier: {}", msg);
                "Invalid check".to_string()
            }
            AppError::MethodNotFound(name) => {
                tracing::error!("Check method not registered: {}", name);
                "Internal server error".to_string()
            }
            AppError::CheckFailed { check, source } => {
                tracing::error!(check = %check, status = source.status().as_u16(), "Check failed: {}", source);
                source.message().to_string()
            }
            AppError::IoError(err) => {
                tracing::error!("IO error: {:?}", err);
                "Internal server error".to_string()
            }
            AppError::Other(err) => {
                tracing::error!("Unexpected error: {:?}", err);
                "Internal server error".to_string()
            }
            other => {
                tracing::error!("{}", other);
                "Internal server error".to_string()
            }
        };

        let body = Json(json!({
            "error": error_message,
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}
