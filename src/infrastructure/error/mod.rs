use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::domain::{SendResult, ValidationErrors, Violation};
use crate::store::StoreError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),

    /// A send that stopped after some messages were already queued
    #[error("Partial dispatch ({} queued): {cause}", .partial.messages_queued)]
    PartialDispatch {
        partial: SendResult,
        cause: Box<AppError>,
    },
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { .. } => AppError::NotFound(err.to_string()),
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl AppError {
    pub fn partial(partial: SendResult, cause: AppError) -> Self {
        AppError::PartialDispatch {
            partial,
            cause: Box::new(cause),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Config(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::PartialDispatch { cause, .. } => cause.status_code(),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::Config(_) => "CONFIG_ERROR",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Internal(_) => "INTERNAL_ERROR",
            AppError::PartialDispatch { cause, .. } => cause.code(),
        }
    }

    /// Messages queued before the failure, if this error ended a send
    pub fn partial_result(&self) -> Option<&SendResult> {
        match self {
            AppError::PartialDispatch { partial, .. } => Some(partial),
            _ => None,
        }
    }

    /// The error that ended a send, or `self` for every other error
    pub fn root_cause(&self) -> &AppError {
        match self {
            AppError::PartialDispatch { cause, .. } => cause.root_cause(),
            other => other,
        }
    }

    fn client_message(&self) -> String {
        match self {
            AppError::Config(_) if is_production() => "Configuration error".to_string(),
            AppError::Config(e) => e.to_string(),
            AppError::Validation(e) => e.to_string(),
            AppError::NotFound(msg) => msg.clone(),
            AppError::Internal(_) if is_production() => "Internal server error".to_string(),
            AppError::Internal(msg) => msg.clone(),
            AppError::PartialDispatch { cause, .. } => cause.client_message(),
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Serialize)]
struct ErrorBody {
    code: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    violations: Option<Vec<Violation>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    partial: Option<SendResult>,
}

/// Check if running in production mode (based on RUN_MODE env var)
fn is_production() -> bool {
    std::env::var("RUN_MODE")
        .map(|m| m == "production" || m == "prod")
        .unwrap_or(false)
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();

        // Always log the detailed error server-side
        tracing::error!(
            code = %code,
            status = %status.as_u16(),
            message = %self,
            "API error"
        );

        let violations = match self.root_cause() {
            AppError::Validation(errors) => Some(errors.violations().to_vec()),
            _ => None,
        };

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message: self.client_message(),
                violations,
                partial: self.partial_result().cloned(),
            },
        };

        (status, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
