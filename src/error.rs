//! Typed errors: configuration, criteria, infrastructure, and the domain taxonomy services report.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid value for {name}: '{value}'")]
    InvalidVar { name: &'static str, value: String },
    #[error("validation: {0}")]
    Validation(String),
}

/// Malformed criteria. Raised before any query reaches the store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CriteriaError {
    #[error("invalid filter: {0}")]
    InvalidFilter(String),
    #[error("invalid pagination: {0}")]
    InvalidPagination(String),
}

/// Infrastructure failures from the storage layer and below.
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Criteria(#[from] CriteriaError),
    #[error("database: {0}")]
    Db(#[from] sqlx::Error),
    #[error("serialization: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("store: {0}")]
    Store(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Entity kinds named in not-found / already-exists outcomes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Resource {
    Event,
    Example,
}

impl std::fmt::Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Resource::Event => f.write_str("Event"),
            Resource::Example => f.write_str("Example"),
        }
    }
}

/// Outcome kinds carried in the `Left` side of every service result.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error("{0} not found")]
    NotFound(Resource),
    #[error("{0} already exists")]
    AlreadyExists(Resource),
    #[error("{0}")]
    InvalidState(String),
    #[error("event cancelled after {max_retries} retry attempts")]
    RetryLimitExceeded { max_retries: u32 },
    #[error("{0}")]
    InvalidFilter(String),
    #[error("{0}")]
    InvalidArgument(String),
    #[error("{0}")]
    Failure(String),
}

impl ServiceError {
    /// Wrap an infrastructure error raised while running `operation` (e.g. "create event").
    /// Criteria errors keep their own kind.
    pub fn from_app(operation: &str, err: AppError) -> Self {
        match err {
            AppError::Criteria(e) => ServiceError::InvalidFilter(e.to_string()),
            other => ServiceError::Failure(format!("failed to {}: {}", operation, other)),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::NotFound(_) => "not_found",
            ServiceError::AlreadyExists(_) => "already_exists",
            ServiceError::InvalidState(_) => "invalid_state",
            ServiceError::RetryLimitExceeded { .. } => "retry_limit_exceeded",
            ServiceError::InvalidFilter(_) => "invalid_filter",
            ServiceError::InvalidArgument(_) => "invalid_argument",
            ServiceError::Failure(_) => "failure",
        }
    }
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = match &self {
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::AlreadyExists(_) => StatusCode::CONFLICT,
            _ => StatusCode::BAD_REQUEST,
        };
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code().to_string(),
                message: self.to_string(),
            },
        };
        (status, Json(body)).into_response()
    }
}
