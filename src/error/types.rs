// src/error/types.rs
use crate::confirmation::ConfirmationError;
use crate::domain::{DomainError, PlanStatus, TaskResult, ValidationReport};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Pool error: {0}")]
    Pool(String),

    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    #[error("Validation failed: {0}")]
    Validation(ValidationReport),

    #[error("Invalid transition for plan {plan_id}: {from} -> {to}")]
    InvalidTransition {
        plan_id: Uuid,
        from: PlanStatus,
        to: PlanStatus,
    },

    #[error("Confirmation timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Confirmation aborted by caller")]
    Aborted,

    #[error("Plan {plan_id}: {} of the rename tasks failed", .failures.len())]
    PartialExecution {
        plan_id: Uuid,
        failures: Vec<TaskResult>,
    },

    #[error("Confirmation error: {0}")]
    Confirmation(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Resource not found")]
    NotFound,

    #[error("Other error: {0}")]
    Other(String),
}

impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl From<ValidationReport> for AppError {
    fn from(report: ValidationReport) -> Self {
        AppError::Validation(report)
    }
}

impl From<ConfirmationError> for AppError {
    fn from(err: ConfirmationError) -> Self {
        match err {
            ConfirmationError::Timeout { timeout_ms } => AppError::Timeout { timeout_ms },
            ConfirmationError::Aborted => AppError::Aborted,
            other => AppError::Confirmation(other.to_string()),
        }
    }
}

impl From<uuid::Error> for AppError {
    fn from(err: uuid::Error) -> Self {
        AppError::Other(format!("UUID error: {}", err))
    }
}

impl From<chrono::ParseError> for AppError {
    fn from(err: chrono::ParseError) -> Self {
        AppError::Other(format!("Date parse error: {}", err))
    }
}

impl From<r2d2::Error> for AppError {
    fn from(err: r2d2::Error) -> Self {
        AppError::Pool(err.to_string())
    }
}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        AppError::Config(err.to_string())
    }
}

pub type AppResult<T> = Result<T, AppError>;
