// src/application/error_handling.rs
//
// Error Handling for Commands
//
// ARCHITECTURE:
// - Maps internal errors → consumer-facing responses
// - Provides one error shape for every command
// - Storage internals stay in the log, not in the response

use serde::{Deserialize, Serialize};

use crate::application::dto::TaskResultDto;
use crate::error::AppError;

/// Standard error response for consumers
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub success: bool,
    pub error_type: ErrorType,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

/// Error categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorType {
    NotFound,

    /// Plan failed path-safety validation; details lists the violations
    Validation,

    /// Plan is not in a state that allows the request
    InvalidTransition,

    /// Consumer did not answer in time
    Timeout,

    /// Caller cancelled while waiting
    Aborted,

    /// Some rename tasks failed; details lists them
    PartialExecution,

    /// Transport or response problem on the confirmation channel
    Confirmation,

    Configuration,

    Database,

    FileSystem,

    Internal,
}

impl ErrorResponse {
    fn new(error_type: ErrorType, message: impl Into<String>) -> Self {
        Self {
            success: false,
            error_type,
            message: message.into(),
            details: None,
        }
    }

    fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn from_app_error(error: AppError) -> Self {
        match error {
            AppError::NotFound => Self::new(ErrorType::NotFound, "Plan not found"),

            AppError::Validation(report) => {
                let violations: Vec<String> =
                    report.violations.iter().map(|v| v.to_string()).collect();
                Self::new(ErrorType::Validation, "Plan failed validation")
                    .with_details(serde_json::json!(violations))
            }

            AppError::Domain(domain_error) => {
                Self::new(ErrorType::Validation, domain_error.to_string())
            }

            AppError::InvalidTransition { plan_id, from, to } => Self::new(
                ErrorType::InvalidTransition,
                format!("Plan {} is {}, cannot become {}", plan_id, from, to),
            ),

            AppError::Timeout { timeout_ms } => Self::new(
                ErrorType::Timeout,
                format!("No confirmation received within {}ms", timeout_ms),
            ),

            AppError::Aborted => Self::new(ErrorType::Aborted, "Confirmation was aborted"),

            AppError::PartialExecution { plan_id, failures } => {
                let failures: Vec<TaskResultDto> =
                    failures.iter().map(TaskResultDto::from).collect();
                Self::new(
                    ErrorType::PartialExecution,
                    format!("{} rename task(s) of plan {} failed", failures.len(), plan_id),
                )
                .with_details(serde_json::json!(failures))
            }

            AppError::Confirmation(message) => {
                log::warn!("Confirmation channel error: {}", message);
                Self::new(ErrorType::Confirmation, message)
            }

            AppError::Config(message) => Self::new(ErrorType::Configuration, message),

            AppError::Database(db_error) => {
                log::error!("Database error: {:?}", db_error);
                Self::new(ErrorType::Database, "Database operation failed")
            }

            AppError::Pool(pool_error) => {
                log::error!("Connection pool error: {}", pool_error);
                Self::new(ErrorType::Database, "Database connection failed")
            }

            AppError::Serialization(serde_error) => {
                log::error!("Serialization error: {:?}", serde_error);
                Self::new(ErrorType::Internal, "Data serialization failed")
            }

            AppError::Io(io_error) => {
                log::error!("IO error: {:?}", io_error);
                Self::new(ErrorType::FileSystem, io_error.to_string())
            }

            AppError::Other(message) => {
                log::error!("Other error: {}", message);
                Self::new(ErrorType::Internal, message)
            }
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorType::Validation, message)
    }

    pub fn not_found(resource: &str) -> Self {
        Self::new(ErrorType::NotFound, format!("{} not found", resource))
    }
}

impl From<AppError> for ErrorResponse {
    fn from(error: AppError) -> Self {
        Self::from_app_error(error)
    }
}

impl std::fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.error_type, self.message)
    }
}

impl std::error::Error for ErrorResponse {}

/// Helper trait to convert Results to ErrorResponse
pub trait ToErrorResponse<T> {
    fn to_error_response(self) -> Result<T, ErrorResponse>;
}

impl<T> ToErrorResponse<T> for Result<T, AppError> {
    fn to_error_response(self) -> Result<T, ErrorResponse> {
        self.map_err(ErrorResponse::from_app_error)
    }
}
