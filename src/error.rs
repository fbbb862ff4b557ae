//! Error types for sitemap-tasks
//!
//! This module provides error handling for the library, including:
//! - The task taxonomy (invalid input, unknown task, result not ready, ...)
//! - HTTP status code mapping for API integration
//! - Structured error responses with machine-readable error codes

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Result type alias for sitemap-tasks operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for sitemap-tasks
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "tasks_file")
        key: Option<String>,
    },

    /// Malformed or missing request parameters
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A resource other than a task was not found (e.g. a scan directory)
    #[error("not found: {0}")]
    NotFound(String),

    /// Task lifecycle error
    #[error("{0}")]
    Task(#[from] TaskError),

    /// A work producer attempt failed
    #[error("producer failed: {0}")]
    Producer(String),

    /// The task watchdog fired before the task finished
    #[error("timeout")]
    Timeout,

    /// No producer is available for the task type
    #[error("unsupported task type: {0}")]
    Unsupported(String),

    /// Shutdown in progress - not accepting new tasks
    #[error("shutdown in progress: not accepting new tasks")]
    ShuttingDown,

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Network error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// API server error
    #[error("API server error: {0}")]
    ApiServerError(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Task-related errors
#[derive(Debug, Error)]
pub enum TaskError {
    /// Task not found in the store
    #[error("task {id} not found")]
    NotFound {
        /// The task ID that was not found
        id: String,
    },

    /// Result requested before the task succeeded
    #[error("task {id} is not ready (status: {status})")]
    NotReady {
        /// The task ID
        id: String,
        /// The current status (e.g. "processing")
        status: String,
    },

    /// Cannot perform operation in current state
    #[error("cannot {operation} task {id} in state {current_state}")]
    InvalidState {
        /// The task ID
        id: String,
        /// The operation that was attempted (e.g., "delete")
        operation: String,
        /// The current state that prevents the operation
        current_state: String,
    },
}

/// API error response format
///
/// # Example JSON Response
///
/// ```json
/// {
///   "error": {
///     "code": "task_not_found",
///     "message": "task 3f1c... not found",
///     "details": {
///       "task_id": "3f1c..."
///     }
///   }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// The error details
    pub error: ErrorDetail,
}

/// Detailed error information for API responses
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "not_found", "invalid_input")
    pub code: String,

    /// Human-readable error message
    pub message: String,

    /// Optional additional context about the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Create a new API error with code and message
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    /// Create an API error with additional details
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: Some(details),
            },
        }
    }

    /// Create a "not found" error
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::new("not_found", format!("{} not found", resource.into()))
    }

    /// Create a "validation error" error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new("invalid_input", message)
    }

    /// Create an "internal server error"
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new("internal_error", message)
    }
}

/// Convert errors to HTTP status codes for API responses
pub trait ToHttpStatus {
    /// Get the HTTP status code for this error
    fn status_code(&self) -> u16;

    /// Get the machine-readable error code
    fn error_code(&self) -> &str;
}

impl ToHttpStatus for Error {
    fn status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - caller's fault
            Error::Config { .. } => 400,
            Error::InvalidInput(_) => 400,

            // 404 Not Found
            Error::NotFound(_) => 404,
            Error::Task(TaskError::NotFound { .. }) => 404,

            // 409 Conflict - task not in a state that allows the operation
            Error::Task(TaskError::NotReady { .. }) => 409,
            Error::Task(TaskError::InvalidState { .. }) => 409,

            // 422 Unprocessable Entity
            Error::Unsupported(_) => 422,

            // 502 Bad Gateway - upstream fetch or producer failed
            Error::Producer(_) => 502,
            Error::Network(_) => 502,

            // 503 Service Unavailable
            Error::ShuttingDown => 503,

            // 504 Gateway Timeout
            Error::Timeout => 504,

            // 500 Internal Server Error
            Error::Io(_) => 500,
            Error::Serialization(_) => 500,
            Error::ApiServerError(_) => 500,
            Error::Other(_) => 500,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::Config { .. } => "config_error",
            Error::InvalidInput(_) => "invalid_input",
            Error::NotFound(_) => "not_found",
            Error::Task(e) => match e {
                TaskError::NotFound { .. } => "task_not_found",
                TaskError::NotReady { .. } => "not_ready",
                TaskError::InvalidState { .. } => "invalid_state",
            },
            Error::Producer(_) => "producer_failure",
            Error::Timeout => "timeout",
            Error::Unsupported(_) => "unsupported",
            Error::ShuttingDown => "shutting_down",
            Error::Io(_) => "io_error",
            Error::Network(_) => "network_error",
            Error::Serialization(_) => "serialization_error",
            Error::ApiServerError(_) => "api_server_error",
            Error::Other(_) => "internal_error",
        }
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        let code = error.error_code().to_string();
        let message = error.to_string();

        let details = match &error {
            Error::Task(TaskError::NotFound { id }) => Some(serde_json::json!({
                "task_id": id,
            })),
            Error::Task(TaskError::NotReady { id, status }) => Some(serde_json::json!({
                "task_id": id,
                "status": status,
            })),
            Error::Task(TaskError::InvalidState {
                id,
                operation,
                current_state,
            }) => Some(serde_json::json!({
                "task_id": id,
                "operation": operation,
                "current_state": current_state,
            })),
            Error::Config { key: Some(key), .. } => Some(serde_json::json!({
                "key": key,
            })),
            _ => None,
        };

        ApiError {
            error: ErrorDetail {
                code,
                message,
                details,
            },
        }
    }
}
