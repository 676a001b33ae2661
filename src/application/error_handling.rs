// src/application/error_handling.rs
//
// Error Handling for Commands
//
// ARCHITECTURE:
// - Maps internal errors → user-friendly responses
// - Provides consistent error format for UI
// - Never exposes internal implementation details
// - Logs errors for debugging

use serde::{Deserialize, Serialize};

use crate::domain::DomainError;
use crate::error::{AppError, MutationError};

/// Standard error response for UI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error_type: ErrorType,
    pub message: String,
    pub details: Option<String>,
}

/// Error categories for UI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorType {
    /// Story or proposal not found (404)
    NotFound,

    /// Invalid input or declined confirmation (400)
    Validation,

    /// Domain invariant violation (422)
    DomainError,

    /// The field already has a write in flight (409)
    Busy,

    /// Database/persistence error (500)
    Database,

    /// The story store refused a write (502)
    Store,

    /// File system error (500)
    FileSystem,

    /// Other/unknown error (500)
    Internal,
}

impl ErrorResponse {
    fn new(error_type: ErrorType, message: impl Into<String>, details: Option<String>) -> Self {
        Self {
            success: false,
            error_type,
            message: message.into(),
            details,
        }
    }

    /// Create error response from AppError
    pub fn from_app_error(error: AppError) -> Self {
        match error {
            AppError::NotFound => Self::new(ErrorType::NotFound, "Resource not found", None),

            AppError::Domain(domain_error) => Self::from_domain_error(domain_error),

            AppError::Database(db_error) => {
                // Log full error for debugging
                log::error!("Database error: {:?}", db_error);
                Self::new(
                    ErrorType::Database,
                    "Database operation failed",
                    Some("Check logs for details".to_string()),
                )
            }

            AppError::Pool(pool_error) => {
                log::error!("Connection pool error: {}", pool_error);
                Self::new(ErrorType::Database, "Database connection failed", None)
            }

            AppError::Serialization(serde_error) => {
                log::error!("Serialization error: {:?}", serde_error);
                Self::new(ErrorType::Internal, "Data serialization failed", None)
            }

            AppError::Io(io_error) => {
                log::error!("IO error: {:?}", io_error);
                Self::new(
                    ErrorType::FileSystem,
                    "File system operation failed",
                    Some(io_error.to_string()),
                )
            }

            AppError::Store(reason) => {
                log::error!("Store error: {}", reason);
                Self::new(ErrorType::Store, "Story store request failed", Some(reason))
            }

            AppError::Other(message) => {
                log::error!("Other error: {}", message);
                Self::new(ErrorType::Internal, message, None)
            }
        }
    }

    pub fn from_domain_error(error: DomainError) -> Self {
        match error {
            DomainError::InvariantViolation(_) => Self::new(
                ErrorType::DomainError,
                "Domain validation failed",
                Some(error.to_string()),
            ),
            DomainError::InvalidRank(_) | DomainError::InvalidFilter(_) | DomainError::InvalidSlot(_) => {
                Self::validation(error.to_string())
            }
        }
    }

    /// Create error response from a coordinator outcome
    pub fn from_mutation_error(error: MutationError) -> Self {
        match error {
            MutationError::Validation(domain_error) => Self::from_domain_error(domain_error),

            MutationError::ConfirmationDeclined => {
                Self::new(ErrorType::Validation, "Rank change cancelled", None)
            }

            // The reason is shown verbatim to the editor
            MutationError::RemoteWrite { ref reason, .. } => Self::new(
                ErrorType::Store,
                format!("Failed to update story: {}", reason),
                Some(error.to_string()),
            ),

            MutationError::StaleReference(_) => {
                Self::new(ErrorType::NotFound, "Story not found", Some(error.to_string()))
            }

            MutationError::UnknownProposal(_) => Self::new(
                ErrorType::NotFound,
                "Rank change no longer pending",
                Some(error.to_string()),
            ),

            MutationError::Busy { .. } => Self::new(
                ErrorType::Busy,
                "An update to this field is already in progress",
                Some(error.to_string()),
            ),
        }
    }

    /// Create validation error
    pub fn validation(message: String) -> Self {
        Self::new(ErrorType::Validation, message, None)
    }

    /// Create not found error
    pub fn not_found(resource: &str) -> Self {
        Self::new(ErrorType::NotFound, format!("{} not found", resource), None)
    }

    /// JSON form handed back to the UI
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "Internal error".to_string())
    }
}

impl From<AppError> for ErrorResponse {
    fn from(error: AppError) -> Self {
        Self::from_app_error(error)
    }
}

impl From<MutationError> for ErrorResponse {
    fn from(error: MutationError) -> Self {
        Self::from_mutation_error(error)
    }
}

impl From<DomainError> for ErrorResponse {
    fn from(error: DomainError) -> Self {
        Self::from_domain_error(error)
    }
}

/// Helper trait to convert Results to a serialized ErrorResponse
pub trait ToErrorResponse<T> {
    fn to_error_response(self) -> Result<T, String>;
}

impl<T, E> ToErrorResponse<T> for Result<T, E>
where
    E: Into<ErrorResponse>,
{
    fn to_error_response(self) -> Result<T, String> {
        self.map_err(|e| e.into().to_json())
    }
}
