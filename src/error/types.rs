// src/error/types.rs
use crate::domain::{DomainError, StoryField};
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

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Failure reported by the story store itself (remote write refused,
    /// connection lost, ...). The string is the store's own reason.
    #[error("Store error: {0}")]
    Store(String),

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

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::Other(format!("Blocking task failed: {}", err))
    }
}

pub type AppResult<T> = Result<T, AppError>;

/// Outcome taxonomy of the mutation coordinator.
///
/// Every variant leaves the working set either untouched (rejections) or
/// restored to its pre-mutation value (remote failures).
#[derive(Debug, Error)]
pub enum MutationError {
    /// Local input rejected before any state change or store call.
    #[error("Validation failed: {0}")]
    Validation(#[from] DomainError),

    /// The editor declined a rank conflict confirmation.
    #[error("Rank change cancelled")]
    ConfirmationDeclined,

    /// The store refused the write; the field was rolled back.
    #[error("Failed to update {field} on story {story_id}: {reason}")]
    RemoteWrite {
        story_id: Uuid,
        field: StoryField,
        reason: String,
    },

    /// The story is no longer part of the working set.
    #[error("Story {0} not found")]
    StaleReference(Uuid),

    #[error("Rank proposal {0} not found")]
    UnknownProposal(Uuid),

    /// The same field of the same story already has a write in flight.
    #[error("Update of {field} on story {story_id} already in progress, retry later")]
    Busy { story_id: Uuid, field: StoryField },
}

impl Serialize for MutationError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

pub type MutationResult<T> = Result<T, MutationError>;
