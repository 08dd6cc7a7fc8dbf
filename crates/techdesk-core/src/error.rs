//! Error types for TechDesk

use thiserror::Error;

use crate::domain::services::Action;
use crate::ports::outbound::RepositoryError;

/// Failure of a helpdesk operation.
///
/// Callers must be able to tell "you may not" (`Forbidden`) from "it doesn't
/// exist" (`NotFound`) from "it's in the wrong state" (`InvalidState`).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeskError {
    /// Malformed input or a violated role constraint on an argument
    #[error("validation error: {0}")]
    Validation(String),

    /// Referenced ticket or user does not exist or is invisible
    #[error("not found: {0}")]
    NotFound(String),

    /// Caller's role does not permit the action
    #[error("forbidden: {action} not permitted")]
    Forbidden { action: Action },

    /// Transition precondition violated
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Persistence or auth provider unavailable
    #[error("dependency failure: {0}")]
    Dependency(String),
}

impl DeskError {
    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::NotFound(_) => "not_found",
            Self::Forbidden { .. } => "forbidden",
            Self::InvalidState(_) => "invalid_state",
            Self::Dependency(_) => "dependency_failure",
        }
    }
}

impl From<RepositoryError> for DeskError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(what) => Self::NotFound(what),
            RepositoryError::Conflict(what) => Self::Validation(what),
            RepositoryError::Storage(what) => Self::Dependency(what),
        }
    }
}

/// Result type for TechDesk
pub type DeskResult<T> = Result<T, DeskError>;
