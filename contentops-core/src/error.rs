//! Error taxonomy.
//!
//! [`FatalError`] stops a run before any record is processed. [`RepositoryError`]
//! is what collaborators return for a single call; the executor converts it into
//! a failed outcome and carries on with the next record.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by repository collaborators.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    #[error("Could not find '{kind}' with identifier '{id}'")]
    NotFound { kind: &'static str, id: String },

    #[error("User '{user}' is not allowed to '{function}' in module '{module}'")]
    Unauthorized {
        user: String,
        module: String,
        function: String,
    },

    #[error("Argument '{argument}' is invalid: {reason}")]
    InvalidArgument { argument: String, reason: String },

    #[error("Argument '{argument}' has a bad state: {reason}")]
    BadState { argument: String, reason: String },

    #[error("Content fields did not validate: {0}")]
    FieldValidation(String),

    #[error("Content did not validate: {0}")]
    ContentValidation(String),

    /// Any other refusal from the repository's structural machinery.
    #[error("{0}")]
    Conflict(String),

    #[error("Storage failure: {0}")]
    Storage(String),
}

impl RepositoryError {
    pub fn not_found(kind: &'static str, id: impl fmt::Display) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    pub fn invalid_argument(argument: &str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            argument: argument.to_string(),
            reason: reason.into(),
        }
    }

    pub fn bad_state(argument: &str, reason: impl Into<String>) -> Self {
        Self::BadState {
            argument: argument.to_string(),
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            Self::NotFound { .. } => FailureKind::NotFound,
            Self::Unauthorized { .. } => FailureKind::Unauthorized,
            Self::InvalidArgument { .. } => FailureKind::InvalidArgument,
            Self::BadState { .. } => FailureKind::BadState,
            Self::FieldValidation(_) => FailureKind::FieldValidation,
            Self::ContentValidation(_) => FailureKind::ContentValidation,
            Self::Conflict(_) => FailureKind::Conflict,
            Self::Storage(_) => FailureKind::Storage,
        }
    }
}

/// Classification attached to every failed outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    NotFound,
    Unauthorized,
    InvalidArgument,
    BadState,
    FieldValidation,
    ContentValidation,
    Conflict,
    Storage,
    /// The operation panicked; the panic was caught at the record boundary.
    Internal,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::Unauthorized => "unauthorized",
            Self::InvalidArgument => "invalid_argument",
            Self::BadState => "bad_state",
            Self::FieldValidation => "field_validation",
            Self::ContentValidation => "content_validation",
            Self::Conflict => "conflict",
            Self::Storage => "storage",
            Self::Internal => "internal",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that abort a run before the first record is touched.
#[derive(Debug, Error)]
pub enum FatalError {
    #[error("Input source not found or unreadable: {}", path.display())]
    SourceNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid input at {location}: {reason}")]
    InvalidSource { location: String, reason: String },

    #[error("{0}")]
    Precondition(String),

    #[error("Process ended. No changes made.")]
    Aborted,

    #[error("Failed to read confirmation: {0}")]
    Prompt(#[from] std::io::Error),
}

impl FatalError {
    pub fn is_aborted(&self) -> bool {
        matches!(self, Self::Aborted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_classification() {
        assert_eq!(
            RepositoryError::not_found("content", 7).kind(),
            FailureKind::NotFound
        );
        assert_eq!(
            RepositoryError::invalid_argument("newParentLocation", "cycle").kind(),
            FailureKind::InvalidArgument
        );
        assert_eq!(
            RepositoryError::Conflict("root".to_string()).kind(),
            FailureKind::Conflict
        );
    }

    #[test]
    fn test_not_found_message_names_the_entity() {
        let err = RepositoryError::not_found("location", 123);
        assert_eq!(
            err.to_string(),
            "Could not find 'location' with identifier '123'"
        );
    }

    #[test]
    fn test_failure_kind_serializes_snake_case() {
        let json = serde_json::to_string(&FailureKind::FieldValidation).unwrap();
        assert_eq!(json, "\"field_validation\"");
        assert_eq!(FailureKind::BadState.to_string(), "bad_state");
    }
}
