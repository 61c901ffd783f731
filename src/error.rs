//! Error taxonomy for migration processing.
//!
//! Functions in this crate return `anyhow::Result`; failures that callers need
//! to tell apart are raised as a [`MigrationError`] and can be recovered with
//! `err.downcast_ref::<MigrationError>()`.

use std::fmt;
use thiserror::Error;

/// Stable machine-readable error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    NotImplemented,
    Duplicated,
    InvalidDescription,
    AlreadyApplied,
    NoChangesDetected,
    PreviousStateFieldNotFound,
    PreviousStateActionNotFound,
    ParentsChanged,
    ObjectNotFound,
    NotLatestMigration,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::NotImplemented => "not_implemented",
            ErrorCode::Duplicated => "duplicated_error",
            ErrorCode::InvalidDescription => "invalid_description",
            ErrorCode::AlreadyApplied => "migration_already_applied",
            ErrorCode::NoChangesDetected => "no_changes_were_detected",
            ErrorCode::PreviousStateFieldNotFound => "previous_state_field_not_found",
            ErrorCode::PreviousStateActionNotFound => "previous_state_action_not_found",
            ErrorCode::ParentsChanged => "parents_changed",
            ErrorCode::ObjectNotFound => "object_not_found",
            ErrorCode::NotLatestMigration => "not_latest_migration",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug)]
pub enum MigrationError {
    /// Malformed or semantically invalid migration input
    #[error("Validation error ({code}): {message}")]
    Validation { code: ErrorCode, message: String },

    /// Migration does not fit the current history or catalog state
    #[error("Consistency error ({code}): {message}")]
    Consistency { code: ErrorCode, message: String },

    /// A statement failed against the physical store
    #[error("DDL failed for {object}: {message}\n  Statement: {statement}")]
    Ddl {
        object: String,
        statement: String,
        message: String,
    },

    /// Commit or rollback requested on a finished transaction
    #[error("Cannot {action} a transaction that is already {state}")]
    Transaction { action: String, state: String },
}

impl MigrationError {
    pub fn validation(code: ErrorCode, message: impl Into<String>) -> Self {
        MigrationError::Validation {
            code,
            message: message.into(),
        }
    }

    pub fn consistency(code: ErrorCode, message: impl Into<String>) -> Self {
        MigrationError::Consistency {
            code,
            message: message.into(),
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self::validation(ErrorCode::InvalidDescription, message)
    }

    pub fn ddl(
        object: impl Into<String>,
        statement: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        MigrationError::Ddl {
            object: object.into(),
            statement: statement.into(),
            message: message.into(),
        }
    }

    pub fn transaction(action: impl Into<String>, state: impl Into<String>) -> Self {
        MigrationError::Transaction {
            action: action.into(),
            state: state.into(),
        }
    }

    /// Error code for validation and consistency failures
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            MigrationError::Validation { code, .. } | MigrationError::Consistency { code, .. } => {
                Some(*code)
            }
            MigrationError::Ddl { .. } | MigrationError::Transaction { .. } => None,
        }
    }
}

/// Extract the error code from an `anyhow` error chain, if any
pub fn error_code(err: &anyhow::Error) -> Option<ErrorCode> {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<MigrationError>())
        .and_then(MigrationError::code)
}
