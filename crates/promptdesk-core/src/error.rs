//! Unified error types for PromptDesk.
//!
//! Every crate maps its internal failures into [`AppError`], whose
//! [`ErrorKind`] doubles as the fixed error-code taxonomy reported to
//! callers through [`crate::types::OperationOutcome`].

use std::fmt;
use thiserror::Error;

/// Error-code taxonomy shared by every operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed or missing request fields.
    Validation,
    /// A destructive request arrived without explicit confirmation.
    ConfirmationRequired,
    /// A referenced folder or prompt does not exist.
    NotFound,
    /// A sibling folder with the same name already exists.
    Conflict,
    /// A reparent would make a folder its own ancestor.
    Cycle,
    /// A non-recursive folder delete hit a folder with contents.
    NotEmpty,
    /// A backup snapshot is internally inconsistent.
    InvalidBackup,
    /// The store reported lock contention (the host application is writing).
    StoreBusy,
    /// Post-commit read-back did not show the expected state.
    VerificationFailed,
    /// The store's structural version is not the one this engine understands.
    SchemaMismatch,
    /// Any other store failure.
    Database,
    /// Configuration could not be loaded or is invalid.
    Configuration,
    /// JSON (de)serialization failed.
    Serialization,
    /// Filesystem I/O failed.
    Storage,
    /// An unexpected internal failure.
    Internal,
}

impl ErrorKind {
    /// Whether the caller may safely re-issue the same request.
    pub fn is_retryable(self) -> bool {
        matches!(self, Self::StoreBusy)
    }

    /// Whether the error message may leak store internals and must not be
    /// shown to callers verbatim.
    pub fn is_opaque(self) -> bool {
        matches!(
            self,
            Self::Database | Self::Internal | Self::Storage | Self::Serialization
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation => write!(f, "VALIDATION"),
            Self::ConfirmationRequired => write!(f, "CONFIRMATION_REQUIRED"),
            Self::NotFound => write!(f, "NOT_FOUND"),
            Self::Conflict => write!(f, "CONFLICT"),
            Self::Cycle => write!(f, "CYCLE"),
            Self::NotEmpty => write!(f, "NOT_EMPTY"),
            Self::InvalidBackup => write!(f, "INVALID_BACKUP"),
            Self::StoreBusy => write!(f, "STORE_BUSY"),
            Self::VerificationFailed => write!(f, "VERIFICATION_FAILED"),
            Self::SchemaMismatch => write!(f, "SCHEMA_MISMATCH"),
            Self::Database => write!(f, "DATABASE"),
            Self::Configuration => write!(f, "CONFIGURATION"),
            Self::Serialization => write!(f, "SERIALIZATION"),
            Self::Storage => write!(f, "STORAGE"),
            Self::Internal => write!(f, "INTERNAL"),
        }
    }
}

/// The unified application error used throughout PromptDesk.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct AppError {
    /// The category of error.
    pub kind: ErrorKind,
    /// A human-readable error message.
    pub message: String,
    /// Optional underlying cause.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new application error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Create a new application error with an underlying cause.
    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// Create a confirmation-required error.
    pub fn confirmation_required(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ConfirmationRequired, message)
    }

    /// Create a not-found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    /// Create a naming conflict error.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    /// Create a structural cycle error.
    pub fn cycle(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Cycle, message)
    }

    /// Create a folder-not-empty error.
    pub fn not_empty(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotEmpty, message)
    }

    /// Create an inconsistent-backup error.
    pub fn invalid_backup(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidBackup, message)
    }

    /// Create a lock-contention error.
    pub fn store_busy(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::StoreBusy, message)
    }

    /// Create a verify-after-write failure.
    pub fn verification_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::VerificationFailed, message)
    }

    /// Create a schema mismatch error.
    pub fn schema_mismatch(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::SchemaMismatch, message)
    }

    /// Create a database error.
    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Database, message)
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// Whether the caller may safely re-issue the same request.
    pub fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }
}

impl Clone for AppError {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            message: self.message.clone(),
            source: None,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(
            ErrorKind::Serialization,
            format!("JSON serialization error: {err}"),
            err,
        )
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::with_source(ErrorKind::Storage, format!("I/O error: {err}"), err)
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::with_source(
            ErrorKind::Configuration,
            format!("Configuration error: {err}"),
            err,
        )
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::with_source(ErrorKind::Validation, describe_validation(&err), err)
    }
}

/// Flatten validator output into `field: reason` pairs.
fn describe_validation(errors: &validator::ValidationErrors) -> String {
    let mut parts: Vec<String> = errors
        .field_errors()
        .iter()
        .map(|(field, errs)| {
            let reason = errs
                .first()
                .and_then(|e| e.message.as_ref().map(|m| m.to_string()))
                .or_else(|| errs.first().map(|e| e.code.to_string()))
                .unwrap_or_else(|| "invalid".to_string());
            format!("{field}: {reason}")
        })
        .collect();
    parts.sort();
    format!("Invalid request ({})", parts.join(", "))
}
