//! The value returned across the engine boundary.

use serde::{Deserialize, Serialize};
use tracing::error;

use crate::error::{AppError, ErrorKind};

/// Whether an operation succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    /// The change is committed and verified.
    Success,
    /// Nothing was changed.
    Error,
}

/// Result of one request, as seen by the caller layer.
///
/// This is the only thing the engine hands back; internal errors are
/// folded into `error_code` + `message` and never surface as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationOutcome {
    /// Success or error.
    pub status: OutcomeStatus,
    /// Identifier of the affected entity, when there is one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Human-readable description.
    pub message: String,
    /// Taxonomy code on error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<ErrorKind>,
    /// Whether re-issuing the request may succeed.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub retryable: bool,
    /// The affected entity or operation report on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl OperationOutcome {
    /// Build a success outcome.
    pub fn success(id: Option<String>, message: impl Into<String>) -> Self {
        Self {
            status: OutcomeStatus::Success,
            id,
            message: message.into(),
            error_code: None,
            retryable: false,
            data: None,
        }
    }

    /// Attach a serializable payload to the outcome.
    pub fn with_data<T: Serialize>(mut self, data: &T) -> Self {
        match serde_json::to_value(data) {
            Ok(value) => self.data = Some(value),
            Err(e) => error!(error = %e, "Failed to serialize outcome payload"),
        }
        self
    }

    /// Translate an error into an outcome.
    ///
    /// Messages of opaque kinds (store, I/O, internal) are replaced by a
    /// fixed text so raw low-level details never reach the caller.
    pub fn from_error(err: &AppError) -> Self {
        let message = if err.kind.is_opaque() {
            opaque_message(err.kind).to_string()
        } else {
            err.message.clone()
        };

        Self {
            status: OutcomeStatus::Error,
            id: None,
            message,
            error_code: Some(err.kind),
            retryable: err.is_retryable(),
            data: None,
        }
    }

    /// Whether the outcome reports success.
    pub fn is_success(&self) -> bool {
        self.status == OutcomeStatus::Success
    }
}

fn opaque_message(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::Database => "The store reported an unexpected error",
        ErrorKind::Storage => "A filesystem operation failed",
        ErrorKind::Serialization => "A payload could not be encoded or decoded",
        _ => "An internal error occurred",
    }
}

impl Serialize for ErrorKind {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ErrorKind {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = String::deserialize(deserializer)?;
        ErrorKind::from_code(&code)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown error code '{code}'")))
    }
}

impl ErrorKind {
    /// Parse a wire code back into a kind.
    pub fn from_code(code: &str) -> Option<Self> {
        let kind = match code {
            "VALIDATION" => Self::Validation,
            "CONFIRMATION_REQUIRED" => Self::ConfirmationRequired,
            "NOT_FOUND" => Self::NotFound,
            "CONFLICT" => Self::Conflict,
            "CYCLE" => Self::Cycle,
            "NOT_EMPTY" => Self::NotEmpty,
            "INVALID_BACKUP" => Self::InvalidBackup,
            "STORE_BUSY" => Self::StoreBusy,
            "VERIFICATION_FAILED" => Self::VerificationFailed,
            "SCHEMA_MISMATCH" => Self::SchemaMismatch,
            "DATABASE" => Self::Database,
            "CONFIGURATION" => Self::Configuration,
            "SERIALIZATION" => Self::Serialization,
            "STORAGE" => Self::Storage,
            "INTERNAL" => Self::Internal,
            _ => return None,
        };
        Some(kind)
    }
}
