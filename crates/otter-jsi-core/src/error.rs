//! Error types for the value bridge
//!
//! Three failure classes matter to callers: the handle is not bound to a
//! live context (`InvalidContext`), the caller asked for the wrong
//! representation (`TypeMismatch`), or the engine itself failed
//! (`EngineFailure`, carried through unchanged).

use otter_jsi_sys::EngineError;
use thiserror::Error;

use crate::kind::ValueKind;

/// Result type alias for bridge operations
pub type JsiResult<T> = Result<T, JsiError>;

/// Structured error types for bridge operations
#[derive(Debug, Error)]
pub enum JsiError {
    /// Handle has no live context: null at the boundary, torn down, or foreign
    #[error("Invalid context: {reason}")]
    InvalidContext { reason: String },

    /// Typed accessor used on a value of another kind
    #[error("Type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        expected: ValueKind,
        actual: ValueKind,
    },

    /// The engine reported an error
    #[error("Engine failure: {0}")]
    EngineFailure(#[from] EngineError),

    /// Engine is already in use further up the call stack
    #[error("Runtime busy: engine is already borrowed")]
    RuntimeBusy,

    /// Value cannot be represented in the requested form
    #[error("Conversion error: {0}")]
    Conversion(String),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl JsiError {
    /// Create an invalid-context error
    pub fn invalid_context(reason: impl Into<String>) -> Self {
        Self::InvalidContext {
            reason: reason.into(),
        }
    }

    /// Create a type mismatch error
    pub fn type_mismatch(expected: ValueKind, actual: ValueKind) -> Self {
        Self::TypeMismatch { expected, actual }
    }

    /// Create a conversion error
    pub fn conversion(message: impl Into<String>) -> Self {
        Self::Conversion(message.into())
    }

    /// Check if the caller can recover by picking another accessor
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::TypeMismatch { .. } | Self::Conversion(_))
    }

    /// Get the underlying engine error, if any
    pub fn engine_error(&self) -> Option<&EngineError> {
        match self {
            Self::EngineFailure(err) => Some(err),
            _ => None,
        }
    }

    /// Get the error type name
    pub fn error_type(&self) -> &str {
        match self {
            Self::InvalidContext { .. } => "InvalidContext",
            Self::TypeMismatch { .. } => "TypeMismatch",
            Self::EngineFailure(EngineError::Exception { error_type, .. }) => error_type,
            Self::EngineFailure(_) => "EngineFailure",
            Self::RuntimeBusy => "RuntimeBusy",
            Self::Conversion(_) => "ConversionError",
            Self::JsonError(_) => "JsonError",
        }
    }
}
