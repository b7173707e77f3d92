//! Error types for engine operations.

use openslot_store::StoreError;
use serde::Serialize;
use thiserror::Error;

/// One field-level validation message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum EngineError {
    /// Input failed validation. Carries every violation found so a caller
    /// sees the full list in one round trip; nothing is partially applied.
    #[error("{message}")]
    Validation {
        message: String,
        errors: Vec<FieldError>,
    },

    /// A referenced record does not exist. Kept distinct from validation
    /// so the calling layer can map it to a distinct outward signal.
    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl EngineError {
    /// Single-field validation failure.
    pub fn invalid(field: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        EngineError::Validation {
            errors: vec![FieldError::new(field, message.clone())],
            message,
        }
    }

    pub fn invalid_many(message: impl Into<String>, errors: Vec<FieldError>) -> Self {
        EngineError::Validation {
            message: message.into(),
            errors,
        }
    }

    pub fn not_found(entity: &'static str, key: impl ToString) -> Self {
        EngineError::NotFound {
            entity,
            key: key.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
