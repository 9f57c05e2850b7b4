//! Error types for EMU

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EmuError {
    // Record errors
    #[error("Malformed record: field '{field}' {reason}")]
    MalformedRecord { field: String, reason: String },

    #[error("Unknown property: {name}. Use temperature, salinity, dissolved_oxygen, phosphate, silicate, or nitrate")]
    UnknownProperty { name: String },

    // Provider errors
    #[error("Feature query provider failed during {operation}: {reason}")]
    Provider { operation: String, reason: String },

    // Configuration errors
    #[error("Missing required configuration: {key}")]
    ConfigMissing { key: String },

    #[error("Invalid configuration value for {key}: {reason}")]
    ConfigInvalid { key: String, reason: String },

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl EmuError {
    /// Build a provider failure for the named operation
    pub fn provider(operation: impl Into<String>, reason: impl ToString) -> Self {
        EmuError::Provider {
            operation: operation.into(),
            reason: reason.to_string(),
        }
    }

    /// Build a malformed-record error for the named field
    pub fn malformed(field: impl Into<String>, reason: impl Into<String>) -> Self {
        EmuError::MalformedRecord {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, EmuError>;
