use thiserror::Error;

/// Failure kinds the interface update pipeline distinguishes
#[derive(Debug, Error)]
pub enum ScriptError {
    /// A field violates a domain constraint at commit time
    #[error("{field}: {message}")]
    Validation { field: String, message: String },

    /// Storage-layer failure while saving a record
    #[error("failed to save {object}: {message}")]
    Persistence { object: String, message: String },

    /// Any failure correlating a batch token with a change log entry
    #[error("{0}")]
    AuditLookup(String),

    /// Script input could not be decoded or resolved
    #[error("{field}: {message}")]
    Parameter { field: String, message: String },
}

impl ScriptError {
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }

    pub fn persistence(object: impl std::fmt::Display, err: impl std::fmt::Display) -> Self {
        Self::Persistence {
            object: object.to_string(),
            message: err.to_string(),
        }
    }

    pub fn parameter(field: &str, message: impl Into<String>) -> Self {
        Self::Parameter {
            field: field.to_string(),
            message: message.into(),
        }
    }

    /// Whether this error stops processing of the interface it was raised for
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Validation { .. } | Self::Persistence { .. })
    }
}
