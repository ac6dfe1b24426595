//! Error types for the contracts API

use thiserror::Error;

/// Result type for contracts API operations
pub type Result<T> = std::result::Result<T, Error>;

/// Contracts API errors
#[derive(Error, Debug)]
pub enum Error {
    /// Value does not match its declared type
    #[error("'{field}' expected {expected} but got value {value} of type {actual_type}")]
    StrongTyping {
        /// Field name, including any object prefix
        field: String,
        /// Expected type expression
        expected: String,
        /// Representation of the offending value
        value: String,
        /// Type name of the offending value
        actual_type: String,
    },

    /// Value has the right type but breaks a semantic rule
    #[error("{0}")]
    InvalidDefinition(String),

    /// Hook requested data the host did not provide
    #[error("Missing data: {0}")]
    MissingData(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Shorthand for an invalid definition error
    pub fn invalid(msg: impl Into<String>) -> Self {
        Error::InvalidDefinition(msg.into())
    }

    /// True for dynamic type mismatches
    pub fn is_strong_typing(&self) -> bool {
        matches!(self, Error::StrongTyping { .. })
    }

    /// True for semantic validation failures
    pub fn is_invalid_definition(&self) -> bool {
        matches!(self, Error::InvalidDefinition(_))
    }
}

impl From<String> for Error {
    fn from(msg: String) -> Self {
        Error::Other(msg)
    }
}

impl From<&str> for Error {
    fn from(msg: &str) -> Self {
        Error::Other(msg.to_string())
    }
}
