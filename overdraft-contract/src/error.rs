//! Error types for the overdraft contract

use thiserror::Error;

/// Result type for contract operations
pub type Result<T> = std::result::Result<T, Error>;

/// Contract errors
#[derive(Error, Debug)]
pub enum Error {
    /// Contract API error
    #[error("Contract API error: {0}")]
    Api(#[from] contracts_api::Error),

    /// Parameter value missing or of the wrong kind
    #[error("Parameter error: {0}")]
    Parameter(String),

    /// Arithmetic overflow in fee or interest maths
    #[error("Arithmetic overflow: {0}")]
    Overflow(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
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
