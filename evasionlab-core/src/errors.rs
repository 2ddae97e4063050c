//! Error types for EvasionLab

use thiserror::Error;

pub type Result<T> = std::result::Result<T, EvasionLabError>;

#[derive(Error, Debug)]
pub enum EvasionLabError {
    /// Malformed input on a decode path (bad hex, bad base64, non UTF-8 output)
    #[error("Format error: {0}")]
    Format(String),

    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Unknown method: {0}")]
    UnknownMethod(String),

    #[error("Invalid parameter for {method}: {reason}")]
    InvalidParameter { method: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl From<config::ConfigError> for EvasionLabError {
    fn from(err: config::ConfigError) -> Self {
        EvasionLabError::Configuration(err.to_string())
    }
}

impl From<hex::FromHexError> for EvasionLabError {
    fn from(err: hex::FromHexError) -> Self {
        EvasionLabError::Format(format!("invalid hex: {}", err))
    }
}

impl From<base64::DecodeError> for EvasionLabError {
    fn from(err: base64::DecodeError) -> Self {
        EvasionLabError::Format(format!("invalid base64: {}", err))
    }
}

impl From<std::string::FromUtf8Error> for EvasionLabError {
    fn from(err: std::string::FromUtf8Error) -> Self {
        EvasionLabError::Format(format!("decoded bytes are not valid UTF-8: {}", err))
    }
}
