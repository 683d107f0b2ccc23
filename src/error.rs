//! Error types and handling for the aviation weather aggregator

use serde::Serialize;
use thiserror::Error;

/// Main error type for `avwx-hub`
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AvwxError {
    /// Upstream unreachable or answered with a non-success status
    #[error("Transport error: {message}")]
    Transport { message: String },

    /// Malformed top-level or nested JSON, unparseable timestamps
    #[error("Decode error: {message}")]
    Decode { message: String },

    /// Wrong-length positional arrays, unknown discriminators, bad site codes
    #[error("Invalid data: {message}")]
    Validation { message: String },

    /// Fewer slots than a record requires
    #[error("Partial data: {message}")]
    PartialData { message: String },

    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// The caller's deadline passed before the call finished
    #[error("Timed out: {message}")]
    Timeout { message: String },

    /// The caller cancelled the request before the call finished
    #[error("Cancelled: {message}")]
    Cancelled { message: String },
}

/// Serializable category of an [`AvwxError`], reported alongside failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Transport,
    Decode,
    Validation,
    PartialData,
    Config,
    Timeout,
    Cancelled,
}

impl AvwxError {
    /// Create a new transport error
    pub fn transport<S: Into<String>>(message: S) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Create a new decode error
    pub fn decode<S: Into<String>>(message: S) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a new partial data error
    pub fn partial_data<S: Into<String>>(message: S) -> Self {
        Self::PartialData {
            message: message.into(),
        }
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn timeout<S: Into<String>>(message: S) -> Self {
        Self::Timeout {
            message: message.into(),
        }
    }

    pub fn cancelled<S: Into<String>>(message: S) -> Self {
        Self::Cancelled {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            AvwxError::Transport { .. } => ErrorKind::Transport,
            AvwxError::Decode { .. } => ErrorKind::Decode,
            AvwxError::Validation { .. } => ErrorKind::Validation,
            AvwxError::PartialData { .. } => ErrorKind::PartialData,
            AvwxError::Config { .. } => ErrorKind::Config,
            AvwxError::Timeout { .. } => ErrorKind::Timeout,
            AvwxError::Cancelled { .. } => ErrorKind::Cancelled,
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            AvwxError::Transport { .. } => {
                "Unable to reach the weather provider. Please try again later.".to_string()
            }
            AvwxError::Decode { .. } | AvwxError::PartialData { .. } => {
                "The weather provider returned data that could not be read.".to_string()
            }
            AvwxError::Validation { message } => format!("Invalid input: {message}"),
            AvwxError::Config { .. } => {
                "Configuration error. Please check your config file.".to_string()
            }
            AvwxError::Timeout { .. } => "The weather provider did not answer in time.".to_string(),
            AvwxError::Cancelled { .. } => "The request was cancelled.".to_string(),
        }
    }
}

impl From<serde_json::Error> for AvwxError {
    fn from(err: serde_json::Error) -> Self {
        AvwxError::decode(err.to_string())
    }
}
