//! Error types for EVOKE core

use thiserror::Error;

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, CoreError>;

/// EVOKE core error types
#[derive(Error, Debug)]
pub enum CoreError {
    /// Frame was not parseable as a JSON array
    #[error("malformed frame: {0}")]
    MalformedFrame(String),

    /// Frame carried no event path slot
    #[error("frame missing event path")]
    MissingPath,

    /// Event path slot held a non-string value
    #[error("event path must be a string, got {0}")]
    InvalidPath(String),

    /// Ack token slot held a non-integer value
    #[error("ack token must be a non-negative integer")]
    InvalidAck,

    /// Regex for a `Pattern` rule failed to compile
    #[error("invalid pattern: {0}")]
    InvalidPattern(String),

    /// Outbound frame serialization error
    #[error("encode error: {0}")]
    Encode(String),
}
