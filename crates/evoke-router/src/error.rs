//! Router error types

use thiserror::Error;

pub type Result<T> = std::result::Result<T, RouterError>;

#[derive(Error, Debug)]
pub enum RouterError {
    /// A route was registered without an override config and without
    /// declared metadata. Surfaced at registration, never at dispatch.
    #[error("no route config declared for {0}: pass one at registration or implement config()")]
    MissingConfig(String),

    #[error("connection not found: {0}")]
    ConnectionNotFound(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("core protocol error: {0}")]
    Core(#[from] evoke_core::CoreError),

    #[error("transport error: {0}")]
    Transport(#[from] evoke_transport::TransportError),
}
