//! EVOKE Transport Layer
//!
//! Transport implementations for the EVOKE dispatch layer:
//! - TCP with length-prefixed framing (feature `tcp`, default)
//! - In-memory channels for tests and same-process embedding
//!
//! The dispatch layer is written against the traits in [`traits`]; any
//! bidirectional, frame-oriented transport can back it.

pub mod error;
pub mod memory;
pub mod traits;

#[cfg(feature = "tcp")]
pub mod tcp;

pub use error::{Result, TransportError};
pub use memory::{MemoryConnector, MemoryServer};
pub use traits::{TransportEvent, TransportReceiver, TransportSender, TransportServer};

#[cfg(feature = "tcp")]
pub use tcp::{TcpConfig, TcpServer, TcpTransport};
