//! Transport trait definitions
//!
//! The seam between the dispatch layer and whatever carries its frames.
//! Senders are cheap handles that may be cloned into sessions; receivers are
//! owned by exactly one read loop.

use async_trait::async_trait;
use bytes::Bytes;
use std::net::SocketAddr;

use crate::error::Result;

/// Events that can occur on a transport
#[derive(Debug, Clone)]
pub enum TransportEvent {
    /// Connection established
    Connected,
    /// Connection closed (clean or error)
    Disconnected { reason: Option<String> },
    /// One complete frame received
    Data(Bytes),
    /// Error occurred
    Error(String),
}

/// Trait for sending frames to one peer
#[async_trait]
pub trait TransportSender: Send + Sync {
    /// Send one frame
    async fn send(&self, data: Bytes) -> Result<()>;

    /// Check if the peer is still connected
    fn is_connected(&self) -> bool;

    /// Close the sender
    async fn close(&self) -> Result<()>;
}

/// Trait for receiving frames from one peer
#[async_trait]
pub trait TransportReceiver: Send {
    /// Receive the next event; `None` means the peer is gone
    async fn recv(&mut self) -> Option<TransportEvent>;
}

/// Trait for transport servers (listeners)
#[async_trait]
pub trait TransportServer: Send + Sync {
    /// The sender type for accepted connections
    type Sender: TransportSender;
    /// The receiver type for accepted connections
    type Receiver: TransportReceiver;

    /// Accept a new connection
    async fn accept(&mut self) -> Result<(Self::Sender, Self::Receiver, SocketAddr)>;

    /// Get the local address
    fn local_addr(&self) -> Result<SocketAddr>;

    /// Close the server
    async fn close(&self) -> Result<()>;
}
