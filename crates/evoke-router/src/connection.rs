//! Connection management

use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use parking_lot::RwLock;
use uuid::Uuid;

use evoke_core::{codec, Envelope};
use evoke_transport::TransportSender;

use crate::error::Result;

/// Connection identifier
pub type ConnectionId = String;

/// A connected peer
pub struct Connection {
    /// Unique connection ID
    pub id: ConnectionId,
    /// Namespace this connection belongs to
    namespace: String,
    /// Transport sender for this peer
    sender: Arc<dyn TransportSender>,
    /// Connection creation time
    pub created_at: Instant,
    /// Last outbound activity
    last_activity: RwLock<Instant>,
}

impl Connection {
    pub fn new(sender: Arc<dyn TransportSender>, namespace: impl Into<String>) -> Self {
        let now = Instant::now();
        Self {
            id: Uuid::new_v4().to_string(),
            namespace: namespace.into(),
            sender,
            created_at: now,
            last_activity: RwLock::new(now),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Emit an event envelope to this peer.
    pub async fn emit(&self, event: &str, envelope: &Envelope) -> Result<()> {
        let frame = codec::encode_event(event, envelope)?;
        self.forward(frame).await
    }

    /// Send an already encoded frame to this peer.
    pub(crate) async fn forward(&self, frame: Bytes) -> Result<()> {
        self.sender.send(frame).await?;
        *self.last_activity.write() = Instant::now();
        Ok(())
    }

    /// Check if the peer is still connected
    pub fn is_connected(&self) -> bool {
        self.sender.is_connected()
    }

    /// Get idle duration
    pub fn idle_duration(&self) -> std::time::Duration {
        self.last_activity.read().elapsed()
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("namespace", &self.namespace)
            .field("connected", &self.is_connected())
            .finish()
    }
}
