//! Request view handed to handler stages

use std::any::Any;
use std::sync::Arc;

use serde_json::Value;

use evoke_core::{EventPacket, Validated};

use crate::connection::Connection;

/// What one handler invocation gets to see: the validated target, the raw
/// packet, and the originating connection.
///
/// Error handlers receive a request whose target is `None`; the raw packet
/// stays available either way.
#[derive(Debug)]
pub struct Request {
    target: Option<Validated>,
    packet: EventPacket,
    connection: Arc<Connection>,
}

impl Request {
    /// Request for a successfully validated dispatch.
    pub fn new(target: Validated, packet: EventPacket, connection: Arc<Connection>) -> Self {
        Self {
            target: Some(target),
            packet,
            connection,
        }
    }

    /// Request for an error handler: no validated target.
    pub fn rejected(packet: EventPacket, connection: Arc<Connection>) -> Self {
        Self {
            target: None,
            packet,
            connection,
        }
    }

    /// The validated target, absent in error handlers.
    pub fn target(&self) -> Option<&Validated> {
        self.target.as_ref()
    }

    /// The schema-validated payload, when that strategy ran.
    pub fn data(&self) -> Option<&Value> {
        self.target.as_ref()?.payload()
    }

    /// The materialized model, when model validation ran.
    pub fn model<M: Any + Send + Sync>(&self) -> Option<Arc<M>> {
        self.target.as_ref()?.model()
    }

    /// The raw inbound packet.
    pub fn packet(&self) -> &EventPacket {
        &self.packet
    }

    /// The originating connection.
    pub fn connection(&self) -> &Arc<Connection> {
        &self.connection
    }
}
