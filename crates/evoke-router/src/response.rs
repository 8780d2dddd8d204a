//! Response builder
//!
//! Per-dispatch accumulator for status, message, and payload, plus the
//! addressing operations. Every addressing call serializes the envelope as
//! it stands at that moment and emits it on the route's own event path, so
//! a handler may address several audiences from one dispatch.

use std::sync::Arc;

use serde_json::Value;

use evoke_core::{status, Envelope};

use crate::connection::Connection;
use crate::error::Result;
use crate::hub::Hub;

pub struct Response {
    status: u16,
    message: String,
    data: Option<Value>,
    /// Resolved path of the matched route; outbound events reuse it.
    event: String,
    connection: Arc<Connection>,
    hub: Arc<Hub>,
}

impl Response {
    pub fn new(event: String, connection: Arc<Connection>, hub: Arc<Hub>) -> Self {
        Self {
            status: status::OK,
            message: String::new(),
            data: None,
            event,
            connection,
            hub,
        }
    }

    // -- Fluent accumulation

    pub fn status(&mut self, code: u16) -> &mut Self {
        self.status = code;
        self
    }

    pub fn get_status(&self) -> u16 {
        self.status
    }

    pub fn with_data(&mut self, payload: Value) -> &mut Self {
        self.data = Some(payload);
        self
    }

    pub fn data(&self) -> Option<&Value> {
        self.data.as_ref()
    }

    pub fn message(&mut self, text: impl Into<String>) -> &mut Self {
        self.message = text.into();
        self
    }

    pub fn get_message(&self) -> &str {
        &self.message
    }

    /// Record a failure message. A status that does not already signal a
    /// server error is escalated to [`status::INTERNAL_SERVER_ERROR`];
    /// caller-set client-error statuses survive.
    pub fn error(&mut self, text: impl Into<String>) -> &mut Self {
        if self.status < status::SERVER_ERROR_THRESHOLD {
            self.status = status::INTERNAL_SERVER_ERROR;
        }
        self.message(text)
    }

    /// The envelope as currently accumulated.
    pub fn envelope(&self) -> Envelope {
        Envelope::new(self.message.clone(), self.status, self.data.clone())
    }

    /// Event path outbound sends use.
    pub fn event(&self) -> &str {
        &self.event
    }

    pub fn connection(&self) -> &Arc<Connection> {
        &self.connection
    }

    // -- Addressing

    /// Send to the originating connection.
    pub async fn relay(&self) -> Result<()> {
        self.connection.emit(&self.event, &self.envelope()).await
    }

    /// Send to every connection except the originator.
    pub async fn to_all_except_sender(&self) -> Result<()> {
        self.hub
            .emit_to_all_except(self.connection.id(), &self.event, &self.envelope())
            .await
    }

    /// Send to every connection in a room.
    pub async fn to_all_in_room(&self, room: &str) -> Result<()> {
        self.hub
            .emit_to_room(room, None, &self.event, &self.envelope())
            .await
    }

    /// Send to every connection in a room except the originator.
    pub async fn to_all_in_room_except_sender(&self, room: &str) -> Result<()> {
        self.hub
            .emit_to_room(room, Some(self.connection.id()), &self.event, &self.envelope())
            .await
    }

    /// Send to every connection in a namespace.
    pub async fn to_all_in_namespace(&self, namespace: &str) -> Result<()> {
        self.hub
            .emit_to_namespace(namespace, &self.event, &self.envelope())
            .await
    }

    /// Send to one connection by id.
    pub async fn to_socket(&self, id: &str) -> Result<()> {
        self.hub
            .emit_to_connection(id, &self.event, &self.envelope())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use evoke_transport::memory;

    fn response() -> Response {
        let ((sender, _receiver), _peer) = memory::duplex();
        let connection = Arc::new(Connection::new(Arc::new(sender), "/"));
        Response::new("chat".into(), connection, Arc::new(Hub::new()))
    }

    #[test]
    fn error_escalates_default_status() {
        let mut response = response();
        response.error("boom");
        assert_eq!(response.get_status(), status::INTERNAL_SERVER_ERROR);
        assert_eq!(response.get_message(), "boom");
    }

    #[test]
    fn error_escalates_client_error_status() {
        let mut response = response();
        response.status(status::BAD_REQUEST).error("nope");
        assert_eq!(response.get_status(), status::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn error_preserves_server_error_status() {
        let mut response = response();
        response.status(503).error("still down");
        assert_eq!(response.get_status(), 503);
        assert_eq!(response.get_message(), "still down");
    }

    #[test]
    fn fluent_chain_accumulates() {
        let mut response = response();
        response
            .status(201)
            .message("created")
            .with_data(serde_json::json!({"id": 1}));
        let envelope = response.envelope();
        assert_eq!(envelope.status, 201);
        assert_eq!(envelope.message, "created");
        assert!(envelope.payload.is_some());
    }
}
