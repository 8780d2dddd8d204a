//! Inbound packet shape

use serde_json::Value;

/// One inbound transport frame, already decoded from the wire.
///
/// A packet is consumed by exactly one dispatch and discarded afterwards.
/// The path selects the route, the payload feeds validation, and the ack
/// token (when present) is carried through untouched; the dispatch layer
/// never acknowledges implicitly.
#[derive(Debug, Clone, PartialEq)]
pub struct EventPacket {
    path: String,
    payload: Option<Value>,
    ack: Option<u64>,
    namespace: String,
}

impl EventPacket {
    pub fn new(path: impl Into<String>, payload: Option<Value>) -> Self {
        Self {
            path: path.into(),
            payload,
            ack: None,
            namespace: crate::DEFAULT_NAMESPACE.to_string(),
        }
    }

    pub fn with_ack(mut self, ack: u64) -> Self {
        self.ack = Some(ack);
        self
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Event path used for route resolution.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Raw user payload, if the frame carried one.
    pub fn payload(&self) -> Option<&Value> {
        self.payload.as_ref()
    }

    /// Acknowledgment token, if the frame carried one.
    pub fn ack(&self) -> Option<u64> {
        self.ack
    }

    /// Namespace of the originating connection.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }
}
