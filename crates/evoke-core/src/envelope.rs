//! Outbound envelope

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::status;

/// The `{message, status, payload}` shape delivered to peers.
///
/// Every addressing operation on a response serializes the same envelope;
/// only the audience differs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub message: String,
    pub status: u16,
    pub payload: Option<Value>,
}

impl Envelope {
    pub fn new(message: impl Into<String>, status: u16, payload: Option<Value>) -> Self {
        Self {
            message: message.into(),
            status,
            payload,
        }
    }
}

impl Default for Envelope {
    fn default() -> Self {
        Self {
            message: String::new(),
            status: status::OK,
            payload: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn wire_shape() {
        let envelope = Envelope::new("created", 201, Some(json!({"id": 7})));
        let wire = serde_json::to_value(&envelope).unwrap();
        assert_eq!(
            wire,
            json!({"message": "created", "status": 201, "payload": {"id": 7}})
        );
    }

    #[test]
    fn default_is_empty_ok() {
        let envelope = Envelope::default();
        assert_eq!(envelope.status, status::OK);
        assert!(envelope.message.is_empty());
        assert!(envelope.payload.is_none());
    }
}
