//! JSON frame codec
//!
//! Wire frames are JSON arrays. Inbound: `[path, data?, ack?]`. Outbound
//! events use the same shape with the envelope in the data slot. Trailing
//! slots may be omitted or null.

use bytes::Bytes;
use serde_json::Value;

use crate::envelope::Envelope;
use crate::error::{CoreError, Result};
use crate::packet::EventPacket;

/// Decode one wire frame into an [`EventPacket`].
pub fn decode_frame(bytes: &[u8]) -> Result<EventPacket> {
    let frame: Value =
        serde_json::from_slice(bytes).map_err(|e| CoreError::MalformedFrame(e.to_string()))?;

    let slots = match frame {
        Value::Array(slots) => slots,
        other => {
            return Err(CoreError::MalformedFrame(format!(
                "expected array, got {other}"
            )))
        }
    };
    let mut slots = slots.into_iter();

    let path = match slots.next() {
        Some(Value::String(path)) => path,
        Some(other) => return Err(CoreError::InvalidPath(other.to_string())),
        None => return Err(CoreError::MissingPath),
    };

    let payload = match slots.next() {
        None | Some(Value::Null) => None,
        Some(data) => Some(data),
    };

    let ack = match slots.next() {
        None | Some(Value::Null) => None,
        Some(Value::Number(n)) => Some(n.as_u64().ok_or(CoreError::InvalidAck)?),
        Some(_) => return Err(CoreError::InvalidAck),
    };

    let mut packet = EventPacket::new(path, payload);
    if let Some(ack) = ack {
        packet = packet.with_ack(ack);
    }
    Ok(packet)
}

/// Encode an outbound event and its envelope into a wire frame.
pub fn encode_event(event: &str, envelope: &Envelope) -> Result<Bytes> {
    let body = serde_json::to_value(envelope).map_err(|e| CoreError::Encode(e.to_string()))?;
    let frame = Value::Array(vec![Value::String(event.to_string()), body]);
    let bytes = serde_json::to_vec(&frame).map_err(|e| CoreError::Encode(e.to_string()))?;
    Ok(Bytes::from(bytes))
}
