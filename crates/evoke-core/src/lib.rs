//! EVOKE Core
//!
//! Core types and payload validation for the EVOKE dispatch layer.
//!
//! This crate provides:
//! - The inbound packet shape ([`EventPacket`])
//! - JSON frame encoding/decoding ([`codec`])
//! - The outbound envelope and status codes ([`Envelope`], [`status`])
//! - Payload validation strategies ([`validation`])

pub mod codec;
pub mod envelope;
pub mod error;
pub mod packet;
pub mod status;
pub mod validation;

pub use envelope::Envelope;
pub use error::{CoreError, Result};
pub use packet::EventPacket;
pub use validation::{
    validate_schema, Kind, Model, ModelValidator, Rule, RuleSchema, Validated, ValidationError,
    ValidationOutcome,
};

/// Namespace assigned to connections that do not select one.
pub const DEFAULT_NAMESPACE: &str = "/";
