//! Validation outcome types

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

/// A single named validation failure.
///
/// Carries at minimum the field it refers to and a human-readable message.
/// The field is `"*"` when the whole payload is at fault.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }

    /// An error covering the entire payload rather than one field.
    pub fn whole_payload(message: impl Into<String>) -> Self {
        Self::new("*", message)
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// The validated target handed to the handler chain.
#[derive(Clone)]
pub enum Validated {
    /// No validation strategy was declared; an empty placeholder.
    Empty,
    /// The raw payload, accepted by schema validation.
    Payload(Value),
    /// A materialized model object; downcast with [`Validated::model`].
    Model(Arc<dyn Any + Send + Sync>),
}

impl Validated {
    /// The schema-validated payload, if that strategy produced this target.
    pub fn payload(&self) -> Option<&Value> {
        match self {
            Validated::Payload(value) => Some(value),
            _ => None,
        }
    }

    /// Downcast a materialized model.
    pub fn model<M: Any + Send + Sync>(&self) -> Option<Arc<M>> {
        match self {
            Validated::Model(target) => Arc::clone(target).downcast::<M>().ok(),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Validated::Empty)
    }
}

impl fmt::Debug for Validated {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Validated::Empty => f.write_str("Empty"),
            Validated::Payload(value) => f.debug_tuple("Payload").field(value).finish(),
            Validated::Model(_) => f.write_str("Model(..)"),
        }
    }
}

/// Result of one validation attempt: a usable target, or at least one error.
#[derive(Debug, Clone)]
pub enum ValidationOutcome {
    Valid(Validated),
    Invalid(Vec<ValidationError>),
}

impl ValidationOutcome {
    pub fn valid(target: Validated) -> Self {
        ValidationOutcome::Valid(target)
    }

    /// An outcome carrying one or more errors. Never construct with an empty
    /// list; an empty list means validation succeeded.
    pub fn invalid(errors: Vec<ValidationError>) -> Self {
        debug_assert!(!errors.is_empty());
        ValidationOutcome::Invalid(errors)
    }

    pub fn did_fail(&self) -> bool {
        matches!(self, ValidationOutcome::Invalid(_))
    }
}
