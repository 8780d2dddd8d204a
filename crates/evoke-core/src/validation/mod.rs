//! Payload validation strategies
//!
//! Two independent strategies produce a [`ValidationOutcome`]: model
//! validation materializes a typed object before checking it, rule-schema
//! validation checks the raw payload directly. Failures never escape as
//! errors; they are data the dispatch pipeline branches on.

mod model;
mod outcome;
mod rules;

pub use model::{Model, ModelValidator};
pub use outcome::{Validated, ValidationError, ValidationOutcome};
pub use rules::{validate_schema, Kind, Rule, RuleSchema};
