//! Model-based validation
//!
//! Materializes a typed object from the raw payload, then runs the model's
//! own semantic checks. Field-population failures and semantic failures
//! surface identically, as named validation errors.

use std::any::type_name;
use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::{Validated, ValidationError, ValidationOutcome};

/// Error reported when the packet carried no payload at all.
const ABSENT_PAYLOAD: &str = "got no data from the socket; all properties are missing";

/// A payload model: a deserializable shape plus semantic rules.
///
/// Deserialization is the structural check. [`Model::validate`] holds the
/// semantic ones and defaults to accepting everything.
pub trait Model: DeserializeOwned + Send + Sync + 'static {
    fn validate(&self) -> Vec<ValidationError> {
        Vec::new()
    }
}

/// Type-erased model strategy, stored on a route config.
///
/// Routes live behind trait objects, so the concrete model type is erased
/// here and recovered by the handler with [`Validated::model`].
#[derive(Clone)]
pub struct ModelValidator {
    model: &'static str,
    run: Arc<dyn Fn(Option<&Value>) -> ValidationOutcome + Send + Sync>,
}

impl ModelValidator {
    /// Build the strategy for a concrete model type.
    pub fn of<M: Model>() -> Self {
        Self {
            model: type_name::<M>(),
            run: Arc::new(|payload| materialize::<M>(payload)),
        }
    }

    /// Run the strategy against a raw payload.
    pub fn validate(&self, payload: Option<&Value>) -> ValidationOutcome {
        (self.run)(payload)
    }

    pub fn model_name(&self) -> &'static str {
        self.model
    }
}

impl fmt::Debug for ModelValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ModelValidator").field(&self.model).finish()
    }
}

fn materialize<M: Model>(payload: Option<&Value>) -> ValidationOutcome {
    let payload = match payload {
        Some(payload) => payload,
        None => {
            return ValidationOutcome::invalid(vec![ValidationError::whole_payload(
                ABSENT_PAYLOAD,
            )]);
        }
    };

    // Population failure short-circuits; semantic checks never see a
    // half-built model.
    let model: M = match serde_json::from_value(payload.clone()) {
        Ok(model) => model,
        Err(e) => {
            return ValidationOutcome::invalid(vec![ValidationError::whole_payload(
                e.to_string(),
            )]);
        }
    };

    let errors = model.validate();
    if errors.is_empty() {
        ValidationOutcome::valid(Validated::Model(Arc::new(model)))
    } else {
        ValidationOutcome::invalid(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Deserialize)]
    struct SignUp {
        name: String,
        age: i64,
    }

    impl Model for SignUp {
        fn validate(&self) -> Vec<ValidationError> {
            let mut errors = Vec::new();
            if self.name.is_empty() {
                errors.push(ValidationError::new("name", "must not be empty"));
            }
            if self.age < 0 {
                errors.push(ValidationError::new("age", "must not be negative"));
            }
            errors
        }
    }

    #[test]
    fn absent_payload_fails_whole() {
        let validator = ModelValidator::of::<SignUp>();
        match validator.validate(None) {
            ValidationOutcome::Invalid(errors) => {
                assert_eq!(errors.len(), 1);
                assert_eq!(errors[0].field, "*");
            }
            ValidationOutcome::Valid(_) => panic!("expected failure"),
        }
    }

    #[test]
    fn population_failure_short_circuits() {
        let validator = ModelValidator::of::<SignUp>();
        // name has the wrong shape and age is negative; only the population
        // error surfaces.
        match validator.validate(Some(&json!({"name": 42, "age": -1}))) {
            ValidationOutcome::Invalid(errors) => {
                assert_eq!(errors.len(), 1);
                assert_eq!(errors[0].field, "*");
            }
            ValidationOutcome::Valid(_) => panic!("expected failure"),
        }
    }

    #[test]
    fn semantic_errors_surface_by_field() {
        let validator = ModelValidator::of::<SignUp>();
        match validator.validate(Some(&json!({"name": "", "age": -1}))) {
            ValidationOutcome::Invalid(errors) => {
                assert_eq!(errors.len(), 2);
                assert_eq!(errors[0].field, "name");
                assert_eq!(errors[1].field, "age");
            }
            ValidationOutcome::Valid(_) => panic!("expected failure"),
        }
    }

    #[test]
    fn valid_payload_materializes() {
        let validator = ModelValidator::of::<SignUp>();
        match validator.validate(Some(&json!({"name": "ada", "age": 36}))) {
            ValidationOutcome::Valid(target) => {
                let model = target.model::<SignUp>().unwrap();
                assert_eq!(model.name, "ada");
                assert_eq!(model.age, 36);
            }
            ValidationOutcome::Invalid(errors) => panic!("unexpected errors: {errors:?}"),
        }
    }
}
