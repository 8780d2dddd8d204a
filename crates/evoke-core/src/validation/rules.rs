//! Rule-schema validation
//!
//! Checks raw payload fields directly against a declared rule map. The
//! payload itself becomes the validated target on success.

use regex_lite::Regex;
use serde_json::Value;

use crate::error::{CoreError, Result};

use super::{Validated, ValidationError, ValidationOutcome};

/// Expected JSON shape of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    String,
    Number,
    Bool,
    Array,
    Object,
}

impl Kind {
    fn matches(self, value: &Value) -> bool {
        match self {
            Kind::String => value.is_string(),
            Kind::Number => value.is_number(),
            Kind::Bool => value.is_boolean(),
            Kind::Array => value.is_array(),
            Kind::Object => value.is_object(),
        }
    }

    fn name(self) -> &'static str {
        match self {
            Kind::String => "string",
            Kind::Number => "number",
            Kind::Bool => "bool",
            Kind::Array => "array",
            Kind::Object => "object",
        }
    }
}

/// One declared constraint on a payload field.
///
/// Only [`Rule::Required`] governs absence: the other rules pass silently
/// when the field is missing, so optional fields stay optional.
#[derive(Debug, Clone)]
pub enum Rule {
    /// Field must be present and non-null.
    Required,
    /// Field must have the given JSON shape.
    Is(Kind),
    /// Strings must have at least this many characters, arrays this many
    /// elements.
    MinLength(usize),
    MaxLength(usize),
    /// Numeric lower bound (inclusive).
    Minimum(f64),
    /// Numeric upper bound (inclusive).
    Maximum(f64),
    /// Strings must match the regex.
    Pattern(Regex),
}

impl Rule {
    /// Compile a [`Rule::Pattern`]. Declaring an invalid regex is a
    /// configuration error, surfaced here rather than at dispatch time.
    pub fn pattern(pattern: &str) -> Result<Self> {
        let regex = Regex::new(pattern).map_err(|e| CoreError::InvalidPattern(e.to_string()))?;
        Ok(Rule::Pattern(regex))
    }

    fn check(&self, field: &str, value: Option<&Value>) -> Option<ValidationError> {
        let value = match (self, value) {
            (Rule::Required, None) => {
                return Some(ValidationError::new(field, "is required"));
            }
            (_, None) => return None,
            (_, Some(value)) => value,
        };

        match self {
            Rule::Required => None,
            Rule::Is(kind) => (!kind.matches(value)).then(|| {
                ValidationError::new(field, format!("must be a {}, got {value}", kind.name()))
            }),
            Rule::MinLength(min) => length_of(value)
                .filter(|len| len < min)
                .map(|len| {
                    ValidationError::new(
                        field,
                        format!("must have at least {min} elements, has {len}"),
                    )
                }),
            Rule::MaxLength(max) => length_of(value)
                .filter(|len| len > max)
                .map(|len| {
                    ValidationError::new(
                        field,
                        format!("must have at most {max} elements, has {len}"),
                    )
                }),
            Rule::Minimum(min) => value
                .as_f64()
                .filter(|n| n < min)
                .map(|n| ValidationError::new(field, format!("must be at least {min}, got {n}"))),
            Rule::Maximum(max) => value
                .as_f64()
                .filter(|n| n > max)
                .map(|n| ValidationError::new(field, format!("must be at most {max}, got {n}"))),
            Rule::Pattern(regex) => match value.as_str() {
                Some(s) if !regex.is_match(s) => Some(ValidationError::new(
                    field,
                    format!("must match pattern {}", regex.as_str()),
                )),
                _ => None,
            },
        }
    }
}

fn length_of(value: &Value) -> Option<usize> {
    match value {
        Value::String(s) => Some(s.chars().count()),
        Value::Array(items) => Some(items.len()),
        _ => None,
    }
}

/// A declared rule map: field name to its ordered rules.
///
/// Declaration order is the order violations are reported in.
#[derive(Debug, Clone, Default)]
pub struct RuleSchema {
    fields: Vec<(String, Vec<Rule>)>,
}

impl RuleSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, name: impl Into<String>, rules: Vec<Rule>) -> Self {
        self.fields.push((name.into(), rules));
        self
    }
}

/// Validate a raw payload against a declared rule map.
///
/// Payload fields without declared rules are ignored. An absent payload is
/// treated as an empty object, so only `Required` rules can fail on it. A
/// present non-object payload fails as a whole.
pub fn validate_schema(schema: &RuleSchema, payload: Option<&Value>) -> ValidationOutcome {
    let object = match payload {
        None => None,
        Some(Value::Object(map)) => Some(map),
        Some(other) => {
            return ValidationOutcome::invalid(vec![ValidationError::whole_payload(format!(
                "payload must be an object, got {other}"
            ))]);
        }
    };

    let mut errors = Vec::new();
    for (field, rules) in &schema.fields {
        let value = object
            .and_then(|map| map.get(field.as_str()))
            .filter(|v| !v.is_null());
        for rule in rules {
            if let Some(error) = rule.check(field, value) {
                errors.push(error);
            }
        }
    }

    if errors.is_empty() {
        ValidationOutcome::valid(Validated::Payload(
            payload.cloned().unwrap_or(Value::Null),
        ))
    } else {
        ValidationOutcome::invalid(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn errors(outcome: ValidationOutcome) -> Vec<ValidationError> {
        match outcome {
            ValidationOutcome::Invalid(errors) => errors,
            ValidationOutcome::Valid(_) => panic!("expected failure"),
        }
    }

    #[test]
    fn conforming_payload_becomes_target() {
        let schema = RuleSchema::new()
            .field("name", vec![Rule::Required, Rule::Is(Kind::String)])
            .field("age", vec![Rule::Is(Kind::Number), Rule::Minimum(0.0)]);

        let payload = json!({"name": "ada", "age": 36});
        match validate_schema(&schema, Some(&payload)) {
            ValidationOutcome::Valid(target) => assert_eq!(target.payload(), Some(&payload)),
            ValidationOutcome::Invalid(errors) => panic!("unexpected errors: {errors:?}"),
        }
    }

    #[test]
    fn reports_exactly_the_violated_rules() {
        let schema = RuleSchema::new()
            .field("name", vec![Rule::Required, Rule::Is(Kind::String)])
            .field("age", vec![Rule::Minimum(0.0)]);

        let found = errors(validate_schema(&schema, Some(&json!({"age": -4}))));
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].field, "name");
        assert_eq!(found[1].field, "age");
    }

    #[test]
    fn optional_fields_pass_when_absent() {
        let schema = RuleSchema::new().field("bio", vec![Rule::Is(Kind::String)]);
        assert!(!validate_schema(&schema, Some(&json!({}))).did_fail());
    }

    #[test]
    fn null_counts_as_absent() {
        let schema = RuleSchema::new().field("bio", vec![Rule::Required]);
        let found = errors(validate_schema(&schema, Some(&json!({"bio": null}))));
        assert_eq!(found[0].field, "bio");
    }

    #[test]
    fn non_object_payload_fails_whole() {
        let schema = RuleSchema::new().field("name", vec![Rule::Required]);
        let found = errors(validate_schema(&schema, Some(&json!([1, 2]))));
        assert_eq!(found[0].field, "*");
    }

    #[test]
    fn length_bounds() {
        let schema = RuleSchema::new()
            .field("tag", vec![Rule::MinLength(2), Rule::MaxLength(4)]);

        assert!(validate_schema(&schema, Some(&json!({"tag": "x"}))).did_fail());
        assert!(validate_schema(&schema, Some(&json!({"tag": "xyzab"}))).did_fail());
        assert!(!validate_schema(&schema, Some(&json!({"tag": "xyz"}))).did_fail());
    }

    #[test]
    fn pattern_rule() {
        let schema = RuleSchema::new()
            .field("id", vec![Rule::pattern("^[a-z]+-[0-9]+$").unwrap()]);

        assert!(!validate_schema(&schema, Some(&json!({"id": "user-17"}))).did_fail());
        assert!(validate_schema(&schema, Some(&json!({"id": "17"}))).did_fail());
    }

    #[test]
    fn invalid_pattern_is_a_config_error() {
        assert!(Rule::pattern("(unclosed").is_err());
    }
}
