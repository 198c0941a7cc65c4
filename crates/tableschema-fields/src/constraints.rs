use std::cmp::Ordering;

use regex::Regex;
use serde_json::Value as JsonValue;
use tableschema_core::{ValidationError, ValidationErrors, Value, display_raw};

use crate::field::{CastMode, Field};
use crate::kind::FieldKind;

/// Constraint values prepared once per field.
#[derive(Debug, Clone, Default)]
pub(crate) struct CompiledConstraints {
    allowed: Option<Vec<Value>>,
    pattern: Option<Regex>,
    minimum: Option<Value>,
    maximum: Option<Value>,
    min_length: Option<usize>,
    max_length: Option<usize>,
}

impl CompiledConstraints {
    pub(crate) fn compile(field: &Field) -> Result<Self, ValidationErrors> {
        let declared = &field.descriptor().constraints;
        let mut errors = ValidationErrors::new();

        let allowed = declared.allowed.as_ref().map(|values| {
            values
                .iter()
                .filter_map(|raw| cast_constraint(field, "enum", raw, &mut errors))
                .collect()
        });

        let pattern = declared.pattern.as_ref().and_then(|pattern| {
            match Regex::new(&format!("^(?:{pattern})$")) {
                Ok(regex) => Some(regex),
                Err(err) => {
                    errors.push(ValidationError::schema_violation(format!(
                        "{}: invalid pattern constraint ({pattern}): {err}",
                        field.name()
                    )));
                    None
                }
            }
        });

        let minimum = declared
            .minimum
            .as_ref()
            .and_then(|raw| cast_constraint(field, "minimum", raw, &mut errors));
        let maximum = declared
            .maximum
            .as_ref()
            .and_then(|raw| cast_constraint(field, "maximum", raw, &mut errors));

        errors.into_result()?;

        Ok(Self {
            allowed,
            pattern,
            minimum,
            maximum,
            min_length: declared.min_length,
            max_length: declared.max_length,
        })
    }

    /// Check a cast value, returning every failed constraint in a fixed order.
    pub(crate) fn check(&self, field: &Field, raw: &JsonValue, value: &Value) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if let Some(allowed) = &self.allowed {
            if !allowed.contains(value) {
                errors.push(field.error(raw, "value not in enum"));
            }
        }

        if value.is_null() {
            return errors;
        }

        if let (Some(pattern), JsonValue::String(text)) = (&self.pattern, raw) {
            if !pattern.is_match(text) {
                errors.push(field.error(raw, "value does not match pattern"));
            }
        }

        if self.minimum.is_some() || self.maximum.is_some() {
            if field.kind().is_ordered() {
                if let Some(minimum) = &self.minimum {
                    if value.compare(minimum) == Some(Ordering::Less) {
                        errors.push(field.error(raw, "value is below minimum"));
                    }
                }
                if let Some(maximum) = &self.maximum {
                    if value.compare(maximum) == Some(Ordering::Greater) {
                        errors.push(field.error(raw, "value is above maximum"));
                    }
                }
            } else {
                let bound = if self.minimum.is_some() { "minimum" } else { "maximum" };
                errors.push(field.error(
                    raw,
                    format!("{bound} constraint is not supported for {} fields", field.kind()),
                ));
            }
        }

        if self.min_length.is_some() || self.max_length.is_some() {
            match value.length() {
                Some(length) => {
                    if self.min_length.is_some_and(|min| length < min) {
                        errors.push(field.error(raw, "value is below minimum length"));
                    }
                    if self.max_length.is_some_and(|max| length > max) {
                        errors.push(field.error(raw, "value is above maximum length"));
                    }
                }
                None => errors.push(field.error(raw, "invalid value for length constraint")),
            }
        }

        errors
    }
}

fn cast_constraint(
    field: &Field,
    constraint: &str,
    raw: &JsonValue,
    errors: &mut ValidationErrors,
) -> Option<Value> {
    match field.cast_value(raw, CastMode::SkipConstraints) {
        Ok(value) => Some(value),
        Err(err) => {
            let reason = err
                .iter()
                .map(|error| match error {
                    ValidationError::FieldValidation { message, .. } => message.clone(),
                    other => other.to_string(),
                })
                .collect::<Vec<_>>()
                .join(", ");
            errors.push(ValidationError::schema_violation(format!(
                "{}: invalid {constraint} constraint value ({}): {reason}",
                field.name(),
                display_raw(raw)
            )));
            None
        }
    }
}
