use std::collections::HashSet;

use crate::descriptor::SchemaDescriptor;
use crate::error::ValidationError;

/// Validate field names and key references of a structurally valid descriptor.
pub fn validate_keys(descriptor: &SchemaDescriptor) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let mut names = HashSet::new();

    for field in &descriptor.fields {
        if !names.insert(field.name.as_str()) {
            errors.push(ValidationError::schema_violation(format!(
                "duplicate field name ({})",
                field.name
            )));
        }
    }

    for key in &descriptor.primary_key {
        if !names.contains(key.as_str()) {
            errors.push(ValidationError::schema_violation(format!(
                "primary key must refer to a field name ({key})"
            )));
        }
    }

    for fk in &descriptor.foreign_keys {
        for field in &fk.fields {
            if !names.contains(field.as_str()) {
                errors.push(ValidationError::schema_violation(format!(
                    "foreign key fields must refer to a field name ({field})"
                )));
            }
        }

        if fk.fields.len() != fk.reference.fields.len() {
            errors.push(ValidationError::schema_violation(format!(
                "foreign key fields and reference fields must have the same length ({})",
                fk.fields.join(", ")
            )));
        }

        if fk.is_self_reference() {
            for field in &fk.reference.fields {
                if !names.contains(field.as_str()) {
                    errors.push(ValidationError::schema_violation(format!(
                        "foreign key reference to self must refer to a field name ({field})"
                    )));
                }
            }
        }
    }

    errors
}
