use jsonschema::JSONSchema;
use serde_json::Value as JsonValue;
use tableschema_core::{SchemaDescriptor, ValidationError, validate_keys};

use crate::errors::{Result, SchemaError};

/// JSON Schema document describing the shape of a table schema descriptor.
pub const TABLE_SCHEMA: &str = include_str!("../schemas/table-schema.json");

/// Validate a descriptor against the table schema document, returning violations
/// as `[<json pointer>] <message>`.
pub fn structural_errors(descriptor: &JsonValue) -> Result<Vec<ValidationError>> {
    let schema: JsonValue =
        serde_json::from_str(TABLE_SCHEMA).map_err(|err| SchemaError::Validator(err.to_string()))?;
    let compiled =
        JSONSchema::compile(&schema).map_err(|err| SchemaError::Validator(err.to_string()))?;

    let mut errors = Vec::new();
    if let Err(failures) = compiled.validate(descriptor) {
        for failure in failures {
            let path = normalized_json_pointer(&failure.instance_path.to_string());
            errors.push(ValidationError::schema_violation(format!("[{path}] {failure}")));
        }
    }

    Ok(errors)
}

/// Typed view of a structurally valid descriptor.
pub fn parse_descriptor(descriptor: JsonValue) -> std::result::Result<SchemaDescriptor, ValidationError> {
    serde_json::from_value(descriptor).map_err(|err| {
        ValidationError::schema_violation(format!("invalid schema descriptor: {err}"))
    })
}

/// Structural validation followed, when the shape is sound, by key reference checks.
pub fn validate_descriptor(descriptor: &JsonValue) -> Result<Vec<ValidationError>> {
    let errors = structural_errors(descriptor)?;
    if !errors.is_empty() {
        return Ok(errors);
    }

    match parse_descriptor(descriptor.clone()) {
        Ok(parsed) => Ok(validate_keys(&parsed)),
        Err(error) => Ok(vec![error]),
    }
}

fn normalized_json_pointer(pointer: &str) -> String {
    if pointer.is_empty() {
        "/".to_string()
    } else {
        pointer.to_string()
    }
}
