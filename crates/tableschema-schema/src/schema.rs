use std::fmt::Display;
use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use serde_json::Value as JsonValue;
use tableschema_core::{
    FieldDescriptor, ForeignKey, RawRow, Row, SchemaDescriptor, ValidationError, ValidationErrors,
    validate_keys,
};
use tableschema_fields::{CastMode, Field, FieldRegistry};
use tracing::{debug, info};

use crate::errors::{Result, SchemaError};
use crate::validator;

/// Any of the ways a schema descriptor can be handed over.
#[derive(Debug, Clone)]
pub enum SchemaSource {
    Value(JsonValue),
    Json(String),
    Descriptor(SchemaDescriptor),
}

impl SchemaSource {
    fn into_json(self) -> Result<JsonValue> {
        match self {
            Self::Value(value) => Ok(value),
            Self::Json(text) => serde_json::from_str(&text)
                .map_err(|err| SchemaError::Load(format!("error decoding descriptor {text}: {err}"))),
            Self::Descriptor(descriptor) => serde_json::to_value(&descriptor)
                .map_err(|err| SchemaError::Load(format!("error encoding descriptor: {err}"))),
        }
    }
}

impl From<JsonValue> for SchemaSource {
    fn from(value: JsonValue) -> Self {
        Self::Value(value)
    }
}

impl From<&str> for SchemaSource {
    fn from(value: &str) -> Self {
        Self::Json(value.to_string())
    }
}

impl From<String> for SchemaSource {
    fn from(value: String) -> Self {
        Self::Json(value)
    }
}

impl From<SchemaDescriptor> for SchemaSource {
    fn from(value: SchemaDescriptor) -> Self {
        Self::Descriptor(value)
    }
}

/// Validated table schema: an ordered set of fields plus key definitions.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    descriptor: SchemaDescriptor,
    fields: IndexMap<String, Field>,
}

impl Schema {
    /// Build a schema, failing on undecodable input or any descriptor violation.
    pub fn new(source: impl Into<SchemaSource>) -> Result<Self> {
        let json = source.into().into_json()?;
        Self::from_json(json)
    }

    /// Schema with no fields.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Fetch the descriptor text through `loader` (file, network, ...) and build from it.
    pub fn load<F, E>(source: &str, loader: F) -> Result<Self>
    where
        F: FnOnce(&str) -> std::result::Result<String, E>,
        E: Display,
    {
        let contents = loader(source).map_err(|err| {
            SchemaError::Load(format!("error loading descriptor from source {source}: {err}"))
        })?;
        let json = serde_json::from_str(&contents).map_err(|err| {
            SchemaError::Load(format!(
                "error decoding descriptor from source {source} - {contents}: {err}"
            ))
        })?;
        Self::from_json(json)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        Self::load(&path.display().to_string(), |_| fs::read_to_string(path))
    }

    /// Every problem with a descriptor, or an empty list when it builds cleanly.
    pub fn validate(source: impl Into<SchemaSource>) -> Vec<ValidationError> {
        match Self::new(source) {
            Ok(_) => Vec::new(),
            Err(SchemaError::ValidationFailed(errors)) => errors.into_vec(),
            Err(other) => vec![ValidationError::load_failed(other.to_string())],
        }
    }

    fn from_json(json: JsonValue) -> Result<Self> {
        let errors = validator::structural_errors(&json)?;
        if !errors.is_empty() {
            return Err(SchemaError::ValidationFailed(errors.into()));
        }

        let descriptor = validator::parse_descriptor(json)
            .map_err(|error| SchemaError::ValidationFailed(error.into()))?;

        let mut errors = ValidationErrors::from(validate_keys(&descriptor));
        let registry = FieldRegistry::new();
        let mut fields = IndexMap::new();
        for field_descriptor in &descriptor.fields {
            match registry.field(field_descriptor.clone()) {
                Ok(field) => {
                    fields.insert(field_descriptor.name.clone(), field);
                }
                Err(field_errors) => errors.extend(field_errors),
            }
        }
        if !errors.is_empty() {
            return Err(SchemaError::ValidationFailed(errors));
        }

        debug!(
            event = "schema_loaded",
            fields = fields.len(),
            primary_key = ?descriptor.primary_key
        );
        Ok(Self { descriptor, fields })
    }

    pub fn descriptor(&self) -> &SchemaDescriptor {
        &self.descriptor
    }

    /// Descriptor with every field's type and format and the missing values spelled out.
    pub fn full_descriptor(&self) -> SchemaDescriptor {
        let mut descriptor = self.descriptor.clone();
        descriptor.fields = self.fields.values().map(Field::full_descriptor).collect();
        descriptor.missing_values = Some(self.missing_values().to_vec());
        descriptor
    }

    pub fn fields(&self) -> &IndexMap<String, Field> {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.get(name)
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.fields.keys().map(String::as_str).collect()
    }

    pub fn field_descriptors(&self) -> &[FieldDescriptor] {
        &self.descriptor.fields
    }

    pub fn primary_key(&self) -> &[String] {
        &self.descriptor.primary_key
    }

    pub fn foreign_keys(&self) -> &[ForeignKey] {
        &self.descriptor.foreign_keys
    }

    pub fn missing_values(&self) -> &[String] {
        self.descriptor.missing_values()
    }

    /// Cast every declared field of `row`, collecting the failures of all fields.
    ///
    /// Absent columns read as null; raw strings listed in `missingValues` become null
    /// before casting.
    pub fn cast_row(&self, row: &RawRow) -> std::result::Result<Row, ValidationErrors> {
        let missing_values = self.missing_values();
        let mut cast = Row::with_capacity(self.fields.len());
        let mut errors = ValidationErrors::new();

        for (name, field) in &self.fields {
            let raw = match row.get(name) {
                Some(JsonValue::String(text)) if missing_values.contains(text) => &JsonValue::Null,
                Some(value) => value,
                None => &JsonValue::Null,
            };
            match field.cast_value(raw, CastMode::Enforce) {
                Ok(value) => {
                    cast.insert(name.clone(), value);
                }
                Err(field_errors) => errors.extend(field_errors),
            }
        }

        errors.into_result()?;
        Ok(cast)
    }

    pub fn validate_row(&self, row: &RawRow) -> Vec<ValidationError> {
        match self.cast_row(row) {
            Ok(_) => Vec::new(),
            Err(errors) => errors.into_vec(),
        }
    }

    pub fn to_json(&self) -> JsonValue {
        self.descriptor.to_json()
    }

    /// Write the descriptor as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(&self.descriptor)
            .map_err(|err| SchemaError::Load(err.to_string()))?;
        fs::write(path, json)?;
        info!(event = "schema_saved", path = %path.display());
        Ok(())
    }
}
