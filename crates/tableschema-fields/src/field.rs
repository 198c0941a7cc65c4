use serde_json::Value as JsonValue;
use tableschema_core::{FieldDescriptor, ValidationError, ValidationErrors, Value};

use crate::constraints::CompiledConstraints;
use crate::kind::FieldKind;
use crate::types;

/// Whether a cast enforces the descriptor's constraints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CastMode {
    #[default]
    Enforce,
    /// Type conversion only; `required` and every other constraint are ignored.
    SkipConstraints,
}

/// A typed column built from a field descriptor.
///
/// Constraint values (`enum`, `minimum`, `maximum`) are cast through the field
/// and the `pattern` is compiled when the field is built, so a descriptor with
/// unusable constraints never produces a `Field`.
#[derive(Debug, Clone)]
pub struct Field {
    descriptor: FieldDescriptor,
    kind: FieldKind,
    constraints: CompiledConstraints,
}

impl Field {
    pub fn new(descriptor: FieldDescriptor) -> Result<Self, ValidationErrors> {
        let kind = match descriptor.field_type.as_deref() {
            None => FieldKind::String,
            Some(name) => FieldKind::from_name(name).ok_or_else(|| {
                ValidationError::schema_violation(format!(
                    "Could not find a valid field for descriptor: {}",
                    descriptor.to_json()
                ))
            })?,
        };

        let mut field = Self {
            descriptor,
            kind,
            constraints: CompiledConstraints::default(),
        };
        field.constraints = CompiledConstraints::compile(&field)?;
        Ok(field)
    }

    /// An `any` field with no constraints.
    pub(crate) fn untyped(name: &str) -> Self {
        Self {
            descriptor: FieldDescriptor::new(name).with_type(FieldKind::Any.name()),
            kind: FieldKind::Any,
            constraints: CompiledConstraints::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    pub fn field_type(&self) -> &'static str {
        self.kind.name()
    }

    pub fn format(&self) -> &str {
        self.descriptor.format.as_deref().unwrap_or("default")
    }

    pub fn title(&self) -> Option<&str> {
        self.descriptor.title.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.descriptor.description.as_deref()
    }

    pub fn rdf_type(&self) -> Option<&str> {
        self.descriptor.rdf_type.as_deref()
    }

    pub fn required(&self) -> bool {
        self.descriptor.constraints.required()
    }

    pub fn unique(&self) -> bool {
        self.descriptor.constraints.unique()
    }

    /// Raw `enum` constraint values as declared.
    pub fn enum_values(&self) -> Option<&[JsonValue]> {
        self.descriptor.constraints.allowed.as_deref()
    }

    pub fn descriptor(&self) -> &FieldDescriptor {
        &self.descriptor
    }

    /// Descriptor with `type` and `format` spelled out.
    pub fn full_descriptor(&self) -> FieldDescriptor {
        let mut descriptor = self.descriptor.clone();
        descriptor.field_type = Some(self.field_type().to_string());
        descriptor.format = Some(self.format().to_string());
        descriptor
    }

    /// Whether the raw value counts as missing before any conversion.
    pub fn is_empty_value(&self, raw: &JsonValue) -> bool {
        match self.kind {
            FieldKind::Any => false,
            _ => raw.is_null(),
        }
    }

    /// Cast a raw value into its native representation.
    pub fn cast_value(&self, raw: &JsonValue, mode: CastMode) -> Result<Value, ValidationErrors> {
        let enforce = mode == CastMode::Enforce;

        if self.is_empty_value(raw) {
            if enforce && self.required() {
                return Err(self.error(raw, "field is required").into());
            }
            return Ok(Value::Null);
        }

        let value = types::cast(self, raw).map_err(|message| self.error(raw, message))?;

        if enforce {
            let errors = self.constraints.check(self, raw, &value);
            if !errors.is_empty() {
                return Err(ValidationErrors(errors));
            }
        }

        Ok(value)
    }

    pub fn validate_value(&self, raw: &JsonValue) -> Vec<ValidationError> {
        match self.cast_value(raw, CastMode::Enforce) {
            Ok(_) => Vec::new(),
            Err(errors) => errors.into_vec(),
        }
    }

    /// Key used to tally this field during inference.
    pub fn infer_identifier(&self, lenient: bool) -> String {
        match self.kind {
            FieldKind::String if !lenient => format!("string:{}", self.format()),
            kind => kind.name().to_string(),
        }
    }

    /// Refine the descriptor from a sample value after a successful inference cast.
    pub(crate) fn infer_properties(&mut self, raw: &JsonValue, lenient: bool) {
        if self.kind == FieldKind::String
            && !lenient
            && raw.as_str().is_some_and(|text| text.contains('@'))
        {
            self.descriptor.format = Some("email".to_string());
        }
    }

    pub(crate) fn error(&self, raw: &JsonValue, message: impl Into<String>) -> ValidationError {
        ValidationError::field(self.name(), raw.clone(), message)
    }
}
