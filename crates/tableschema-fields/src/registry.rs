use serde_json::Value as JsonValue;
use tableschema_core::{FieldDescriptor, ValidationError, ValidationErrors, display_raw};

use crate::field::{CastMode, Field};
use crate::kind::{FieldKind, INFER_ORDER};

/// Builds fields from descriptors and infers them from sample values.
#[derive(Debug, Clone, Default)]
pub struct FieldRegistry;

impl FieldRegistry {
    pub fn new() -> Self {
        Self
    }

    pub fn field(&self, descriptor: FieldDescriptor) -> Result<Field, ValidationErrors> {
        Field::new(descriptor)
    }

    /// First kind in inference order that accepts `raw`, with properties refined from it.
    pub fn infer(
        &self,
        raw: &JsonValue,
        partial: &FieldDescriptor,
        lenient: bool,
    ) -> Result<Field, ValidationErrors> {
        INFER_ORDER
            .iter()
            .find_map(|kind| self.try_kind(*kind, raw, partial, lenient))
            .ok_or_else(|| {
                ValidationError::schema_violation(format!(
                    "Could not find a valid field for value: {}",
                    display_raw(raw)
                ))
                .into()
            })
    }

    fn try_kind(
        &self,
        kind: FieldKind,
        raw: &JsonValue,
        partial: &FieldDescriptor,
        lenient: bool,
    ) -> Option<Field> {
        let descriptor = partial.clone().with_type(kind.name());
        let mut field = Field::new(descriptor).ok()?;
        field.cast_value(raw, CastMode::Enforce).ok()?;
        field.infer_properties(raw, lenient);
        Some(field)
    }
}
