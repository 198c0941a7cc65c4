use indexmap::IndexMap;
use tableschema_core::{RawRow, Row, SchemaDescriptor, ValidationErrors};
use tableschema_fields::{Field, FieldsInferrer};
use tracing::info;

use crate::errors::Result;
use crate::schema::Schema;

/// Schema that revises its fields from every row it casts until it is locked.
#[derive(Debug, Clone, Default)]
pub struct InferSchema {
    inferrer: FieldsInferrer,
    fields: IndexMap<String, Field>,
    locked: Option<Schema>,
}

impl InferSchema {
    pub fn new(lenient: bool) -> Self {
        Self {
            inferrer: FieldsInferrer::new(lenient),
            ..Self::default()
        }
    }

    pub fn is_locked(&self) -> bool {
        self.locked.is_some()
    }

    /// Before locking: add the row to the inference sample and return its cast
    /// under the current best fields. After locking: a plain schema cast.
    pub fn cast_row(&mut self, row: &RawRow) -> std::result::Result<Row, ValidationErrors> {
        if let Some(schema) = &self.locked {
            return schema.cast_row(row);
        }

        self.inferrer.add_row(row.clone())?;
        self.fields = self.inferrer.infer();
        Ok(self.inferrer.cast_rows().last().cloned().unwrap_or_default())
    }

    /// Freeze the inferred fields and hand back every row cast so far, under the final fields.
    pub fn lock(&mut self) -> Result<Vec<Row>> {
        if self.locked.is_some() {
            return Ok(Vec::new());
        }

        let schema = Schema::new(self.descriptor())?;
        info!(
            event = "schema_locked",
            fields = schema.fields().len(),
            rows = self.inferrer.cast_rows().len()
        );
        self.locked = Some(schema);
        Ok(self.inferrer.take_cast_rows())
    }

    /// The locked schema, once `lock` has run.
    pub fn schema(&self) -> Option<&Schema> {
        self.locked.as_ref()
    }

    pub fn fields(&self) -> &IndexMap<String, Field> {
        match &self.locked {
            Some(schema) => schema.fields(),
            None => &self.fields,
        }
    }

    /// Descriptor of the currently inferred fields.
    pub fn descriptor(&self) -> SchemaDescriptor {
        match &self.locked {
            Some(schema) => schema.descriptor().clone(),
            None => SchemaDescriptor::new(
                self.fields
                    .values()
                    .map(|field| field.full_descriptor())
                    .collect(),
            ),
        }
    }
}
