use tableschema_core::{FieldDescriptor, ForeignKey, SchemaDescriptor};

use crate::errors::{Result, SchemaError};
use crate::schema::Schema;

/// Mutable draft of a schema. Every change is validated as a whole candidate
/// descriptor and only committed when it builds; a rejected change leaves the
/// draft untouched.
#[derive(Debug, Clone, Default)]
pub struct SchemaBuilder {
    schema: Schema,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_schema(schema: Schema) -> Self {
        Self { schema }
    }

    pub fn from_descriptor(descriptor: SchemaDescriptor) -> Result<Self> {
        Ok(Self::from_schema(Schema::new(descriptor)?))
    }

    pub fn set_fields(&mut self, fields: Vec<FieldDescriptor>) -> Result<&mut Self> {
        self.commit(|draft| {
            draft.fields = fields;
            Ok(())
        })
    }

    /// Replace the field with the same name, or append it.
    pub fn set_field(&mut self, field: FieldDescriptor) -> Result<&mut Self> {
        self.commit(|draft| {
            match draft.fields.iter_mut().find(|existing| existing.name == field.name) {
                Some(existing) => *existing = field,
                None => draft.fields.push(field),
            }
            Ok(())
        })
    }

    pub fn remove_field(&mut self, name: &str) -> Result<&mut Self> {
        self.commit(|draft| {
            let before = draft.fields.len();
            draft.fields.retain(|field| field.name != name);
            if draft.fields.len() == before {
                return Err(SchemaError::UnknownField(name.to_string()));
            }
            Ok(())
        })
    }

    pub fn set_primary_key(&mut self, primary_key: Vec<String>) -> Result<&mut Self> {
        self.commit(|draft| {
            draft.primary_key = primary_key;
            Ok(())
        })
    }

    pub fn set_foreign_keys(&mut self, foreign_keys: Vec<ForeignKey>) -> Result<&mut Self> {
        self.commit(|draft| {
            draft.foreign_keys = foreign_keys;
            Ok(())
        })
    }

    pub fn set_missing_values(&mut self, missing_values: Vec<String>) -> Result<&mut Self> {
        self.commit(|draft| {
            draft.missing_values = Some(missing_values);
            Ok(())
        })
    }

    /// Current committed snapshot.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn build(self) -> Schema {
        self.schema
    }

    fn commit<F>(&mut self, change: F) -> Result<&mut Self>
    where
        F: FnOnce(&mut SchemaDescriptor) -> Result<()>,
    {
        let mut draft = self.schema.descriptor().clone();
        change(&mut draft)?;
        self.schema = Schema::new(draft)?;
        Ok(self)
    }
}
