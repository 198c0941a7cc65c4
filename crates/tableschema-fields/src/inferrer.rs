use std::cmp::Reverse;

use indexmap::IndexMap;
use serde_json::Value as JsonValue;
use tableschema_core::{FieldDescriptor, RawRow, Row, ValidationErrors, Value};
use tracing::debug;

use crate::field::{CastMode, Field};
use crate::registry::FieldRegistry;

#[derive(Debug, Clone)]
struct Candidate {
    identifier: String,
    count: usize,
    discovered: usize,
    field: Field,
}

/// Incrementally infers one field per column from sample rows.
///
/// Each value votes for the first kind that accepts it. On `infer`, candidates
/// are tried from most to least popular (ties keep discovery order) and the
/// first one that casts every collected value of the column wins.
#[derive(Debug, Clone, Default)]
pub struct FieldsInferrer {
    registry: FieldRegistry,
    lenient: bool,
    input_rows: Vec<RawRow>,
    cast_rows: Vec<Row>,
    popularity: IndexMap<String, Vec<Candidate>>,
    winners: IndexMap<String, String>,
}

impl FieldsInferrer {
    pub fn new(lenient: bool) -> Self {
        Self {
            lenient,
            ..Self::default()
        }
    }

    pub fn add_rows(&mut self, rows: impl IntoIterator<Item = RawRow>) -> Result<(), ValidationErrors> {
        for row in rows {
            self.add_row(row)?;
        }
        Ok(())
    }

    pub fn add_row(&mut self, row: RawRow) -> Result<(), ValidationErrors> {
        for (column, raw) in &row {
            let partial = FieldDescriptor::new(column.clone());
            let field = self.registry.infer(raw, &partial, self.lenient)?;
            let identifier = field.infer_identifier(self.lenient);

            let candidates = self.popularity.entry(column.clone()).or_default();
            match candidates
                .iter_mut()
                .find(|candidate| candidate.identifier == identifier)
            {
                Some(candidate) => candidate.count += 1,
                None => {
                    let discovered = candidates.len();
                    candidates.push(Candidate {
                        identifier,
                        count: 1,
                        discovered,
                        field,
                    });
                }
            }
            candidates.sort_by_key(|candidate| (Reverse(candidate.count), candidate.discovered));
        }
        self.input_rows.push(row);
        Ok(())
    }

    /// Pick the winning field per column and re-cast every collected row with it.
    pub fn infer(&mut self) -> IndexMap<String, Field> {
        let mut fields = IndexMap::new();
        let mut columns: Vec<Vec<Value>> = Vec::new();

        for (column, candidates) in &self.popularity {
            let (field, values) = candidates
                .iter()
                .find_map(|candidate| {
                    cast_column(&candidate.field, column, &self.input_rows)
                        .map(|values| (candidate.field.clone(), values))
                })
                .unwrap_or_else(|| fallback(column, &self.input_rows));

            let identifier = field.infer_identifier(self.lenient);
            if let Some(previous) = self.winners.insert(column.clone(), identifier.clone()) {
                if previous != identifier {
                    debug!(
                        event = "inferred_type_changed",
                        column = %column,
                        from = %previous,
                        to = %identifier
                    );
                }
            }

            fields.insert(column.clone(), field);
            columns.push(values);
        }

        self.cast_rows = (0..self.input_rows.len())
            .map(|index| {
                fields
                    .keys()
                    .zip(&columns)
                    .map(|(name, values)| (name.clone(), values[index].clone()))
                    .collect()
            })
            .collect();

        fields
    }

    pub fn input_rows(&self) -> &[RawRow] {
        &self.input_rows
    }

    /// Rows cast by the most recent `infer`.
    pub fn cast_rows(&self) -> &[Row] {
        &self.cast_rows
    }

    pub fn take_cast_rows(&mut self) -> Vec<Row> {
        std::mem::take(&mut self.cast_rows)
    }
}

fn column_value<'a>(row: &'a RawRow, column: &str) -> &'a JsonValue {
    row.get(column).unwrap_or(&JsonValue::Null)
}

fn cast_column(field: &Field, column: &str, rows: &[RawRow]) -> Option<Vec<Value>> {
    rows.iter()
        .map(|row| field.cast_value(column_value(row, column), CastMode::Enforce).ok())
        .collect()
}

/// An `any` field accepts every value; used when no candidate covers the whole column.
fn fallback(column: &str, rows: &[RawRow]) -> (Field, Vec<Value>) {
    let values = rows
        .iter()
        .map(|row| Value::from_json(column_value(row, column)))
        .collect();
    (Field::untyped(column), values)
}
