use serde_json::Value as JsonValue;
use tableschema_core::RawRow;

use super::DataSource;
use crate::errors::DataSourceError;

/// Rows held in memory.
#[derive(Debug, Clone, Default)]
pub struct NativeDataSource {
    rows: Vec<RawRow>,
    cursor: usize,
}

impl NativeDataSource {
    pub fn new(rows: Vec<RawRow>) -> Self {
        Self { rows, cursor: 0 }
    }

    /// Build from a JSON array of objects.
    pub fn from_json(value: JsonValue) -> Result<Self, DataSourceError> {
        let JsonValue::Array(items) = value else {
            return Err(DataSourceError::new("native data must be an array of objects"));
        };
        let rows = items
            .into_iter()
            .enumerate()
            .map(|(index, item)| match item {
                JsonValue::Object(map) => Ok(map.into_iter().collect()),
                _ => Err(DataSourceError::at_row(index + 1, "row must be an object")),
            })
            .collect::<Result<Vec<RawRow>, _>>()?;
        Ok(Self::new(rows))
    }
}

impl FromIterator<RawRow> for NativeDataSource {
    fn from_iter<I: IntoIterator<Item = RawRow>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl DataSource for NativeDataSource {
    fn open(&mut self) -> Result<(), DataSourceError> {
        self.cursor = 0;
        Ok(())
    }

    fn next_line(&mut self) -> Result<RawRow, DataSourceError> {
        let row = self
            .rows
            .get(self.cursor)
            .cloned()
            .ok_or_else(|| DataSourceError::new("no more rows in data source"))?;
        self.cursor += 1;
        Ok(row)
    }

    fn is_eof(&mut self) -> Result<bool, DataSourceError> {
        Ok(self.cursor >= self.rows.len())
    }

    fn headers(&self) -> Option<Vec<String>> {
        self.rows.first().map(|row| row.keys().cloned().collect())
    }
}
