use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tableschema_core::{RawRow, Row, ValidationError, ValidationErrors, Value, tuple_key};
use tableschema_schema::{InferSchema, Schema};
use tracing::{debug, info, warn};

use crate::dialect::{CsvDialect, CsvDialectConfig};
use crate::errors::{DataSourceError, Result, TableError};
use crate::output;
use crate::source::{CsvDataSource, DataSource};

/// Rows peeked by default when a schema has to be inferred.
pub const DEFAULT_PEEK_ROWS: usize = 10;

/// Options for the bulk read helpers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadOptions {
    /// Stop after this many rows; `None` or `0` reads everything.
    pub limit: Option<usize>,
}

impl ReadOptions {
    pub fn limit(limit: usize) -> Self {
        Self { limit: Some(limit) }
    }

    fn max_rows(self) -> usize {
        match self.limit {
            Some(limit) if limit > 0 => limit,
            _ => usize::MAX,
        }
    }
}

/// A cast row together with its position and the table headers.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtendedRow {
    /// 1-based data row number.
    pub row_number: usize,
    pub headers: Vec<String>,
    pub values: Vec<Value>,
}

#[derive(Debug)]
enum SchemaSlot {
    Fixed(Schema),
    /// Inference still running; replaced by `Fixed` once locked.
    Inferring(InferSchema),
}

impl SchemaSlot {
    fn cast_row(&mut self, row: &RawRow) -> std::result::Result<Row, ValidationErrors> {
        match self {
            Self::Fixed(schema) => schema.cast_row(row),
            Self::Inferring(infer) => infer.cast_row(row),
        }
    }

    fn field_names(&self) -> Vec<String> {
        match self {
            Self::Fixed(schema) => schema.fields().keys().cloned().collect(),
            Self::Inferring(infer) => infer.fields().keys().cloned().collect(),
        }
    }
}

/// Streams rows from a data source, casting each through the schema and
/// enforcing `unique` and primary key constraints across the pass.
///
/// Iteration yields `Result<Row>` and stops after the first error.
#[derive(Debug)]
pub struct Table<S: DataSource> {
    source: S,
    schema: SchemaSlot,
    lenient: bool,
    /// Rows cast while peeking for inference, served before the source.
    replay: VecDeque<Row>,
    row_num: usize,
    failed: bool,
    unique_values: HashMap<String, HashSet<String>>,
    primary_keys: HashSet<String>,
}

impl<S: DataSource> Table<S> {
    /// Open `source`; without a schema one is inferred from the rows.
    pub fn new(source: S, schema: Option<Schema>) -> Result<Self> {
        let schema = match schema {
            Some(schema) => SchemaSlot::Fixed(schema),
            None => SchemaSlot::Inferring(InferSchema::new(false)),
        };
        Self::open(source, schema, false)
    }

    /// Table with an inferred schema; `lenient` turns off string format inference.
    pub fn inferring(source: S, lenient: bool) -> Result<Self> {
        Self::open(source, SchemaSlot::Inferring(InferSchema::new(lenient)), lenient)
    }

    fn open(mut source: S, schema: SchemaSlot, lenient: bool) -> Result<Self> {
        source.open()?;
        debug!(
            event = "table_opened",
            inferring = matches!(schema, SchemaSlot::Inferring(_))
        );
        Ok(Self {
            source,
            schema,
            lenient,
            replay: VecDeque::new(),
            row_num: 0,
            failed: false,
            unique_values: HashMap::new(),
            primary_keys: HashSet::new(),
        })
    }

    /// Run the streaming checks over at most `num_peek_rows` rows and report
    /// the first failure as validation errors.
    pub fn validate(source: S, schema: Option<Schema>, num_peek_rows: usize) -> Vec<ValidationError> {
        let mut table = match Self::new(source, schema) {
            Ok(table) => table,
            Err(err) => return vec![ValidationError::load_failed(err.to_string())],
        };

        let mut errors = Vec::new();
        for _ in 0..num_peek_rows {
            match table.next() {
                None => break,
                Some(Ok(_)) => {}
                Some(Err(err)) => {
                    errors = err.into_validation_errors(table.row_num);
                    break;
                }
            }
        }
        info!(
            event = "table_validated",
            rows = table.row_num,
            errors = errors.len()
        );
        errors
    }

    /// The table schema, inferring it from up to `num_peek_rows` rows first when
    /// none was given. Peeked rows are replayed by the iterator.
    pub fn schema(&mut self, num_peek_rows: usize) -> Result<&Schema> {
        self.infer_schema(num_peek_rows)?;
        match &self.schema {
            SchemaSlot::Fixed(schema) => Ok(schema),
            SchemaSlot::Inferring(_) => Err(TableError::InferenceIncomplete),
        }
    }

    pub fn headers(&mut self, num_peek_rows: usize) -> Result<Vec<String>> {
        self.infer_schema(num_peek_rows)?;
        Ok(self.schema.field_names())
    }

    /// Cast rows, starting from the first one when the previous pass has ended.
    pub fn read(&mut self, options: ReadOptions) -> Result<Vec<Row>> {
        self.rewind()?;
        self.by_ref().take(options.max_rows()).collect()
    }

    /// Raw source rows without casting or constraint checks. Leaves the table
    /// ready for a fresh pass.
    pub fn read_raw(&mut self, options: ReadOptions) -> Result<Vec<RawRow>> {
        self.source.open()?;
        let max_rows = options.max_rows();
        let mut rows = Vec::new();
        while rows.len() < max_rows && !self.source.is_eof()? {
            rows.push(self.source.next_line()?);
        }
        self.restart()?;
        Ok(rows)
    }

    /// Cast rows as values in header order, numbered from 1.
    pub fn read_extended(&mut self, options: ReadOptions) -> Result<Vec<ExtendedRow>> {
        let headers = self.headers(options.limit.unwrap_or(DEFAULT_PEEK_ROWS))?;
        let rows = self.read(options)?;
        Ok(rows
            .into_iter()
            .enumerate()
            .map(|(index, row)| ExtendedRow {
                row_number: index + 1,
                headers: headers.clone(),
                values: headers
                    .iter()
                    .map(|name| row.get(name).cloned().unwrap_or(Value::Null))
                    .collect(),
            })
            .collect())
    }

    /// Start a new pass. A no-op before the first row; allowed again only once
    /// the source is exhausted. An inferring schema is locked first.
    pub fn rewind(&mut self) -> Result<()> {
        if self.row_num == 0 {
            return Ok(());
        }
        if !self.replay.is_empty() || !self.source.is_eof()? {
            return Err(TableError::RewindUnsupported);
        }
        self.lock_inferred()?;
        self.restart()
    }

    /// Write the header and the remaining raw rows as CSV.
    pub fn save(&mut self, path: impl AsRef<Path>) -> Result<usize> {
        let headers = match self.source.headers() {
            Some(headers) => headers,
            None => self.schema.field_names(),
        };
        output::save_source(&mut self.source, &headers, path.as_ref())
    }

    /// 1-based number of the last row handed out.
    pub fn row_num(&self) -> usize {
        self.row_num
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    fn infer_schema(&mut self, num_peek_rows: usize) -> Result<()> {
        if matches!(self.schema, SchemaSlot::Fixed(_)) {
            return Ok(());
        }
        let emitted = self.row_num;
        for result in self.by_ref().take(num_peek_rows) {
            result?;
        }
        let rows = self.lock_inferred()?;
        self.replay = rows.into_iter().skip(emitted).collect();
        self.row_num = emitted;
        Ok(())
    }

    fn lock_inferred(&mut self) -> Result<Vec<Row>> {
        let SchemaSlot::Inferring(infer) = &mut self.schema else {
            return Ok(Vec::new());
        };
        let rows = infer.lock()?;
        let locked = infer.schema().cloned();
        if let Some(schema) = locked {
            self.schema = SchemaSlot::Fixed(schema);
        }
        Ok(rows)
    }

    fn restart(&mut self) -> Result<()> {
        self.source.open()?;
        if let SchemaSlot::Inferring(infer) = &mut self.schema {
            *infer = InferSchema::new(self.lenient);
        }
        self.replay.clear();
        self.row_num = 0;
        self.failed = false;
        self.unique_values.clear();
        self.primary_keys.clear();
        Ok(())
    }

    fn next_row(&mut self) -> Result<Row> {
        let raw = self.source.next_line()?;
        let raw = self.align_headers(raw);
        let row = self
            .schema
            .cast_row(&raw)
            .map_err(|errors| TableError::FieldValidation {
                row: self.row_num,
                errors,
            })?;
        self.check_row_constraints(&row)?;
        Ok(row)
    }

    /// Rename raw columns onto schema field names that differ only in case.
    fn align_headers(&self, raw: RawRow) -> RawRow {
        if self.source.case_sensitive_header() {
            return raw;
        }
        let SchemaSlot::Fixed(schema) = &self.schema else {
            return raw;
        };
        let fields = schema.fields();
        raw.into_iter()
            .map(|(name, value)| {
                if fields.contains_key(&name) {
                    return (name, value);
                }
                let lower = name.to_lowercase();
                match fields.keys().find(|field| field.to_lowercase() == lower) {
                    Some(field) => (field.clone(), value),
                    None => (name, value),
                }
            })
            .collect::<IndexMap<_, _>>()
    }

    fn check_row_constraints(&mut self, row: &Row) -> Result<()> {
        let SchemaSlot::Fixed(schema) = &self.schema else {
            return Ok(());
        };

        for (name, field) in schema.fields() {
            if !field.unique() {
                continue;
            }
            let Some(value) = row.get(name).filter(|value| !value.is_null()) else {
                continue;
            };
            let seen = self.unique_values.entry(name.clone()).or_default();
            if !seen.insert(value.key()) {
                return Err(DataSourceError::at_row(
                    self.row_num,
                    format!("{name}: field must be unique"),
                )
                .into());
            }
        }

        let primary_key = schema.primary_key();
        if primary_key.is_empty() {
            return Ok(());
        }
        let mut key_values = Vec::with_capacity(primary_key.len());
        for key in primary_key {
            match row.get(key) {
                Some(value) if !value.is_null() => key_values.push(value),
                _ => {
                    return Err(DataSourceError::at_row(
                        self.row_num,
                        format!(
                            "value for {key} field cannot be null because it is part of the primary key"
                        ),
                    )
                    .into());
                }
            }
        }
        if !self.primary_keys.insert(tuple_key(key_values)) {
            return Err(DataSourceError::at_row(
                self.row_num,
                format!("duplicate row for the primary key {}", primary_key.join("/")),
            )
            .into());
        }
        Ok(())
    }
}

impl Table<CsvDataSource> {
    /// Open a CSV file with the given dialect.
    pub fn from_csv_path(
        path: impl Into<PathBuf>,
        schema: Option<Schema>,
        dialect: CsvDialectConfig,
    ) -> Result<Self> {
        let source = CsvDataSource::from_path(path).with_dialect(CsvDialect::new(dialect)?);
        Self::new(source, schema)
    }
}

impl<S: DataSource> Iterator for Table<S> {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(row) = self.replay.pop_front() {
            self.row_num += 1;
            return Some(Ok(row));
        }
        if self.failed {
            return None;
        }
        match self.source.is_eof() {
            Ok(true) => return None,
            Ok(false) => {}
            Err(err) => {
                self.failed = true;
                return Some(Err(err.into()));
            }
        }

        self.row_num += 1;
        let result = self.next_row();
        if let Err(err) = &result {
            self.failed = true;
            warn!(event = "row_rejected", row = self.row_num, error = %err);
        }
        Some(result)
    }
}

impl<S: DataSource> Drop for Table<S> {
    fn drop(&mut self) {
        self.source.close();
        debug!(event = "table_closed", rows = self.row_num);
    }
}
