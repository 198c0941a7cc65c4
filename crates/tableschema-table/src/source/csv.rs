use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader, Cursor, Read};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tableschema_core::RawRow;
use tracing::debug;

use super::DataSource;
use crate::dialect::{CsvDialect, LineTerminator, ParsedLine, PendingRow};
use crate::errors::{DataSourceError, Result};
use crate::output;

/// Where the header row sits and how many leading rows to skip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CsvSourceOptions {
    /// Explicit header names; no rows are consumed as a header.
    pub header_row: Option<Vec<String>>,
    /// 1-based line of the header row.
    pub header_row_num: usize,
    /// Leading rows to skip, defaulting to `header_row_num`.
    pub skip_rows: Option<usize>,
}

impl Default for CsvSourceOptions {
    fn default() -> Self {
        Self {
            header_row: None,
            header_row_num: 1,
            skip_rows: None,
        }
    }
}

enum Origin {
    Path(PathBuf),
    Text(String),
    Stream(Option<Box<dyn Read>>),
}

impl Origin {
    fn open(&mut self) -> std::result::Result<Box<dyn BufRead>, DataSourceError> {
        match self {
            Self::Path(path) => {
                let file = File::open(path.as_path()).map_err(|err| {
                    DataSourceError::new(format!("failed to open {}: {err}", path.display()))
                })?;
                Ok(Box::new(BufReader::new(file)))
            }
            Self::Text(text) => Ok(Box::new(Cursor::new(text.clone().into_bytes()))),
            Self::Stream(stream) => stream
                .take()
                .map(|stream| Box::new(BufReader::new(stream)) as Box<dyn BufRead>)
                .ok_or_else(|| DataSourceError::new("stream data source cannot be reopened")),
        }
    }

    fn describe(&self) -> String {
        match self {
            Self::Path(path) => path.display().to_string(),
            Self::Text(_) => "<text>".to_string(),
            Self::Stream(_) => "<stream>".to_string(),
        }
    }
}

/// Reads rows from CSV text: a file, an in-memory string or a one-shot stream.
pub struct CsvDataSource {
    origin: Origin,
    options: CsvSourceOptions,
    dialect: CsvDialect,
    reader: Option<Box<dyn BufRead>>,
    header_row: Option<Vec<String>>,
    skipped_rows: Vec<Vec<String>>,
    line_num: usize,
    next_row: Option<Vec<String>>,
}

impl fmt::Debug for CsvDataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CsvDataSource")
            .field("origin", &self.origin.describe())
            .field("options", &self.options)
            .field("dialect", &self.dialect)
            .field("header_row", &self.header_row)
            .field("line_num", &self.line_num)
            .finish_non_exhaustive()
    }
}

impl CsvDataSource {
    fn with_origin(origin: Origin) -> Self {
        Self {
            origin,
            options: CsvSourceOptions::default(),
            dialect: CsvDialect::default(),
            reader: None,
            header_row: None,
            skipped_rows: Vec::new(),
            line_num: 0,
            next_row: None,
        }
    }

    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self::with_origin(Origin::Path(path.into()))
    }

    pub fn from_string(text: impl Into<String>) -> Self {
        Self::with_origin(Origin::Text(text.into()))
    }

    /// Stream-backed source; it can be opened only once.
    pub fn from_reader<R: Read + 'static>(reader: R) -> Self {
        Self::with_origin(Origin::Stream(Some(Box::new(reader))))
    }

    pub fn with_options(mut self, options: CsvSourceOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_dialect(mut self, dialect: CsvDialect) -> Self {
        self.dialect = dialect;
        self
    }

    pub fn dialect(&self) -> &CsvDialect {
        &self.dialect
    }

    pub fn header_row(&self) -> Option<&[String]> {
        self.header_row.as_deref()
    }

    /// Rows consumed before data started, header row included.
    pub fn skipped_rows(&self) -> &[Vec<String>] {
        &self.skipped_rows
    }

    /// Write the header and every remaining row to `path`.
    pub fn save(&mut self, path: impl AsRef<Path>) -> Result<usize> {
        if self.reader.is_none() {
            self.open()?;
        }
        let headers = self.header_row.clone().unwrap_or_default();
        output::save_source(self, &headers, path.as_ref())
    }

    fn read_physical_line(&mut self) -> std::result::Result<Option<String>, DataSourceError> {
        let line_end = self.dialect.line_terminator.line_end();
        let line_num = self.line_num + 1;
        let reader = self
            .reader
            .as_mut()
            .ok_or_else(|| DataSourceError::new("data source is not open"))?;

        let mut buf = Vec::new();
        let read = reader
            .read_until(line_end, &mut buf)
            .map_err(|err| DataSourceError::at_row(line_num, format!("failed to read line: {err}")))?;
        if read == 0 {
            return Ok(None);
        }
        self.line_num = line_num;

        let mut line = String::from_utf8(buf)
            .map_err(|_| DataSourceError::at_row(line_num, "line is not valid UTF-8"))?;
        if line_num == 1 && line.starts_with('\u{feff}') {
            line.remove(0);
        }
        if self.dialect.line_terminator == LineTerminator::LfCr && line.starts_with('\r') {
            line.remove(0);
        }
        Ok(Some(line))
    }

    /// Next logical record, joining physical lines while an enclosed field is open.
    fn read_record(&mut self) -> std::result::Result<Option<Vec<String>>, DataSourceError> {
        let Some(line) = self.read_physical_line()? else {
            return Ok(None);
        };
        let mut parsed = self.parse(&line, None)?;
        loop {
            match parsed {
                ParsedLine::Complete(fields) => return Ok(Some(fields)),
                ParsedLine::Open(pending) => {
                    let Some(line) = self.read_physical_line()? else {
                        return Err(DataSourceError::at_row(
                            self.line_num,
                            "Invalid csv file - enclosed field is not closed at end of data",
                        ));
                    };
                    parsed = self.parse(&line, Some(pending))?;
                }
            }
        }
    }

    fn parse(
        &self,
        line: &str,
        pending: Option<PendingRow>,
    ) -> std::result::Result<ParsedLine, DataSourceError> {
        self.dialect
            .parse_line(line, pending)
            .map_err(|err| DataSourceError::at_row(self.line_num, err.to_string()))
    }
}

impl DataSource for CsvDataSource {
    fn open(&mut self) -> std::result::Result<(), DataSourceError> {
        self.reader = Some(self.origin.open()?);
        self.line_num = 0;
        self.next_row = None;
        self.skipped_rows.clear();
        self.header_row = self.options.header_row.clone();

        let generate_header = !self.dialect.header && self.header_row.is_none();
        let header_row_num = if self.header_row.is_some() || generate_header {
            0
        } else {
            self.options.header_row_num
        };
        let skip_rows = self.options.skip_rows.unwrap_or(header_row_num);
        for index in 1..=skip_rows {
            let row = self.read_record()?.unwrap_or_default();
            if index == header_row_num {
                self.header_row = Some(row.clone());
            }
            self.skipped_rows.push(row);
        }

        if generate_header && !self.is_eof()? {
            let width = self.next_row.as_ref().map_or(0, Vec::len);
            self.header_row = Some((1..=width).map(|n| format!("field{n}")).collect());
        }

        match &self.header_row {
            Some(header) if !is_blank(header) => {
                debug!(
                    event = "csv_source_opened",
                    source = %self.origin.describe(),
                    columns = header.len(),
                    skipped = self.skipped_rows.len()
                );
                Ok(())
            }
            _ => Err(DataSourceError::new("Failed to get header row")),
        }
    }

    fn next_line(&mut self) -> std::result::Result<RawRow, DataSourceError> {
        if self.is_eof()? {
            return Err(DataSourceError::new("no more rows in data source"));
        }
        let row = self
            .next_row
            .take()
            .ok_or_else(|| DataSourceError::new("no more rows in data source"))?;

        let header = self.header_row.as_deref().unwrap_or_default();
        if row.len() != header.len() {
            return Err(DataSourceError::new(format!(
                "Invalid row: {}",
                row.join(", ")
            )));
        }
        Ok(header
            .iter()
            .cloned()
            .zip(row.into_iter().map(JsonValue::String))
            .collect())
    }

    /// Blank lines are allowed only at the end of the data.
    fn is_eof(&mut self) -> std::result::Result<bool, DataSourceError> {
        if self.next_row.is_some() {
            return Ok(false);
        }
        if self.reader.is_none() {
            self.open()?;
            return self.is_eof();
        }

        let mut blank_line = None;
        loop {
            match self.read_record()? {
                None => return Ok(true),
                Some(row) if row.is_empty() => {
                    blank_line.get_or_insert(self.line_num);
                }
                Some(row) => {
                    if let Some(line) = blank_line {
                        return Err(DataSourceError::at_row(
                            line,
                            "Invalid csv file - blank line inside data",
                        ));
                    }
                    self.next_row = Some(row);
                    return Ok(false);
                }
            }
        }
    }

    fn close(&mut self) {
        self.reader = None;
        self.next_row = None;
    }

    fn headers(&self) -> Option<Vec<String>> {
        self.header_row.clone()
    }

    fn case_sensitive_header(&self) -> bool {
        self.dialect.case_sensitive_header
    }
}

fn is_blank(row: &[String]) -> bool {
    row.is_empty() || (row.len() == 1 && row[0].is_empty())
}
