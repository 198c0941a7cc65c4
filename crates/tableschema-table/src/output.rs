use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde_json::Value as JsonValue;
use tracing::info;

use crate::errors::Result;
use crate::source::DataSource;

/// Write `headers` and every remaining row of `source` as RFC 4180 CSV.
///
/// Returns the number of data rows written.
pub fn save_source<S: DataSource + ?Sized>(
    source: &mut S,
    headers: &[String],
    path: &Path,
) -> Result<usize> {
    let file = File::create(path)?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(BufWriter::new(file));
    writer.write_record(headers)?;

    let mut rows = 0usize;
    while !source.is_eof()? {
        let row = source.next_line()?;
        let record: Vec<String> = headers
            .iter()
            .map(|name| row.get(name).map(raw_to_csv).unwrap_or_default())
            .collect();
        writer.write_record(&record)?;
        rows += 1;
    }

    writer.flush()?;
    let mut inner = writer.into_inner().map_err(|err| err.into_error())?;
    inner.flush()?;
    info!(event = "csv_saved", path = %path.display(), rows);
    Ok(rows)
}

/// Text written for a raw value: strings as is, null as an empty field, the rest as JSON.
pub fn raw_to_csv(value: &JsonValue) -> String {
    match value {
        JsonValue::Null => String::new(),
        JsonValue::String(text) => text.clone(),
        other => other.to_string(),
    }
}
