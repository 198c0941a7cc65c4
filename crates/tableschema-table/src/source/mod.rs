//! Row providers consumed by [`crate::Table`].

mod csv;
mod native;

pub use self::csv::{CsvDataSource, CsvSourceOptions};
pub use self::native::NativeDataSource;

use tableschema_core::RawRow;

use crate::errors::DataSourceError;

/// Sequential access to raw rows keyed by header name.
///
/// `next_line` after the last record must not depend on a trailing line
/// terminator; `is_eof` is the only end-of-stream signal.
pub trait DataSource {
    /// (Re)start reading from the first data row.
    fn open(&mut self) -> Result<(), DataSourceError>;

    fn next_line(&mut self) -> Result<RawRow, DataSourceError>;

    fn is_eof(&mut self) -> Result<bool, DataSourceError>;

    fn close(&mut self) {}

    /// Header names in column order, when the source knows them.
    fn headers(&self) -> Option<Vec<String>> {
        None
    }

    fn case_sensitive_header(&self) -> bool {
        true
    }
}
