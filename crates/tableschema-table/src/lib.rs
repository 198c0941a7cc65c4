//! Streaming validation of tabular data against a table schema: CSV dialect
//! parsing, data sources and the row driver.

pub mod dialect;
pub mod errors;
pub mod output;
pub mod source;
pub mod table;

pub use dialect::{CsvDialect, CsvDialectConfig, LineTerminator, ParsedLine, PendingRow};
pub use errors::{DataSourceError, DialectError, Result, TableError};
pub use output::save_source;
pub use source::{CsvDataSource, CsvSourceOptions, DataSource, NativeDataSource};
pub use table::{DEFAULT_PEEK_ROWS, ExtendedRow, ReadOptions, Table};
