use std::env;
use std::path::PathBuf;

use tableschema_schema::Schema;
use tableschema_table::{CsvDataSource, CsvDialect, CsvDialectConfig, DEFAULT_PEEK_ROWS, Table};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut args = env::args().skip(1);
    let mut data_path: Option<PathBuf> = None;
    let mut schema_path: Option<PathBuf> = None;
    let mut dialect_path: Option<PathBuf> = None;
    let mut peek_rows = DEFAULT_PEEK_ROWS;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--schema" => schema_path = args.next().map(PathBuf::from),
            "--dialect" => dialect_path = args.next().map(PathBuf::from),
            "--peek" => {
                peek_rows = args
                    .next()
                    .ok_or("missing --peek value")?
                    .parse()?;
            }
            _ => {
                if data_path.is_none() {
                    data_path = Some(PathBuf::from(arg));
                } else {
                    return Err("unexpected argument".into());
                }
            }
        }
    }

    let data_path = data_path.ok_or("missing csv path")?;
    let schema = schema_path.map(Schema::from_path).transpose()?;
    let dialect = match dialect_path {
        Some(path) => {
            let config: CsvDialectConfig = serde_json::from_str(&std::fs::read_to_string(path)?)?;
            CsvDialect::new(config)?
        }
        None => CsvDialect::default(),
    };

    let source = CsvDataSource::from_path(&data_path).with_dialect(dialect.clone());
    let inferred = schema.is_none();
    let errors = Table::validate(source, schema, peek_rows);
    for error in &errors {
        println!("{error}");
    }

    if errors.is_empty() && inferred {
        let source = CsvDataSource::from_path(&data_path).with_dialect(dialect);
        let mut table = Table::new(source, None)?;
        println!("{}", serde_json::to_string_pretty(&table.schema(peek_rows)?.to_json())?);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(format!("{} validation error(s)", errors.len()).into())
    }
}
