use std::fs;
use std::path::PathBuf;

use anyhow::Result;
use serde_json::{Value as JsonValue, json};
use tableschema_core::{ErrorKind, Row, Value};
use tableschema_schema::Schema;
use tableschema_table::{
    CsvDataSource, CsvDialectConfig, NativeDataSource, ReadOptions, Table, TableError,
};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn csv_fixture(name: &str) -> CsvDataSource {
    CsvDataSource::from_path(fixture(name))
}

fn native(rows: JsonValue) -> NativeDataSource {
    NativeDataSource::from_json(rows).expect("native rows")
}

fn schema(descriptor: JsonValue) -> Schema {
    Schema::new(descriptor).expect("schema")
}

fn id_name_schema() -> Schema {
    schema(json!({
        "fields": [
            {"name": "id", "type": "integer"},
            {"name": "name", "type": "string"}
        ]
    }))
}

fn names_and_orders() -> Vec<(Value, Value, Value)> {
    vec![
        (Value::from("Foo"), Value::from("Bar"), Value::Integer(1)),
        (Value::from("Baz"), Value::from("Bax"), Value::Integer(2)),
        (Value::from("באך"), Value::from("ביי"), Value::Integer(3)),
    ]
}

fn as_tuples(rows: &[Row]) -> Vec<(Value, Value, Value)> {
    rows.iter()
        .map(|row| {
            (
                row["first_name"].clone(),
                row["last_name"].clone(),
                row["order"].clone(),
            )
        })
        .collect()
}

fn messages(errors: &[tableschema_core::ValidationError]) -> Vec<String> {
    errors.iter().map(ToString::to_string).collect()
}

/// Message of the first failure while streaming every row.
fn stream_error(table_schema: JsonValue, rows: JsonValue) -> String {
    let table = Table::new(native(rows), Some(schema(table_schema))).expect("table");
    let result: Result<Vec<Row>, TableError> = table.collect();
    result.expect_err("streaming should fail").to_string()
}

#[test]
fn rows_are_cast_through_the_schema() -> Result<()> {
    let schema = Schema::from_path(fixture("data.json"))?;
    let table = Table::new(csv_fixture("data.csv"), Some(schema))?;
    let rows = table.collect::<Result<Vec<_>, _>>()?;
    assert_eq!(as_tuples(&rows), names_and_orders());
    Ok(())
}

#[test]
fn valid_data_reports_no_errors() -> Result<()> {
    let schema = Schema::from_path(fixture("data.json"))?;
    assert!(Table::validate(csv_fixture("data.csv"), Some(schema), 10).is_empty());
    Ok(())
}

#[test]
fn unreadable_sources_fail_to_load() {
    let errors = Table::validate(csv_fixture("--invalid--"), Some(id_name_schema()), 10);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind(), ErrorKind::LoadFailed);
    assert!(errors[0].to_string().starts_with("failed to open"));

    let errors = Table::validate(csv_fixture("empty_file"), Some(id_name_schema()), 10);
    assert_eq!(messages(&errors), vec!["Failed to get header row"]);
    assert_eq!(errors[0].kind(), ErrorKind::LoadFailed);
}

#[test]
fn field_errors_in_peeked_rows_are_row_numbered() {
    let errors = Table::validate(
        native(json!([
            {"email": "good@email.nice"},
            {"email": "bad and invalid email"}
        ])),
        Some(schema(json!({
            "fields": [{"name": "email", "type": "string", "format": "email"}]
        }))),
        10,
    );
    assert_eq!(
        messages(&errors),
        vec!["row 2 email: value is not a valid email (bad and invalid email)"]
    );
    assert_eq!(errors[0].kind(), ErrorKind::RowFieldValidation);
}

#[test]
fn errors_beyond_the_peek_window_are_not_reported() {
    let rows = json!([{"id": "1"}, {"id": "2"}, {"id": "x"}]);
    assert!(Table::validate(native(rows.clone()), Some(id_name_schema()), 2).is_empty());
    assert_eq!(Table::validate(native(rows), Some(id_name_schema()), 3).len(), 1);
}

#[test]
fn malformed_rows_become_row_validation_errors() {
    let errors = Table::validate(
        CsvDataSource::from_string("id,name\n1,foo\n2,bar,extra\n"),
        Some(id_name_schema()),
        10,
    );
    assert_eq!(messages(&errors), vec!["row 2: Invalid row: 2, bar, extra"]);
    assert_eq!(errors[0].kind(), ErrorKind::RowValidation);
}

#[test]
fn schema_fields_missing_from_the_data_read_as_null() -> Result<()> {
    let foo_schema = schema(json!({"fields": [{"name": "foo", "type": "string"}]}));
    assert!(Table::validate(csv_fixture("data.csv"), Some(foo_schema.clone()), 10).is_empty());

    let rows = Table::new(csv_fixture("data.csv"), Some(foo_schema))?
        .collect::<Result<Vec<_>, _>>()?;
    assert_eq!(rows.len(), 3);
    assert!(rows.iter().all(|row| row.len() == 1 && row["foo"] == Value::Null));
    Ok(())
}

#[test]
fn inferred_schema_is_enforced_after_lock() -> Result<()> {
    let mut table = Table::new(
        native(json!([
            {"id": "1", "email": "test1_example_com"},
            {"id": "2", "email": "test2@example.com"},
            {"id": "3.5", "email": "test3@example.com"}
        ])),
        None,
    )?;
    assert_eq!(
        table.schema(2)?.field("id").map(|field| field.field_type()),
        Some("integer")
    );

    assert_eq!(table.next().transpose()?.map(|row| row["id"].clone()), Some(Value::Integer(1)));
    assert_eq!(table.next().transpose()?.map(|row| row["id"].clone()), Some(Value::Integer(2)));
    let err = table.next().expect("third row").unwrap_err();
    assert_eq!(err.to_string(), "row 3 id: value must be an integer (3.5)");
    assert!(table.next().is_none());
    Ok(())
}

#[test]
fn peeking_more_rows_widens_the_inferred_type() -> Result<()> {
    let mut table = Table::new(
        native(json!([
            {"id": "1", "email": "test1_example_com"},
            {"id": "2", "email": "test2@example.com"},
            {"id": "3.5", "email": "test3@example.com"}
        ])),
        None,
    )?;
    assert_eq!(
        table.schema(3)?.field("id").map(|field| field.field_type()),
        Some("number")
    );

    let rows = table.read(ReadOptions::default())?;
    let ids: Vec<Value> = rows.iter().map(|row| row["id"].clone()).collect();
    assert_eq!(
        ids,
        vec![Value::Number(1.0), Value::Number(2.0), Value::Number(3.5)]
    );
    assert_eq!(rows[0]["email"], Value::from("test1_example_com"));
    Ok(())
}

#[test]
fn missing_schema_is_inferred_from_the_data() -> Result<()> {
    let mut table = Table::new(csv_fixture("data.csv"), None)?;
    let schema = table.schema(10)?;
    let types: Vec<(&str, &str)> = schema
        .fields()
        .values()
        .map(|field| (field.name(), field.field_type()))
        .collect();
    assert_eq!(
        types,
        vec![
            ("first_name", "string"),
            ("last_name", "string"),
            ("order", "integer")
        ]
    );
    Ok(())
}

#[test]
fn headers_peek_and_rows_are_replayed() -> Result<()> {
    let mut table = Table::new(csv_fixture("data.csv"), None)?;
    assert_eq!(table.headers(10)?, vec!["first_name", "last_name", "order"]);
    assert_eq!(as_tuples(&table.read(ReadOptions::default())?), names_and_orders());

    let mut table = Table::new(csv_fixture("data.csv"), None)?;
    assert_eq!(table.headers(1)?, vec!["first_name", "last_name", "order"]);
    assert_eq!(as_tuples(&table.read(ReadOptions::default())?), names_and_orders());
    // a finished pass can be read again
    assert_eq!(as_tuples(&table.read(ReadOptions::default())?), names_and_orders());
    Ok(())
}

#[test]
fn inference_over_a_file_and_a_row_limit() -> Result<()> {
    for peek in [10, 4] {
        let mut table = Table::new(csv_fixture("data_infer.csv"), None)?;
        let schema = table.schema(peek)?;
        let types: Vec<&str> = schema.fields().values().map(|field| field.field_type()).collect();
        assert_eq!(types, vec!["integer", "integer", "string"]);
    }
    Ok(())
}

#[test]
fn email_format_is_inferred_unless_lenient() -> Result<()> {
    let rows = json!([
        {"email": "valid_email@example.com"},
        {"email": "invalid_email"}
    ]);

    let mut table = Table::new(native(rows.clone()), None)?;
    table.schema(1)?;
    let err = table.read(ReadOptions::default()).unwrap_err();
    assert_eq!(
        err.to_string(),
        "row 2 email: value is not a valid email (invalid_email)"
    );

    let mut table = Table::new(native(rows.clone()), None)?;
    table.schema(2)?;
    let emails: Vec<Value> = table
        .read(ReadOptions::default())?
        .into_iter()
        .map(|row| row["email"].clone())
        .collect();
    assert_eq!(
        emails,
        vec![Value::from("valid_email@example.com"), Value::from("invalid_email")]
    );

    let mut table = Table::inferring(native(rows), true)?;
    table.schema(1)?;
    assert_eq!(table.read(ReadOptions::default())?.len(), 2);
    Ok(())
}

#[test]
fn primary_key_values_cannot_be_null() {
    assert_eq!(
        stream_error(
            json!({"fields": [{"name": "id"}], "primaryKey": ["id"]}),
            json!([{"id": ""}])
        ),
        "row 1: value for id field cannot be null because it is part of the primary key"
    );
    assert_eq!(
        stream_error(
            json!({"fields": [{"name": "id"}], "primaryKey": ["id"], "missingValues": ["n/a"]}),
            json!([{"id": "n/a"}])
        ),
        "row 1: value for id field cannot be null because it is part of the primary key"
    );
}

#[test]
fn primary_key_values_cannot_repeat() {
    assert_eq!(
        stream_error(
            json!({"fields": [{"name": "id"}], "primaryKey": ["id"]}),
            json!([{"id": "foo"}, {"id": "foo"}])
        ),
        "row 2: duplicate row for the primary key id"
    );
    assert_eq!(
        stream_error(
            json!({"fields": [{"name": "id"}, {"name": "age"}], "primaryKey": ["id", "age"]}),
            json!([
                {"id": "foo", "age": "123"},
                {"id": "foo", "age": "234"},
                {"id": "foo", "age": "123"}
            ])
        ),
        "row 3: duplicate row for the primary key id/age"
    );
    assert_eq!(
        stream_error(
            json!({"fields": [{"name": "date", "type": "date"}], "primaryKey": ["date"]}),
            json!([{"date": "2022-01-16"}, {"date": "2022-01-10"}, {"date": "2022-01-16"}])
        ),
        "row 3: duplicate row for the primary key date"
    );
    assert_eq!(
        stream_error(
            json!({"fields": [{"name": "id", "type": "integer"}], "primaryKey": ["id"]}),
            json!([{"id": "123"}, {"id": 234}, {"id": 123}])
        ),
        "row 3: duplicate row for the primary key id"
    );
}

#[test]
fn unique_fields_reject_repeated_values_but_not_nulls() -> Result<()> {
    let descriptor = json!({
        "fields": [{"name": "code", "constraints": {"unique": true}}]
    });
    assert_eq!(
        stream_error(
            descriptor.clone(),
            json!([{"code": "a"}, {"code": "b"}, {"code": "a"}])
        ),
        "row 3: code: field must be unique"
    );

    let rows = Table::new(
        native(json!([{"code": ""}, {"code": ""}, {"code": "a"}])),
        Some(schema(descriptor)),
    )?
    .collect::<Result<Vec<_>, _>>()?;
    assert_eq!(rows.len(), 3);
    Ok(())
}

#[test]
fn unique_numbers_beyond_integer_range_stay_distinct() -> Result<()> {
    let descriptor = json!({
        "fields": [{"name": "n", "type": "number", "constraints": {"unique": true}}]
    });
    let rows = Table::new(
        native(json!([{"n": "1e20"}, {"n": "5e20"}])),
        Some(schema(descriptor.clone())),
    )?
    .collect::<Result<Vec<_>, _>>()?;
    assert_eq!(rows.len(), 2);

    assert_eq!(
        stream_error(descriptor, json!([{"n": "1e20"}, {"n": "100000000000000000000"}])),
        "row 2: n: field must be unique"
    );
    Ok(())
}

#[test]
fn custom_dialect_with_letter_delimiters() -> Result<()> {
    let table = Table::from_csv_path(
        fixture("data.lolsv"),
        None,
        CsvDialectConfig {
            delimiter: "o".into(),
            quote_char: "L".into(),
            ..CsvDialectConfig::default()
        },
    )?;
    let rows = table.collect::<Result<Vec<_>, _>>()?;
    assert_eq!(as_tuples(&rows), names_and_orders());
    Ok(())
}

#[test]
fn quoted_line_breaks_stay_in_the_value() -> Result<()> {
    let mut table = Table::new(csv_fixture("data_linebreaks.csv"), None)?;
    let rows = table.read(ReadOptions::default())?;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["aaa"], Value::from("test\na"));
    assert_eq!(rows[0]["ccc"], Value::from("test c"));
    Ok(())
}

#[test]
fn invalid_data_fails_every_pass_but_raw_rows_stay_readable() -> Result<()> {
    let schema = schema(json!({
        "fields": [
            {"name": "id", "type": "integer"},
            {"name": "email", "type": "string", "format": "email"}
        ]
    }));
    let mut table = Table::new(csv_fixture("invalid_tabular_data.csv"), Some(schema))?;
    let expected = "row 2 email: value is not a valid email (bad.email)";

    let first: Result<Vec<Row>, TableError> = table.by_ref().collect();
    assert_eq!(first.unwrap_err().to_string(), expected);
    assert_eq!(
        table.read(ReadOptions::default()).unwrap_err().to_string(),
        expected
    );

    let raw = table.read_raw(ReadOptions::default())?;
    assert_eq!(raw[0]["id"], json!("1"));
    assert_eq!(raw[0]["email"], json!("good@email.and.nice"));
    assert_eq!(raw.len(), 2);
    Ok(())
}

#[test]
fn rewinding_mid_stream_is_refused() -> Result<()> {
    let schema = Schema::from_path(fixture("data.json"))?;
    let mut table = Table::new(csv_fixture("data.csv"), Some(schema))?;
    table.rewind()?;
    table.next().transpose()?;
    assert!(matches!(table.rewind(), Err(TableError::RewindUnsupported)));
    Ok(())
}

#[test]
fn extended_rows_carry_number_and_headers() -> Result<()> {
    let schema = Schema::from_path(fixture("data.json"))?;
    let mut table = Table::new(csv_fixture("data.csv"), Some(schema))?;
    let rows = table.read_extended(ReadOptions::limit(2))?;
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1].row_number, 2);
    assert_eq!(rows[1].headers, vec!["first_name", "last_name", "order"]);
    assert_eq!(
        rows[1].values,
        vec![Value::from("Baz"), Value::from("Bax"), Value::Integer(2)]
    );
    Ok(())
}

#[test]
fn headers_match_schema_fields_case_insensitively_by_default() -> Result<()> {
    let rows = Table::new(
        CsvDataSource::from_string("ID,Name\n1,foo\n"),
        Some(id_name_schema()),
    )?
    .collect::<Result<Vec<_>, _>>()?;
    assert_eq!(rows[0]["id"], Value::Integer(1));
    assert_eq!(rows[0]["name"], Value::from("foo"));

    let dialect = tableschema_table::CsvDialect::new(CsvDialectConfig {
        case_sensitive_header: true,
        ..CsvDialectConfig::default()
    })?;
    let rows = Table::new(
        CsvDataSource::from_string("ID,Name\n1,foo\n").with_dialect(dialect),
        Some(id_name_schema()),
    )?
    .collect::<Result<Vec<_>, _>>()?;
    assert_eq!(rows[0]["id"], Value::Null);
    Ok(())
}

#[test]
fn save_writes_header_and_remaining_rows() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("saved.csv");

    let mut table = Table::new(csv_fixture("data.csv"), None)?;
    assert_eq!(table.save(&path)?, 3);
    assert_eq!(
        fs::read_to_string(&path)?,
        "first_name,last_name,order\nFoo,Bar,1\nBaz,Bax,2\nבאך,ביי,3\n"
    );
    Ok(())
}

#[test]
fn saved_csv_reads_back_through_the_dialect() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("quoted.csv");

    let mut source = NativeDataSource::from_json(json!([
        {"id": "1", "note": "a, b"},
        {"id": "2", "note": "say \"hi\""}
    ]))?;
    let headers = vec!["id".to_string(), "note".to_string()];
    assert_eq!(tableschema_table::save_source(&mut source, &headers, &path)?, 2);

    let rows = Table::new(CsvDataSource::from_path(&path), None)?
        .read_raw(ReadOptions::default())?;
    assert_eq!(rows[0]["note"], json!("a, b"));
    assert_eq!(rows[1]["note"], json!("say \"hi\""));
    Ok(())
}
