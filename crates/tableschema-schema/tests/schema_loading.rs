use std::fs;

use anyhow::Result;
use serde_json::json;
use tableschema_core::{ErrorKind, RawRow, Value};
use tableschema_schema::{Schema, SchemaError};

fn raw_row(pairs: &[(&str, &str)]) -> RawRow {
    pairs
        .iter()
        .map(|(key, value)| (key.to_string(), json!(value)))
        .collect()
}

#[test]
fn descriptor_from_json_text() -> Result<()> {
    let schema = Schema::new(r#"{"fields": [{"name": "id", "type": "integer"}, {"name": "name"}]}"#)?;
    assert_eq!(schema.field_names(), vec!["id", "name"]);
    assert_eq!(schema.field("name").map(|field| field.field_type()), Some("string"));
    Ok(())
}

#[test]
fn undecodable_text_is_a_load_failure() {
    let err = Schema::new("{not json").unwrap_err();
    assert!(matches!(err, SchemaError::Load(_)));
    assert!(err.to_string().starts_with("error decoding descriptor {not json"));

    let errors = Schema::validate("{not json");
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind(), ErrorKind::LoadFailed);
}

#[test]
fn loader_failures_name_the_source() {
    let err = Schema::load("https://example.com/schema.json", |_| {
        Err::<String, _>("connection refused")
    })
    .unwrap_err();
    assert_eq!(
        err.to_string(),
        "error loading descriptor from source https://example.com/schema.json: connection refused"
    );
}

#[test]
fn schema_file_round_trips_through_disk() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("schema.json");

    let schema = Schema::new(json!({
        "fields": [{"name": "id", "type": "integer"}],
        "primaryKey": ["id"],
        "missingValues": ["", "NA"]
    }))?;
    schema.save(&path)?;

    let loaded = Schema::from_path(&path)?;
    assert_eq!(loaded.descriptor(), schema.descriptor());
    assert!(fs::read_to_string(&path)?.contains("\"primaryKey\""));
    Ok(())
}

#[test]
fn violations_are_collected_not_truncated() {
    let errors = Schema::validate(json!({
        "fields": [{"name": "id"}],
        "primaryKey": ["a", "b"],
        "foreignKeys": [{"fields": ["c"], "reference": {"resource": "", "fields": ["d"]}}]
    }));
    let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
    assert_eq!(
        messages,
        vec![
            "primary key must refer to a field name (a)",
            "primary key must refer to a field name (b)",
            "foreign key fields must refer to a field name (c)",
            "foreign key reference to self must refer to a field name (d)",
        ]
    );
    assert!(errors.iter().all(|error| error.kind() == ErrorKind::SchemaViolation));
}

#[test]
fn cast_row_accumulates_one_error_per_failing_field() {
    let schema = Schema::new(json!({
        "fields": [
            {"name": "id", "type": "integer"},
            {"name": "price", "type": "number"},
            {"name": "active", "type": "boolean"},
            {"name": "name"}
        ]
    }))
    .expect("schema");

    let err = schema
        .cast_row(&raw_row(&[("id", "x"), ("price", "y"), ("active", "maybe"), ("name", "ok")]))
        .unwrap_err();
    assert_eq!(err.len(), 3);
    assert_eq!(
        err.to_string(),
        "id: value must be numeric (x), price: value must be numeric (y), active: invalid bool value (maybe)"
    );
}

#[test]
fn missing_values_map_to_null_before_casting() {
    let schema = Schema::new(json!({
        "fields": [{"name": "n", "type": "number"}],
        "missingValues": ["NA"]
    }))
    .expect("schema");
    let row = schema.cast_row(&raw_row(&[("n", "NA")])).expect("cast");
    assert_eq!(row["n"], Value::Null);

    let schema = Schema::new(json!({
        "fields": [{"name": "s", "type": "string"}],
        "missingValues": []
    }))
    .expect("schema");
    let row = schema.cast_row(&raw_row(&[("s", "")])).expect("cast");
    assert_eq!(row["s"], Value::from(""));
}

#[test]
fn absent_columns_read_as_null_and_output_follows_field_order() {
    let schema = Schema::new(json!({
        "fields": [{"name": "b"}, {"name": "a"}, {"name": "foo"}]
    }))
    .expect("schema");
    let row = schema
        .cast_row(&raw_row(&[("a", "1"), ("b", "2")]))
        .expect("cast");
    assert_eq!(row.keys().collect::<Vec<_>>(), vec!["b", "a", "foo"]);
    assert_eq!(row["foo"], Value::Null);
}

#[test]
fn full_descriptor_spells_out_defaults() {
    let schema = Schema::new(json!({"fields": [{"name": "id"}]})).expect("schema");
    let full = schema.full_descriptor();
    assert_eq!(
        full.fields[0].to_json(),
        json!({"name": "id", "type": "string", "format": "default"})
    );
    assert_eq!(full.missing_values, Some(vec![String::new()]));
    assert_eq!(schema.descriptor().missing_values, None);
}
