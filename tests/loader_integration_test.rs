//! Integration tests for dataset loading from disk.

use indoc::indoc;
use procsum::store::{Dataset, LoadOptions, Value};
use procsum::Error;
use std::fs;
use tempfile::TempDir;

#[test]
fn json_lines_file_loads_with_custom_options() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("contracts.jsonl");
    fs::write(
        &path,
        indoc! {r#"
            {"contract_id": 1, "sector": "  energy ", "signed": "2021-03-04T10:00:00Z"}

            {"contract_id": 2, "sector": "HEALTH", "signed": "n/a", "extra": true}
        "#},
    )
    .unwrap();

    let options = LoadOptions {
        normalize_fields: vec!["sector".to_string()],
        date_fields: vec!["signed".to_string()],
    };
    let dataset = Dataset::open(&path, &options).unwrap();
    assert_eq!(dataset.source(), Some(path.as_path()));

    let store = dataset.snapshot();
    let schema = store.schema();
    assert_eq!(schema.names(), &["contract_id", "sector", "signed", "extra"]);

    let sector = schema.field("sector").unwrap();
    let signed = schema.field("signed").unwrap();
    let extra = schema.field("extra").unwrap();
    let rows = store.records();
    assert_eq!(rows[0].get(sector), &Value::from("Energy"));
    assert_eq!(rows[1].get(sector), &Value::from("Health"));
    assert_eq!(rows[0].get(signed).year(), Some(2021));
    assert!(rows[1].get(signed).is_null());
    assert!(rows[0].get(extra).is_null());
    assert_eq!(rows[1].get(extra), &Value::from("true"));

    dataset.close();
    assert_eq!(store.len(), 2);
}

#[test]
fn malformed_file_reports_its_path() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.json");
    fs::write(&path, "[{\"contract_id\": 1},").unwrap();

    let err = Dataset::open(&path, &LoadOptions::default()).unwrap_err();
    assert!(matches!(err, Error::Load { .. }));
    assert!(err.to_string().contains("broken.json"));
}

#[test]
fn non_array_json_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("object.json");
    fs::write(&path, r#"{"contract_id": 1}"#).unwrap();
    assert!(Dataset::open(&path, &LoadOptions::default()).is_err());
}

#[test]
fn missing_file_error_names_the_path() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("absent.json");
    let err = Dataset::open(&path, &LoadOptions::default()).unwrap_err();
    assert!(matches!(&err, Error::Load { path: p, .. } if *p == path));
    let message = err.to_string();
    assert!(
        message.contains(&path.display().to_string()),
        "message lacks the path: {message}"
    );
}
