//! Reading contract records from JSON or JSON Lines files.
//!
//! Normalization (trim + title case) of the listed fields happens here, once,
//! so equality predicates downstream can compare plain strings.

use super::value::parse_date;
use super::{RecordStore, RecordStoreBuilder, Value};
use crate::errors::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Map;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::{debug, info_span};

/// Input layout of a dataset file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    /// A single JSON array of objects
    Json,
    /// One JSON object per line
    JsonLines,
}

impl SourceFormat {
    /// Guess from the file extension; anything unknown is treated as JSON.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("jsonl" | "ndjson") => Self::JsonLines,
            _ => Self::Json,
        }
    }
}

/// How raw rows become typed values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadOptions {
    /// Text fields that are trimmed and title-cased on load
    #[serde(default = "default_normalize_fields")]
    pub normalize_fields: Vec<String>,
    /// Fields parsed into dates; unparseable values become null
    #[serde(default = "default_date_fields")]
    pub date_fields: Vec<String>,
}

fn default_normalize_fields() -> Vec<String> {
    vec![
        "awarded_firm_country_name".to_string(),
        "operation_country_name".to_string(),
    ]
}

fn default_date_fields() -> Vec<String> {
    vec![
        "signature_date".to_string(),
        "start_date".to_string(),
        "stop_date".to_string(),
    ]
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            normalize_fields: default_normalize_fields(),
            date_fields: default_date_fields(),
        }
    }
}

/// Load a dataset file into a [`RecordStore`].
pub fn load_records(path: &Path, options: &LoadOptions) -> Result<RecordStore> {
    let _span = info_span!("load_records", path = %path.display()).entered();
    let contents = fs::read_to_string(path).map_err(|e| Error::load(path, e.to_string()))?;
    let format = SourceFormat::from_path(path);
    parse_records(&contents, format, options).map_err(|e| match e {
        Error::Json(json) => Error::load(path, json.to_string()),
        other => other,
    })
}

/// Parse dataset contents already held in memory.
pub fn parse_records(
    contents: &str,
    format: SourceFormat,
    options: &LoadOptions,
) -> Result<RecordStore> {
    let rows: Vec<Map<String, serde_json::Value>> = match format {
        SourceFormat::Json => serde_json::from_str(contents)?,
        SourceFormat::JsonLines => contents
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(serde_json::from_str)
            .collect::<std::result::Result<_, _>>()?,
    };

    let normalize: HashSet<&str> = options.normalize_fields.iter().map(String::as_str).collect();
    let dates: HashSet<&str> = options.date_fields.iter().map(String::as_str).collect();

    let mut builder = RecordStoreBuilder::default();
    for row in rows {
        builder.push_row(row.into_iter().map(|(name, raw)| {
            let value = convert(&raw, dates.contains(name.as_str()));
            let value = if normalize.contains(name.as_str()) {
                normalize_text(value)
            } else {
                value
            };
            (name, value)
        }));
    }

    let store = builder.build();
    debug!(
        records = store.len(),
        fields = store.schema().len(),
        "parsed dataset"
    );
    Ok(store)
}

fn convert(raw: &serde_json::Value, is_date: bool) -> Value {
    use serde_json::Value as Json;
    match raw {
        Json::Null => Value::Null,
        Json::String(s) if is_date => parse_date(s).map_or(Value::Null, Value::Date),
        Json::String(s) => Value::Text(s.clone()),
        Json::Number(n) => n
            .as_i64()
            .map(Value::Int)
            .or_else(|| n.as_f64().map(Value::Float))
            .unwrap_or(Value::Null),
        Json::Bool(b) => Value::Text(b.to_string()),
        other => Value::Text(other.to_string()),
    }
}

/// Trim and title-case a text value; other kinds pass through.
fn normalize_text(value: Value) -> Value {
    match value {
        Value::Text(s) => Value::Text(title_case(s.trim())),
        other => other,
    }
}

/// Uppercase the first letter of every alphabetic run, lowercase the rest.
pub fn title_case(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut prev_alpha = false;
    for ch in input.chars() {
        if ch.is_alphabetic() {
            if prev_alpha {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(ch);
            prev_alpha = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn title_case_matches_word_boundaries() {
        assert_eq!(title_case("uruguay"), "Uruguay");
        assert_eq!(title_case("UNITED STATES"), "United States");
        assert_eq!(title_case("korea, rep."), "Korea, Rep.");
        assert_eq!(title_case("o'brien"), "O'Brien");
    }

    #[test]
    fn parse_json_array_normalizes_and_types_values() {
        let contents = r#"[
            {"contract_id": 1, "awarded_firm_country_name": "  uruguay ", "amount": 10.5,
             "signature_date": "2020-02-03"},
            {"contract_id": 2, "awarded_firm_country_name": "BRAZIL", "amount": null,
             "signature_date": "garbage"}
        ]"#;
        let store = parse_records(contents, SourceFormat::Json, &LoadOptions::default()).unwrap();
        let schema = store.schema();
        let country = schema.field("awarded_firm_country_name").unwrap();
        let amount = schema.field("amount").unwrap();
        let signed = schema.field("signature_date").unwrap();
        let rows = store.records();

        assert_eq!(rows[0].get(country), &Value::from("Uruguay"));
        assert_eq!(rows[1].get(country), &Value::from("Brazil"));
        assert_eq!(rows[0].get(amount), &Value::Float(10.5));
        assert!(rows[1].get(amount).is_null());
        assert_eq!(
            rows[0].get(signed),
            &Value::Date(NaiveDate::from_ymd_opt(2020, 2, 3).unwrap())
        );
        assert!(rows[1].get(signed).is_null());
    }

    #[test]
    fn parse_json_lines_skips_blank_lines() {
        let contents = "{\"status\": \"Active\"}\n\n{\"status\": \"Closed\"}\n";
        let store =
            parse_records(contents, SourceFormat::JsonLines, &LoadOptions::default()).unwrap();
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn malformed_json_is_an_error() {
        let err = parse_records("{not json", SourceFormat::Json, &LoadOptions::default());
        assert!(matches!(err, Err(Error::Json(_))));
    }

    #[test]
    fn format_follows_extension() {
        assert_eq!(
            SourceFormat::from_path(Path::new("a.ndjson")),
            SourceFormat::JsonLines
        );
        assert_eq!(SourceFormat::from_path(Path::new("a.json")), SourceFormat::Json);
    }
}
