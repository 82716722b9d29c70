//! In-memory record store.
//!
//! A [`RecordStore`] is loaded once and never mutated afterwards. Every
//! summarization operation borrows it through a [`RecordSet`], a cheap view
//! holding references to the rows that survived filtering.

pub mod dataset;
pub mod loader;
pub mod schema;
pub mod value;

pub use dataset::Dataset;
pub use loader::{load_records, parse_records, LoadOptions, SourceFormat};
pub use schema::{FieldId, Schema};
pub use value::Value;

static NULL: Value = Value::Null;

/// One contract record. Values are addressed by [`FieldId`].
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    values: Vec<Value>,
}

impl Record {
    pub fn get(&self, field: FieldId) -> &Value {
        self.values.get(field.index()).unwrap_or(&NULL)
    }
}

/// Immutable table of records sharing one [`Schema`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordStore {
    schema: Schema,
    records: Vec<Record>,
}

impl RecordStore {
    pub fn builder() -> RecordStoreBuilder {
        RecordStoreBuilder::default()
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Borrow every record as an unfiltered view.
    pub fn view(&self) -> RecordSet<'_> {
        RecordSet {
            schema: &self.schema,
            rows: self.records.iter().collect(),
        }
    }
}

/// Row-by-row construction of a [`RecordStore`].
///
/// Fields first seen on a later row are added to the schema; earlier rows
/// read them as null.
#[derive(Debug, Default)]
pub struct RecordStoreBuilder {
    schema: Schema,
    rows: Vec<Vec<Value>>,
}

impl RecordStoreBuilder {
    pub fn push_row<I, K, V>(&mut self, fields: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let mut values = vec![Value::Null; self.schema.len()];
        for (name, value) in fields {
            let id = self.schema.intern(name.into());
            if values.len() <= id.index() {
                values.resize(id.index() + 1, Value::Null);
            }
            values[id.index()] = value.into();
        }
        self.rows.push(values);
    }

    #[must_use]
    pub fn row<I, K, V>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.push_row(fields);
        self
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn build(self) -> RecordStore {
        let width = self.schema.len();
        let records = self
            .rows
            .into_iter()
            .map(|mut values| {
                values.resize(width, Value::Null);
                Record { values }
            })
            .collect();
        RecordStore {
            schema: self.schema,
            records,
        }
    }
}

/// Borrowed, possibly filtered view over a [`RecordStore`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordSet<'a> {
    schema: &'a Schema,
    rows: Vec<&'a Record>,
}

impl<'a> RecordSet<'a> {
    pub(crate) fn from_rows(schema: &'a Schema, rows: Vec<&'a Record>) -> Self {
        Self { schema, rows }
    }

    pub fn schema(&self) -> &'a Schema {
        self.schema
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a Record> + '_ {
        self.rows.iter().copied()
    }

    /// Distinct non-null keys of a field, sorted. Empty when the field is
    /// not in the schema.
    pub fn distinct(&self, field: &str) -> Vec<String> {
        let Some(id) = self.schema.field(field) else {
            return Vec::new();
        };
        let keys: std::collections::BTreeSet<String> =
            self.iter().filter_map(|r| r.get(id).as_key()).collect();
        keys.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_backfills_late_fields_as_null() {
        let store = RecordStore::builder()
            .row([("status", Value::from("Active"))])
            .row([
                ("status", Value::from("Closed")),
                ("contract_type", Value::from("Goods")),
            ])
            .build();

        let ct = store.schema().field("contract_type").unwrap();
        assert!(store.records()[0].get(ct).is_null());
        assert_eq!(store.records()[1].get(ct), &Value::from("Goods"));
    }

    #[test]
    fn distinct_skips_nulls_and_missing_fields() {
        let store = RecordStore::builder()
            .row([("status", Value::from("b"))])
            .row([("status", Value::Null)])
            .row([("status", Value::from("a"))])
            .row([("status", Value::from("b"))])
            .build();
        let view = store.view();
        assert_eq!(view.distinct("status"), vec!["a", "b"]);
        assert!(view.distinct("nope").is_empty());
    }
}
