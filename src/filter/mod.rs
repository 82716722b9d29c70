//! Filter stage: a conjunction of predicates over named fields.
//!
//! Clauses are resolved against the schema once per call. A clause whose
//! field is not in the schema is skipped (treated as always true), so a
//! dataset lacking an optional column still produces a result.

pub mod predicates;

pub use predicates::Predicate;

use crate::errors::{Error, Result};
use crate::store::{FieldId, Record, RecordSet, Schema, Value};
use predicates::{differs, matches_equals, matches_in_set, within_range};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeSet;
use tracing::debug;

/// One `(field, predicate)` pair of a [`FilterSpec`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Clause {
    pub field: String,
    pub predicate: Predicate,
}

/// Ordered list of clauses combined with logical AND.
///
/// The empty spec is the identity filter.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FilterSpec {
    clauses: Vec<Clause>,
}

impl FilterSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Append a clause as-is, without configuration checks.
    pub fn push(&mut self, field: impl Into<String>, predicate: Predicate) {
        self.clauses.push(Clause {
            field: field.into(),
            predicate,
        });
    }

    #[must_use]
    pub fn where_equals(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.push(field, Predicate::equals(value));
        self
    }

    /// Restrict `field` to `values`. An empty selection adds no clause,
    /// like an untouched multi-select.
    #[must_use]
    pub fn where_in<I, S>(mut self, field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values: BTreeSet<String> = values.into_iter().map(Into::into).collect();
        if !values.is_empty() {
            self.push(field, Predicate::InSet { values });
        }
        self
    }

    /// Inclusive range clause. Inverted or incomparable bounds are a
    /// configuration error.
    pub fn where_range(
        mut self,
        field: impl Into<String>,
        min: impl Into<Value>,
        max: impl Into<Value>,
    ) -> Result<Self> {
        let field = field.into();
        let (min, max) = (min.into(), max.into());
        match min.compare(&max) {
            Some(Ordering::Less | Ordering::Equal) => {}
            Some(Ordering::Greater) => {
                return Err(Error::invalid_config(format!(
                    "range on '{field}' has inverted bounds ({min} > {max})"
                )));
            }
            None => {
                return Err(Error::invalid_config(format!(
                    "range on '{field}' has incomparable bounds ({min:?}, {max:?})"
                )));
            }
        }
        self.push(field, Predicate::Range { min, max });
        Ok(self)
    }

    /// Keep records whose `field` differs from `other` in the same record.
    #[must_use]
    pub fn where_differs(mut self, field: impl Into<String>, other: impl Into<String>) -> Self {
        self.push(field, Predicate::differs_from(other));
        self
    }

    /// Fields referenced by this spec that `schema` lacks.
    pub fn skipped_fields(&self, schema: &Schema) -> Vec<String> {
        let mut missing = Vec::new();
        for clause in &self.clauses {
            let mut names = vec![clause.field.as_str()];
            if let Predicate::DiffersFrom { other } = &clause.predicate {
                names.push(other.as_str());
            }
            for name in schema.missing(names) {
                if !missing.contains(&name) {
                    missing.push(name);
                }
            }
        }
        missing
    }

    fn resolve<'s>(&'s self, schema: &Schema) -> Vec<ResolvedClause<'s>> {
        self.clauses
            .iter()
            .filter_map(|clause| {
                let resolved = resolve_clause(clause, schema);
                if resolved.is_none() {
                    debug!(field = %clause.field, "skipping filter on unavailable field");
                }
                resolved
            })
            .collect()
    }
}

struct ResolvedClause<'s> {
    field: FieldId,
    test: ResolvedTest<'s>,
}

enum ResolvedTest<'s> {
    Equals(&'s str),
    InSet(&'s BTreeSet<String>),
    Range(&'s Value, &'s Value),
    DiffersFrom(FieldId),
}

fn resolve_clause<'s>(clause: &'s Clause, schema: &Schema) -> Option<ResolvedClause<'s>> {
    let field = schema.field(&clause.field)?;
    let test = match &clause.predicate {
        Predicate::Equals { value } => ResolvedTest::Equals(value),
        Predicate::InSet { values } => ResolvedTest::InSet(values),
        Predicate::Range { min, max } => ResolvedTest::Range(min, max),
        Predicate::DiffersFrom { other } => ResolvedTest::DiffersFrom(schema.field(other)?),
    };
    Some(ResolvedClause { field, test })
}

impl ResolvedClause<'_> {
    fn accepts(&self, record: &Record) -> bool {
        let value = record.get(self.field);
        match self.test {
            ResolvedTest::Equals(expected) => matches_equals(value, expected),
            ResolvedTest::InSet(allowed) => matches_in_set(value, allowed),
            ResolvedTest::Range(min, max) => within_range(value, min, max),
            ResolvedTest::DiffersFrom(other) => differs(value, record.get(other)),
        }
    }
}

/// Apply `spec` to `records`, returning the surviving rows in input order.
pub fn apply<'a>(records: &RecordSet<'a>, spec: &FilterSpec) -> RecordSet<'a> {
    let schema = records.schema();
    let clauses = spec.resolve(schema);
    let rows = records
        .iter()
        .filter(|record| clauses.iter().all(|clause| clause.accepts(record)))
        .collect::<Vec<_>>();
    debug!(
        before = records.len(),
        after = rows.len(),
        clauses = clauses.len(),
        "filter applied"
    );
    RecordSet::from_rows(schema, rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::RecordStore;

    fn store() -> RecordStore {
        RecordStore::builder()
            .row([
                ("contract_type", Value::from("Goods")),
                ("status", Value::from("Active")),
                ("amount", Value::Int(100)),
                ("awarded_firm_country_name", Value::from("Uruguay")),
                ("operation_country_name", Value::from("Uruguay")),
            ])
            .row([
                ("contract_type", Value::from("Works")),
                ("status", Value::from("Closed")),
                ("amount", Value::Int(250)),
                ("awarded_firm_country_name", Value::from("Brazil")),
                ("operation_country_name", Value::from("Uruguay")),
            ])
            .row([
                ("contract_type", Value::from("Goods")),
                ("status", Value::from("Closed")),
                ("amount", Value::Int(400)),
                ("awarded_firm_country_name", Value::from("Chile")),
                ("operation_country_name", Value::from("Uruguay")),
            ])
            .build()
    }

    #[test]
    fn empty_spec_is_identity() {
        let store = store();
        let view = store.view();
        assert_eq!(apply(&view, &FilterSpec::new()), view);
    }

    #[test]
    fn clauses_combine_with_and() {
        let store = store();
        let spec = FilterSpec::new()
            .where_equals("contract_type", "Goods")
            .where_in("status", ["Closed"]);
        assert_eq!(apply(&store.view(), &spec).len(), 1);
    }

    #[test]
    fn missing_field_clause_is_skipped() {
        let store = store();
        let spec = FilterSpec::new()
            .where_equals("economic_sector_name", "Energy")
            .where_equals("contract_type", "Goods");
        assert_eq!(apply(&store.view(), &spec).len(), 2);
        assert_eq!(
            spec.skipped_fields(store.schema()),
            vec!["economic_sector_name".to_string()]
        );
    }

    #[test]
    fn empty_in_selection_adds_no_clause() {
        let spec = FilterSpec::new().where_in("status", Vec::<String>::new());
        assert!(spec.is_empty());
    }

    #[test]
    fn range_builder_rejects_inverted_bounds() {
        let err = FilterSpec::new().where_range("amount", 500, 100).unwrap_err();
        assert!(err.is_configuration());
        let err = FilterSpec::new()
            .where_range("amount", 1, "x")
            .unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn raw_inverted_range_yields_empty_set() {
        let store = store();
        let mut spec = FilterSpec::new();
        spec.push("amount", Predicate::range(500, 100));
        assert!(apply(&store.view(), &spec).is_empty());
    }

    #[test]
    fn range_filters_inclusively() {
        let store = store();
        let spec = FilterSpec::new().where_range("amount", 100, 250).unwrap();
        assert_eq!(apply(&store.view(), &spec).len(), 2);
    }

    #[test]
    fn differs_excludes_domestic_awards() {
        let store = store();
        let spec =
            FilterSpec::new().where_differs("awarded_firm_country_name", "operation_country_name");
        let filtered = apply(&store.view(), &spec);
        assert_eq!(filtered.distinct("awarded_firm_country_name"), vec!["Brazil", "Chile"]);
    }

    #[test]
    fn differs_with_missing_other_field_is_skipped() {
        let store = store();
        let spec = FilterSpec::new().where_differs("awarded_firm_country_name", "nope");
        assert_eq!(apply(&store.view(), &spec).len(), 3);
    }

    #[test]
    fn filtering_is_idempotent() {
        let store = store();
        let spec = FilterSpec::new().where_in("status", ["Closed"]);
        let once = apply(&store.view(), &spec);
        let twice = apply(&once, &spec);
        assert_eq!(once, twice);
    }
}
