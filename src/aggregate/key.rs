use crate::store::{FieldId, Record, Schema};
use serde::{Deserialize, Serialize};

/// One grouping dimension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyField {
    /// Raw value of a field
    Field(String),
    /// Calendar year of a date (or date-like text) field
    YearOf(String),
    /// First candidate whose field exists in the schema
    Coalesce(Vec<KeyField>),
}

impl KeyField {
    pub fn field(name: impl Into<String>) -> Self {
        Self::Field(name.into())
    }

    pub fn year_of(name: impl Into<String>) -> Self {
        Self::YearOf(name.into())
    }

    pub fn coalesce(candidates: impl IntoIterator<Item = KeyField>) -> Self {
        Self::Coalesce(candidates.into_iter().collect())
    }

    /// Column label used in results.
    pub fn label(&self) -> String {
        match self {
            Self::Field(name) => name.clone(),
            Self::YearOf(name) => format!("{name}_year"),
            Self::Coalesce(candidates) => candidates
                .first()
                .map_or_else(|| "key".to_string(), Self::label),
        }
    }

    /// Resolve against `schema`; `Err` carries the names that were missing.
    pub(crate) fn resolve(&self, schema: &Schema) -> Result<ResolvedKey, Vec<String>> {
        match self {
            Self::Field(name) => schema
                .field(name)
                .map(|id| ResolvedKey {
                    id,
                    label: self.label(),
                    year: false,
                })
                .ok_or_else(|| vec![name.clone()]),
            Self::YearOf(name) => schema
                .field(name)
                .map(|id| ResolvedKey {
                    id,
                    label: self.label(),
                    year: true,
                })
                .ok_or_else(|| vec![name.clone()]),
            Self::Coalesce(candidates) => {
                let mut missing = Vec::new();
                for candidate in candidates {
                    match candidate.resolve(schema) {
                        Ok(resolved) => return Ok(resolved),
                        Err(names) => missing.extend(names),
                    }
                }
                Err(missing)
            }
        }
    }
}

impl From<&str> for KeyField {
    fn from(name: &str) -> Self {
        Self::Field(name.to_string())
    }
}

impl From<String> for KeyField {
    fn from(name: String) -> Self {
        Self::Field(name)
    }
}

/// A [`KeyField`] bound to a concrete schema position.
#[derive(Debug, Clone)]
pub(crate) struct ResolvedKey {
    id: FieldId,
    label: String,
    year: bool,
}

impl ResolvedKey {
    pub(crate) fn label(&self) -> &str {
        &self.label
    }

    /// Grouping key of `record`, or `None` when the value is null.
    pub(crate) fn extract(&self, record: &Record) -> Option<String> {
        let value = record.get(self.id);
        if self.year {
            value.year().map(|y| y.to_string())
        } else {
            value.as_key()
        }
    }
}

/// One or two fields whose distinct value combinations form the buckets.
///
/// Order matters to the pivot builder: the first key becomes rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GroupKey {
    Single(KeyField),
    Pair(KeyField, KeyField),
}

impl GroupKey {
    pub fn one(key: impl Into<KeyField>) -> Self {
        Self::Single(key.into())
    }

    pub fn two(first: impl Into<KeyField>, second: impl Into<KeyField>) -> Self {
        Self::Pair(first.into(), second.into())
    }

    pub fn fields(&self) -> Vec<&KeyField> {
        match self {
            Self::Single(key) => vec![key],
            Self::Pair(first, second) => vec![first, second],
        }
    }

    pub fn arity(&self) -> usize {
        match self {
            Self::Single(_) => 1,
            Self::Pair(..) => 2,
        }
    }

    pub(crate) fn resolve(&self, schema: &Schema) -> Result<Vec<ResolvedKey>, Vec<String>> {
        let mut resolved = Vec::with_capacity(self.arity());
        let mut missing = Vec::new();
        for key in self.fields() {
            match key.resolve(schema) {
                Ok(r) => resolved.push(r),
                Err(names) => missing.extend(names),
            }
        }
        if missing.is_empty() {
            Ok(resolved)
        } else {
            Err(missing)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coalesce_takes_first_available() {
        let schema = Schema::new(["signature_date"]);
        let key = KeyField::coalesce([
            KeyField::field("contract_year"),
            KeyField::year_of("signature_date"),
        ]);
        let resolved = key.resolve(&schema).unwrap();
        assert_eq!(resolved.label(), "signature_date_year");
    }

    #[test]
    fn coalesce_reports_every_missing_candidate() {
        let schema = Schema::new(["status"]);
        let key = KeyField::coalesce([
            KeyField::field("contract_year"),
            KeyField::year_of("signature_date"),
        ]);
        assert_eq!(
            key.resolve(&schema).unwrap_err(),
            vec!["contract_year".to_string(), "signature_date".to_string()]
        );
    }

    #[test]
    fn pair_collects_missing_from_both_sides() {
        let schema = Schema::new(["status"]);
        let key = GroupKey::two("contract_type", "status");
        assert_eq!(key.arity(), 2);
        assert_eq!(
            key.resolve(&schema).unwrap_err(),
            vec!["contract_type".to_string()]
        );
    }
}
