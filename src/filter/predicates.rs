//! Pure predicate functions over single record values.
//!
//! Each predicate takes already-resolved values and returns a boolean. Field
//! resolution and the skip-on-missing policy live in the parent module.

use crate::store::Value;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeSet;

/// Condition applied to one field of a record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Predicate {
    /// Normalized string equality
    Equals { value: String },
    /// Membership in a set of normalized strings
    InSet { values: BTreeSet<String> },
    /// Inclusive on both ends
    Range { min: Value, max: Value },
    /// Value differs from another field of the same record
    DiffersFrom { other: String },
}

impl Predicate {
    pub fn equals(value: impl Into<String>) -> Self {
        Self::Equals {
            value: value.into(),
        }
    }

    pub fn in_set<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::InSet {
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn range(min: impl Into<Value>, max: impl Into<Value>) -> Self {
        Self::Range {
            min: min.into(),
            max: max.into(),
        }
    }

    pub fn differs_from(other: impl Into<String>) -> Self {
        Self::DiffersFrom {
            other: other.into(),
        }
    }
}

#[inline]
pub fn matches_equals(value: &Value, expected: &str) -> bool {
    value.as_key().is_some_and(|key| key == expected)
}

#[inline]
pub fn matches_in_set(value: &Value, allowed: &BTreeSet<String>) -> bool {
    value.as_key().is_some_and(|key| allowed.contains(&key))
}

/// Inclusive range check. Nulls and values incomparable with the bounds
/// never match; an inverted range matches nothing.
#[inline]
pub fn within_range(value: &Value, min: &Value, max: &Value) -> bool {
    let above_min = matches!(
        value.compare(min),
        Some(Ordering::Greater | Ordering::Equal)
    );
    let below_max = matches!(value.compare(max), Some(Ordering::Less | Ordering::Equal));
    above_min && below_max
}

/// Two nulls are treated as equal; a null never differs from itself.
#[inline]
pub fn differs(value: &Value, other: &Value) -> bool {
    value.as_key() != other.as_key()
}
