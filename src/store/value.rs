//! Cell values held by a [`Record`](super::Record).

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;

/// A single field value.
///
/// Values are immutable once loaded. `Null` marks a field that is present in
/// the schema but has no value for this row; it never takes part in grouping.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Int(i64),
    Float(f64),
    Date(NaiveDate),
    Text(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Normalized string form used for grouping and equality predicates.
    ///
    /// Returns `None` for null values. Whole floats render without a
    /// fractional part so `2020.0` and `2020` land in the same bucket.
    pub fn as_key(&self) -> Option<String> {
        match self {
            Self::Null => None,
            Self::Int(v) => Some(v.to_string()),
            Self::Float(v) if v.is_nan() => None,
            Self::Float(v) if v.fract() == 0.0 && v.abs() < 1e15 => {
                Some(format!("{}", *v as i64))
            }
            Self::Float(v) => Some(v.to_string()),
            Self::Date(d) => Some(d.format("%Y-%m-%d").to_string()),
            Self::Text(s) => Some(s.clone()),
        }
    }

    /// Numeric view of the value. Text is not coerced.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(v) => Some(*v as f64),
            Self::Float(v) if !v.is_nan() => Some(*v),
            _ => None,
        }
    }

    /// Date view of the value; date-like text is parsed leniently.
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Date(d) => Some(*d),
            Self::Text(s) => parse_date(s),
            _ => None,
        }
    }

    /// Calendar year of a date value, or the value itself for integer years.
    pub fn year(&self) -> Option<i32> {
        match self {
            Self::Int(v) => i32::try_from(*v).ok(),
            other => other.as_date().map(|d| d.year()),
        }
    }

    /// Ordering used by range predicates. Values of different kinds are
    /// incomparable, except integers and floats.
    pub fn compare(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Null, _) | (_, Self::Null) => None,
            (Self::Date(a), Self::Date(b)) => Some(a.cmp(b)),
            (Self::Date(a), Self::Text(b)) => parse_date(b).map(|b| a.cmp(&b)),
            (Self::Text(a), Self::Date(b)) => parse_date(a).map(|a| a.cmp(b)),
            (Self::Text(a), Self::Text(b)) => Some(a.cmp(b)),
            (a, b) => match (a.as_f64(), b.as_f64()) {
                (Some(a), Some(b)) => a.partial_cmp(&b),
                _ => None,
            },
        }
    }

    /// Parse a bound typed on the command line: integer, float, date, or text.
    pub fn parse_literal(raw: &str) -> Self {
        let raw = raw.trim();
        if let Ok(v) = raw.parse::<i64>() {
            return Self::Int(v);
        }
        if let Ok(v) = raw.parse::<f64>() {
            return Self::Float(v);
        }
        if let Some(d) = parse_date(raw) {
            return Self::Date(d);
        }
        Self::Text(raw.to_string())
    }
}

/// Parse `YYYY-MM-DD` or an RFC 3339 / `YYYY-MM-DD HH:MM:SS` timestamp.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(d) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(d);
    }
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|dt| dt.date())
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_key() {
            Some(key) => write!(f, "{key}"),
            None => write!(f, ""),
        }
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Self::Date(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}
