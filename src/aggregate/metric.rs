use crate::store::{FieldId, Record, Schema};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a numeric metric reads its input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumericSource {
    Field(String),
    /// Whole days from `start` to `end`; rows missing either date contribute nothing
    DaysBetween { start: String, end: String },
}

impl NumericSource {
    pub fn field(name: impl Into<String>) -> Self {
        Self::Field(name.into())
    }

    pub fn days_between(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self::DaysBetween {
            start: start.into(),
            end: end.into(),
        }
    }

    fn label(&self) -> String {
        match self {
            Self::Field(name) => name.clone(),
            Self::DaysBetween { .. } => "duration_days".to_string(),
        }
    }

    fn fields(&self) -> Vec<&str> {
        match self {
            Self::Field(name) => vec![name.as_str()],
            Self::DaysBetween { start, end } => vec![start.as_str(), end.as_str()],
        }
    }

    fn resolve(&self, schema: &Schema) -> Option<ResolvedSource> {
        match self {
            Self::Field(name) => schema.field(name).map(ResolvedSource::Field),
            Self::DaysBetween { start, end } => Some(ResolvedSource::DaysBetween(
                schema.field(start)?,
                schema.field(end)?,
            )),
        }
    }
}

impl From<&str> for NumericSource {
    fn from(name: &str) -> Self {
        Self::Field(name.to_string())
    }
}

/// Statistic computed per group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    /// Rows in the group
    Count,
    /// Rows in the group with a non-null value for the field
    CountOf(String),
    Sum(NumericSource),
    Mean(NumericSource),
    Min(NumericSource),
    Max(NumericSource),
}

impl Metric {
    pub fn is_count(&self) -> bool {
        matches!(self, Self::Count | Self::CountOf(_))
    }

    pub fn label(&self) -> String {
        match self {
            Self::Count => "count".to_string(),
            Self::CountOf(field) => format!("count({field})"),
            Self::Sum(source) => format!("sum({})", source.label()),
            Self::Mean(source) => format!("mean({})", source.label()),
            Self::Min(source) => format!("min({})", source.label()),
            Self::Max(source) => format!("max({})", source.label()),
        }
    }

    pub(crate) fn required_fields(&self) -> Vec<&str> {
        match self {
            Self::Count => Vec::new(),
            Self::CountOf(field) => vec![field.as_str()],
            Self::Sum(s) | Self::Mean(s) | Self::Min(s) | Self::Max(s) => s.fields(),
        }
    }

    pub(crate) fn resolve(&self, schema: &Schema) -> Option<ResolvedMetric> {
        let (source, kind) = match self {
            Self::Count => return Some(ResolvedMetric::Count),
            Self::CountOf(field) => return schema.field(field).map(ResolvedMetric::CountOf),
            Self::Sum(source) => (source, StatKind::Sum),
            Self::Mean(source) => (source, StatKind::Mean),
            Self::Min(source) => (source, StatKind::Min),
            Self::Max(source) => (source, StatKind::Max),
        };
        source
            .resolve(schema)
            .map(|source| ResolvedMetric::Numeric { source, kind })
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum ResolvedSource {
    Field(FieldId),
    DaysBetween(FieldId, FieldId),
}

impl ResolvedSource {
    fn extract(self, record: &Record) -> Option<f64> {
        match self {
            Self::Field(id) => record.get(id).as_f64(),
            Self::DaysBetween(start, end) => {
                let start = record.get(start).as_date()?;
                let end = record.get(end).as_date()?;
                Some((end - start).num_days() as f64)
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum StatKind {
    Sum,
    Mean,
    Min,
    Max,
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum ResolvedMetric {
    Count,
    CountOf(FieldId),
    Numeric {
        source: ResolvedSource,
        kind: StatKind,
    },
}

impl ResolvedMetric {
    pub(crate) fn observe(self, acc: &mut Accumulator, record: &Record) {
        match self {
            Self::Count => acc.hits += 1,
            Self::CountOf(id) => {
                if !record.get(id).is_null() {
                    acc.hits += 1;
                }
            }
            Self::Numeric { source, .. } => {
                if let Some(v) = source.extract(record) {
                    acc.push(v);
                }
            }
        }
    }

    pub(crate) fn finish(self, acc: &Accumulator) -> MetricValue {
        match self {
            Self::Count | Self::CountOf(_) => MetricValue::Count(acc.hits),
            Self::Numeric { .. } if acc.hits == 0 => MetricValue::NoData,
            Self::Numeric { kind, .. } => MetricValue::Number(match kind {
                StatKind::Sum => acc.sum,
                StatKind::Mean => acc.sum / acc.hits as f64,
                StatKind::Min => acc.min,
                StatKind::Max => acc.max,
            }),
        }
    }
}

/// Running state for one metric of one group.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Accumulator {
    hits: u64,
    sum: f64,
    min: f64,
    max: f64,
}

impl Default for Accumulator {
    fn default() -> Self {
        Self {
            hits: 0,
            sum: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }
}

impl Accumulator {
    fn push(&mut self, value: f64) {
        self.hits += 1;
        self.sum += value;
        self.min = self.min.min(value);
        self.max = self.max.max(value);
    }
}

/// Value of a metric for one group.
///
/// `NoData` marks a numeric statistic over a group with no usable values.
/// It is distinct from zero and serializes as `null`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MetricValue {
    Count(u64),
    Number(f64),
    NoData,
}

impl MetricValue {
    pub fn as_count(self) -> Option<u64> {
        match self {
            Self::Count(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_f64(self) -> Option<f64> {
        match self {
            Self::Count(n) => Some(n as f64),
            Self::Number(v) => Some(v),
            Self::NoData => None,
        }
    }

    pub fn is_no_data(self) -> bool {
        matches!(self, Self::NoData)
    }
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Count(n) => write!(f, "{n}"),
            Self::Number(v) if v.fract() == 0.0 => write!(f, "{v:.0}"),
            Self::Number(v) => write!(f, "{v:.2}"),
            Self::NoData => write!(f, "n/a"),
        }
    }
}
