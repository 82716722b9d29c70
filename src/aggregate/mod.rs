//! Group aggregator.
//!
//! Groups a [`RecordSet`] by one or two keys and computes a metric per group.
//! Results are flat `(key tuple, value)` sequences in first-seen key order;
//! reshaping into matrices belongs to the pivot builder. Rows whose key is
//! null are left out of every group.

pub mod key;
pub mod metric;

pub use key::{GroupKey, KeyField};
pub use metric::{Metric, MetricValue, NumericSource};

use crate::store::RecordSet;
use metric::{Accumulator, ResolvedMetric};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::debug;

/// One group of an [`AggregationResult`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupEntry {
    pub key: Vec<String>,
    pub value: MetricValue,
}

/// Flat grouped statistic.
///
/// When a referenced field is missing from the schema, `missing` names it and
/// `entries` is empty: the summary is "not available" rather than an error.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregationResult {
    pub key_labels: Vec<String>,
    pub metric: String,
    pub entries: Vec<GroupEntry>,
    pub missing: Vec<String>,
}

/// A group's count alongside its share of the total.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShareEntry {
    pub key: Vec<String>,
    pub count: u64,
    pub percentage: f64,
}

impl AggregationResult {
    fn unavailable(key_labels: Vec<String>, metric: String, missing: Vec<String>) -> Self {
        Self {
            key_labels,
            metric,
            entries: Vec::new(),
            missing,
        }
    }

    pub fn is_available(&self) -> bool {
        self.missing.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Sum of all count values. Non-count entries contribute nothing.
    pub fn total_count(&self) -> u64 {
        self.entries.iter().filter_map(|e| e.value.as_count()).sum()
    }

    /// Counts with their percentage of the total, rounded to two decimals.
    pub fn with_shares(&self) -> Vec<ShareEntry> {
        let total = self.total_count();
        self.entries
            .iter()
            .filter_map(|entry| {
                let count = entry.value.as_count()?;
                Some(ShareEntry {
                    key: entry.key.clone(),
                    count,
                    percentage: percentage_of(count, total),
                })
            })
            .collect()
    }

    /// Descending by value, ties broken by key ascending. `NoData` sorts last.
    #[must_use]
    pub fn ranked(mut self) -> Self {
        self.entries.sort_by(rank_order);
        self
    }

    /// Ascending by key tuple.
    #[must_use]
    pub fn sorted_by_key(mut self) -> Self {
        self.entries.sort_by(|a, b| a.key.cmp(&b.key));
        self
    }
}

pub(crate) fn rank_order(a: &GroupEntry, b: &GroupEntry) -> Ordering {
    match (a.value.as_f64(), b.value.as_f64()) {
        (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
    .then_with(|| a.key.cmp(&b.key))
}

/// `part / total * 100` rounded to two decimals; zero when `total` is zero.
pub fn percentage_of(part: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    round2(part as f64 / total as f64 * 100.0)
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Several metrics per group, computed in one pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryTable {
    pub key_labels: Vec<String>,
    pub metrics: Vec<String>,
    pub rows: Vec<SummaryRow>,
    pub missing: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRow {
    pub key: Vec<String>,
    pub values: Vec<MetricValue>,
}

impl SummaryTable {
    pub fn is_available(&self) -> bool {
        self.missing.is_empty()
    }

    #[must_use]
    pub fn sorted_by_key(mut self) -> Self {
        self.rows.sort_by(|a, b| a.key.cmp(&b.key));
        self
    }
}

/// Group `records` by `key` and compute `metric` for every group.
pub fn aggregate(records: &RecordSet<'_>, key: &GroupKey, metric: &Metric) -> AggregationResult {
    let table = aggregate_many(records, key, std::slice::from_ref(metric));
    let metric_label = metric.label();
    if !table.is_available() {
        return AggregationResult::unavailable(table.key_labels, metric_label, table.missing);
    }
    AggregationResult {
        key_labels: table.key_labels,
        metric: metric_label,
        entries: table
            .rows
            .into_iter()
            .map(|row| GroupEntry {
                key: row.key,
                value: row.values.into_iter().next().unwrap_or(MetricValue::NoData),
            })
            .collect(),
        missing: Vec::new(),
    }
}

/// Group `records` by `key` and compute every metric in `metrics` per group.
pub fn aggregate_many(
    records: &RecordSet<'_>,
    key: &GroupKey,
    metrics: &[Metric],
) -> SummaryTable {
    let schema = records.schema();
    let metric_labels: Vec<String> = metrics.iter().map(Metric::label).collect();

    let mut missing = Vec::new();
    let keys = match key.resolve(schema) {
        Ok(keys) => keys,
        Err(names) => {
            missing.extend(names);
            Vec::new()
        }
    };
    let key_labels: Vec<String> = if keys.is_empty() {
        key.fields().iter().map(|k| k.label()).collect()
    } else {
        keys.iter().map(|k| k.label().to_string()).collect()
    };

    let mut resolved: Vec<ResolvedMetric> = Vec::with_capacity(metrics.len());
    for metric in metrics {
        match metric.resolve(schema) {
            Some(r) => resolved.push(r),
            None => missing.extend(schema.missing(metric.required_fields())),
        }
    }

    if !missing.is_empty() {
        let mut seen = std::collections::HashSet::new();
        missing.retain(|name| seen.insert(name.clone()));
        debug!(?missing, "aggregation not available");
        return SummaryTable {
            key_labels,
            metrics: metric_labels,
            rows: Vec::new(),
            missing,
        };
    }

    let mut index: HashMap<Vec<String>, usize> = HashMap::new();
    let mut groups: Vec<(Vec<String>, Vec<Accumulator>)> = Vec::new();
    for record in records.iter() {
        let Some(tuple) = keys
            .iter()
            .map(|k| k.extract(record))
            .collect::<Option<Vec<String>>>()
        else {
            continue;
        };
        let slot = *index.entry(tuple.clone()).or_insert_with(|| {
            groups.push((tuple, vec![Accumulator::default(); resolved.len()]));
            groups.len() - 1
        });
        let accs = &mut groups[slot].1;
        for (metric, acc) in resolved.iter().zip(accs.iter_mut()) {
            metric.observe(acc, record);
        }
    }

    debug!(groups = groups.len(), rows = records.len(), "aggregated");
    SummaryTable {
        key_labels,
        metrics: metric_labels,
        rows: groups
            .into_iter()
            .map(|(key, accs)| SummaryRow {
                key,
                values: resolved
                    .iter()
                    .zip(accs.iter())
                    .map(|(metric, acc)| metric.finish(acc))
                    .collect(),
            })
            .collect(),
        missing: Vec::new(),
    }
}
