//! Top-N bucketing with a pinned category and an "Other" remainder.
//!
//! A single-key count is ranked by frequency (ties by key, ascending). The
//! top `k` entries are kept; a configured pinned category is always kept and
//! displaces the lowest of them. Everything else collapses into one "Other"
//! entry, so the bucketed total always equals the input total.

use crate::aggregate::{aggregate, rank_order, AggregationResult, GroupKey, KeyField, Metric};
use crate::config::TopNSettings;
use crate::errors::{Error, Result};
use crate::store::{Record, RecordSet};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

pub const DEFAULT_OTHER_LABEL: &str = "Other";

/// Validated Top-N parameters.
///
/// Deserializing goes through [`TopNSettings`], so the same checks as
/// [`TopNConfig::new`] apply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "TopNSettings")]
pub struct TopNConfig {
    k: usize,
    pinned: Option<String>,
    other_label: String,
}

impl TopNConfig {
    /// `k` must be positive.
    pub fn new(k: usize) -> Result<Self> {
        if k == 0 {
            return Err(Error::invalid_config("top-n k must be at least 1"));
        }
        Ok(Self {
            k,
            pinned: None,
            other_label: DEFAULT_OTHER_LABEL.to_string(),
        })
    }

    /// Always keep `category` when it occurs in the data.
    pub fn with_pinned(mut self, category: impl Into<String>) -> Result<Self> {
        let category = category.into();
        if category.trim().is_empty() {
            return Err(Error::invalid_config("pinned category must not be blank"));
        }
        self.pinned = Some(category);
        Ok(self)
    }

    pub fn with_other_label(mut self, label: impl Into<String>) -> Result<Self> {
        let label = label.into();
        if label.trim().is_empty() {
            return Err(Error::invalid_config("other label must not be blank"));
        }
        self.other_label = label;
        Ok(self)
    }

    pub fn k(&self) -> usize {
        self.k
    }

    pub fn pinned(&self) -> Option<&str> {
        self.pinned.as_deref()
    }

    pub fn other_label(&self) -> &str {
        &self.other_label
    }
}

impl TryFrom<TopNSettings> for TopNConfig {
    type Error = Error;

    fn try_from(settings: TopNSettings) -> Result<Self> {
        settings.to_config()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BucketKind {
    Ranked,
    Pinned,
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BucketEntry {
    pub label: String,
    pub frequency: u64,
    pub percentage: f64,
    pub kind: BucketKind,
}

/// At most `k` kept entries (a pinned category included) plus one "Other"
/// entry.
///
/// Entries are in rank order with "Other" last. Display order is the
/// caller's choice; see [`BucketedResult::ascending`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BucketedResult {
    pub category: String,
    pub entries: Vec<BucketEntry>,
    pub missing: Vec<String>,
}

impl BucketedResult {
    pub fn is_available(&self) -> bool {
        self.missing.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn total(&self) -> u64 {
        self.entries.iter().map(|e| e.frequency).sum()
    }

    pub fn get(&self, label: &str) -> Option<&BucketEntry> {
        self.entries
            .iter()
            .find(|e| e.kind != BucketKind::Other && e.label == label)
    }

    pub fn other(&self) -> Option<&BucketEntry> {
        self.entries.iter().find(|e| e.kind == BucketKind::Other)
    }

    /// Entries ordered by ascending frequency, e.g. for horizontal bars.
    pub fn ascending(&self) -> Vec<&BucketEntry> {
        let mut entries: Vec<&BucketEntry> = self.entries.iter().collect();
        entries.sort_by_key(|e| e.frequency);
        entries
    }
}

/// Bucket an existing single-key count aggregation.
pub fn bucket_top_n(result: &AggregationResult, config: &TopNConfig) -> Result<BucketedResult> {
    if result.key_labels.len() != 1 {
        return Err(Error::invalid_config(format!(
            "top-n bucketing needs a single grouping key, got {}",
            result.key_labels.len()
        )));
    }
    if result.entries.iter().any(|e| e.value.as_count().is_none()) {
        return Err(Error::invalid_config(format!(
            "top-n bucketing needs a count metric, got {}",
            result.metric
        )));
    }

    let category = result.key_labels[0].clone();
    if !result.is_available() {
        return Ok(BucketedResult {
            category,
            entries: Vec::new(),
            missing: result.missing.clone(),
        });
    }

    let mut ranked = result.entries.clone();
    ranked.sort_by(rank_order);
    let ranked: Vec<(String, u64)> = ranked
        .into_iter()
        .map(|e| (e.key.join(" / "), e.value.as_count().unwrap_or(0)))
        .collect();

    let pinned_at = config
        .pinned()
        .and_then(|p| ranked.iter().position(|(label, _)| label == p));

    let mut keep = vec![false; ranked.len()];
    match pinned_at {
        Some(pin) => {
            keep[pin] = true;
            let mut slots = config.k().saturating_sub(1);
            for (i, flag) in keep.iter_mut().enumerate() {
                if slots == 0 {
                    break;
                }
                if i != pin {
                    *flag = true;
                    slots -= 1;
                }
            }
        }
        None => keep.iter_mut().take(config.k()).for_each(|flag| *flag = true),
    }

    let mut entries = Vec::new();
    let mut rest = 0u64;
    let mut rest_count = 0usize;
    for (i, (label, frequency)) in ranked.into_iter().enumerate() {
        if keep[i] {
            let kind = if Some(i) == pinned_at {
                BucketKind::Pinned
            } else {
                BucketKind::Ranked
            };
            entries.push(BucketEntry {
                label,
                frequency,
                percentage: 0.0,
                kind,
            });
        } else {
            rest += frequency;
            rest_count += 1;
        }
    }
    if rest_count > 0 {
        entries.push(BucketEntry {
            label: config.other_label().to_string(),
            frequency: rest,
            percentage: 0.0,
            kind: BucketKind::Other,
        });
    }

    let frequencies: Vec<u64> = entries.iter().map(|e| e.frequency).collect();
    let shares = largest_remainder_percentages(&frequencies);
    for (entry, share) in entries.iter_mut().zip(shares) {
        entry.percentage = share;
    }

    debug!(
        category = %category,
        kept = entries.len(),
        folded = rest_count,
        "top-n bucketed"
    );
    Ok(BucketedResult {
        category,
        entries,
        missing: Vec::new(),
    })
}

/// Count `category` over `records` and bucket the result.
pub fn top_n(
    records: &RecordSet<'_>,
    category: impl Into<KeyField>,
    config: &TopNConfig,
) -> Result<BucketedResult> {
    let counts = aggregate(records, &GroupKey::one(category), &Metric::Count);
    bucket_top_n(&counts, config)
}

/// Percentages of `frequencies` at two decimals that sum to exactly 100.
///
/// Each share is floored to a hundredth of a percent and the leftover
/// hundredths go to the largest remainders, earliest entry first on ties.
fn largest_remainder_percentages(frequencies: &[u64]) -> Vec<f64> {
    const UNITS: u128 = 10_000;
    let total: u128 = frequencies.iter().map(|&f| u128::from(f)).sum();
    if total == 0 {
        return vec![0.0; frequencies.len()];
    }
    let mut units: Vec<u128> = Vec::with_capacity(frequencies.len());
    let mut remainders: Vec<(u128, usize)> = Vec::with_capacity(frequencies.len());
    for (i, &f) in frequencies.iter().enumerate() {
        let scaled = u128::from(f) * UNITS;
        units.push(scaled / total);
        remainders.push((scaled % total, i));
    }
    let assigned: u128 = units.iter().sum();
    remainders.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
    for &(_, i) in remainders.iter().take((UNITS - assigned) as usize) {
        units[i] += 1;
    }
    units.into_iter().map(|u| u as f64 / 100.0).collect()
}

/// Top-N breakdown of one partition value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartitionBuckets {
    pub partition: String,
    pub buckets: BucketedResult,
}

/// Top-N breakdowns of `category`, one per distinct `partition` value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartitionedResult {
    pub partition_label: String,
    pub partitions: Vec<PartitionBuckets>,
    pub missing: Vec<String>,
}

/// Bucket `category` separately within every value of `partition`, in
/// first-seen partition order. Rows with a null partition are skipped.
pub fn bucket_by_partition(
    records: &RecordSet<'_>,
    partition: &KeyField,
    category: &KeyField,
    config: &TopNConfig,
) -> Result<PartitionedResult> {
    let schema = records.schema();
    let resolved = match partition.resolve(schema) {
        Ok(resolved) => resolved,
        Err(missing) => {
            return Ok(PartitionedResult {
                partition_label: partition.label(),
                partitions: Vec::new(),
                missing,
            });
        }
    };

    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<(String, Vec<&Record>)> = Vec::new();
    for record in records.iter() {
        let Some(value) = resolved.extract(record) else {
            continue;
        };
        let slot = *index.entry(value.clone()).or_insert_with(|| {
            groups.push((value, Vec::new()));
            groups.len() - 1
        });
        groups[slot].1.push(record);
    }

    let mut partitions = Vec::with_capacity(groups.len());
    for (value, rows) in groups {
        let subset = RecordSet::from_rows(schema, rows);
        let buckets = top_n(&subset, category.clone(), config)?;
        partitions.push(PartitionBuckets {
            partition: value,
            buckets,
        });
    }

    Ok(PartitionedResult {
        partition_label: resolved.label().to_string(),
        partitions,
        missing: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{RecordStore, Value};

    fn countries(names: &[(&str, usize)]) -> RecordStore {
        let mut builder = RecordStore::builder();
        for (name, n) in names {
            for _ in 0..*n {
                builder.push_row([("awarded_firm_country_name", Value::from(*name))]);
            }
        }
        builder.build()
    }

    fn labels(result: &BucketedResult) -> Vec<&str> {
        result.entries.iter().map(|e| e.label.as_str()).collect()
    }

    #[test]
    fn zero_k_is_a_configuration_error() {
        assert!(TopNConfig::new(0).unwrap_err().is_configuration());
    }

    #[test]
    fn deserializing_runs_the_same_validation() {
        let zero = serde_json::from_str::<TopNConfig>(r#"{"k":0,"pinned":"Uruguay"}"#);
        assert!(zero.unwrap_err().to_string().contains("at least 1"));
        assert!(serde_json::from_str::<TopNConfig>(r#"{"k":2,"pinned":" "}"#).is_err());
        assert!(serde_json::from_str::<TopNConfig>(r#"{"k":2,"other_label":""}"#).is_err());

        let config: TopNConfig =
            serde_json::from_str(r#"{"k":2,"pinned":"Uruguay","other_label":"Otros"}"#).unwrap();
        assert_eq!(config.k(), 2);
        assert_eq!(config.pinned(), Some("Uruguay"));
        assert_eq!(config.other_label(), "Otros");
    }

    #[test]
    fn blank_pinned_and_other_label_are_rejected() {
        let config = TopNConfig::new(3).unwrap();
        assert!(config.clone().with_pinned("  ").is_err());
        assert!(config.with_other_label("").is_err());
    }

    #[test]
    fn pinned_top_ranked_keeps_k_entries() {
        let store = countries(&[("Uruguay", 4), ("Brazil", 3), ("Argentina", 2), ("Chile", 1)]);
        let config = TopNConfig::new(2).unwrap().with_pinned("Uruguay").unwrap();
        let result = top_n(&store.view(), "awarded_firm_country_name", &config).unwrap();

        assert_eq!(labels(&result), vec!["Uruguay", "Brazil", "Other"]);
        let freqs: Vec<u64> = result.entries.iter().map(|e| e.frequency).collect();
        assert_eq!(freqs, vec![4, 3, 3]);
        let pcts: Vec<f64> = result.entries.iter().map(|e| e.percentage).collect();
        assert_eq!(pcts, vec![40.0, 30.0, 30.0]);
        assert_eq!(result.entries[0].kind, BucketKind::Pinned);
    }

    #[test]
    fn low_ranked_pin_displaces_last_slot() {
        let store = countries(&[("Brazil", 5), ("Argentina", 4), ("Chile", 3), ("Uruguay", 1)]);
        let config = TopNConfig::new(2).unwrap().with_pinned("Uruguay").unwrap();
        let result = top_n(&store.view(), "awarded_firm_country_name", &config).unwrap();

        assert_eq!(labels(&result), vec!["Brazil", "Uruguay", "Other"]);
        assert_eq!(result.other().unwrap().frequency, 7);
        assert_eq!(result.total(), 13);
    }

    #[test]
    fn absent_pin_keeps_plain_top_k() {
        let store = countries(&[("Brazil", 5), ("Argentina", 4), ("Chile", 3)]);
        let config = TopNConfig::new(2).unwrap().with_pinned("Uruguay").unwrap();
        let result = top_n(&store.view(), "awarded_firm_country_name", &config).unwrap();
        assert_eq!(labels(&result), vec!["Brazil", "Argentina", "Other"]);
        assert!(result.entries.iter().all(|e| e.kind != BucketKind::Pinned));
    }

    #[test]
    fn no_other_entry_when_everything_fits() {
        let store = countries(&[("Brazil", 2), ("Chile", 1)]);
        let config = TopNConfig::new(5).unwrap();
        let result = top_n(&store.view(), "awarded_firm_country_name", &config).unwrap();
        assert!(result.other().is_none());
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn ties_break_by_label() {
        let store = countries(&[("Peru", 2), ("Chile", 2), ("Bolivia", 2)]);
        let config = TopNConfig::new(2).unwrap();
        let result = top_n(&store.view(), "awarded_firm_country_name", &config).unwrap();
        assert_eq!(labels(&result), vec!["Bolivia", "Chile", "Other"]);
    }

    #[test]
    fn custom_other_label() {
        let store = countries(&[("Brazil", 2), ("Chile", 1)]);
        let config = TopNConfig::new(1).unwrap().with_other_label("Otros").unwrap();
        let result = top_n(&store.view(), "awarded_firm_country_name", &config).unwrap();
        assert_eq!(result.other().unwrap().label, "Otros");
    }

    #[test]
    fn empty_input_is_empty_result() {
        let store = countries(&[("Brazil", 1)]);
        let none = crate::filter::apply(
            &store.view(),
            &crate::filter::FilterSpec::new().where_equals("awarded_firm_country_name", "Peru"),
        );
        let result = top_n(&none, "awarded_firm_country_name", &TopNConfig::new(3).unwrap())
            .unwrap();
        assert!(result.is_empty());
        assert!(result.is_available());
    }

    #[test]
    fn missing_category_is_unavailable() {
        let store = countries(&[("Brazil", 1)]);
        let result = top_n(&store.view(), "nope", &TopNConfig::new(3).unwrap()).unwrap();
        assert_eq!(result.missing, vec!["nope"]);
    }

    #[test]
    fn non_count_metric_is_rejected() {
        let store = RecordStore::builder()
            .row([("k", Value::from("a")), ("amount", Value::Int(3))])
            .build();
        let sums = aggregate(&store.view(), &GroupKey::one("k"), &Metric::Sum("amount".into()));
        assert!(bucket_top_n(&sums, &TopNConfig::new(1).unwrap()).is_err());
    }

    #[test]
    fn ascending_view_sorts_by_frequency() {
        let store = countries(&[("Brazil", 5), ("Chile", 1), ("Peru", 3)]);
        let config = TopNConfig::new(3).unwrap();
        let result = top_n(&store.view(), "awarded_firm_country_name", &config).unwrap();
        let asc: Vec<&str> = result.ascending().iter().map(|e| e.label.as_str()).collect();
        assert_eq!(asc, vec!["Chile", "Peru", "Brazil"]);
    }

    #[test]
    fn percentages_sum_to_exactly_one_hundred() {
        let shares = largest_remainder_percentages(&[1, 1, 1]);
        assert_eq!(shares, vec![33.34, 33.33, 33.33]);
        assert_eq!(largest_remainder_percentages(&[0, 0]), vec![0.0, 0.0]);
    }

    #[test]
    fn partitions_bucket_independently() {
        let store = RecordStore::builder()
            .row([("op", Value::from("Loan")), ("c", Value::from("Uruguay"))])
            .row([("op", Value::from("Loan")), ("c", Value::from("Brazil"))])
            .row([("op", Value::from("Loan")), ("c", Value::from("Brazil"))])
            .row([("op", Value::from("Grant")), ("c", Value::from("Chile"))])
            .row([("op", Value::Null), ("c", Value::from("Peru"))])
            .build();
        let config = TopNConfig::new(1).unwrap().with_pinned("Uruguay").unwrap();
        let result = bucket_by_partition(
            &store.view(),
            &KeyField::field("op"),
            &KeyField::field("c"),
            &config,
        )
        .unwrap();

        assert_eq!(result.partitions.len(), 2);
        assert_eq!(result.partitions[0].partition, "Loan");
        assert_eq!(labels(&result.partitions[0].buckets), vec!["Uruguay", "Other"]);
        assert_eq!(labels(&result.partitions[1].buckets), vec!["Chile"]);
    }
}
