//! Categorical aggregation and bounded-cardinality summaries over
//! procurement contract records.
//!
//! The pipeline is filter → aggregate → bucket or pivot → format. Every
//! stage reads an immutable [`store::RecordSet`] and returns a new value
//! object; a field the dataset does not carry makes the affected result
//! "not available" rather than failing the whole run.

pub mod aggregate;
pub mod bucketing;
pub mod cli;
pub mod commands;
pub mod config;
pub mod errors;
pub mod filter;
pub mod formatting;
pub mod output;
pub mod pivot;
pub mod report;
pub mod store;

// Re-export commonly used types
pub use crate::aggregate::{
    aggregate, aggregate_many, AggregationResult, GroupEntry, GroupKey, KeyField, Metric,
    MetricValue, NumericSource, SummaryTable,
};
pub use crate::bucketing::{
    bucket_by_partition, bucket_top_n, top_n, BucketEntry, BucketKind, BucketedResult,
    PartitionedResult, TopNConfig,
};
pub use crate::errors::{Error, Result};
pub use crate::filter::{apply as apply_filter, FilterSpec, Predicate};
pub use crate::pivot::{pivot, DenseGrid, PivotCell, PivotSpec, PivotTable, SplitRule};
pub use crate::report::{standard_report, Report};
pub use crate::store::{Dataset, LoadOptions, Record, RecordSet, RecordStore, Schema, Value};
