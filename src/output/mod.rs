//! Rendering summaries for the command line.
//!
//! Every result type is first flattened into a [`TableView`] of display
//! strings; the terminal writer draws it and the JSON writer serializes the
//! original value objects instead.

pub mod json;
pub mod terminal;

use crate::aggregate::{AggregationResult, SummaryTable};
use crate::bucketing::{BucketKind, BucketedResult, PartitionedResult};
use crate::formatting::{format_currency_with_symbol, format_metric, format_percentage};
use crate::pivot::{DenseGrid, PivotTable};
use crate::report::{Report, SectionTable};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Terminal,
    Json,
}

/// A titled grid of display strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableView {
    pub title: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// Fields whose absence made this table unavailable
    pub missing: Vec<String>,
}

impl TableView {
    pub fn is_available(&self) -> bool {
        self.missing.is_empty()
    }

    pub fn from_counts(title: &str, result: &AggregationResult) -> Self {
        let mut headers = result.key_labels.clone();
        headers.push(result.metric.clone());
        Self {
            title: title.to_string(),
            headers,
            rows: result
                .entries
                .iter()
                .map(|entry| {
                    let mut row = entry.key.clone();
                    row.push(format_metric(entry.value));
                    row
                })
                .collect(),
            missing: result.missing.clone(),
        }
    }

    pub fn from_shares(title: &str, result: &AggregationResult, decimals: usize) -> Self {
        let mut headers = result.key_labels.clone();
        headers.push(result.metric.clone());
        headers.push("share".to_string());
        Self {
            title: title.to_string(),
            headers,
            rows: result
                .with_shares()
                .into_iter()
                .map(|share| {
                    let mut row = share.key;
                    row.push(share.count.to_string());
                    row.push(format_percentage(share.percentage, decimals));
                    row
                })
                .collect(),
            missing: result.missing.clone(),
        }
    }

    pub fn from_summary(title: &str, table: &SummaryTable) -> Self {
        let mut headers = table.key_labels.clone();
        headers.extend(table.metrics.iter().cloned());
        Self {
            title: title.to_string(),
            headers,
            rows: table
                .rows
                .iter()
                .map(|row| {
                    let mut cells = row.key.clone();
                    cells.extend(row.values.iter().map(|v| format_metric(*v)));
                    cells
                })
                .collect(),
            missing: table.missing.clone(),
        }
    }

    pub fn from_buckets(title: &str, result: &BucketedResult, decimals: usize) -> Self {
        Self {
            title: title.to_string(),
            headers: vec![
                result.category.clone(),
                "frequency".to_string(),
                "share".to_string(),
            ],
            rows: result
                .entries
                .iter()
                .map(|entry| {
                    let label = match entry.kind {
                        BucketKind::Pinned => format!("{} *", entry.label),
                        BucketKind::Ranked | BucketKind::Other => entry.label.clone(),
                    };
                    vec![
                        label,
                        entry.frequency.to_string(),
                        format_percentage(entry.percentage, decimals),
                    ]
                })
                .collect(),
            missing: result.missing.clone(),
        }
    }

    pub fn from_partitions(result: &PartitionedResult, decimals: usize) -> Vec<Self> {
        if !result.missing.is_empty() {
            return vec![Self {
                title: result.partition_label.clone(),
                headers: Vec::new(),
                rows: Vec::new(),
                missing: result.missing.clone(),
            }];
        }
        result
            .partitions
            .iter()
            .map(|p| {
                let title = format!("{} = {}", result.partition_label, p.partition);
                Self::from_buckets(&title, &p.buckets, decimals)
            })
            .collect()
    }

    /// Sparse listing: one line per observed cell.
    pub fn from_pivot(title: &str, table: &PivotTable) -> Self {
        Self {
            title: title.to_string(),
            headers: vec![
                table.row_label.clone(),
                table.col_label.clone(),
                format!("{} vs {}", table.labels.a, table.labels.b),
            ],
            rows: table
                .entries
                .iter()
                .map(|e| vec![e.row.clone(), e.col.clone(), e.cell.to_string()])
                .collect(),
            missing: table.missing.clone(),
        }
    }

    pub fn from_grid(title: &str, grid: &DenseGrid, missing: &[String]) -> Self {
        let mut headers = vec![format!("{} \\ {}", grid.row_label, grid.col_label)];
        headers.extend(grid.cols.iter().cloned());
        Self {
            title: title.to_string(),
            headers,
            rows: grid
                .rows
                .iter()
                .zip(grid.rendered())
                .map(|(row, cells)| {
                    let mut line = vec![row.clone()];
                    line.extend(cells);
                    line
                })
                .collect(),
            missing: missing.to_vec(),
        }
    }

    /// Re-render the last column as money. Non-numeric cells are left alone.
    #[must_use]
    pub fn with_currency(mut self, symbol: &str) -> Self {
        for row in &mut self.rows {
            if let Some(cell) = row.last_mut() {
                if let Ok(amount) = cell.parse::<f64>() {
                    *cell = format_currency_with_symbol(amount, symbol);
                }
            }
        }
        self
    }

    pub fn from_report(report: &Report, decimals: usize) -> Vec<Self> {
        report
            .sections
            .iter()
            .map(|section| match &section.table {
                SectionTable::Shares(r) => Self::from_shares(&section.title, r, decimals),
                SectionTable::Counts(r) => Self::from_counts(&section.title, r),
                SectionTable::Stats(t) => Self::from_summary(&section.title, t),
            })
            .collect()
    }
}
