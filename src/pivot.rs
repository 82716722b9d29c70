//! Pivot builder: two grouping keys plus a binary split per cell.
//!
//! The table is sparse. Only (row, col) combinations observed in the data
//! get an entry; [`PivotTable::dense`] fills the rest with `0 vs 0`.

use crate::aggregate::KeyField;
use crate::store::{FieldId, Record, RecordSet, Schema};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;

/// Classifies each record as side A (rule holds) or side B (anything else,
/// including nulls).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitRule {
    /// `field` equals `value`, e.g. awarded country is the home country
    Equals { field: String, value: String },
    /// Two fields of the record hold the same value
    FieldsMatch { left: String, right: String },
}

impl SplitRule {
    pub fn equals(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Equals {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn fields_match(left: impl Into<String>, right: impl Into<String>) -> Self {
        Self::FieldsMatch {
            left: left.into(),
            right: right.into(),
        }
    }

    fn fields(&self) -> Vec<&str> {
        match self {
            Self::Equals { field, .. } => vec![field.as_str()],
            Self::FieldsMatch { left, right } => vec![left.as_str(), right.as_str()],
        }
    }

    fn resolve(&self, schema: &Schema) -> Option<ResolvedSplit<'_>> {
        match self {
            Self::Equals { field, value } => Some(ResolvedSplit::Equals(schema.field(field)?, value)),
            Self::FieldsMatch { left, right } => Some(ResolvedSplit::FieldsMatch(
                schema.field(left)?,
                schema.field(right)?,
            )),
        }
    }
}

enum ResolvedSplit<'s> {
    Equals(FieldId, &'s str),
    FieldsMatch(FieldId, FieldId),
}

impl ResolvedSplit<'_> {
    fn classify(&self, record: &Record) -> Side {
        let hit = match self {
            Self::Equals(id, expected) => record
                .get(*id)
                .as_key()
                .is_some_and(|key| key == *expected),
            Self::FieldsMatch(left, right) => match record.get(*left).as_key() {
                Some(l) => record.get(*right).as_key().is_some_and(|r| r == l),
                None => false,
            },
        };
        if hit {
            Side::A
        } else {
            Side::B
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    A,
    B,
}

/// Display names of the two split sides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitLabels {
    pub a: String,
    pub b: String,
}

impl Default for SplitLabels {
    fn default() -> Self {
        Self {
            a: "home".to_string(),
            b: "other".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PivotSpec {
    pub rows: KeyField,
    pub cols: KeyField,
    pub split: SplitRule,
    #[serde(default)]
    pub labels: SplitLabels,
}

impl PivotSpec {
    pub fn new(rows: impl Into<KeyField>, cols: impl Into<KeyField>, split: SplitRule) -> Self {
        Self {
            rows: rows.into(),
            cols: cols.into(),
            split,
            labels: SplitLabels::default(),
        }
    }

    #[must_use]
    pub fn with_labels(mut self, a: impl Into<String>, b: impl Into<String>) -> Self {
        self.labels = SplitLabels {
            a: a.into(),
            b: b.into(),
        };
        self
    }
}

/// Paired count of one (row, col) cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PivotCell {
    pub a: u64,
    pub b: u64,
}

impl PivotCell {
    pub const fn new(a: u64, b: u64) -> Self {
        Self { a, b }
    }

    pub const fn total(self) -> u64 {
        self.a + self.b
    }
}

impl fmt::Display for PivotCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} vs {}", self.a, self.b)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("not a paired count: {0:?}")]
pub struct ParsePivotCellError(String);

/// Reads back `"{a} vs {b}"`. The separator is not escaped, so this only
/// works for strings produced by the `Display` impl.
impl FromStr for PivotCell {
    type Err = ParsePivotCellError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParsePivotCellError(s.to_string());
        let (a, b) = s.split_once(" vs ").ok_or_else(err)?;
        Ok(Self {
            a: a.trim().parse().map_err(|_| err())?,
            b: b.trim().parse().map_err(|_| err())?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PivotEntry {
    pub row: String,
    pub col: String,
    pub cell: PivotCell,
}

/// Sparse cross-tabulation in first-seen (row, col) order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PivotTable {
    pub row_label: String,
    pub col_label: String,
    pub labels: SplitLabels,
    pub entries: Vec<PivotEntry>,
    pub missing: Vec<String>,
}

impl PivotTable {
    pub fn is_available(&self) -> bool {
        self.missing.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, row: &str, col: &str) -> Option<PivotCell> {
        self.entries
            .iter()
            .find(|e| e.row == row && e.col == col)
            .map(|e| e.cell)
    }

    /// Full grid over the observed row and column values, sorted, with
    /// `(0, 0)` for combinations that never occurred.
    pub fn dense(&self) -> DenseGrid {
        let rows: Vec<String> = self
            .entries
            .iter()
            .map(|e| e.row.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let cols: Vec<String> = self
            .entries
            .iter()
            .map(|e| e.col.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let lookup: HashMap<(&str, &str), PivotCell> = self
            .entries
            .iter()
            .map(|e| ((e.row.as_str(), e.col.as_str()), e.cell))
            .collect();
        let cells = rows
            .iter()
            .map(|r| {
                cols.iter()
                    .map(|c| {
                        lookup
                            .get(&(r.as_str(), c.as_str()))
                            .copied()
                            .unwrap_or_default()
                    })
                    .collect()
            })
            .collect();
        DenseGrid {
            row_label: self.row_label.clone(),
            col_label: self.col_label.clone(),
            rows,
            cols,
            cells,
        }
    }
}

/// Dense reshaping of a [`PivotTable`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DenseGrid {
    pub row_label: String,
    pub col_label: String,
    pub rows: Vec<String>,
    pub cols: Vec<String>,
    pub cells: Vec<Vec<PivotCell>>,
}

impl DenseGrid {
    pub fn cell(&self, row: &str, col: &str) -> Option<PivotCell> {
        let r = self.rows.iter().position(|v| v == row)?;
        let c = self.cols.iter().position(|v| v == col)?;
        Some(self.cells[r][c])
    }

    /// Every cell rendered as `"a vs b"`.
    pub fn rendered(&self) -> Vec<Vec<String>> {
        self.cells
            .iter()
            .map(|row| row.iter().map(ToString::to_string).collect())
            .collect()
    }
}

/// Cross-tabulate `spec.rows` × `spec.cols`, counting each split side.
pub fn pivot(records: &RecordSet<'_>, spec: &PivotSpec) -> PivotTable {
    let schema = records.schema();
    let mut table = PivotTable {
        row_label: spec.rows.label(),
        col_label: spec.cols.label(),
        labels: spec.labels.clone(),
        entries: Vec::new(),
        missing: Vec::new(),
    };

    let rows = spec.rows.resolve(schema);
    let cols = spec.cols.resolve(schema);
    let split = spec.split.resolve(schema);
    let (Ok(rows), Ok(cols), Some(split)) = (rows.as_ref(), cols.as_ref(), split) else {
        if let Err(names) = &rows {
            table.missing.extend(names.iter().cloned());
        }
        if let Err(names) = &cols {
            table.missing.extend(names.iter().cloned());
        }
        table.missing.extend(schema.missing(spec.split.fields()));
        debug!(missing = ?table.missing, "pivot not available");
        return table;
    };
    table.row_label = rows.label().to_string();
    table.col_label = cols.label().to_string();

    let mut index: HashMap<(String, String), usize> = HashMap::new();
    for record in records.iter() {
        let (Some(row), Some(col)) = (rows.extract(record), cols.extract(record)) else {
            continue;
        };
        let slot = *index.entry((row.clone(), col.clone())).or_insert_with(|| {
            table.entries.push(PivotEntry {
                row,
                col,
                cell: PivotCell::default(),
            });
            table.entries.len() - 1
        });
        let cell = &mut table.entries[slot].cell;
        match split.classify(record) {
            Side::A => cell.a += 1,
            Side::B => cell.b += 1,
        }
    }

    debug!(cells = table.entries.len(), "pivot built");
    table
}
