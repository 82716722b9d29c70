//! The standard aggregate report over a filtered contract set.
//!
//! Each section degrades on its own: a dataset without, say,
//! `economic_sector_name` still gets every other section.

use crate::aggregate::{
    aggregate, aggregate_many, AggregationResult, GroupKey, KeyField, Metric, NumericSource,
    SummaryTable,
};
use crate::store::RecordSet;
use serde::Serialize;

const CONTRACT_ID: &str = "contract_id";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum SectionTable {
    /// Counts shown with their share of the total
    Shares(AggregationResult),
    Counts(AggregationResult),
    Stats(SummaryTable),
}

impl SectionTable {
    pub fn missing(&self) -> &[String] {
        match self {
            Self::Shares(r) | Self::Counts(r) => &r.missing,
            Self::Stats(t) => &t.missing,
        }
    }

    pub fn is_available(&self) -> bool {
        self.missing().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportSection {
    pub title: String,
    pub table: SectionTable,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub records: usize,
    pub sections: Vec<ReportSection>,
}

fn counted(records: &RecordSet<'_>, key: GroupKey) -> AggregationResult {
    aggregate(records, &key, &Metric::CountOf(CONTRACT_ID.to_string()))
}

fn section(title: &str, table: SectionTable) -> ReportSection {
    ReportSection {
        title: title.to_string(),
        table,
    }
}

pub fn standard_report(records: &RecordSet<'_>) -> Report {
    let duration = NumericSource::days_between("start_date", "stop_date");
    let yearly = KeyField::coalesce([
        KeyField::field("contract_year"),
        KeyField::year_of("signature_date"),
    ]);

    let sections = vec![
        section(
            "Contracts by type",
            SectionTable::Shares(counted(records, GroupKey::one("contract_type"))),
        ),
        section(
            "Contracts by status",
            SectionTable::Counts(counted(records, GroupKey::one("status"))),
        ),
        section(
            "Contracts by operation country",
            SectionTable::Counts(counted(records, GroupKey::one("operation_country_name"))),
        ),
        section(
            "Contracts by awarded firm country",
            SectionTable::Counts(counted(records, GroupKey::one("awarded_firm_country_name"))),
        ),
        section(
            "Contracts per year",
            SectionTable::Counts(counted(records, GroupKey::one(yearly)).sorted_by_key()),
        ),
        section(
            "Operations by type",
            SectionTable::Counts(counted(records, GroupKey::one("operation_type_name"))),
        ),
        section(
            "Contract duration in days by type",
            SectionTable::Stats(aggregate_many(
                records,
                &GroupKey::one("contract_type"),
                &[
                    Metric::Min(duration.clone()),
                    Metric::Max(duration.clone()),
                    Metric::Mean(duration),
                ],
            )),
        ),
        section(
            "Contracts by economic sector and procurement type",
            SectionTable::Counts(counted(
                records,
                GroupKey::two("economic_sector_name", "procurement_type"),
            )),
        ),
        section(
            "Contracts by type and status",
            SectionTable::Counts(counted(records, GroupKey::two("contract_type", "status"))),
        ),
    ];

    Report {
        records: records.len(),
        sections,
    }
}
