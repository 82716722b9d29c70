//! End-to-end summaries over the bundled contracts fixture.
//!
//! The fixture holds ten contracts awarded to Uruguay (4), Brazil (3),
//! Argentina (2) and Chile (1), with mixed-case country names that the
//! loader normalizes.

use pretty_assertions::assert_eq;
use procsum::aggregate::{aggregate, aggregate_many, GroupKey, KeyField, Metric, MetricValue};
use procsum::bucketing::{bucket_by_partition, top_n, BucketKind, TopNConfig};
use procsum::filter::{apply, FilterSpec};
use procsum::pivot::{pivot, PivotCell, PivotSpec, SplitRule};
use procsum::report::{standard_report, SectionTable};
use procsum::store::{Dataset, LoadOptions, RecordStore};
use procsum::NumericSource;
use std::path::PathBuf;
use std::sync::Arc;

fn fixture() -> Arc<RecordStore> {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/data/contracts.json");
    let dataset = Dataset::open(&path, &LoadOptions::default()).unwrap();
    let store = dataset.snapshot();
    dataset.close();
    store
}

fn entries(result: &procsum::BucketedResult) -> Vec<(String, u64, f64)> {
    result
        .entries
        .iter()
        .map(|e| (e.label.clone(), e.frequency, e.percentage))
        .collect()
}

#[test]
fn pinned_top_two_with_other_bucket() {
    let store = fixture();
    let config = TopNConfig::new(2).unwrap().with_pinned("Uruguay").unwrap();
    let result = top_n(&store.view(), "awarded_firm_country_name", &config).unwrap();

    assert_eq!(
        entries(&result),
        vec![
            ("Uruguay".to_string(), 4, 40.0),
            ("Brazil".to_string(), 3, 30.0),
            ("Other".to_string(), 3, 30.0),
        ]
    );
    assert_eq!(result.entries[0].kind, BucketKind::Pinned);
    assert_eq!(result.total(), 10);
}

#[test]
fn excluding_domestic_awards_before_bucketing() {
    let store = fixture();
    let view = store.view();
    let foreign = apply(
        &view,
        &FilterSpec::new().where_differs("awarded_firm_country_name", "operation_country_name"),
    );
    let config = TopNConfig::new(10).unwrap().with_pinned("Uruguay").unwrap();
    let result = top_n(&foreign, "awarded_firm_country_name", &config).unwrap();

    assert_eq!(
        entries(&result),
        vec![
            ("Brazil".to_string(), 3, 50.0),
            ("Argentina".to_string(), 2, 33.33),
            ("Chile".to_string(), 1, 16.67),
        ]
    );
    assert!(result.other().is_none());
}

#[test]
fn filtered_counts_by_type() {
    let store = fixture();
    let view = store.view();
    let spec = FilterSpec::new()
        .where_in("status", ["Active"])
        .where_range("contract_year", 2020, 2020)
        .unwrap();
    let filtered = apply(&view, &spec);
    let result = aggregate(&filtered, &GroupKey::one("contract_type"), &Metric::Count).ranked();

    let counts: Vec<(String, MetricValue)> = result
        .entries
        .iter()
        .map(|e| (e.key[0].clone(), e.value))
        .collect();
    assert_eq!(
        counts,
        vec![
            ("Works".to_string(), MetricValue::Count(2)),
            ("Goods".to_string(), MetricValue::Count(1)),
        ]
    );
}

#[test]
fn empty_selection_yields_empty_results() {
    let store = fixture();
    let view = store.view();
    let none = apply(&view, &FilterSpec::new().where_equals("status", "Cancelled"));
    assert!(none.is_empty());

    let counts = aggregate(&none, &GroupKey::one("contract_type"), &Metric::Count);
    assert!(counts.is_available());
    assert!(counts.is_empty());

    let buckets = top_n(&none, "contract_type", &TopNConfig::new(3).unwrap()).unwrap();
    assert!(buckets.is_empty());
}

#[test]
fn sums_by_sector_ignore_null_amounts() {
    let store = fixture();
    let result = aggregate(
        &store.view(),
        &GroupKey::one("economic_sector_name"),
        &Metric::Sum(NumericSource::field("amount")),
    )
    .sorted_by_key();

    let sums: Vec<(String, MetricValue)> = result
        .entries
        .iter()
        .map(|e| (e.key[0].clone(), e.value))
        .collect();
    assert_eq!(
        sums,
        vec![
            ("Energy".to_string(), MetricValue::Number(5750.0)),
            ("Health".to_string(), MetricValue::Number(750.0)),
            ("Transport".to_string(), MetricValue::Number(29000.0)),
        ]
    );
}

#[test]
fn duration_statistics_per_contract_type() {
    let store = fixture();
    let duration = NumericSource::days_between("start_date", "stop_date");
    let table = aggregate_many(
        &store.view(),
        &GroupKey::one("contract_type"),
        &[
            Metric::Min(duration.clone()),
            Metric::Max(duration.clone()),
            Metric::Mean(duration),
        ],
    )
    .sorted_by_key();

    let rows: Vec<(String, Vec<MetricValue>)> = table
        .rows
        .iter()
        .map(|r| (r.key[0].clone(), r.values.clone()))
        .collect();
    assert_eq!(
        rows,
        vec![
            (
                "Goods".to_string(),
                vec![
                    MetricValue::Number(10.0),
                    MetricValue::Number(30.0),
                    MetricValue::Number(18.0)
                ]
            ),
            (
                "Services".to_string(),
                vec![
                    MetricValue::Number(30.0),
                    MetricValue::Number(30.0),
                    MetricValue::Number(30.0)
                ]
            ),
            (
                "Works".to_string(),
                vec![
                    MetricValue::Number(90.0),
                    MetricValue::Number(365.0),
                    MetricValue::Number(227.5)
                ]
            ),
        ]
    );
}

#[test]
fn pivot_of_active_contracts_fills_gaps_densely() {
    let store = fixture();
    let view = store.view();
    let active = apply(&view, &FilterSpec::new().where_equals("status", "Active"));
    let spec = PivotSpec::new(
        "contract_year",
        "contract_type",
        SplitRule::equals("awarded_firm_country_name", "Uruguay"),
    );
    let table = pivot(&active, &spec);

    assert_eq!(table.get("2020", "Works"), Some(PivotCell::new(1, 1)));
    assert_eq!(table.get("2020", "Services"), None);

    let grid = table.dense();
    assert_eq!(grid.rows, vec!["2020", "2021"]);
    assert_eq!(grid.cols, vec!["Goods", "Services", "Works"]);
    assert_eq!(
        grid.rendered(),
        vec![
            vec!["1 vs 0", "0 vs 0", "1 vs 1"],
            vec!["0 vs 1", "0 vs 1", "1 vs 0"],
        ]
    );
}

#[test]
fn top_breakdown_per_operation_type() {
    let store = fixture();
    let config = TopNConfig::new(1).unwrap();
    let result = bucket_by_partition(
        &store.view(),
        &KeyField::field("operation_type_name"),
        &KeyField::field("awarded_firm_country_name"),
        &config,
    )
    .unwrap();

    let partitions: Vec<&str> = result
        .partitions
        .iter()
        .map(|p| p.partition.as_str())
        .collect();
    assert_eq!(partitions, vec!["Loan", "Grant"]);

    let loan = &result.partitions[0].buckets;
    assert_eq!(loan.entries[0].label, "Uruguay");
    assert_eq!(loan.total(), 7);
}

#[test]
fn standard_report_covers_every_section() {
    let store = fixture();
    let report = standard_report(&store.view());

    assert_eq!(report.records, 10);
    assert!(report.sections.iter().all(|s| s.table.is_available()));

    let SectionTable::Counts(yearly) = &report.sections[4].table else {
        panic!("yearly section should be counts");
    };
    let years: Vec<(&str, MetricValue)> = yearly
        .entries
        .iter()
        .map(|e| (e.key[0].as_str(), e.value))
        .collect();
    assert_eq!(
        years,
        vec![("2020", MetricValue::Count(6)), ("2021", MetricValue::Count(4))]
    );
}
