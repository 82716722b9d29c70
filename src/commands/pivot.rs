use anyhow::{bail, Result};
use std::path::Path;

use super::{with_filtered, CommandContext};
use crate::cli::FilterArgs;
use crate::output::TableView;
use crate::pivot::{pivot, PivotSpec, SplitRule};

pub struct PivotOptions {
    pub rows: String,
    pub cols: String,
    pub split_field: String,
    pub split_value: Option<String>,
    pub split_match: Option<String>,
    pub labels: Option<Vec<String>>,
    pub dense: bool,
}

pub fn build_spec(options: &PivotOptions) -> Result<PivotSpec> {
    let split = match (&options.split_value, &options.split_match) {
        (Some(value), None) => SplitRule::equals(options.split_field.as_str(), value.as_str()),
        (None, Some(other)) => SplitRule::fields_match(options.split_field.as_str(), other.as_str()),
        _ => bail!("pivot needs exactly one of --split-value or --split-match"),
    };
    let spec = PivotSpec::new(options.rows.as_str(), options.cols.as_str(), split);
    Ok(match options.labels.as_deref() {
        Some([a, b]) => spec.with_labels(a.as_str(), b.as_str()),
        Some(other) => bail!("--labels takes two names, got {}", other.len()),
        None => spec,
    })
}

pub fn run_pivot(
    ctx: &CommandContext,
    data: &Path,
    options: &PivotOptions,
    filters: &FilterArgs,
) -> Result<()> {
    let spec = build_spec(options)?;
    let title = format!(
        "{} vs {} by {} x {}",
        spec.labels.a, spec.labels.b, options.rows, options.cols
    );

    with_filtered(ctx, data, &filters.to_spec()?, |records| {
        let table = pivot(records, &spec);
        if options.dense {
            let grid = table.dense();
            let view = TableView::from_grid(&title, &grid, &table.missing);
            ctx.emit(&grid, &[view])
        } else {
            ctx.emit(&table, &[TableView::from_pivot(&title, &table)])
        }
    })
}
