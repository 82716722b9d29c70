use anyhow::Result;
use std::path::Path;

use super::{with_filtered, CommandContext};
use crate::cli::FilterArgs;
use crate::output::TableView;
use crate::report::standard_report;

pub fn run_report(ctx: &CommandContext, data: &Path, filters: &FilterArgs) -> Result<()> {
    with_filtered(ctx, data, &filters.to_spec()?, |records| {
        let report = standard_report(records);
        let unavailable = report.sections.iter().filter(|s| !s.table.is_available()).count();
        if unavailable > 0 {
            tracing::info!("{} report section(s) unavailable for this dataset", unavailable);
        }
        ctx.emit(&report, &TableView::from_report(&report, ctx.percent_decimals()))
    })
}
