use anyhow::{bail, Result};
use std::path::Path;

use super::{with_filtered, CommandContext};
use crate::aggregate::{aggregate, GroupKey, Metric, NumericSource};
use crate::cli::{FilterArgs, MetricArg};
use crate::output::TableView;

pub struct SummaryOptions {
    pub by: Vec<String>,
    pub metric: MetricArg,
    pub field: Option<String>,
    pub days_between: Option<Vec<String>>,
    pub currency: bool,
}

pub fn group_key(by: &[String]) -> Result<GroupKey> {
    match by {
        [first] => Ok(GroupKey::one(first.as_str())),
        [first, second] => Ok(GroupKey::two(first.as_str(), second.as_str())),
        _ => bail!("--by takes one or two fields, got {}", by.len()),
    }
}

fn numeric_source(options: &SummaryOptions) -> Option<NumericSource> {
    match (&options.field, options.days_between.as_deref()) {
        (Some(field), _) => Some(NumericSource::field(field.as_str())),
        (None, Some([start, end])) => Some(NumericSource::days_between(start, end)),
        _ => None,
    }
}

pub fn build_metric(options: &SummaryOptions) -> Result<Metric> {
    if options.metric == MetricArg::Count {
        return Ok(match &options.field {
            Some(field) => Metric::CountOf(field.clone()),
            None => Metric::Count,
        });
    }
    let Some(source) = numeric_source(options) else {
        bail!("--metric {:?} needs --field or --days-between", options.metric);
    };
    Ok(match options.metric {
        MetricArg::Sum => Metric::Sum(source),
        MetricArg::Mean => Metric::Mean(source),
        MetricArg::Min => Metric::Min(source),
        MetricArg::Max => Metric::Max(source),
        MetricArg::Count => Metric::Count,
    })
}

pub fn run_summary(
    ctx: &CommandContext,
    data: &Path,
    options: &SummaryOptions,
    filters: &FilterArgs,
) -> Result<()> {
    let key = group_key(&options.by)?;
    let metric = build_metric(options)?;

    with_filtered(ctx, data, &filters.to_spec()?, |records| {
        let result = aggregate(records, &key, &metric).ranked();
        let title = format!("{} by {}", metric.label(), options.by.join(" x "));
        let view = if metric.is_count() {
            TableView::from_shares(&title, &result, ctx.percent_decimals())
        } else if options.currency {
            TableView::from_counts(&title, &result).with_currency(&ctx.config.format.currency_symbol)
        } else {
            TableView::from_counts(&title, &result)
        };
        ctx.emit(&result, &[view])
    })
}
