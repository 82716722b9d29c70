use anyhow::Result;
use std::path::Path;

use super::{with_filtered, CommandContext};
use crate::aggregate::KeyField;
use crate::bucketing::{bucket_by_partition, top_n, TopNConfig};
use crate::cli::FilterArgs;
use crate::config::TopNSettings;
use crate::output::TableView;

const AWARDED_COUNTRY: &str = "awarded_firm_country_name";
const OPERATION_COUNTRY: &str = "operation_country_name";

pub struct TopOptions {
    pub by: String,
    pub k: Option<usize>,
    pub pinned: Option<String>,
    pub other_label: Option<String>,
    pub per: Option<String>,
    pub exclude_same_country: bool,
}

/// Command-line values override the `[top_n]` config section field by field.
pub fn resolve_config(settings: &TopNSettings, options: &TopOptions) -> Result<TopNConfig> {
    let merged = TopNSettings {
        k: options.k.unwrap_or(settings.k),
        pinned: options.pinned.clone().or_else(|| settings.pinned.clone()),
        other_label: options
            .other_label
            .clone()
            .unwrap_or_else(|| settings.other_label.clone()),
    };
    Ok(merged.to_config()?)
}

pub fn run_top(
    ctx: &CommandContext,
    data: &Path,
    options: &TopOptions,
    filters: &FilterArgs,
) -> Result<()> {
    let config = resolve_config(&ctx.config.top_n, options)?;
    let mut filters = filters.to_spec()?;
    if options.exclude_same_country {
        filters = filters.where_differs(AWARDED_COUNTRY, OPERATION_COUNTRY);
    }
    let decimals = ctx.percent_decimals();

    with_filtered(ctx, data, &filters, |records| match &options.per {
        Some(per) => {
            let result = bucket_by_partition(
                records,
                &KeyField::field(per.as_str()),
                &KeyField::field(options.by.as_str()),
                &config,
            )?;
            ctx.emit(&result, &TableView::from_partitions(&result, decimals))
        }
        None => {
            let result = top_n(records, options.by.as_str(), &config)?;
            let title = format!("Top {} {}", config.k(), options.by);
            ctx.emit(&result, &[TableView::from_buckets(&title, &result, decimals)])
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> TopOptions {
        TopOptions {
            by: "awarded_firm_country_name".into(),
            k: None,
            pinned: None,
            other_label: None,
            per: None,
            exclude_same_country: false,
        }
    }

    #[test]
    fn config_values_apply_when_flags_absent() {
        let settings = TopNSettings {
            k: 5,
            pinned: Some("Uruguay".into()),
            other_label: "Otros".into(),
        };
        let config = resolve_config(&settings, &options()).unwrap();
        assert_eq!(config.k(), 5);
        assert_eq!(config.pinned(), Some("Uruguay"));
        assert_eq!(config.other_label(), "Otros");
    }

    #[test]
    fn flags_override_config() {
        let opts = TopOptions {
            k: Some(3),
            pinned: Some("Chile".into()),
            ..options()
        };
        let config = resolve_config(&TopNSettings::default(), &opts).unwrap();
        assert_eq!(config.k(), 3);
        assert_eq!(config.pinned(), Some("Chile"));
        assert_eq!(config.other_label(), "Other");
    }

    #[test]
    fn zero_k_flag_is_rejected() {
        let opts = TopOptions {
            k: Some(0),
            ..options()
        };
        assert!(resolve_config(&TopNSettings::default(), &opts).is_err());
    }
}
