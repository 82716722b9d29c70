//! Handlers behind each `procsum` subcommand.
//!
//! Each handler loads the dataset, applies the shared filters, computes one
//! result and hands it to [`CommandContext::emit`], which picks the renderer.

pub mod init;
pub mod pivot;
pub mod report;
pub mod summary;
pub mod top;

use anyhow::Result;
use serde::Serialize;
use std::io::{self, Write};
use std::path::Path;

use crate::cli::{setup, Cli, Commands};
use crate::config::ProcsumConfig;
use crate::filter::{self, FilterSpec};
use crate::formatting::{ColoredFormatter, FormattingConfig};
use crate::output::json::write_json;
use crate::output::terminal::write_tables;
use crate::output::{OutputFormat, TableView};
use crate::store::{Dataset, RecordSet};

/// Settings every handler shares, resolved once from flags and config.
pub struct CommandContext {
    pub config: ProcsumConfig,
    pub output: OutputFormat,
    pub formatting: FormattingConfig,
}

impl CommandContext {
    pub fn new(config: ProcsumConfig, output: OutputFormat, plain: bool) -> Self {
        let formatting = setup::create_formatting_config(plain, config.format.percent_decimals);
        Self {
            config,
            output,
            formatting,
        }
    }

    pub fn percent_decimals(&self) -> usize {
        self.formatting.percent_decimals
    }

    /// Write `value` as JSON or `views` as terminal tables to stdout.
    pub fn emit<T: Serialize + ?Sized>(&self, value: &T, views: &[TableView]) -> Result<()> {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        self.emit_to(&mut out, value, views)
    }

    pub fn emit_to<T: Serialize + ?Sized>(
        &self,
        writer: &mut dyn Write,
        value: &T,
        views: &[TableView],
    ) -> Result<()> {
        match self.output {
            OutputFormat::Json => write_json(writer, value)?,
            OutputFormat::Terminal => {
                let formatter = ColoredFormatter::new(self.formatting);
                write_tables(writer, views, &formatter)?;
            }
        }
        Ok(())
    }
}

/// Open `data`, filter it and run `f` over the surviving records.
pub fn with_filtered<T>(
    ctx: &CommandContext,
    data: &Path,
    spec: &FilterSpec,
    f: impl FnOnce(&RecordSet<'_>) -> Result<T>,
) -> Result<T> {
    let dataset = Dataset::open(data, &ctx.config.dataset)?;
    let store = dataset.snapshot();
    let all = store.view();

    for field in spec.skipped_fields(all.schema()) {
        tracing::warn!("Filter on '{}' ignored: field not in dataset", field);
    }

    let filtered = filter::apply(&all, spec);
    tracing::info!(
        total = all.len(),
        kept = filtered.len(),
        "Applied {} filter clause(s)",
        spec.clauses().len()
    );

    let result = f(&filtered);
    dataset.close();
    result
}

/// Dispatch a parsed command line.
pub fn run(cli: Cli) -> Result<()> {
    let Cli {
        command,
        format,
        config,
        plain,
        ..
    } = cli;

    // Config is only read by commands that touch data
    let context = || -> Result<CommandContext> {
        let config = setup::load_run_config(config.as_deref())?;
        Ok(CommandContext::new(config, format.into(), plain))
    };

    match command {
        Commands::Init { force } => init::init_config(force),
        Commands::Summary {
            data,
            by,
            metric,
            field,
            days_between,
            currency,
            filters,
        } => {
            let options = summary::SummaryOptions {
                by,
                metric,
                field,
                days_between,
                currency,
            };
            summary::run_summary(&context()?, &data, &options, &filters)
        }
        Commands::Top {
            data,
            by,
            k,
            pinned,
            other_label,
            per,
            exclude_same_country,
            filters,
        } => {
            let options = top::TopOptions {
                by,
                k,
                pinned,
                other_label,
                per,
                exclude_same_country,
            };
            top::run_top(&context()?, &data, &options, &filters)
        }
        Commands::Pivot {
            data,
            rows,
            cols,
            split_field,
            split_value,
            split_match,
            labels,
            dense,
            filters,
        } => {
            let options = pivot::PivotOptions {
                rows,
                cols,
                split_field,
                split_value,
                split_match,
                labels,
                dense,
            };
            pivot::run_pivot(&context()?, &data, &options, &filters)
        }
        Commands::Report { data, filters } => report::run_report(&context()?, &data, &filters),
    }
}
