use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::errors::{Error, Result};
use crate::filter::FilterSpec;
use crate::output::OutputFormat;
use crate::store::Value;

#[derive(Parser, Debug)]
#[command(name = "procsum")]
#[command(about = "Grouped counts, Top-N breakdowns and pivots over procurement contracts", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format
    #[arg(short, long, value_enum, default_value = "terminal", global = true)]
    pub format: FormatArg,

    /// Config file (defaults to the nearest .procsum.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (can be repeated: -v, -vv)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    pub verbosity: u8,

    /// Plain output without colors
    #[arg(long, global = true)]
    pub plain: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    Terminal,
    Json,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Terminal => Self::Terminal,
            FormatArg::Json => Self::Json,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MetricArg {
    Count,
    Sum,
    Mean,
    Min,
    Max,
}

/// Record filters shared by every data command.
#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Keep records where FIELD equals VALUE
    #[arg(long = "where", value_name = "FIELD=VALUE")]
    pub equals: Vec<String>,

    /// Keep records where FIELD is one of the listed values
    #[arg(long = "in", value_name = "FIELD=A,B,...")]
    pub in_set: Vec<String>,

    /// Keep records where FIELD lies within LO..HI (inclusive)
    #[arg(long = "range", value_name = "FIELD=LO..HI")]
    pub ranges: Vec<String>,
}

fn split_assignment<'a>(flag: &str, raw: &'a str) -> Result<(&'a str, &'a str)> {
    raw.split_once('=')
        .filter(|(field, _)| !field.trim().is_empty())
        .map(|(field, value)| (field.trim(), value.trim()))
        .ok_or_else(|| Error::invalid_config(format!("--{flag} expects FIELD=..., got '{raw}'")))
}

impl FilterArgs {
    pub fn to_spec(&self) -> Result<FilterSpec> {
        let mut spec = FilterSpec::new();
        for raw in &self.equals {
            let (field, value) = split_assignment("where", raw)?;
            spec = spec.where_equals(field, value);
        }
        for raw in &self.in_set {
            let (field, values) = split_assignment("in", raw)?;
            let values = values
                .split(',')
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string);
            spec = spec.where_in(field, values.collect::<Vec<_>>());
        }
        for raw in &self.ranges {
            let (field, bounds) = split_assignment("range", raw)?;
            let (lo, hi) = bounds.split_once("..").ok_or_else(|| {
                Error::invalid_config(format!("--range expects FIELD=LO..HI, got '{raw}'"))
            })?;
            spec = spec.where_range(field, Value::parse_literal(lo), Value::parse_literal(hi))?;
        }
        Ok(spec)
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Grouped statistic over one or two fields
    Summary {
        /// Dataset file (.json array or .jsonl)
        data: PathBuf,

        /// Grouping field(s), comma-separated (at most two)
        #[arg(long, value_delimiter = ',', required = true)]
        by: Vec<String>,

        /// Statistic to compute per group
        #[arg(long, value_enum, default_value = "count")]
        metric: MetricArg,

        /// Field the metric reads (counts non-null values when used with count)
        #[arg(long)]
        field: Option<String>,

        /// Measure the duration in days between two date fields instead of --field
        #[arg(long, value_delimiter = ',', num_args = 2, value_names = ["START", "END"], conflicts_with = "field")]
        days_between: Option<Vec<String>>,

        /// Render the statistic as a currency amount
        #[arg(long)]
        currency: bool,

        #[command(flatten)]
        filters: FilterArgs,
    },

    /// Top-N categories with a pinned category and an "Other" bucket
    Top {
        data: PathBuf,

        /// Category field to rank
        #[arg(long)]
        by: String,

        /// Number of entries to keep (overrides config)
        #[arg(long)]
        k: Option<usize>,

        /// Category always kept regardless of rank (overrides config)
        #[arg(long)]
        pinned: Option<String>,

        /// Label of the merged remainder (overrides config)
        #[arg(long)]
        other_label: Option<String>,

        /// Produce one breakdown per value of this field
        #[arg(long)]
        per: Option<String>,

        /// Drop contracts awarded to a firm from the operation's own country
        #[arg(long)]
        exclude_same_country: bool,

        #[command(flatten)]
        filters: FilterArgs,
    },

    /// Rows x columns table of paired counts split by a condition
    Pivot {
        data: PathBuf,

        #[arg(long)]
        rows: String,

        #[arg(long)]
        cols: String,

        /// Field tested by the split
        #[arg(long)]
        split_field: String,

        /// Records whose split field equals this value count on the first side
        #[arg(long, conflicts_with = "split_match")]
        split_value: Option<String>,

        /// Records whose split field equals this other field count on the first side
        #[arg(long)]
        split_match: Option<String>,

        /// Names of the two sides, e.g. home,other
        #[arg(long, value_delimiter = ',', num_args = 2)]
        labels: Option<Vec<String>>,

        /// Show every row/column combination, filling gaps with 0 vs 0
        #[arg(long)]
        dense: bool,

        #[command(flatten)]
        filters: FilterArgs,
    },

    /// Standard multi-section summary of the filtered contracts
    Report {
        data: PathBuf,

        #[command(flatten)]
        filters: FilterArgs,
    },

    /// Write a default .procsum.toml in the current directory
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}
