//! Command-line definition for the `procsum` binary.

pub mod args;
pub mod setup;

pub use args::{Cli, Commands, FilterArgs, FormatArg, MetricArg};
