//! Runtime setup for the binary: logging, config and terminal styling.

use std::path::Path;

use crate::config::{load_config, load_config_from, ProcsumConfig};
use crate::errors::Result;
use crate::formatting::{ColorMode, FormattingConfig};
use tracing_subscriber::EnvFilter;

/// Default log level for a `-v` count. `RUST_LOG` wins when set.
pub fn log_level(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Install the global tracing subscriber. Logs go to stderr so stdout stays
/// parseable when `--format json` is used.
pub fn init_logging(verbosity: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("procsum={}", log_level(verbosity))));

    // A subscriber may already be installed by an embedding test harness
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// An explicit `--config` must load; otherwise discovery falls back to defaults.
pub fn load_run_config(explicit: Option<&Path>) -> Result<ProcsumConfig> {
    match explicit {
        Some(path) => load_config_from(path),
        None => Ok(load_config()),
    }
}

pub fn create_formatting_config(plain: bool, percent_decimals: usize) -> FormattingConfig {
    if plain {
        FormattingConfig::new(ColorMode::Never, percent_decimals)
    } else {
        FormattingConfig {
            percent_decimals,
            ..FormattingConfig::from_env()
        }
    }
}
