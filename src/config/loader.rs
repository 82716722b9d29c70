use std::fs;
use std::path::{Path, PathBuf};

use super::core::ProcsumConfig;
use crate::errors::{Error, Result};

pub const CONFIG_FILE_NAME: &str = ".procsum.toml";

/// Pure function to parse and validate config from TOML string
pub fn parse_and_validate_config(contents: &str) -> Result<ProcsumConfig> {
    let config = toml::from_str::<ProcsumConfig>(contents)?;
    // Surface a bad [top_n] section now rather than on first use
    config.top_n.to_config()?;
    Ok(config)
}

/// Load an explicitly named config file; errors are not swallowed.
pub fn load_config_from(path: &Path) -> Result<ProcsumConfig> {
    let contents = fs::read_to_string(path)?;
    parse_and_validate_config(&contents)
        .map_err(|e| e.with_context(format!("config {}", path.display())))
}

/// Try loading config from a specific path, warning on anything but absence
pub(crate) fn try_load_config_from_path(config_path: &Path) -> Option<ProcsumConfig> {
    let contents = match fs::read_to_string(config_path) {
        Ok(contents) => contents,
        Err(e) => {
            handle_read_error(config_path, &e);
            return None;
        }
    };

    match parse_and_validate_config(&contents) {
        Ok(config) => {
            tracing::debug!("Loaded config from {}", config_path.display());
            Some(config)
        }
        Err(e) => {
            tracing::warn!("Ignoring {}: {}. Using defaults.", config_path.display(), e);
            None
        }
    }
}

/// Handle file read errors with appropriate logging
fn handle_read_error(config_path: &Path, error: &std::io::Error) {
    // Only log actual errors, not "file not found"
    if error.kind() != std::io::ErrorKind::NotFound {
        tracing::warn!(
            "Failed to read config file {}: {}",
            config_path.display(),
            error
        );
    }
}

/// Pure function to generate directory ancestors up to a depth limit
pub fn directory_ancestors(start: PathBuf, max_depth: usize) -> impl Iterator<Item = PathBuf> {
    std::iter::successors(Some(start), |dir| {
        let mut parent = dir.clone();
        if parent.pop() {
            Some(parent)
        } else {
            None
        }
    })
    .take(max_depth)
}

/// Search `start` and its ancestors for a config file.
pub fn discover_config(start: PathBuf) -> ProcsumConfig {
    const MAX_TRAVERSAL_DEPTH: usize = 10;

    directory_ancestors(start, MAX_TRAVERSAL_DEPTH)
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .find_map(|path| try_load_config_from_path(&path))
        .unwrap_or_else(|| {
            tracing::debug!(
                "No config found after checking {} directories. Using default config.",
                MAX_TRAVERSAL_DEPTH
            );
            ProcsumConfig::default()
        })
}

pub fn load_config() -> ProcsumConfig {
    match std::env::current_dir() {
        Ok(dir) => discover_config(dir),
        Err(e) => {
            tracing::warn!(
                "Failed to get current directory: {}. Using default config.",
                e
            );
            ProcsumConfig::default()
        }
    }
}

/// Default config file contents written by `procsum init`.
pub fn default_config_toml() -> Result<String> {
    let body = toml::to_string_pretty(&ProcsumConfig::default())
        .map_err(|e| Error::invalid_config(e.to_string()))?;
    Ok(format!(
        "# procsum configuration\n# Set [top_n] pinned = \"Uruguay\" to always keep a category.\n\n{body}"
    ))
}
