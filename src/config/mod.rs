//! Configuration loaded from `.procsum.toml`.
//!
//! The file is optional. Missing or invalid files fall back to defaults with
//! a warning; an explicit `--config` path fails loudly instead.

pub mod core;
pub mod loader;

pub use self::core::{FormatSettings, ProcsumConfig, TopNSettings};
pub use loader::{
    default_config_toml, directory_ancestors, discover_config, load_config, load_config_from,
    parse_and_validate_config, CONFIG_FILE_NAME,
};
