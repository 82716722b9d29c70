use anyhow::{bail, Context, Result};
use std::fs;
use std::path::Path;

use crate::config::{default_config_toml, CONFIG_FILE_NAME};

pub fn init_config(force: bool) -> Result<()> {
    write_default_config(Path::new(CONFIG_FILE_NAME), force)?;
    println!("Created {CONFIG_FILE_NAME} configuration file");
    Ok(())
}

pub fn write_default_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!("Configuration file already exists. Use --force to overwrite.");
    }
    let contents = default_config_toml()?;
    fs::write(path, contents).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}
