//! Init and Config commands.

use anyhow::anyhow;
use std::path::Path;

use crate::config::Settings;

/// Run init command - create configuration file and data directory.
pub fn run_init(config_path: Option<&Path>, force: bool) -> anyhow::Result<()> {
    let path = Settings::init_config_file(config_path, force).map_err(|e| anyhow!("{e}"))?;
    println!("Created configuration file at: {}", path.display());

    let settings = Settings::load_from(&path)?;
    std::fs::create_dir_all(&settings.data_dir)?;
    println!("Data directory: {}", settings.data_dir.display());
    println!("Edit the configuration file to customize chunking and embedding settings.");
    Ok(())
}

/// Run config command - display current configuration.
pub fn run_config(config: &Settings) -> anyhow::Result<()> {
    println!("Current Configuration:");
    println!("{}", "=".repeat(50));
    println!("{}", toml::to_string_pretty(config)?);
    Ok(())
}
