//! Config loading and the `config` command

use std::path::Path;

use anyhow::{Context, Result};
use siaga_core::config::default_config_path;
use siaga_core::AnalysisConfig;

/// Explicit path, else the user config, else built-in thresholds
pub fn load_config(path: Option<&Path>) -> Result<AnalysisConfig> {
    match path {
        Some(path) => AnalysisConfig::with_config_path(path)
            .with_context(|| format!("Failed to load config: {}", path.display())),
        None => AnalysisConfig::load().context("Failed to load analysis config"),
    }
}

pub fn cmd_config(path: Option<&Path>, show_path: bool) -> Result<()> {
    if show_path {
        match default_config_path() {
            Some(p) => {
                let state = if p.exists() { "exists" } else { "not created" };
                println!("{} ({})", p.display(), state);
            }
            None => println!("No user data directory on this platform"),
        }
        return Ok(());
    }

    let config = load_config(path)?;
    print!("{}", config.to_toml()?);
    Ok(())
}
