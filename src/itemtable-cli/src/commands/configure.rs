//! Configuration command handlers
//!
//! Handles the `configure` subcommand for setting up itemtable CLI defaults.

use crate::config::Config;
use anyhow::Result;
use std::path::PathBuf;

/// Handle the configure command
///
/// # Arguments
/// * `default_db` - Optional database path to store as the default
/// * `show` - If true, show current configuration
pub fn handle(default_db: Option<PathBuf>, show: bool) -> Result<()> {
    let mut config = Config::load()?;

    if show {
        show_config(&config)?;
        return Ok(());
    }

    if let Some(path) = default_db {
        set_database(&mut config, path)?;
    } else {
        show_usage();
    }

    Ok(())
}

/// Display current configuration
fn show_config(config: &Config) -> Result<()> {
    if let Ok(path) = Config::config_path() {
        println!("Config file: {}", path.display());
    }
    println!();
    print!("{}", config.to_toml()?);
    Ok(())
}

fn set_database(config: &mut Config, path: PathBuf) -> Result<()> {
    config.database = Some(path.clone());
    config.save()?;

    println!("Default database configured: {}", path.display());

    if let Ok(path) = Config::config_path() {
        println!("Config saved to: {}", path.display());
    }

    Ok(())
}

/// Show usage help for the configure command
fn show_usage() {
    println!("Usage: itemtable configure --default-db PATH");
    println!("   or: itemtable configure --show");
    println!();
    println!("Normalizer fallbacks (accessory_fallback, spell_icon_use_type,");
    println!("id_overrides) are set in the [normalizer] table of the config file.");
}
