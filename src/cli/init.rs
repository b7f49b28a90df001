//! Init command implementation

use std::path::PathBuf;

use anyhow::Result;

use super::context::resolve_config_path;
use edvantage::config::Config;

/// Write a default config with the built-in catalog
pub async fn init_command(config_override: Option<&PathBuf>, force: bool) -> Result<()> {
    let path = resolve_config_path(config_override);

    if Config::init_at(&path, force)? {
        println!("Created {}", path.display());
    } else {
        println!(
            "Config already exists at {} (use --force to overwrite)",
            path.display()
        );
    }
    Ok(())
}
