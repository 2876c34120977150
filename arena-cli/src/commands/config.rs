use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use arena_core::config::get_config_dir;
use arena_core::ArenaConfig;
use colored::Colorize;

pub fn cmd_config(config: &ArenaConfig) -> Result<()> {
    println!("{}", "Effective Configuration".cyan().bold());
    println!("{}", "═".repeat(40).dimmed());
    println!("{}", toml::to_string_pretty(config)?);
    println!("  {:<16} {}", "Public backend:".bold(), config.backend.public_url());
    println!("  {:<16} {}", "Socket URL:".bold(), config.backend.ws_url());
    Ok(())
}

/// Writes the default configuration. Does not read the existing one.
pub fn cmd_config_init(force: bool, path: Option<PathBuf>) -> Result<()> {
    let path = match path {
        Some(path) => path,
        None => get_config_dir()
            .map(|d| d.join("config.toml"))
            .ok_or_else(|| anyhow!("Could not determine the user config directory"))?,
    };

    if path.exists() && !force {
        println!(
            "{} {} already exists (use --force to overwrite)",
            "!".yellow().bold(),
            path.display()
        );
        return Ok(());
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let rendered = toml::to_string_pretty(&ArenaConfig::default())?;
    std::fs::write(&path, rendered)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    println!(
        "{} Wrote default configuration to {}",
        "✓".green().bold(),
        path.display()
    );
    Ok(())
}
