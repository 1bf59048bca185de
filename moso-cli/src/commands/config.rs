use anyhow::Result;
use clap::{Args, Subcommand};

use crate::config::{ConfigLoader, GlobalArgs};

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show current configuration (merged)
    Show,
    /// Show configuration and storage paths
    Path,
}

pub fn run(global: &GlobalArgs, args: ConfigArgs) -> Result<()> {
    match args.command {
        ConfigCommands::Show => show_config(global),
        ConfigCommands::Path => show_paths(global),
    }
}

fn show_config(global: &GlobalArgs) -> Result<()> {
    let mut options = ConfigLoader::load(global)?;
    options.api_key = mask(&options.api_key);
    println!("{}", toml::to_string_pretty(&options)?);
    Ok(())
}

fn show_paths(global: &GlobalArgs) -> Result<()> {
    let config = global
        .config
        .clone()
        .unwrap_or_else(ConfigLoader::user_config_path);
    println!("Config:        {}", config.display());
    println!("Local storage: {}", moso_paths::local_storage_file().display());
    println!("IndexedDB:     {}", moso_paths::indexed_db_dir().display());
    Ok(())
}

fn mask(api_key: &str) -> String {
    let visible: String = api_key.chars().take(4).collect();
    format!("{}…", visible)
}
