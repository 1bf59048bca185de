use std::path::PathBuf;

use clap::Args;
use moso_core::{ApiKeyPlacement, Environment, StorageType};
use serde::Deserialize;

/// Configuration as stored in TOML files (with optional fields for merging)
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
pub struct RawMosoConfig {
    pub api_key: Option<String>,
    pub environment: Option<Environment>,
    pub storage_type: Option<StorageType>,
    pub key_prefix: Option<String>,
    pub endpoint: Option<String>,
    pub api_key_placement: Option<ApiKeyPlacement>,
}

/// Flags shared by every subcommand
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Config file to read instead of the user config
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// API key sent with relay requests
    #[arg(long, global = true, env = "MOSO_API_KEY")]
    pub api_key: Option<String>,

    /// development or production
    #[arg(long, global = true)]
    pub environment: Option<Environment>,

    /// local-storage, session-storage or indexeddb
    #[arg(long, global = true)]
    pub storage_type: Option<StorageType>,
}

impl GlobalArgs {
    /// Flag values as a config layer.
    pub fn as_raw(&self) -> RawMosoConfig {
        RawMosoConfig {
            api_key: self.api_key.clone(),
            environment: self.environment,
            storage_type: self.storage_type,
            ..RawMosoConfig::default()
        }
    }
}
