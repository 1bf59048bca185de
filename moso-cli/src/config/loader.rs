use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use moso_core::{ConfigError, SdkOptions};

use super::types::{GlobalArgs, RawMosoConfig};

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load options: config file first, then command-line flags
    pub fn load(global: &GlobalArgs) -> Result<SdkOptions> {
        let path = global
            .config
            .clone()
            .unwrap_or_else(Self::user_config_path);

        let file = Self::read_file(&path)?;
        let merged = Self::merge_raw(file, global.as_raw());
        Ok(Self::finalize(merged)?)
    }

    /// Get user config path
    pub fn user_config_path() -> PathBuf {
        moso_paths::config_dir().join("config.toml")
    }

    fn read_file(path: &Path) -> Result<RawMosoConfig> {
        if !path.exists() {
            return Ok(RawMosoConfig::default());
        }
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let raw = toml::from_str(&contents)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        Ok(raw)
    }

    /// Merge two raw configs (overlay values override base only if explicitly set)
    fn merge_raw(base: RawMosoConfig, overlay: RawMosoConfig) -> RawMosoConfig {
        RawMosoConfig {
            api_key: overlay.api_key.or(base.api_key),
            environment: overlay.environment.or(base.environment),
            storage_type: overlay.storage_type.or(base.storage_type),
            key_prefix: overlay.key_prefix.or(base.key_prefix),
            endpoint: overlay.endpoint.or(base.endpoint),
            api_key_placement: overlay.api_key_placement.or(base.api_key_placement),
        }
    }

    /// Convert raw config to final options with defaults applied
    fn finalize(raw: RawMosoConfig) -> Result<SdkOptions, ConfigError> {
        let api_key = raw.api_key.ok_or(ConfigError::MissingApiKey)?;
        let mut options = SdkOptions::new(api_key);

        if let Some(environment) = raw.environment {
            options = options.with_environment(environment);
        }
        if let Some(storage_type) = raw.storage_type {
            options = options.with_storage_type(storage_type);
        }
        if let Some(prefix) = raw.key_prefix {
            options = options.with_key_prefix(prefix);
        }
        if let Some(endpoint) = raw.endpoint {
            options = options.with_endpoint(endpoint);
        }
        if let Some(placement) = raw.api_key_placement {
            options = options.with_api_key_placement(placement);
        }

        options.validate()?;
        Ok(options)
    }
}
