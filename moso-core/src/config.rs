//! SDK options supplied once at initialization.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Remote endpoint that accepts relayed attribution events.
pub const DEFAULT_ENDPOINT: &str = "https://marketer.moso.xyz/api/v1/brand-links/click";

/// Prefix for every persisted key.
pub const DEFAULT_KEY_PREFIX: &str = "MOSO_AFFILIATE";

/// Deployment environment. Gates diagnostic output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    pub fn as_str(self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
        }
    }

    /// Whether flow diagnostics should be emitted.
    pub fn is_development(self) -> bool {
        self == Environment::Development
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "development" => Ok(Environment::Development),
            "production" => Ok(Environment::Production),
            other => Err(ConfigError::UnsupportedEnvironment(other.to_string())),
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Environment> for String {
    fn from(value: Environment) -> Self {
        value.as_str().to_string()
    }
}

/// Which storage backend holds the persisted attribution state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum StorageType {
    /// Persistent web-storage area with an in-memory fallback.
    #[default]
    LocalStorage,
    /// Tab-scoped web-storage area with an in-memory fallback.
    SessionStorage,
    /// Indexed on-disk database. Its answers are authoritative.
    IndexedDb,
}

impl StorageType {
    pub fn as_str(self) -> &'static str {
        match self {
            StorageType::LocalStorage => "local-storage",
            StorageType::SessionStorage => "session-storage",
            StorageType::IndexedDb => "indexeddb",
        }
    }
}

impl fmt::Display for StorageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StorageType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "local-storage" => Ok(StorageType::LocalStorage),
            "session-storage" => Ok(StorageType::SessionStorage),
            "indexeddb" => Ok(StorageType::IndexedDb),
            other => Err(ConfigError::UnsupportedStorageType(other.to_string())),
        }
    }
}

impl TryFrom<String> for StorageType {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<StorageType> for String {
    fn from(value: StorageType) -> Self {
        value.as_str().to_string()
    }
}

/// Where the API key travels on relay requests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiKeyPlacement {
    /// `?api_key=...` on the endpoint URL
    #[default]
    Query,
    /// `x-api-key` request header
    Header,
}

/// Options for an [`Analytics`](crate::Analytics) handle.
///
/// Immutable once the handle is initialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SdkOptions {
    pub api_key: String,

    #[serde(default)]
    pub environment: Environment,

    #[serde(default)]
    pub storage_type: StorageType,

    /// Prefix for persisted keys. Handles with different prefixes never share state.
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,

    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    #[serde(default)]
    pub api_key_placement: ApiKeyPlacement,
}

fn default_key_prefix() -> String {
    DEFAULT_KEY_PREFIX.to_string()
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

impl SdkOptions {
    /// Options with the given API key and every other field defaulted.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            environment: Environment::default(),
            storage_type: StorageType::default(),
            key_prefix: default_key_prefix(),
            endpoint: default_endpoint(),
            api_key_placement: ApiKeyPlacement::default(),
        }
    }

    #[must_use]
    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    #[must_use]
    pub fn with_storage_type(mut self, storage_type: StorageType) -> Self {
        self.storage_type = storage_type;
        self
    }

    #[must_use]
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    #[must_use]
    pub fn with_api_key_placement(mut self, placement: ApiKeyPlacement) -> Self {
        self.api_key_placement = placement;
        self
    }

    /// Parse options from TOML text.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let options: SdkOptions = toml::from_str(contents)?;
        options.validate()?;
        Ok(options)
    }

    /// Read options from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Check the options an [`Analytics`](crate::Analytics) handle cannot run without.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_key.trim().is_empty() {
            return Err(ConfigError::MissingApiKey);
        }
        url::Url::parse(&self.endpoint)
            .map_err(|e| ConfigError::InvalidEndpoint(format!("{}: {}", self.endpoint, e)))?;
        Ok(())
    }
}
