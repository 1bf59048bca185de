//! Error types for moso-core

use thiserror::Error;

/// Result type alias using the crate's top-level error.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for moso-core
///
/// Only [`ConfigError`] ever reaches a caller of the [`Analytics`](crate::Analytics)
/// operations. Store and transport failures are recovered inside them.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
}

/// Integration mistakes, raised at construction or invocation
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Storage type not supported: {0}")]
    UnsupportedStorageType(String),

    #[error("Environment not supported: {0}")]
    UnsupportedEnvironment(String),

    #[error("Record event not recognized: {0}")]
    UnrecognizedEventType(String),

    #[error("API key is missing")]
    MissingApiKey,

    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from a storage medium
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Storage IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage is corrupt: {0}")]
    Corrupt(String),
}

/// Errors from the relay transport
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Request failed: {0}")]
    Request(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_unsupported_storage_displays_type() {
        let error = ConfigError::UnsupportedStorageType("cookies".to_string());
        assert_eq!(error.to_string(), "Storage type not supported: cookies");
    }

    #[test]
    fn config_error_unrecognized_event_displays_type() {
        let error = ConfigError::UnrecognizedEventType("signup".to_string());
        assert!(error.to_string().contains("signup"));
    }

    #[test]
    fn store_error_converts_from_io() {
        let io_error = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let error: StoreError = io_error.into();
        assert!(matches!(error, StoreError::Io(_)));
    }

    #[test]
    fn error_converts_from_config_error() {
        let error: Error = ConfigError::MissingApiKey.into();
        assert!(matches!(error, Error::Config(ConfigError::MissingApiKey)));
        assert!(error.to_string().contains("Configuration error"));
    }

    #[test]
    fn error_converts_from_transport_error() {
        let error: Error = TransportError::Request("connection reset".to_string()).into();
        assert!(matches!(error, Error::Transport(_)));
        assert!(error.to_string().contains("connection reset"));
    }

    #[test]
    fn config_error_converts_from_toml() {
        let toml_error = toml::from_str::<toml::Value>("api_key = ").unwrap_err();
        let error: ConfigError = toml_error.into();
        assert!(matches!(error, ConfigError::Parse(_)));
    }
}
