//! XDG Base Directory paths for moso.
//!
//! The CLI keeps its persistent storage media (the file-backed local storage
//! area and the indexed database) under the data directory, and reads its
//! user config from the config directory.

use std::path::PathBuf;

/// Get the moso config directory.
///
/// Returns `$XDG_CONFIG_HOME/moso` if set, otherwise `~/.config/moso`.
///
/// # Examples
///
/// ```
/// use moso_paths::config_dir;
///
/// let config_file = config_dir().join("config.toml");
/// ```
pub fn config_dir() -> PathBuf {
    xdg_dir("XDG_CONFIG_HOME", ".config")
}

/// Get the moso data directory.
///
/// Returns `$XDG_DATA_HOME/moso` if set, otherwise `~/.local/share/moso`.
/// Storage media that must outlive a single process live here.
pub fn data_dir() -> PathBuf {
    xdg_dir("XDG_DATA_HOME", ".local/share")
}

/// Path of the file backing the persistent local storage area.
pub fn local_storage_file() -> PathBuf {
    data_dir().join("local_storage.json")
}

/// Directory holding indexed databases.
pub fn indexed_db_dir() -> PathBuf {
    data_dir().join("indexeddb")
}

fn xdg_dir(var: &str, home_relative: &str) -> PathBuf {
    if let Ok(base) = std::env::var(var) {
        PathBuf::from(base).join("moso")
    } else if let Some(home) = dirs::home_dir() {
        home.join(home_relative).join("moso")
    } else {
        PathBuf::from(home_relative).join("moso")
    }
}
