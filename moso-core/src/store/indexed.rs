//! Indexed on-disk database.
//!
//! Layout under the media directory:
//!
//! ```text
//! MOSO_ANALYTICS/
//!   version          schema version, written on first open
//!   tracking/        the one object store
//!     <key>          raw value text
//! ```
//!
//! Every record lives in its own file and is replaced atomically, so writes
//! to different keys never interfere.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::debug;

use super::KeyValueStore;
use super::area::write_atomic;
use crate::error::StoreError;

/// Database name.
pub const DATABASE_NAME: &str = "MOSO_ANALYTICS";

/// Schema version this crate creates.
pub const DATABASE_VERSION: u32 = 1;

/// Object store holding attribution state.
pub const TRACKING_STORE: &str = "tracking";

const VERSION_FILE: &str = "version";

/// An opened database directory.
#[derive(Debug, Clone)]
pub struct IndexedDb {
    root: PathBuf,
}

impl IndexedDb {
    /// Open (creating on first use) a database under `base_dir`.
    ///
    /// Fails when the stored schema is newer than `version`.
    pub async fn open(base_dir: &Path, name: &str, version: u32) -> Result<Self, StoreError> {
        let root = base_dir.join(name);
        let version_path = root.join(VERSION_FILE);

        let stored = match fs::read_to_string(&version_path).await {
            Ok(text) => Some(text.trim().parse::<u32>().map_err(|_| {
                StoreError::Corrupt(format!("unreadable version file: {}", version_path.display()))
            })?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => return Err(e.into()),
        };

        let db = Self { root };
        match stored {
            Some(stored) if stored > version => {
                return Err(StoreError::Corrupt(format!(
                    "database {} is at version {}, cannot open as {}",
                    name, stored, version
                )));
            }
            Some(stored) if stored == version => {}
            _ => {
                db.upgrade().await?;
                write_atomic(&version_path, version.to_string().as_bytes()).await?;
            }
        }
        Ok(db)
    }

    async fn upgrade(&self) -> Result<(), StoreError> {
        debug!(path = %self.root.display(), "Creating object store {}", TRACKING_STORE);
        fs::create_dir_all(self.root.join(TRACKING_STORE)).await?;
        Ok(())
    }

    fn record_path(&self, store: &str, key: &str) -> PathBuf {
        self.root.join(store).join(encode_key(key))
    }

    pub async fn get(&self, store: &str, key: &str) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(self.record_path(store, key)).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn put(&self, store: &str, key: &str, value: &str) -> Result<(), StoreError> {
        write_atomic(&self.record_path(store, key), value.as_bytes()).await
    }

    pub async fn delete(&self, store: &str, key: &str) -> Result<(), StoreError> {
        match fs::remove_file(self.record_path(store, key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Map a key onto a safe file name.
///
/// Percent-encodes the key, and its dots too so `.` and `..` never name a
/// directory entry.
fn encode_key(key: &str) -> String {
    urlencoding::encode(key).replace('.', "%2E")
}

/// Store bound to one key of the tracking object store.
///
/// The database is reopened for each operation. Absence on disk is final:
/// there is no in-memory fallback.
pub struct IndexedStore {
    base_dir: PathBuf,
    key: String,
}

impl IndexedStore {
    pub fn new(base_dir: impl Into<PathBuf>, key: impl Into<String>) -> Self {
        let key = key.into();
        debug!(key = %key, "Using IndexedDB");
        Self {
            base_dir: base_dir.into(),
            key,
        }
    }

    async fn resolve_db(&self) -> Result<IndexedDb, StoreError> {
        IndexedDb::open(&self.base_dir, DATABASE_NAME, DATABASE_VERSION).await
    }
}

#[async_trait]
impl KeyValueStore for IndexedStore {
    fn key(&self) -> &str {
        &self.key
    }

    async fn get(&self) -> Result<Option<String>, StoreError> {
        self.resolve_db().await?.get(TRACKING_STORE, &self.key).await
    }

    async fn set(&self, value: &str) -> Result<(), StoreError> {
        self.resolve_db()
            .await?
            .put(TRACKING_STORE, &self.key, value)
            .await
    }

    async fn remove(&self) -> Result<(), StoreError> {
        self.resolve_db()
            .await?
            .delete(TRACKING_STORE, &self.key)
            .await
    }
}
