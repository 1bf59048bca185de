//! Key/value stores for persisted attribution state.
//!
//! Every store is bound to one logical key and exposes the same
//! [`KeyValueStore`] contract regardless of backend. The backend is chosen by
//! [`StorageType`] in exactly one place, [`StorageMedia::open`].
//!
//! Stores are short-lived. Callers open one per operation through a
//! [`StoreOpener`], so an in-memory fallback only covers the operation that
//! wrote it and never outlives a removal made through another store.
//!
//! | backend | medium | in-memory fallback |
//! |---|---|---|
//! | `local-storage` | persistent [`StorageArea`] | yes |
//! | `session-storage` | tab-scoped [`StorageArea`] | yes |
//! | `indexeddb` | [`IndexedDb`] directory | no |

mod area;
mod cached;
mod indexed;

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;

pub use area::{FileArea, MemoryArea, StorageArea};
pub use cached::CachedAreaStore;
pub use indexed::{DATABASE_NAME, DATABASE_VERSION, IndexedDb, IndexedStore, TRACKING_STORE};

use crate::config::StorageType;
use crate::error::StoreError;

/// Single-key async store.
///
/// Each operation is atomic for its key: `set` fully replaces the prior
/// value, and after `remove` a `get` yields `None`.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// The logical key this store is bound to.
    fn key(&self) -> &str;

    async fn get(&self) -> Result<Option<String>, StoreError>;

    async fn set(&self, value: &str) -> Result<(), StoreError>;

    async fn remove(&self) -> Result<(), StoreError>;
}

/// The storage media available to a page.
#[derive(Clone)]
pub struct StorageMedia {
    /// Persistent web-storage area
    pub local: Arc<dyn StorageArea>,
    /// Tab-scoped web-storage area
    pub session: Arc<dyn StorageArea>,
    /// Directory holding indexed databases
    pub indexed_dir: PathBuf,
}

impl StorageMedia {
    pub fn new(
        local: Arc<dyn StorageArea>,
        session: Arc<dyn StorageArea>,
        indexed_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            local,
            session,
            indexed_dir: indexed_dir.into(),
        }
    }

    /// Fresh in-memory web-storage areas, with indexed databases under `indexed_dir`.
    pub fn in_memory(indexed_dir: impl Into<PathBuf>) -> Self {
        Self::new(
            Arc::new(MemoryArea::new()),
            Arc::new(MemoryArea::new()),
            indexed_dir,
        )
    }

    /// Open a store for `key` on the selected backend.
    ///
    /// Every call builds a new store, and with it a new in-memory cache.
    pub fn open(&self, storage_type: StorageType, key: &str) -> Box<dyn KeyValueStore> {
        match storage_type {
            StorageType::LocalStorage => Box::new(CachedAreaStore::new(
                Arc::clone(&self.local),
                key,
                "local storage",
            )),
            StorageType::SessionStorage => Box::new(CachedAreaStore::new(
                Arc::clone(&self.session),
                key,
                "session storage",
            )),
            StorageType::IndexedDb => Box::new(IndexedStore::new(self.indexed_dir.clone(), key)),
        }
    }

    /// Fix the backend, yielding an opener for it.
    pub fn select(self, storage_type: StorageType) -> SelectedMedia {
        SelectedMedia {
            media: self,
            storage_type,
        }
    }
}

/// Opens a fresh store for a logical key.
pub trait StoreOpener: Send + Sync {
    fn open(&self, key: &str) -> Box<dyn KeyValueStore>;
}

/// [`StorageMedia`] with one backend selected.
#[derive(Clone)]
pub struct SelectedMedia {
    media: StorageMedia,
    storage_type: StorageType,
}

impl SelectedMedia {
    pub fn storage_type(&self) -> StorageType {
        self.storage_type
    }
}

impl StoreOpener for SelectedMedia {
    fn open(&self, key: &str) -> Box<dyn KeyValueStore> {
        self.media.open(self.storage_type, key)
    }
}

/// Logical key names derived from a prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreKeys {
    pub referrer: String,
    pub send_timestamp: String,
    pub sub_id: String,
    pub campaign_id: String,
}

impl StoreKeys {
    pub fn with_prefix(prefix: &str) -> Self {
        Self {
            referrer: format!("{}_REFERRER", prefix),
            send_timestamp: format!("{}_TIMESTAMP", prefix),
            sub_id: format!("{}_SUB_ID", prefix),
            campaign_id: format!("{}_CAMPAIGN_ID", prefix),
        }
    }
}
