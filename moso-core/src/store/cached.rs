//! Web-storage backed store with an in-memory fallback.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tracing::{debug, warn};

use super::KeyValueStore;
use super::area::StorageArea;
use crate::error::StoreError;

/// Store bound to one key of a [`StorageArea`].
///
/// Remembers the last value it wrote. When the area later reports the key
/// absent, or refuses to answer, the remembered value is returned instead,
/// so a value this store wrote is not lost to a medium that got cleared or
/// disabled while the store is alive. Writes and removals the area refuses
/// are logged and still applied to the remembered value.
pub struct CachedAreaStore {
    area: Arc<dyn StorageArea>,
    key: String,
    label: &'static str,
    cached: Mutex<Option<String>>,
}

impl CachedAreaStore {
    /// `label` names the medium in diagnostics ("local storage", "session storage").
    pub fn new(area: Arc<dyn StorageArea>, key: impl Into<String>, label: &'static str) -> Self {
        let key = key.into();
        debug!(key = %key, "Using {}", label);
        Self {
            area,
            key,
            label,
            cached: Mutex::new(None),
        }
    }

    fn cached(&self) -> Option<String> {
        self.cached.lock().map(|c| c.clone()).unwrap_or(None)
    }

    fn set_cached(&self, value: Option<String>) {
        if let Ok(mut cached) = self.cached.lock() {
            *cached = value;
        }
    }
}

#[async_trait]
impl KeyValueStore for CachedAreaStore {
    fn key(&self) -> &str {
        &self.key
    }

    async fn get(&self) -> Result<Option<String>, StoreError> {
        let existing = match self.area.get_item(&self.key).await {
            Ok(existing) => existing,
            Err(e) => match self.cached() {
                Some(cached) => {
                    warn!(key = %self.key, error = %e, "{} unavailable, returning in-memory item", self.label);
                    return Ok(Some(cached));
                }
                None => return Err(e),
            },
        };

        if existing.is_none()
            && let Some(cached) = self.cached()
        {
            debug!(key = %self.key, "Existing item is missing, returning in-memory item");
            return Ok(Some(cached));
        }

        Ok(existing)
    }

    async fn set(&self, value: &str) -> Result<(), StoreError> {
        self.set_cached(Some(value.to_string()));
        if let Err(e) = self.area.set_item(&self.key, value).await {
            warn!(key = %self.key, error = %e, "{} refused write, keeping in-memory item", self.label);
        }
        Ok(())
    }

    async fn remove(&self) -> Result<(), StoreError> {
        self.set_cached(None);
        if let Err(e) = self.area.remove_item(&self.key).await {
            warn!(key = %self.key, error = %e, "{} refused removal", self.label);
        }
        Ok(())
    }
}
