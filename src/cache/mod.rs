//! Asset cache.
//!
//! [`AssetCache`] is an explicit object handed to every lookup; there is no
//! process-wide singleton. It keeps portable [`AssetRecord`]s in a pluggable
//! [`CacheStore`]:
//!
//! - [`MemoryStore`]: in-process map
//! - [`DiskStore`]: one JSON file per key, shared across processes

mod disk;
mod record;
mod store;

pub use disk::DiskStore;
pub use record::{
    AssetRecord, ContributorRecord, RECORD_VERSION, RecordError, RecordKind, RecordPath,
    TargetRecord, decode, encode,
};
pub use store::{CacheStore, MemoryStore};

use std::sync::Arc;

use crate::config::BundleConfig;

/// Shared handle on a record store. Cloning shares the store.
#[derive(Clone)]
pub struct AssetCache {
    store: Arc<dyn CacheStore>,
}

impl AssetCache {
    pub fn new(store: impl CacheStore + 'static) -> Self {
        Self {
            store: Arc::new(store),
        }
    }

    pub fn memory() -> Self {
        Self::new(MemoryStore::new())
    }

    /// Disk store when `cache.dir` is configured, memory otherwise.
    pub fn from_config(config: &BundleConfig) -> Self {
        match &config.cache.dir {
            Some(dir) => Self::new(DiskStore::new(dir)),
            None => Self::memory(),
        }
    }

    #[inline]
    pub fn store(&self) -> &dyn CacheStore {
        self.store.as_ref()
    }

    /// Cache key of a logical path.
    pub fn key(logical_path: &str) -> String {
        format!("asset:{RECORD_VERSION}:{logical_path}")
    }

    pub fn get(&self, logical_path: &str) -> Option<AssetRecord> {
        self.store.get(&Self::key(logical_path))
    }

    /// Store a record. Failures are logged, never returned: a cache that
    /// cannot be written only costs a rebuild.
    pub fn set(&self, logical_path: &str, record: &AssetRecord) {
        if let Err(err) = self.store.set(&Self::key(logical_path), record) {
            crate::log!("cache"; "failed to store {}: {}", logical_path, err);
        }
    }

    pub fn remove(&self, logical_path: &str) {
        if let Err(err) = self.store.remove(&Self::key(logical_path)) {
            crate::log!("cache"; "failed to remove {}: {}", logical_path, err);
        }
    }

    pub fn clear(&self) -> std::io::Result<()> {
        self.store.clear()
    }
}

impl Default for AssetCache {
    fn default() -> Self {
        Self::memory()
    }
}

impl std::fmt::Debug for AssetCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssetCache").finish_non_exhaustive()
    }
}
