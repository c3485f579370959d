//! Record stores.

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::io;

use super::AssetRecord;
use crate::error::Result;

/// Key → record storage behind an [`AssetCache`](super::AssetCache).
pub trait CacheStore: Send + Sync {
    /// Missing or unreadable entries are `None`.
    fn get(&self, key: &str) -> Option<AssetRecord>;

    fn set(&self, key: &str, record: &AssetRecord) -> io::Result<()>;

    fn remove(&self, key: &str) -> io::Result<()>;

    fn clear(&self) -> io::Result<()>;

    /// Return the stored record or compute and store one. A failed store
    /// write does not fail the lookup.
    fn fetch_or_compute(
        &self,
        key: &str,
        compute: &mut dyn FnMut() -> Result<AssetRecord>,
    ) -> Result<AssetRecord> {
        if let Some(record) = self.get(key) {
            return Ok(record);
        }
        let record = compute()?;
        if let Err(err) = self.set(key, &record) {
            crate::log!("cache"; "failed to store {}: {}", key, err);
        }
        Ok(record)
    }
}

/// In-process store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<FxHashMap<String, AssetRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

impl CacheStore for MemoryStore {
    fn get(&self, key: &str) -> Option<AssetRecord> {
        self.records.read().get(key).cloned()
    }

    fn set(&self, key: &str, record: &AssetRecord) -> io::Result<()> {
        self.records.write().insert(key.to_string(), record.clone());
        Ok(())
    }

    fn remove(&self, key: &str) -> io::Result<()> {
        self.records.write().remove(key);
        Ok(())
    }

    fn clear(&self) -> io::Result<()> {
        self.records.write().clear();
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::cache::{RecordKind, RecordPath};
    use crate::error::BundleError;
    use crate::freshness::ContentHash;

    pub(crate) fn sample_record(name: &str) -> AssetRecord {
        AssetRecord {
            version: crate::cache::RECORD_VERSION,
            kind: RecordKind::Static,
            logical_path: name.to_string(),
            pathname: RecordPath {
                root: Some(0),
                path: name.to_string(),
            },
            content_type: "text/plain".into(),
            length: 2,
            digest: ContentHash::of(b"hi"),
            mtime: 1,
            body: hex::encode(b"hi"),
            source: None,
            contributors: Vec::new(),
            self_index: 0,
            targets: Vec::new(),
            asset_dependencies: Vec::new(),
        }
    }

    #[test]
    fn test_memory_store_crud() {
        let store = MemoryStore::new();
        assert!(store.get("a").is_none());

        store.set("a", &sample_record("a.txt")).unwrap();
        assert_eq!(store.get("a"), Some(sample_record("a.txt")));
        assert_eq!(store.len(), 1);

        store.remove("a").unwrap();
        assert!(store.is_empty());

        store.set("a", &sample_record("a.txt")).unwrap();
        store.set("b", &sample_record("b.txt")).unwrap();
        store.clear().unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_fetch_or_compute() {
        let store = MemoryStore::new();
        let mut calls = 0;

        for _ in 0..2 {
            let record = store
                .fetch_or_compute("k", &mut || {
                    calls += 1;
                    Ok(sample_record("k.txt"))
                })
                .unwrap();
            assert_eq!(record.logical_path, "k.txt");
        }
        assert_eq!(calls, 1);

        let err = store
            .fetch_or_compute("missing", &mut || Err(BundleError::not_found("x", None)))
            .unwrap_err();
        assert!(matches!(err, BundleError::FileNotFound { .. }));
        assert!(store.get("missing").is_none());
    }
}
