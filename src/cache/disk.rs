//! On-disk record store: one JSON file per key.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::{AssetRecord, CacheStore};

/// Stores each record at `<dir>/<blake3(key)>.json`.
///
/// Writes go to a temp file and are renamed into place, so a reader never
/// sees half a record. Files that fail to read or parse are misses.
#[derive(Debug, Clone)]
pub struct DiskStore {
    dir: PathBuf,
}

impl DiskStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[inline]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.dir
            .join(format!("{}.json", blake3::hash(key.as_bytes()).to_hex()))
    }
}

impl CacheStore for DiskStore {
    fn get(&self, key: &str) -> Option<AssetRecord> {
        let path = self.entry_path(key);
        let json = match fs::read_to_string(&path) {
            Ok(json) => json,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return None,
            Err(err) => {
                crate::debug!("cache"; "failed to read {}: {}", path.display(), err);
                return None;
            }
        };

        AssetRecord::from_json(&json)
            .map_err(|err| {
                crate::debug!("cache"; "failed to parse {}: {}", path.display(), err);
            })
            .ok()
    }

    fn set(&self, key: &str, record: &AssetRecord) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;

        let path = self.entry_path(key);
        let json = record
            .to_json()
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;

        let tmp = path.with_extension(format!("{}.tmp", std::process::id()));
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &path).inspect_err(|_| {
            let _ = fs::remove_file(&tmp);
        })
    }

    fn remove(&self, key: &str) -> io::Result<()> {
        match fs::remove_file(self.entry_path(key)) {
            Err(err) if err.kind() != io::ErrorKind::NotFound => Err(err),
            _ => Ok(()),
        }
    }

    fn clear(&self) -> io::Result<()> {
        if self.dir.exists() {
            fs::remove_dir_all(&self.dir)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::store::tests::sample_record;
    use tempfile::TempDir;

    #[test]
    fn test_disk_store_roundtrip() {
        let dir = TempDir::new().unwrap();
        let store = DiskStore::new(dir.path().join("cache"));

        assert!(store.get("app.js").is_none());
        store.set("app.js", &sample_record("app.js")).unwrap();
        assert_eq!(store.get("app.js"), Some(sample_record("app.js")));

        // Another handle on the same directory sees the record
        let other = DiskStore::new(store.dir());
        assert_eq!(other.get("app.js"), Some(sample_record("app.js")));

        store.remove("app.js").unwrap();
        assert!(store.get("app.js").is_none());
        store.remove("app.js").unwrap();
    }

    #[test]
    fn test_corrupt_entry_is_miss() {
        let dir = TempDir::new().unwrap();
        let store = DiskStore::new(dir.path());
        store.set("k", &sample_record("k")).unwrap();

        fs::write(store.entry_path("k"), "{ not json").unwrap();
        assert!(store.get("k").is_none());
    }

    #[test]
    fn test_clear_removes_directory() {
        let dir = TempDir::new().unwrap();
        let store = DiskStore::new(dir.path().join("cache"));
        store.set("a", &sample_record("a")).unwrap();
        store.set("b", &sample_record("b")).unwrap();

        store.clear().unwrap();
        assert!(!store.dir().exists());
        assert!(store.get("a").is_none());
        store.clear().unwrap();
    }
}
