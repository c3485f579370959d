//! Freshness detection: mtime fast path, content-hash (blake3) fallback.
//!
//! Every asset snapshot carries the set of filesystem targets it was built
//! from. A check stats each target; only targets whose mtime moved past the
//! snapshot are re-hashed. A snapshot is never advanced by a check, so an
//! mtime bump without a content change is re-verified on every later check.

mod hash;
pub mod mtime;

pub use hash::{ContentHash, hash_file, hash_listing};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::resolver::PathResolver;

/// Verdict of a freshness check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    Fresh,
    Stale,
}

impl Freshness {
    #[inline]
    pub fn is_fresh(self) -> bool {
        self == Self::Fresh
    }
}

/// What a tracked target's digest covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    /// File bytes.
    File,
    /// Directory listing (entry names only).
    Directory,
}

/// One filesystem target an asset snapshot depends on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedTarget {
    pub path: PathBuf,
    pub kind: TargetKind,
    pub mtime: SystemTime,
    pub digest: ContentHash,
}

impl TrackedTarget {
    pub fn file(path: PathBuf, mtime: SystemTime, digest: ContentHash) -> Self {
        Self {
            path,
            kind: TargetKind::File,
            mtime: mtime::truncate(mtime),
            digest,
        }
    }

    pub fn directory(path: PathBuf, mtime: SystemTime, digest: ContentHash) -> Self {
        Self {
            path,
            kind: TargetKind::Directory,
            mtime: mtime::truncate(mtime),
            digest,
        }
    }

    /// Snapshot a directory's current listing.
    ///
    /// The mtime is read before listing, so a concurrent change leaves the
    /// snapshot older than the directory and gets re-probed.
    pub fn probe_directory(path: &Path, resolver: &dyn PathResolver) -> io::Result<Self> {
        let stat = resolver.stat(path);
        let mtime = match stat.mtime {
            Some(mtime) if stat.exists && stat.is_dir => mtime,
            _ => return Err(io::Error::new(io::ErrorKind::NotFound, "not a directory")),
        };
        let digest = listing_digest(path, resolver);
        Ok(Self::directory(path.to_path_buf(), mtime, digest))
    }
}

/// Listing signature of `dir` as seen through `resolver`.
pub fn listing_digest(dir: &Path, resolver: &dyn PathResolver) -> ContentHash {
    let names: Vec<String> = resolver
        .list_children(dir, false)
        .iter()
        .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        .collect();
    hash_listing(names)
}

/// Check every target against the current filesystem state.
pub fn check(targets: &[TrackedTarget], resolver: &dyn PathResolver) -> Freshness {
    let stale = targets
        .par_iter()
        .find_any(|target| !is_target_fresh(target, resolver));

    match stale {
        Some(target) => {
            crate::debug!("fresh"; "stale: {}", target.path.display());
            Freshness::Stale
        }
        None => Freshness::Fresh,
    }
}

fn is_target_fresh(target: &TrackedTarget, resolver: &dyn PathResolver) -> bool {
    let stat = resolver.stat(&target.path);
    let Some(current) = stat.mtime.filter(|_| stat.exists) else {
        return false;
    };
    if stat.is_dir != (target.kind == TargetKind::Directory) {
        return false;
    }

    // Fast path: nothing read
    if current <= target.mtime {
        return true;
    }

    // An mtime says nothing about bytes written within the same tick, so
    // a moved target is always re-hashed.
    let digest = match target.kind {
        TargetKind::File => resolver.digest(&target.path),
        TargetKind::Directory => Ok(listing_digest(&target.path, resolver)),
    };

    digest.is_ok_and(|d| d == target.digest)
}
