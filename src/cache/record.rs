//! Portable asset records.
//!
//! A record is the serialized form of an [`Asset`] snapshot. Paths are stored
//! relative to the environment root that contains them, so a record stays
//! valid when the project directory moves. Decoding does no I/O.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::asset::{Asset, AssetDependency, BundledAsset, Contributor, StaticAsset};
use crate::environment::Environment;
use crate::freshness::{ContentHash, TargetKind, TrackedTarget, mtime};
use crate::utils::path::split_root;

/// Bumped whenever the record layout changes. Older records are misses.
pub const RECORD_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("record version {found}, expected {RECORD_VERSION}")]
    Version { found: u32 },

    #[error("root index {0} is out of range")]
    RootIndex(usize),

    #[error("static body is not valid hex")]
    Hex(#[from] hex::FromHexError),

    #[error("recorded length {recorded} does not match body length {actual}")]
    Length { recorded: usize, actual: usize },

    #[error("malformed record: {0}")]
    Malformed(String),

    #[error("record is not valid JSON")]
    Json(#[from] serde_json::Error),
}

// ============================================================================
// Record types
// ============================================================================

/// A path, relative to the root at `root` when it lies inside one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordPath {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<usize>,
    /// `/`-separated when relative.
    pub path: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Static,
    Bundled,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributorRecord {
    pub logical_path: String,
    pub pathname: RecordPath,
    pub content_type: String,
    pub mtime: u64,
    pub digest: ContentHash,
    pub length: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetRecord {
    pub path: RecordPath,
    pub kind: TargetKind,
    pub mtime: u64,
    pub digest: ContentHash,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRecord {
    pub version: u32,
    pub kind: RecordKind,
    pub logical_path: String,
    pub pathname: RecordPath,
    pub content_type: String,
    pub length: usize,
    pub digest: ContentHash,
    /// Nanoseconds since the Unix epoch.
    pub mtime: u64,
    /// Hex of the raw bytes for static assets; the root's processed text
    /// for bundles.
    pub body: String,
    /// Assembled source (bundles only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default)]
    pub contributors: Vec<ContributorRecord>,
    #[serde(default)]
    pub self_index: usize,
    pub targets: Vec<TargetRecord>,
    #[serde(default)]
    pub asset_dependencies: Vec<AssetDependency>,
}

impl AssetRecord {
    pub fn to_json(&self) -> Result<String, RecordError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, RecordError> {
        Ok(serde_json::from_str(json)?)
    }
}

// ============================================================================
// Codec
// ============================================================================

/// Snapshot an asset into a record.
pub fn encode(asset: &Asset, env: &Environment) -> AssetRecord {
    let roots = &env.config().roots;
    let to_record = |p: &Path| record_path(p, roots);

    let targets = asset
        .targets()
        .iter()
        .map(|t| TargetRecord {
            path: to_record(&t.path),
            kind: t.kind,
            mtime: mtime::to_nanos(t.mtime),
            digest: t.digest,
        })
        .collect();

    let mut record = AssetRecord {
        version: RECORD_VERSION,
        kind: RecordKind::Static,
        logical_path: asset.logical_path().to_string(),
        pathname: to_record(asset.pathname()),
        content_type: asset.content_type().to_string(),
        length: asset.length(),
        digest: asset.digest(),
        mtime: mtime::to_nanos(asset.mtime()),
        body: String::new(),
        source: None,
        contributors: Vec::new(),
        self_index: 0,
        targets,
        asset_dependencies: asset.asset_dependencies().to_vec(),
    };

    match asset {
        Asset::Static(a) => {
            record.body = hex::encode(&a.bytes);
        }
        Asset::Bundled(a) => {
            record.kind = RecordKind::Bundled;
            record.body = a.body.clone();
            record.source = Some(a.source.clone());
            record.self_index = a.self_index;
            record.contributors = a
                .contributors
                .iter()
                .map(|c| ContributorRecord {
                    logical_path: c.logical_path.clone(),
                    pathname: to_record(&c.pathname),
                    content_type: c.content_type.clone(),
                    mtime: mtime::to_nanos(c.mtime),
                    digest: c.digest,
                    length: c.length,
                })
                .collect();
        }
    }

    record
}

/// Rebuild an asset from a record against `env`'s roots.
pub fn decode(record: AssetRecord, env: &Environment) -> Result<Asset, RecordError> {
    if record.version != RECORD_VERSION {
        return Err(RecordError::Version {
            found: record.version,
        });
    }

    let roots = &env.config().roots;
    let pathname = resolve_record_path(&record.pathname, roots)?;
    let targets = record
        .targets
        .iter()
        .map(|t| {
            Ok(TrackedTarget {
                path: resolve_record_path(&t.path, roots)?,
                kind: t.kind,
                mtime: mtime::from_nanos(t.mtime),
                digest: t.digest,
            })
        })
        .collect::<Result<Vec<_>, RecordError>>()?;

    match record.kind {
        RecordKind::Static => {
            let bytes = hex::decode(&record.body)?;
            check_length(record.length, bytes.len())?;
            if ContentHash::of(&bytes) != record.digest {
                return Err(RecordError::Malformed("static digest does not match body".into()));
            }
            Ok(Asset::Static(StaticAsset {
                logical_path: record.logical_path,
                pathname,
                content_type: record.content_type,
                mtime: mtime::from_nanos(record.mtime),
                digest: record.digest,
                bytes,
                targets,
            }))
        }
        RecordKind::Bundled => {
            let source = record
                .source
                .ok_or_else(|| RecordError::Malformed("bundle without source".into()))?;
            check_length(record.length, source.len())?;
            if record.self_index >= record.contributors.len() {
                return Err(RecordError::Malformed(format!(
                    "self index {} with {} contributors",
                    record.self_index,
                    record.contributors.len()
                )));
            }

            let contributors = record
                .contributors
                .into_iter()
                .map(|c| {
                    Ok(Contributor {
                        pathname: resolve_record_path(&c.pathname, roots)?,
                        logical_path: c.logical_path,
                        content_type: c.content_type,
                        mtime: mtime::from_nanos(c.mtime),
                        digest: c.digest,
                        length: c.length,
                    })
                })
                .collect::<Result<Vec<_>, RecordError>>()?;

            Ok(Asset::Bundled(BundledAsset {
                logical_path: record.logical_path,
                pathname,
                content_type: record.content_type,
                mtime: mtime::from_nanos(record.mtime),
                digest: record.digest,
                body: record.body,
                source,
                contributors,
                self_index: record.self_index,
                targets,
                asset_dependencies: record.asset_dependencies,
            }))
        }
    }
}

fn check_length(recorded: usize, actual: usize) -> Result<(), RecordError> {
    if recorded == actual {
        Ok(())
    } else {
        Err(RecordError::Length { recorded, actual })
    }
}

fn record_path(path: &Path, roots: &[PathBuf]) -> RecordPath {
    match split_root(path, roots) {
        Some((index, rel)) => RecordPath {
            root: Some(index),
            path: rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/"),
        },
        None => RecordPath {
            root: None,
            path: path.to_string_lossy().into_owned(),
        },
    }
}

fn resolve_record_path(record: &RecordPath, roots: &[PathBuf]) -> Result<PathBuf, RecordError> {
    let Some(index) = record.root else {
        return Ok(PathBuf::from(&record.path));
    };
    let root = roots.get(index).ok_or(RecordError::RootIndex(index))?;
    Ok(record
        .path
        .split('/')
        .filter(|c| !c.is_empty())
        .fold(root.clone(), |acc, c| acc.join(c)))
}
