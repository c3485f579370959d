//! Assets: the unit a lookup returns.
//!
//! Two closed variants behind one capability surface:
//!
//! | Variant          | Source                               | `to_a`              |
//! |------------------|--------------------------------------|---------------------|
//! | `StaticAsset`    | any file without a comment syntax    | `[self]`            |
//! | `BundledAsset`   | directive-bearing root + requires    | contributors + self |
//!
//! Assets are snapshots. A stale asset is replaced wholesale by a rebuild,
//! never patched.

mod write;

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::bundle::Bundle;
use crate::environment::Environment;
use crate::error::{BundleError, Result};
use crate::freshness::{self, ContentHash, Freshness, TrackedTarget, mtime};
use crate::graph::SourceNode;
use crate::resolver::PathResolver;

// =============================================================================
// Contributor
// =============================================================================

/// Snapshot of one file's part in an asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contributor {
    pub logical_path: String,
    pub pathname: PathBuf,
    pub content_type: String,
    pub mtime: SystemTime,
    pub digest: ContentHash,
    /// Byte length of the processed body.
    pub length: usize,
}

impl Contributor {
    pub fn from_node(node: &SourceNode) -> Self {
        Self {
            logical_path: node.logical_path.clone(),
            pathname: node.path.clone(),
            content_type: node.content_type.clone(),
            mtime: node.mtime,
            digest: node.digest,
            length: node.body.len(),
        }
    }
}

/// An asset folded in through `depend_on_asset`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetDependency {
    pub logical_path: String,
    pub digest: ContentHash,
}

// =============================================================================
// Variants
// =============================================================================

/// Leaf asset served byte-for-byte.
#[derive(Debug, Clone)]
pub struct StaticAsset {
    pub(crate) logical_path: String,
    pub(crate) pathname: PathBuf,
    pub(crate) content_type: String,
    pub(crate) mtime: SystemTime,
    pub(crate) digest: ContentHash,
    pub(crate) bytes: Vec<u8>,
    pub(crate) targets: Vec<TrackedTarget>,
}

impl StaticAsset {
    /// Stat then read `path`.
    pub fn load(path: &Path, logical_path: String, env: &Environment) -> Result<Self> {
        let resolver = env.resolver();
        let stat = resolver.stat(path);
        let Some(current) = stat.mtime.filter(|_| stat.is_file()) else {
            return Err(BundleError::not_found(logical_path, None));
        };
        let current = mtime::truncate(current);

        let bytes = resolver.read(path).map_err(|err| BundleError::io(path, err))?;
        let digest = ContentHash::of(&bytes);

        Ok(Self {
            logical_path,
            pathname: path.to_path_buf(),
            content_type: env.config().content_type_for(path),
            mtime: current,
            digest,
            bytes,
            targets: vec![TrackedTarget::file(path.to_path_buf(), current, digest)],
        })
    }

    fn as_contributor(&self) -> Contributor {
        Contributor {
            logical_path: self.logical_path.clone(),
            pathname: self.pathname.clone(),
            content_type: self.content_type.clone(),
            mtime: self.mtime,
            digest: self.digest,
            length: self.bytes.len(),
        }
    }
}

/// Directive-bearing root plus its resolved contributors.
#[derive(Debug, Clone)]
pub struct BundledAsset {
    pub(crate) logical_path: String,
    pub(crate) pathname: PathBuf,
    pub(crate) content_type: String,
    pub(crate) mtime: SystemTime,
    pub(crate) digest: ContentHash,
    /// Root node's own processed text.
    pub(crate) body: String,
    /// Concatenation of every contributor.
    pub(crate) source: String,
    pub(crate) contributors: Vec<Contributor>,
    pub(crate) self_index: usize,
    pub(crate) targets: Vec<TrackedTarget>,
    pub(crate) asset_dependencies: Vec<AssetDependency>,
}

impl BundledAsset {
    pub fn from_bundle(root: &SourceNode, bundle: Bundle) -> Self {
        let mtime = latest_mtime(&bundle.targets).unwrap_or(root.mtime);
        Self {
            logical_path: root.logical_path.clone(),
            pathname: root.path.clone(),
            content_type: root.content_type.clone(),
            mtime,
            digest: bundle.digest,
            body: root.body.clone(),
            source: bundle.source,
            contributors: bundle.contributors,
            self_index: bundle.self_index,
            targets: bundle.targets,
            asset_dependencies: bundle.asset_dependencies,
        }
    }
}

fn latest_mtime(targets: &[TrackedTarget]) -> Option<SystemTime> {
    targets.iter().map(|t| t.mtime).max()
}

// =============================================================================
// Asset
// =============================================================================

#[derive(Debug, Clone)]
pub enum Asset {
    Static(StaticAsset),
    Bundled(BundledAsset),
}

impl Asset {
    #[inline]
    pub fn logical_path(&self) -> &str {
        match self {
            Self::Static(a) => &a.logical_path,
            Self::Bundled(a) => &a.logical_path,
        }
    }

    /// Absolute path of the root file.
    #[inline]
    pub fn pathname(&self) -> &Path {
        match self {
            Self::Static(a) => &a.pathname,
            Self::Bundled(a) => &a.pathname,
        }
    }

    #[inline]
    pub fn content_type(&self) -> &str {
        match self {
            Self::Static(a) => &a.content_type,
            Self::Bundled(a) => &a.content_type,
        }
    }

    /// Byte length of the final content.
    #[inline]
    pub fn length(&self) -> usize {
        self.as_bytes().len()
    }

    #[inline]
    pub fn digest(&self) -> ContentHash {
        match self {
            Self::Static(a) => a.digest,
            Self::Bundled(a) => a.digest,
        }
    }

    /// Latest mtime among everything the asset tracks.
    #[inline]
    pub fn mtime(&self) -> SystemTime {
        match self {
            Self::Static(a) => a.mtime,
            Self::Bundled(a) => a.mtime,
        }
    }

    /// The asset's own content: raw bytes for a static asset, the root
    /// file's processed text for a bundle.
    pub fn body(&self) -> &[u8] {
        match self {
            Self::Static(a) => &a.bytes,
            Self::Bundled(a) => a.body.as_bytes(),
        }
    }

    /// Final content bytes.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Static(a) => &a.bytes,
            Self::Bundled(a) => a.source.as_bytes(),
        }
    }

    /// Final content as text. Static binaries decode lossily.
    pub fn to_s(&self) -> Cow<'_, str> {
        match self {
            Self::Static(a) => String::from_utf8_lossy(&a.bytes),
            Self::Bundled(a) => Cow::Borrowed(&a.source),
        }
    }

    /// Every contributor in bundle order, including the asset itself.
    pub fn to_a(&self) -> Vec<Contributor> {
        match self {
            Self::Static(a) => vec![a.as_contributor()],
            Self::Bundled(a) => a.contributors.clone(),
        }
    }

    /// `to_a` without the asset itself.
    pub fn dependencies(&self) -> Vec<Contributor> {
        match self {
            Self::Static(_) => Vec::new(),
            Self::Bundled(a) => a
                .contributors
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != a.self_index)
                .map(|(_, c)| c.clone())
                .collect(),
        }
    }

    /// Assets folded in through `depend_on_asset`.
    pub fn asset_dependencies(&self) -> &[AssetDependency] {
        match self {
            Self::Static(_) => &[],
            Self::Bundled(a) => &a.asset_dependencies,
        }
    }

    /// Filesystem targets the snapshot was built from.
    pub fn targets(&self) -> &[TrackedTarget] {
        match self {
            Self::Static(a) => &a.targets,
            Self::Bundled(a) => &a.targets,
        }
    }

    /// Whether the snapshot still matches the filesystem.
    pub fn fresh(&self, resolver: &dyn PathResolver) -> Freshness {
        freshness::check(self.targets(), resolver)
    }

    #[inline]
    pub fn is_static(&self) -> bool {
        matches!(self, Self::Static(_))
    }
}

impl PartialEq for Asset {
    fn eq(&self, other: &Self) -> bool {
        self.logical_path() == other.logical_path() && self.digest() == other.digest()
    }
}

impl Eq for Asset {}
