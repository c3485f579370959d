//! Lookup entry point.
//!
//! An [`Environment`] owns the configuration, the resolver and the
//! transformer. Every lookup goes through an [`AssetCache`]:
//!
//! ```text
//! find_asset(logical_path, cache)
//!   ├── resolve → absolute path
//!   ├── cache record? ── decode ── fresh? ──→ hit
//!   │                      │          └─ stale ─┐
//!   │                      └─ undecodable ──────┤
//!   └── miss ←──────────────────────────────────┘
//!         └── build (graph → bundle → asset) → store record
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::asset::{Asset, BundledAsset, StaticAsset};
use crate::bundle;
use crate::cache::{self, AssetCache};
use crate::config::{BundleConfig, ConfigError};
use crate::error::{BundleError, Result};
use crate::graph::DependencyGraphBuilder;
use crate::resolver::{FsResolver, PathResolver};
use crate::transform::{PassthroughTransformer, Transformer};


pub struct Environment {
    config: Arc<BundleConfig>,
    resolver: Arc<dyn PathResolver>,
    transformer: Arc<dyn Transformer>,
}

impl Environment {
    /// Environment over the real filesystem with the passthrough transformer.
    pub fn new(config: BundleConfig) -> Self {
        let transformer = PassthroughTransformer::new(&config);
        Self::with_parts(config, Arc::new(FsResolver::new()), Arc::new(transformer))
    }

    pub fn with_parts(
        config: BundleConfig,
        resolver: Arc<dyn PathResolver>,
        transformer: Arc<dyn Transformer>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            resolver,
            transformer,
        }
    }

    /// Load and validate `sprig.toml` at `path`.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        BundleConfig::from_path(path).map(Self::new)
    }

    #[inline]
    pub fn config(&self) -> &BundleConfig {
        &self.config
    }

    #[inline]
    pub fn resolver(&self) -> &dyn PathResolver {
        self.resolver.as_ref()
    }

    #[inline]
    pub fn transformer(&self) -> &dyn Transformer {
        self.transformer.as_ref()
    }

    // -------------------------------------------------------------------------
    // Lookup
    // -------------------------------------------------------------------------

    /// Resolve a logical path to an absolute file inside the roots.
    pub fn resolve(&self, logical_path: &str) -> Result<PathBuf> {
        self.resolver
            .resolve(logical_path, None, &self.config.roots)
            .filter(|path| self.resolver.stat(path).is_file())
            .ok_or_else(|| BundleError::not_found(logical_path, None))
    }

    /// Find the asset at `logical_path`, reusing `cache` when the snapshot it
    /// holds is still fresh.
    pub fn find_asset(&self, logical_path: &str, cache: &AssetCache) -> Result<Asset> {
        let path = self.resolve(logical_path)?;
        self.fetch(&path, cache, &mut Vec::new())
    }

    /// Write `asset` to `target`, gzipping `.gz` targets at the configured
    /// level.
    pub fn write_asset(&self, asset: &Asset, target: &Path) -> Result<()> {
        asset.write_to(target, self.config.output.gzip_level)
    }

    // -------------------------------------------------------------------------
    // Private
    // -------------------------------------------------------------------------

    /// Cached lookup by absolute path. `building` holds the assets currently
    /// being built, for `depend_on_asset` cycle detection.
    fn fetch(&self, path: &Path, cache: &AssetCache, building: &mut Vec<PathBuf>) -> Result<Asset> {
        let logical_path = self
            .config
            .logical_path_for(path)
            .ok_or_else(|| BundleError::not_found(path.display().to_string(), None))?;

        if let Some(record) = cache.get(&logical_path) {
            match cache::decode(record, self) {
                Ok(asset) if asset.pathname() != path => {
                    crate::debug!("cache"; "moved: {}", logical_path);
                }
                Ok(asset) => {
                    if asset.fresh(self.resolver()).is_fresh() {
                        crate::debug!("cache"; "hit: {}", logical_path);
                        return Ok(asset);
                    }
                    crate::debug!("cache"; "stale: {}", logical_path);
                }
                Err(err) => {
                    crate::debug!("cache"; "unreadable record for {}: {}", logical_path, err);
                }
            }
        } else {
            crate::debug!("cache"; "miss: {}", logical_path);
        }

        let asset = self.build(path, logical_path, cache, building)?;
        cache.set(asset.logical_path(), &cache::encode(&asset, self));
        Ok(asset)
    }

    fn build(
        &self,
        path: &Path,
        logical_path: String,
        cache: &AssetCache,
        building: &mut Vec<PathBuf>,
    ) -> Result<Asset> {
        if !self.config.is_directive_bearing(path) {
            return StaticAsset::load(path, logical_path, self).map(Asset::Static);
        }
        if building.iter().any(|p| p == path) {
            return Err(BundleError::CircularDependency {
                path: path.to_path_buf(),
            });
        }

        building.push(path.to_path_buf());
        let result = self.build_bundle(path, cache, building);
        building.pop();
        result
    }

    fn build_bundle(&self, path: &Path, cache: &AssetCache, building: &mut Vec<PathBuf>) -> Result<Asset> {
        let graph = DependencyGraphBuilder::new(self).build(path)?;
        let bundle = bundle::assemble(&graph, self, |dep| self.fetch(dep, cache, building))?;
        let root = graph
            .root_node()
            .ok_or_else(|| BundleError::not_found(path.display().to_string(), None))?;
        Ok(Asset::Bundled(BundledAsset::from_bundle(root, bundle)))
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Environment")
            .field("roots", &self.config.roots)
            .finish_non_exhaustive()
    }
}
