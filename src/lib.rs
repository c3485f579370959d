//! Sprig - a directive-driven asset bundler.
//!
//! Source files declare their dependencies in a leading comment block:
//!
//! ```text
//! //= require jquery
//! //= require_tree ./views
//! //= require_self
//! ```
//!
//! The [`Environment`] resolves those directives into a dependency graph,
//! concatenates the contributors into one [`Asset`] and keeps a snapshot of
//! every file it read. Later lookups go through an [`AssetCache`] and only
//! rebuild when the freshness check finds a changed file.
//!
//! # Module Structure
//!
//! ```text
//! src/
//! ├── directive/    # Comment-header directive parser
//! ├── graph/        # Source nodes, edges, graph builder
//! ├── bundle/       # Contributor ordering + concatenation
//! ├── asset/        # Static / bundled asset variants, write-out
//! ├── freshness/    # Content hashes, mtimes, staleness checks
//! ├── cache/        # Cache stores + record codec
//! ├── resolver/     # PathResolver trait + filesystem resolver
//! ├── transform/    # Transformer trait + passthrough transformer
//! ├── environment/  # Lookup entry point
//! ├── config/       # sprig.toml
//! └── logger.rs     # log! / debug! macros
//! ```

pub mod logger;

pub mod asset;
pub mod bundle;
pub mod cache;
pub mod config;
pub mod directive;
pub mod environment;
pub mod error;
pub mod freshness;
pub mod graph;
pub mod resolver;
pub mod transform;
pub mod utils;

pub use asset::{Asset, BundledAsset, Contributor, StaticAsset};
pub use cache::{AssetCache, AssetRecord, CacheStore, DiskStore, MemoryStore};
pub use config::{BundleConfig, ConfigError};
pub use environment::Environment;
pub use error::{BundleError, Result};
pub use freshness::{ContentHash, Freshness};
pub use resolver::{FsResolver, PathResolver, Stat};
pub use transform::{PassthroughTransformer, TransformError, Transformer};
