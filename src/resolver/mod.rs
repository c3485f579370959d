//! Load-path resolution.
//!
//! The bundler never touches the filesystem directly: every lookup, listing,
//! stat and read goes through a [`PathResolver`]. [`FsResolver`] is the
//! default implementation over the real filesystem.

mod fs;

pub use fs::FsResolver;

use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::freshness::ContentHash;

/// Result of a stat call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Stat {
    pub exists: bool,
    pub is_dir: bool,
    pub mtime: Option<SystemTime>,
}

impl Stat {
    pub const fn missing() -> Self {
        Self {
            exists: false,
            is_dir: false,
            mtime: None,
        }
    }

    #[inline]
    pub fn is_file(&self) -> bool {
        self.exists && !self.is_dir
    }
}

/// Filesystem access used by graph building and freshness checks.
pub trait PathResolver: Send + Sync {
    /// Resolve a logical or relative path to an absolute path inside `roots`.
    ///
    /// Relative paths (`./x`, `../x`) resolve against `from_dir`; everything
    /// else is searched in `roots` order. Returns `None` when nothing matches
    /// or the match lies outside every root.
    fn resolve(&self, path: &str, from_dir: Option<&Path>, roots: &[PathBuf]) -> Option<PathBuf>;

    /// Entries of `dir` (files and directories), sorted. `recursive` walks the
    /// whole subtree.
    fn list_children(&self, dir: &Path, recursive: bool) -> Vec<PathBuf>;

    fn stat(&self, path: &Path) -> Stat;

    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Content digest of a file.
    fn digest(&self, path: &Path) -> io::Result<ContentHash> {
        Ok(ContentHash::of(&self.read(path)?))
    }
}
