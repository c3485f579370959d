//! Bundler configuration (`sprig.toml`).
//!
//! # Example
//!
//! ```toml
//! roots = ["app/assets/javascripts", "vendor/assets"]
//! processing_suffixes = ["erb"]
//!
//! [content_types]
//! coffee = "application/javascript"
//!
//! [comments.coffee]
//! line = ["#"]
//! block = [["###", "###"]]
//!
//! [cache]
//! dir = ".sprig/cache"
//!
//! [output]
//! gzip_level = 9
//! ```
//!
//! Relative paths are resolved against the directory holding the config
//! file. Tables are merged over the built-in defaults, so a config only
//! needs to name what it changes.

mod error;

pub use error::ConfigError;

use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use crate::directive::CommentSyntax;
use crate::utils::{mime, path as pathutil};

/// Default config file name
pub const CONFIG_FILE: &str = "sprig.toml";

// ============================================================================
// root configuration
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BundleConfig {
    /// Absolute path to the config file, if loaded from one (internal use only)
    #[serde(skip)]
    pub config_path: Option<PathBuf>,

    /// Load paths searched for logical paths, in priority order
    pub roots: Vec<PathBuf>,

    /// Trailing extensions removed when computing logical paths and
    /// format extensions (`app.js.erb` → `app.js`)
    pub processing_suffixes: Vec<String>,

    /// Format extension → content type, merged over the built-in table
    pub content_types: BTreeMap<String, String>,

    /// Source extension → comment syntax. Files whose extension chain has no
    /// entry here are served as static assets without directive processing.
    pub comments: BTreeMap<String, CommentSyntax>,

    pub cache: CacheConfig,

    pub output: OutputConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Directory for the on-disk record store. `None` keeps records in memory.
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// gzip level (0-9) for `*.gz` write-out targets
    pub gzip_level: u32,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { gzip_level: 9 }
    }
}

impl Default for BundleConfig {
    fn default() -> Self {
        Self {
            config_path: None,
            roots: Vec::new(),
            processing_suffixes: vec!["erb".into()],
            content_types: default_content_types(),
            comments: default_comments(),
            cache: CacheConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

fn default_content_types() -> BTreeMap<String, String> {
    [
        ("coffee", mime::types::JAVASCRIPT),
        ("scss", mime::types::CSS),
        ("sass", mime::types::CSS),
        ("less", mime::types::CSS),
    ]
    .into_iter()
    .map(|(ext, ty)| (ext.to_string(), ty.to_string()))
    .collect()
}

fn default_comments() -> BTreeMap<String, CommentSyntax> {
    [
        ("js", CommentSyntax::c_style()),
        ("mjs", CommentSyntax::c_style()),
        ("css", CommentSyntax::block_only()),
        ("scss", CommentSyntax::c_style()),
        ("sass", CommentSyntax::c_style()),
        ("less", CommentSyntax::c_style()),
        ("coffee", CommentSyntax::hash()),
    ]
    .into_iter()
    .map(|(ext, syntax)| (ext.to_string(), syntax))
    .collect()
}

impl BundleConfig {
    /// Default configuration over the given roots.
    pub fn new(roots: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        let mut config = Self {
            roots: roots.into_iter().map(Into::into).collect(),
            ..Self::default()
        };
        config.normalize_paths(None);
        config
    }

    /// Parse configuration from a TOML string.
    ///
    /// Relative paths resolve against `base_dir`, or the current directory.
    pub fn from_toml(content: &str, base_dir: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config: Self = toml::from_str(content)?;
        config.merge_defaults();
        config.normalize_paths(base_dir);
        Ok(config)
    }

    /// Load and validate configuration from a file.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let mut config = Self::from_toml(&content, path.parent())?;
        config.config_path = Some(pathutil::normalize_path(path));
        config.validate()?;

        crate::debug!("config"; "loaded {} with {} roots", path.display(), config.roots.len());
        Ok(config)
    }

    /// Check the configuration for problems that would make every lookup fail.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.roots.is_empty() {
            return Err(ConfigError::Validation("`roots` must name at least one directory".into()));
        }
        if let Some(missing) = self.roots.iter().find(|root| !root.is_dir()) {
            return Err(ConfigError::Validation(format!(
                "root `{}` is not a directory",
                missing.display()
            )));
        }
        if self.output.gzip_level > 9 {
            return Err(ConfigError::Validation(format!(
                "`output.gzip_level` must be 0-9, got {}",
                self.output.gzip_level
            )));
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Lookups
    // ------------------------------------------------------------------------

    /// Content type of a file, from its format extension.
    pub fn content_type_for(&self, path: &Path) -> String {
        let ext = pathutil::format_extension(path, &self.processing_suffixes);
        ext.as_deref()
            .and_then(|ext| self.content_types.get(ext))
            .cloned()
            .unwrap_or_else(|| mime::from_extension(ext.as_deref()).to_string())
    }

    /// Comment syntax used to scan a file's directive header.
    ///
    /// Walks the extension chain from the end, so `app.js.erb` uses the
    /// `js` syntax unless `erb` has one of its own.
    pub fn comment_syntax_for(&self, path: &Path) -> Option<&CommentSyntax> {
        pathutil::extension_chain(path)
            .iter()
            .rev()
            .find_map(|ext| self.comments.get(&ext.to_ascii_lowercase()))
    }

    /// Whether a file takes part in directive processing.
    pub fn is_directive_bearing(&self, path: &Path) -> bool {
        self.comment_syntax_for(path).is_some()
    }

    /// Format extension of a file (`users.js.erb` → `js`).
    pub fn format_extension(&self, path: &Path) -> Option<String> {
        pathutil::format_extension(path, &self.processing_suffixes)
    }

    /// Logical path of an absolute file path, relative to the first root
    /// containing it.
    pub fn logical_path_for(&self, path: &Path) -> Option<String> {
        let (_, rel) = pathutil::split_root(path, &self.roots)?;
        Some(pathutil::logical_path(rel, &self.processing_suffixes))
    }

    // ------------------------------------------------------------------------
    // Private
    // ------------------------------------------------------------------------

    /// Re-add built-in table entries a user config did not override.
    fn merge_defaults(&mut self) {
        for (ext, ty) in default_content_types() {
            self.content_types.entry(ext).or_insert(ty);
        }
        for (ext, syntax) in default_comments() {
            self.comments.entry(ext).or_insert(syntax);
        }
    }

    fn normalize_paths(&mut self, base_dir: Option<&Path>) {
        let absolutize = |p: &Path| match base_dir {
            Some(base) if p.is_relative() => pathutil::normalize_path(&base.join(p)),
            _ => pathutil::normalize_path(p),
        };

        self.roots = self.roots.iter().map(|r| absolutize(r)).collect();
        self.cache.dir = self.cache.dir.as_deref().map(absolutize);
        self.processing_suffixes = self
            .processing_suffixes
            .iter()
            .map(|s| s.trim_start_matches('.').to_ascii_lowercase())
            .collect();
    }
}
