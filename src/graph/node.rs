//! Source nodes.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::directive::{self, Directive, DirectiveHeader};
use crate::environment::Environment;
use crate::error::{BundleError, Result};
use crate::freshness::{ContentHash, mtime};
use crate::transform::TransformError;

/// One physical file contributing to a bundle. Immutable once loaded.
#[derive(Debug, Clone)]
pub struct SourceNode {
    /// Canonical absolute path.
    pub path: PathBuf,
    /// Root-relative path with processing suffixes stripped.
    pub logical_path: String,
    /// Content type reported by the transformer.
    pub content_type: String,
    pub mtime: SystemTime,
    /// Digest of the raw file bytes.
    pub digest: ContentHash,
    pub directives: Vec<Directive>,
    /// Transformer output for the source with directive lines removed.
    pub body: String,
}

impl SourceNode {
    /// Stat, read, parse and transform one file.
    ///
    /// The stat happens before the read, so a write racing with the load
    /// leaves the recorded mtime older than the file and the next freshness
    /// check re-probes it.
    pub fn load(path: &Path, env: &Environment) -> Result<Self> {
        let config = env.config();
        let resolver = env.resolver();

        let stat = resolver.stat(path);
        let Some(mtime) = stat.mtime.filter(|_| stat.is_file()) else {
            return Err(BundleError::not_found(path.display().to_string(), None));
        };
        let mtime = mtime::truncate(mtime);

        let raw = resolver.read(path).map_err(|err| BundleError::io(path, err))?;
        let digest = ContentHash::of(&raw);

        let logical_path = config
            .logical_path_for(path)
            .ok_or_else(|| BundleError::not_found(path.display().to_string(), None))?;

        let header = match config.comment_syntax_for(path) {
            Some(syntax) => {
                let text = std::str::from_utf8(&raw).map_err(|err| {
                    TransformError::with_source(path, "source is not valid UTF-8", err)
                })?;
                directive::parse(path, text, syntax)?
            }
            None => DirectiveHeader {
                processed: String::from_utf8_lossy(&raw).into_owned(),
                ..DirectiveHeader::default()
            },
        };

        let (body, content_type) = env
            .transformer()
            .process(header.processed.as_bytes(), path)?;

        Ok(Self {
            path: path.to_path_buf(),
            logical_path,
            content_type,
            mtime,
            digest,
            directives: header.directives,
            body,
        })
    }
}
