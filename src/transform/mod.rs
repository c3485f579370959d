//! Content transformers.
//!
//! A transformer turns a source file's bytes (directive lines already
//! removed) into processed text plus the content type it produces. The
//! bundler treats it as opaque: whatever it returns is spliced into the
//! bundle as-is, and any error aborts the build.

use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::BundleConfig;

// =============================================================================
// Transformer Trait
// =============================================================================

/// Processes directive-bearing sources.
pub trait Transformer: Send + Sync {
    /// Returns `(text, content_type)`.
    fn process(&self, raw: &[u8], path: &Path) -> Result<(String, String), TransformError>;
}

#[derive(Debug, Error)]
#[error("failed to process `{}`: {message}", .path.display())]
pub struct TransformError {
    pub path: PathBuf,
    pub message: String,
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl TransformError {
    pub fn new(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        path: impl Into<PathBuf>,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

// =============================================================================
// Passthrough
// =============================================================================

/// Decodes UTF-8 and reports the content type inferred from the extension.
#[derive(Debug, Clone, Default)]
pub struct PassthroughTransformer {
    config: BundleConfig,
}

impl PassthroughTransformer {
    pub fn new(config: &BundleConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }
}

impl Transformer for PassthroughTransformer {
    fn process(&self, raw: &[u8], path: &Path) -> Result<(String, String), TransformError> {
        let text = std::str::from_utf8(raw)
            .map_err(|err| TransformError::with_source(path, "source is not valid UTF-8", err))?;
        Ok((text.to_owned(), self.config.content_type_for(path)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::mime;

    fn transformer() -> PassthroughTransformer {
        PassthroughTransformer::new(&BundleConfig::default())
    }

    #[test]
    fn test_passthrough_text_and_type() {
        let t = transformer();
        let (text, ty) = t.process(b"var a = 1;\n", Path::new("/app/a.js")).unwrap();
        assert_eq!(text, "var a = 1;\n");
        assert_eq!(ty, mime::types::JAVASCRIPT);

        let (_, ty) = t.process(b"", Path::new("/app/site.css.erb")).unwrap();
        assert_eq!(ty, mime::types::CSS);

        let (_, ty) = t.process(b"", Path::new("/app/app.coffee")).unwrap();
        assert_eq!(ty, mime::types::JAVASCRIPT);
    }

    #[test]
    fn test_passthrough_rejects_invalid_utf8() {
        let err = transformer()
            .process(&[0xff, 0xfe, 0x00], Path::new("/app/bad.js"))
            .unwrap_err();
        assert_eq!(err.path, PathBuf::from("/app/bad.js"));
        assert!(err.to_string().contains("not valid UTF-8"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
