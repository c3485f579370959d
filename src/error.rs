//! Bundle build errors.
//!
//! Every variant aborts the current build attempt. Nothing here is retried
//! automatically and no partial bundle is ever produced.

use std::path::PathBuf;
use thiserror::Error;

use crate::cache::RecordError;
use crate::transform::TransformError;

pub type Result<T, E = BundleError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum BundleError {
    /// A directive argument or logical path did not resolve inside the roots.
    #[error("couldn't find file '{path}'{}", from_suffix(.from))]
    FileNotFound {
        path: String,
        from: Option<PathBuf>,
    },

    /// A require chain came back to a node that is still being expanded.
    #[error("{} has already been required", .path.display())]
    CircularDependency { path: PathBuf },

    #[error("{} is '{found}', not '{expected}'", .path.display())]
    ContentTypeMismatch {
        path: PathBuf,
        expected: String,
        found: String,
    },

    #[error("{}: require_self can only be used once", .path.display())]
    MultipleRequireSelf { path: PathBuf },

    #[error("{}:{line}: {message}", .path.display())]
    DirectiveArgument {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error(transparent)]
    Transform(#[from] TransformError),

    #[error("IO error when accessing `{}`", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid cache record")]
    Record(#[from] RecordError),
}

impl BundleError {
    pub(crate) fn not_found(path: impl Into<String>, from: Option<PathBuf>) -> Self {
        Self::FileNotFound {
            path: path.into(),
            from,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

fn from_suffix(from: &Option<PathBuf>) -> String {
    from.as_ref()
        .map(|p| format!(" (required from {})", p.display()))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display() {
        let err = BundleError::not_found("missing.js", None);
        assert_eq!(err.to_string(), "couldn't find file 'missing.js'");

        let err = BundleError::not_found("missing.js", Some(PathBuf::from("/app/a.js")));
        assert!(err.to_string().contains("required from /app/a.js"));
    }

    #[test]
    fn test_directive_argument_display() {
        let err = BundleError::DirectiveArgument {
            path: PathBuf::from("/app/a.js"),
            line: 3,
            message: "require_tree argument must be a relative path".into(),
        };
        assert_eq!(
            err.to_string(),
            "/app/a.js:3: require_tree argument must be a relative path"
        );
    }
}
