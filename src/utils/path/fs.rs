//! Path normalization utilities.
//!
//! Provides consistent path handling across the codebase:
//! - `normalize_path` - file system paths (canonicalize + fallback)
//! - `is_within` - root containment checks
//! - `split_root` - root index + relative remainder, for portable records

use std::path::{Component, Path, PathBuf};

/// Normalize a file system path to absolute form.
///
/// Tries `canonicalize()` first (resolves symlinks, `.`, `..`).
/// Falls back to a lexical cleanup of `.` and `..` components, joined onto
/// the current directory if relative. The fallback keeps missing paths
/// comparable with canonical ones.
#[inline]
pub fn normalize_path(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| {
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir().map_or_else(|_| path.to_path_buf(), |cwd| cwd.join(path))
        };
        clean_lexically(&absolute)
    })
}

/// Check whether `path` lies inside any of `roots`.
///
/// Both sides are expected to be normalized already.
pub fn is_within(path: &Path, roots: &[PathBuf]) -> bool {
    roots.iter().any(|root| path.starts_with(root))
}

/// Split `path` into the index of the first root containing it and the
/// remainder relative to that root.
pub fn split_root<'a>(path: &'a Path, roots: &[PathBuf]) -> Option<(usize, &'a Path)> {
    roots
        .iter()
        .enumerate()
        .find_map(|(idx, root)| path.strip_prefix(root).ok().map(|rel| (idx, rel)))
}

fn clean_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path_absolute() {
        let path = Path::new("/absolute/path/file.txt");
        let normalized = normalize_path(path);
        assert!(normalized.is_absolute());
    }

    #[test]
    fn test_normalize_path_relative() {
        let path = Path::new("relative/path/file.txt");
        let normalized = normalize_path(path);
        assert!(normalized.is_absolute());
    }

    #[test]
    fn test_normalize_missing_path_cleans_dots() {
        let normalized = normalize_path(Path::new("/nonexistent/a/./b/../c.js"));
        assert_eq!(normalized, PathBuf::from("/nonexistent/a/c.js"));
    }

    #[test]
    fn test_is_within() {
        let roots = vec![PathBuf::from("/app/assets"), PathBuf::from("/vendor")];
        assert!(is_within(Path::new("/app/assets/js/a.js"), &roots));
        assert!(is_within(Path::new("/vendor/lib.js"), &roots));
        assert!(!is_within(Path::new("/app/other/a.js"), &roots));
        // Component-wise, not string prefix
        assert!(!is_within(Path::new("/vendored/lib.js"), &roots));
    }

    #[test]
    fn test_split_root() {
        let roots = vec![PathBuf::from("/app"), PathBuf::from("/vendor")];
        let (idx, rel) = split_root(Path::new("/vendor/js/lib.js"), &roots).unwrap();
        assert_eq!(idx, 1);
        assert_eq!(rel, Path::new("js/lib.js"));
        assert!(split_root(Path::new("/elsewhere/x.js"), &roots).is_none());
    }
}
