//! Filesystem-backed resolver.

use jwalk::WalkDir;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::{PathResolver, Stat};
use crate::directive::is_relative;
use crate::freshness::{ContentHash, hash_file};
use crate::utils::path::{is_within, normalize_path};

/// Resolver over the real filesystem.
///
/// Lookups try the exact path first, then extension completion: `users`
/// matches `users.js`, `application.js` matches `application.js.erb`. When
/// several files complete the same name the first in sorted order wins.
/// Hidden entries (leading `.`) are never listed or completed.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsResolver;

impl FsResolver {
    pub fn new() -> Self {
        Self
    }

    fn lookup(&self, candidate: &Path, roots: &[PathBuf]) -> Option<PathBuf> {
        let candidate = normalize_path(candidate);

        if candidate.exists() {
            return is_within(&candidate, roots).then_some(candidate);
        }

        let parent = candidate.parent()?;
        let name = candidate.file_name()?.to_str()?;
        let prefix = format!("{name}.");

        self.list_children(parent, false)
            .into_iter()
            .filter(|p| p.is_file())
            .find(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with(&prefix))
            })
            .map(|p| normalize_path(&p))
            .filter(|p| is_within(p, roots))
    }
}

impl PathResolver for FsResolver {
    fn resolve(&self, path: &str, from_dir: Option<&Path>, roots: &[PathBuf]) -> Option<PathBuf> {
        if path.is_empty() {
            return None;
        }

        let as_path = Path::new(path);
        if as_path.is_absolute() {
            return self.lookup(as_path, roots);
        }

        match from_dir {
            Some(dir) if is_relative(path) => self.lookup(&dir.join(path), roots),
            _ => roots
                .iter()
                .find_map(|root| self.lookup(&root.join(path), roots)),
        }
    }

    fn list_children(&self, dir: &Path, recursive: bool) -> Vec<PathBuf> {
        let mut entries: Vec<PathBuf> = if recursive {
            WalkDir::new(dir)
                .skip_hidden(true)
                .into_iter()
                .filter_map(Result::ok)
                .filter(|e| e.depth() > 0)
                .map(|e| e.path())
                .collect()
        } else {
            let Ok(read) = fs::read_dir(dir) else {
                return Vec::new();
            };
            read.filter_map(Result::ok)
                .filter(|e| !e.file_name().to_string_lossy().starts_with('.'))
                .map(|e| e.path())
                .collect()
        };
        entries.sort();
        entries
    }

    fn stat(&self, path: &Path) -> Stat {
        match fs::metadata(path) {
            Ok(meta) => Stat {
                exists: true,
                is_dir: meta.is_dir(),
                mtime: meta.modified().ok(),
            },
            Err(_) => Stat::missing(),
        }
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        fs::read(path)
    }

    fn digest(&self, path: &Path) -> io::Result<ContentHash> {
        hash_file(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup() -> (TempDir, Vec<PathBuf>) {
        let dir = TempDir::new().unwrap();
        let root = normalize_path(dir.path()).join("assets");
        fs::create_dir_all(root.join("views/nested")).unwrap();
        fs::write(root.join("application.js.erb"), "app").unwrap();
        fs::write(root.join("users.js"), "users").unwrap();
        fs::write(root.join("views/a.js"), "a").unwrap();
        fs::write(root.join("views/nested/b.js"), "b").unwrap();
        fs::write(root.join("views/.hidden.js"), "h").unwrap();
        fs::write(normalize_path(dir.path()).join("outside.js"), "o").unwrap();
        (dir, vec![root])
    }

    #[test]
    fn test_resolve_exact_and_completion() {
        let (_dir, roots) = setup();
        let resolver = FsResolver::new();

        assert_eq!(
            resolver.resolve("users.js", None, &roots),
            Some(roots[0].join("users.js"))
        );
        assert_eq!(
            resolver.resolve("users", None, &roots),
            Some(roots[0].join("users.js"))
        );
        assert_eq!(
            resolver.resolve("application.js", None, &roots),
            Some(roots[0].join("application.js.erb"))
        );
        assert_eq!(resolver.resolve("missing.js", None, &roots), None);
        assert_eq!(resolver.resolve("", None, &roots), None);
    }

    #[test]
    fn test_resolve_relative() {
        let (_dir, roots) = setup();
        let resolver = FsResolver::new();
        let views = roots[0].join("views");

        assert_eq!(
            resolver.resolve("./nested/b", Some(&views), &roots),
            Some(views.join("nested/b.js"))
        );
        assert_eq!(
            resolver.resolve("../users", Some(&views), &roots),
            Some(roots[0].join("users.js"))
        );
        assert_eq!(resolver.resolve(".", Some(&views), &roots), Some(views.clone()));
    }

    #[test]
    fn test_resolve_rejects_outside_roots() {
        let (_dir, roots) = setup();
        let resolver = FsResolver::new();
        assert_eq!(resolver.resolve("../outside.js", Some(&roots[0]), &roots), None);
        let outside = roots[0].parent().unwrap().join("outside.js");
        assert_eq!(resolver.resolve(outside.to_str().unwrap(), None, &roots), None);
    }

    #[test]
    fn test_list_children() {
        let (_dir, roots) = setup();
        let resolver = FsResolver::new();
        let views = roots[0].join("views");

        assert_eq!(
            resolver.list_children(&views, false),
            vec![views.join("a.js"), views.join("nested")]
        );
        assert_eq!(
            resolver.list_children(&views, true),
            vec![
                views.join("a.js"),
                views.join("nested"),
                views.join("nested/b.js"),
            ]
        );
        assert!(resolver.list_children(&roots[0].join("nope"), false).is_empty());
    }

    #[test]
    fn test_stat() {
        let (_dir, roots) = setup();
        let resolver = FsResolver::new();

        let stat = resolver.stat(&roots[0].join("users.js"));
        assert!(stat.is_file());
        assert!(stat.mtime.is_some());

        assert!(resolver.stat(&roots[0].join("views")).is_dir);
        assert_eq!(resolver.stat(&roots[0].join("nope")), Stat::missing());
    }
}
