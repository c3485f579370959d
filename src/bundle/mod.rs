//! Bundle assembly.
//!
//! Walks a [`DependencyGraph`] from its root and flattens it into the
//! ordered contributor list, the concatenated source, the bundle digest and
//! the set of filesystem targets the result depends on.

use rustc_hash::FxHashSet;
use std::path::{Path, PathBuf};

use crate::asset::{Asset, AssetDependency, Contributor};
use crate::environment::Environment;
use crate::error::{BundleError, Result};
use crate::freshness::{ContentHash, TrackedTarget, mtime};
use crate::graph::{DependencyGraph, EdgeKind, SourceNode};

/// Flattened result of one graph walk.
#[derive(Debug, Clone)]
pub struct Bundle {
    /// Contributors, requires before requirers, each exactly once.
    pub contributors: Vec<Contributor>,
    /// Position of the root among `contributors`.
    pub self_index: usize,
    pub source: String,
    pub digest: ContentHash,
    /// Deduplicated by path, first occurrence wins.
    pub targets: Vec<TrackedTarget>,
    pub asset_dependencies: Vec<AssetDependency>,
}

/// Assemble the bundle rooted at `graph.root()`.
///
/// `asset_for` builds the asset named by a `depend_on_asset` edge; its
/// digest and tracked targets are folded into this bundle.
pub fn assemble<F>(graph: &DependencyGraph, env: &Environment, mut asset_for: F) -> Result<Bundle>
where
    F: FnMut(&Path) -> Result<Asset>,
{
    let order = contributor_order(graph)?;
    let root = graph.root();

    let self_index = order.iter().position(|n| n.path == root).unwrap_or_default();
    let source = join_bodies(&order);

    // Contributor files first so their snapshot wins over any later
    // occurrence of the same path
    let mut targets = TargetSet::default();
    for node in &order {
        targets.push(TrackedTarget::file(node.path.clone(), node.mtime, node.digest));
    }

    let mut asset_dependencies = Vec::new();
    for node in &order {
        for edge in graph.edges(&node.path) {
            match edge.kind {
                EdgeKind::DependOn => targets.push(capture_file(&edge.target, env)?),
                EdgeKind::Directory => {
                    let target = TrackedTarget::probe_directory(&edge.target, env.resolver())
                        .map_err(|err| BundleError::io(&edge.target, err))?;
                    targets.push(target);
                }
                EdgeKind::DependOnAsset => {
                    let asset = asset_for(&edge.target)?;
                    asset_dependencies.push(AssetDependency {
                        logical_path: asset.logical_path().to_string(),
                        digest: asset.digest(),
                    });
                    for target in asset.targets() {
                        targets.push(target.clone());
                    }
                }
                EdgeKind::Require | EdgeKind::SelfMarker => {}
            }
        }
    }

    let contributors: Vec<Contributor> = order.iter().map(|n| Contributor::from_node(n)).collect();
    let digest = bundle_digest(&source, &contributors, &asset_dependencies);

    Ok(Bundle {
        contributors,
        self_index,
        source,
        digest,
        targets: targets.into_vec(),
        asset_dependencies,
    })
}

/// Depth-first, first-encounter order. A node's own body goes at its
/// `require_self` marker, or after all of its requires.
fn contributor_order(graph: &DependencyGraph) -> Result<Vec<&SourceNode>> {
    let node_at = |path: &Path| {
        graph
            .node(path)
            .ok_or_else(|| BundleError::not_found(path.display().to_string(), None))
    };

    let root = graph.root();
    let mut order = Vec::with_capacity(graph.len());
    let mut visited: FxHashSet<&Path> = FxHashSet::default();
    let mut stack: Vec<(&Path, usize)> = vec![(root, 0)];
    visited.insert(root);

    while let Some(top) = stack.last_mut() {
        let (path, next) = *top;
        top.1 += 1;

        let edges = graph.edges(path);
        let Some(edge) = edges.get(next) else {
            if !edges.iter().any(|e| e.kind == EdgeKind::SelfMarker) {
                order.push(node_at(path)?);
            }
            stack.pop();
            continue;
        };

        match edge.kind {
            EdgeKind::Require => {
                if visited.insert(edge.target.as_path()) {
                    stack.push((edge.target.as_path(), 0));
                }
            }
            EdgeKind::SelfMarker => order.push(node_at(path)?),
            _ => {}
        }
    }

    Ok(order)
}

/// Concatenate contributor bodies.
///
/// A lone contributor is passed through untouched. Otherwise each segment
/// loses its trailing newlines, gains exactly one, and segments are
/// separated by a blank line. Segments left empty are skipped.
fn join_bodies(order: &[&SourceNode]) -> String {
    if let [only] = order {
        return only.body.clone();
    }

    let segments: Vec<&str> = order
        .iter()
        .map(|n| n.body.trim_end_matches(['\n', '\r']))
        .filter(|s| !s.is_empty())
        .collect();

    let mut source = String::with_capacity(segments.iter().map(|s| s.len() + 2).sum());
    for (i, segment) in segments.iter().enumerate() {
        if i > 0 {
            source.push('\n');
        }
        source.push_str(segment);
        source.push('\n');
    }
    source
}

fn bundle_digest(
    source: &str,
    contributors: &[Contributor],
    asset_dependencies: &[AssetDependency],
) -> ContentHash {
    let mut hasher = blake3::Hasher::new();
    hasher.update(source.as_bytes());
    for contributor in contributors {
        hasher.update(contributor.digest.as_bytes());
    }
    for dep in asset_dependencies {
        hasher.update(dep.digest.as_bytes());
    }
    hasher.finalize().into()
}

/// Snapshot a `depend_on` file. Stat before hashing.
fn capture_file(path: &Path, env: &Environment) -> Result<TrackedTarget> {
    let resolver = env.resolver();
    let stat = resolver.stat(path);
    let Some(current) = stat.mtime.filter(|_| stat.is_file()) else {
        return Err(BundleError::not_found(path.display().to_string(), None));
    };
    let current = mtime::truncate(current);
    let digest = resolver
        .digest(path)
        .map_err(|err| BundleError::io(path, err))?;
    Ok(TrackedTarget::file(path.to_path_buf(), current, digest))
}

#[derive(Default)]
struct TargetSet {
    seen: FxHashSet<PathBuf>,
    targets: Vec<TrackedTarget>,
}

impl TargetSet {
    fn push(&mut self, target: TrackedTarget) {
        if self.seen.insert(target.path.clone()) {
            self.targets.push(target);
        }
    }

    fn into_vec(self) -> Vec<TrackedTarget> {
        self.targets
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BundleConfig;
    use crate::graph::DependencyGraphBuilder;
    use std::fs;
    use tempfile::TempDir;

    fn setup(files: &[(&str, &str)]) -> (TempDir, Environment) {
        let dir = TempDir::new().unwrap();
        for (name, content) in files {
            let path = dir.path().join(name);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }
        let env = Environment::new(BundleConfig::new([dir.path()]));
        (dir, env)
    }

    fn bundle(env: &Environment, name: &str) -> Bundle {
        let root = env.config().roots[0].join(name);
        let graph = DependencyGraphBuilder::new(env).build(&root).unwrap();
        assemble(&graph, env, |_| panic!("no asset dependencies expected")).unwrap()
    }

    fn logical_paths(bundle: &Bundle) -> Vec<&str> {
        bundle
            .contributors
            .iter()
            .map(|c| c.logical_path.as_str())
            .collect()
    }

    #[test]
    fn test_requires_before_self() {
        let (_dir, env) = setup(&[
            ("application.js", "//= require project\n//= require users\napp();\n"),
            ("project.js", "project();\n"),
            ("users.js", "users();\n"),
        ]);
        let b = bundle(&env, "application.js");
        assert_eq!(logical_paths(&b), vec!["project.js", "users.js", "application.js"]);
        assert_eq!(b.self_index, 2);
        assert_eq!(b.source, "project();\n\nusers();\n\napp();\n");
    }

    #[test]
    fn test_require_self_marker_position() {
        let (_dir, env) = setup(&[
            ("app.js", "//= require a\n//= require_self\n//= require b\nmain();\n"),
            ("a.js", "a();\n"),
            ("b.js", "b();\n"),
        ]);
        let b = bundle(&env, "app.js");
        assert_eq!(logical_paths(&b), vec!["a.js", "app.js", "b.js"]);
        assert_eq!(b.self_index, 1);
        assert_eq!(b.source, "a();\n\nmain();\n\nb();\n");
    }

    #[test]
    fn test_require_once_at_first_encounter() {
        let (_dir, env) = setup(&[
            ("app.js", "//= require a\n//= require b\n//= require shared\n"),
            ("a.js", "//= require shared\na();\n"),
            ("b.js", "//= require shared\nb();\n"),
            ("shared.js", "shared();\n"),
        ]);
        let b = bundle(&env, "app.js");
        assert_eq!(logical_paths(&b), vec!["shared.js", "a.js", "b.js", "app.js"]);
    }

    #[test]
    fn test_single_contributor_passthrough() {
        let (_dir, env) = setup(&[("plain.js", "plain();\n\n\n")]);
        let b = bundle(&env, "plain.js");
        assert_eq!(b.contributors.len(), 1);
        assert_eq!(b.source, "plain();\n\n\n");
    }

    #[test]
    fn test_empty_segments_skipped() {
        let (_dir, env) = setup(&[
            ("app.js", "//= require empty\n//= require a\n"),
            ("empty.js", "\n\n"),
            ("a.js", "a();"),
        ]);
        let b = bundle(&env, "app.js");
        assert_eq!(b.source, "a();\n");
    }

    #[test]
    fn test_targets_deduplicated() {
        let (_dir, env) = setup(&[
            ("app.js", "//= require a\n//= depend_on a.js\n//= depend_on data.json\n"),
            ("a.js", "a();\n"),
            ("data.json", "{}"),
        ]);
        let b = bundle(&env, "app.js");
        let root = &env.config().roots[0];
        let paths: Vec<_> = b.targets.iter().map(|t| t.path.clone()).collect();
        assert_eq!(paths, vec![root.join("a.js"), root.join("app.js"), root.join("data.json")]);
    }

    #[test]
    fn test_digest_covers_depend_on_asset() {
        let (_dir, env) = setup(&[("app.js", "//= depend_on_asset other.js\napp();\n"), ("other.js", "")]);
        let root = env.config().roots[0].join("app.js");
        let graph = DependencyGraphBuilder::new(&env).build(&root).unwrap();

        let other = env.config().roots[0].join("other.js");
        let mut calls = Vec::new();
        let b = assemble(&graph, &env, |path| {
            calls.push(path.to_path_buf());
            env.find_asset("other.js", &crate::cache::AssetCache::memory())
        })
        .unwrap();

        assert_eq!(calls, vec![other.clone()]);
        assert_eq!(b.asset_dependencies.len(), 1);
        assert_eq!(b.asset_dependencies[0].logical_path, "other.js");
        assert!(b.targets.iter().any(|t| t.path == other));
    }
}
