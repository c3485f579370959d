//! Graph construction.
//!
//! Depth-first over `require` edges with an explicit stack and a
//! white/gray/black color map keyed by canonical path. White nodes are
//! absent from the map.

use rayon::prelude::*;
use rustc_hash::FxHashMap;
use std::path::{Path, PathBuf};

use super::{DependencyEdge, DependencyGraph, EdgeKind, SourceNode};
use crate::directive::{Directive, DirectiveKind};
use crate::environment::Environment;
use crate::error::{BundleError, Result};
use crate::utils::path::normalize_path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    /// On the traversal stack.
    Gray,
    /// Fully expanded.
    Black,
}

struct Frame {
    path: PathBuf,
    edges: Vec<DependencyEdge>,
    next: usize,
}

/// Builds the [`DependencyGraph`] rooted at one source file.
pub struct DependencyGraphBuilder<'a> {
    env: &'a Environment,
    root_type: String,
    colors: FxHashMap<PathBuf, Color>,
    /// Nodes loaded ahead of traversal by directory expansion.
    loaded: FxHashMap<PathBuf, SourceNode>,
    graph: DependencyGraph,
}

impl<'a> DependencyGraphBuilder<'a> {
    pub fn new(env: &'a Environment) -> Self {
        Self {
            env,
            root_type: String::new(),
            colors: FxHashMap::default(),
            loaded: FxHashMap::default(),
            graph: DependencyGraph::default(),
        }
    }

    /// Load `root` and everything it requires.
    pub fn build(mut self, root: &Path) -> Result<DependencyGraph> {
        let node = SourceNode::load(root, self.env)?;
        self.root_type = node.content_type.clone();
        self.graph.root = node.path.clone();

        let mut stack = vec![self.enter(node)?];

        while let Some(frame) = stack.last_mut() {
            let Some(edge) = frame.edges.get(frame.next) else {
                let path = std::mem::take(&mut frame.path);
                let edges = std::mem::take(&mut frame.edges);
                stack.pop();
                self.colors.insert(path.clone(), Color::Black);
                self.graph.edges.insert(path, edges);
                continue;
            };
            frame.next += 1;
            if !edge.is_require() {
                continue;
            }
            let target = edge.target.clone();

            match self.colors.get(&target) {
                Some(Color::Gray) => return Err(BundleError::CircularDependency { path: target }),
                Some(Color::Black) => continue,
                None => {}
            }

            let node = match self.loaded.remove(&target) {
                Some(node) => node,
                None => SourceNode::load(&target, self.env)?,
            };
            self.check_type(&node)?;
            stack.push(self.enter(node)?);
        }

        crate::debug!("graph"; "{}: {} nodes", self.graph.root.display(), self.graph.len());
        Ok(self.graph)
    }

    // -------------------------------------------------------------------------
    // Private
    // -------------------------------------------------------------------------

    /// Resolve a node's edges, mark it gray and hand back its frame.
    fn enter(&mut self, node: SourceNode) -> Result<Frame> {
        let edges = self.resolve_edges(&node)?;
        let path = node.path.clone();
        self.colors.insert(path.clone(), Color::Gray);
        self.graph.nodes.insert(path.clone(), node);
        Ok(Frame {
            path,
            edges,
            next: 0,
        })
    }

    fn check_type(&self, node: &SourceNode) -> Result<()> {
        if node.content_type == self.root_type {
            return Ok(());
        }
        Err(BundleError::ContentTypeMismatch {
            path: node.path.clone(),
            expected: self.root_type.clone(),
            found: node.content_type.clone(),
        })
    }

    fn resolve_edges(&mut self, node: &SourceNode) -> Result<Vec<DependencyEdge>> {
        let mut edges = Vec::with_capacity(node.directives.len());
        let mut has_self = false;

        for directive in &node.directives {
            match directive.kind {
                DirectiveKind::RequireSelf => {
                    if has_self {
                        return Err(BundleError::MultipleRequireSelf {
                            path: node.path.clone(),
                        });
                    }
                    has_self = true;
                    edges.push(DependencyEdge::new(EdgeKind::SelfMarker, &node.path));
                }
                DirectiveKind::RequireDirectory | DirectiveKind::RequireTree => {
                    self.expand_directory(node, directive, &mut edges)?;
                }
                kind => {
                    let Some(edge_kind) = EdgeKind::for_directive(kind) else {
                        continue;
                    };
                    let arg = directive.argument.as_deref().ok_or_else(|| {
                        BundleError::DirectiveArgument {
                            path: node.path.clone(),
                            line: directive.line,
                            message: format!("{} requires an argument", kind.keyword()),
                        }
                    })?;
                    let target = self.resolve_file(node, arg)?;
                    edges.push(DependencyEdge::new(edge_kind, target));
                }
            }
        }

        Ok(edges)
    }

    /// Resolve a single-file argument. An argument without an extension tries
    /// the requiring file's format extension first.
    fn resolve_file(&self, node: &SourceNode, arg: &str) -> Result<PathBuf> {
        let config = self.env.config();
        let resolver = self.env.resolver();
        let from_dir = node.path.parent();

        let with_ext = match (Path::new(arg).extension(), config.format_extension(&node.path)) {
            (None, Some(ext)) => Some(format!("{arg}.{ext}")),
            _ => None,
        };

        with_ext
            .as_deref()
            .into_iter()
            .chain(std::iter::once(arg))
            .filter_map(|candidate| resolver.resolve(candidate, from_dir, &config.roots))
            .find(|path| resolver.stat(path).is_file())
            .ok_or_else(|| BundleError::not_found(arg, Some(node.path.clone())))
    }

    /// Expand `require_directory` / `require_tree` into directory couplings
    /// followed by sorted `require` edges.
    fn expand_directory(
        &mut self,
        node: &SourceNode,
        directive: &Directive,
        edges: &mut Vec<DependencyEdge>,
    ) -> Result<()> {
        let env = self.env;
        let config = env.config();
        let resolver = env.resolver();
        let arg = directive.argument.as_deref().unwrap_or(".");

        let dir = resolver
            .resolve(arg, node.path.parent(), &config.roots)
            .ok_or_else(|| BundleError::not_found(arg, Some(node.path.clone())))?;
        if !resolver.stat(&dir).is_dir {
            return Err(BundleError::DirectiveArgument {
                path: node.path.clone(),
                line: directive.line,
                message: format!("{} argument `{arg}` is not a directory", directive.kind.keyword()),
            });
        }

        let recursive = directive.kind == DirectiveKind::RequireTree;
        edges.push(DependencyEdge::new(EdgeKind::Directory, &dir));

        let mut files = Vec::new();
        for entry in resolver.list_children(&dir, recursive) {
            let stat = resolver.stat(&entry);
            if stat.is_dir {
                if recursive {
                    edges.push(DependencyEdge::new(EdgeKind::Directory, entry));
                }
            } else if stat.is_file() && config.is_directive_bearing(&entry) {
                let entry = normalize_path(&entry);
                if entry == node.path {
                    continue;
                }
                // Other content types are skipped by path, never loaded
                if config.content_type_for(&entry) == self.root_type {
                    files.push(entry);
                } else {
                    crate::debug!("graph"; "skipping {} in {}", entry.display(), dir.display());
                }
            }
        }

        self.preload(&files)?;

        for file in files {
            let content_type = self
                .graph
                .nodes
                .get(&file)
                .or_else(|| self.loaded.get(&file))
                .map(|n| n.content_type.as_str());
            if content_type == Some(self.root_type.as_str()) {
                edges.push(DependencyEdge::new(EdgeKind::Require, file));
            } else {
                crate::debug!("graph"; "skipping {} in {}", file.display(), dir.display());
            }
        }
        Ok(())
    }

    /// Load expansion candidates in parallel and merge them in sorted order.
    fn preload(&mut self, files: &[PathBuf]) -> Result<()> {
        let pending: Vec<&PathBuf> = files
            .iter()
            .filter(|p| !self.graph.nodes.contains_key(*p) && !self.loaded.contains_key(*p))
            .collect();
        if pending.is_empty() {
            return Ok(());
        }

        let env = self.env;
        let results: Vec<Result<SourceNode>> = pending
            .par_iter()
            .map(|path| SourceNode::load(path, env))
            .collect();

        for result in results {
            let node = result?;
            self.loaded.insert(node.path.clone(), node);
        }
        Ok(())
    }
}
