//! Dependency graph of one bundle.
//!
//! - `node`: one loaded source file
//! - `edge`: typed `source -> target` couplings
//! - `builder`: directive resolution, cycle detection, directory expansion

mod builder;
mod edge;
mod node;

pub use builder::DependencyGraphBuilder;
pub use edge::{DependencyEdge, EdgeKind};
pub use node::SourceNode;

use rustc_hash::FxHashMap;
use std::path::{Path, PathBuf};

/// Nodes reachable from one root through `require` edges, plus the ordered
/// edge list of each.
///
/// # Invariants
/// - Acyclic over `Require` edges
/// - Every `Require` target has a node of the root's content type
/// - At most one `SelfMarker` edge per node
#[derive(Debug, Default)]
pub struct DependencyGraph {
    root: PathBuf,
    nodes: FxHashMap<PathBuf, SourceNode>,
    edges: FxHashMap<PathBuf, Vec<DependencyEdge>>,
}

impl DependencyGraph {
    #[inline]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[inline]
    pub fn root_node(&self) -> Option<&SourceNode> {
        self.nodes.get(&self.root)
    }

    #[inline]
    pub fn node(&self, path: &Path) -> Option<&SourceNode> {
        self.nodes.get(path)
    }

    /// Ordered edges of a node (empty for unknown paths).
    pub fn edges(&self, path: &Path) -> &[DependencyEdge] {
        self.edges.get(path).map(Vec::as_slice).unwrap_or_default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
