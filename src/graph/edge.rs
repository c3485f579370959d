//! Dependency edges.

use std::path::PathBuf;

use crate::directive::DirectiveKind;

/// What an edge couples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeKind {
    /// Target's bundle is inlined before the source's own body.
    Require,
    /// Position of the source's own body among its requires.
    SelfMarker,
    /// Freshness coupling to one file. Not transitive.
    DependOn,
    /// Freshness coupling to a whole asset, including its targets.
    DependOnAsset,
    /// Freshness coupling to a directory listing expanded by
    /// `require_directory` or `require_tree`.
    Directory,
}

/// Directed edge `source -> target`. The source is the node owning the edge
/// list; a [`EdgeKind::SelfMarker`] edge targets the source itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyEdge {
    pub kind: EdgeKind,
    pub target: PathBuf,
}

impl DependencyEdge {
    pub fn new(kind: EdgeKind, target: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            target: target.into(),
        }
    }

    #[inline]
    pub fn is_require(&self) -> bool {
        self.kind == EdgeKind::Require
    }
}

impl EdgeKind {
    /// Edge kind produced directly by a single-target directive.
    pub fn for_directive(kind: DirectiveKind) -> Option<Self> {
        match kind {
            DirectiveKind::Require => Some(Self::Require),
            DirectiveKind::RequireSelf => Some(Self::SelfMarker),
            DirectiveKind::DependOn => Some(Self::DependOn),
            DirectiveKind::DependOnAsset => Some(Self::DependOnAsset),
            DirectiveKind::RequireDirectory | DirectiveKind::RequireTree => None,
        }
    }
}
