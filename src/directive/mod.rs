//! Comment-header directive language.
//!
//! Directives live in the leading comment block of a source file and use the
//! comment syntax registered for the file's extension:
//!
//! ```text
//! //= require jquery          (js, scss)
//!  *= require_tree ./widgets  (inside /* */)
//! #= require_self             (coffee)
//! ```
//!
//! One grammar serves every syntax; see [`parse`].

mod parse;
mod syntax;

pub use parse::parse;
pub(crate) use parse::is_relative;
pub use syntax::CommentSyntax;

/// Directive keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirectiveKind {
    Require,
    RequireDirectory,
    RequireTree,
    RequireSelf,
    DependOn,
    DependOnAsset,
}

impl DirectiveKind {
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Some(match keyword {
            "require" => Self::Require,
            "require_directory" => Self::RequireDirectory,
            "require_tree" => Self::RequireTree,
            "require_self" => Self::RequireSelf,
            "depend_on" => Self::DependOn,
            "depend_on_asset" => Self::DependOnAsset,
            _ => return None,
        })
    }

    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Require => "require",
            Self::RequireDirectory => "require_directory",
            Self::RequireTree => "require_tree",
            Self::RequireSelf => "require_self",
            Self::DependOn => "depend_on",
            Self::DependOnAsset => "depend_on_asset",
        }
    }
}

/// One parsed directive line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    pub kind: DirectiveKind,
    /// Raw argument, unquoted. Directory directives default to `.`;
    /// `require_self` never has one.
    pub argument: Option<String>,
    /// 1-based source line, for error reporting.
    pub line: usize,
}

/// Result of scanning a file's header.
#[derive(Debug, Clone, Default)]
pub struct DirectiveHeader {
    /// Directives in source order.
    pub directives: Vec<Directive>,
    /// Byte offset just past the last header comment line.
    pub header_end: usize,
    /// Source with directive lines removed; everything else untouched.
    pub processed: String,
}
