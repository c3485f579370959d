//! Comment syntax table entries.

use serde::{Deserialize, Serialize};

/// Comment markers for one source extension.
///
/// ```toml
/// [comments.coffee]
/// line = ["#"]
/// block = [["###", "###"]]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommentSyntax {
    /// Single-line comment prefixes (`//`, `#`).
    pub line: Vec<String>,
    /// Block comment delimiters as `[open, close]` pairs (`/*`, `*/`).
    pub block: Vec<(String, String)>,
}

impl CommentSyntax {
    /// `//` line comments and `/* */` blocks.
    pub fn c_style() -> Self {
        Self {
            line: vec!["//".into()],
            block: vec![("/*".into(), "*/".into())],
        }
    }

    /// `/* */` blocks only.
    pub fn block_only() -> Self {
        Self {
            line: Vec::new(),
            block: vec![("/*".into(), "*/".into())],
        }
    }

    /// `#` line comments and `###` blocks.
    pub fn hash() -> Self {
        Self {
            line: vec!["#".into()],
            block: vec![("###".into(), "###".into())],
        }
    }

    /// Line prefix this line starts with, longest match first.
    pub(crate) fn line_prefix<'a>(&'a self, line: &str) -> Option<&'a str> {
        self.line
            .iter()
            .filter(|p| line.starts_with(p.as_str()))
            .max_by_key(|p| p.len())
            .map(String::as_str)
    }

    /// Block delimiters whose opening marker starts this line.
    pub(crate) fn block_open<'a>(&'a self, line: &str) -> Option<(&'a str, &'a str)> {
        self.block
            .iter()
            .filter(|(open, _)| line.starts_with(open.as_str()))
            .max_by_key(|(open, _)| open.len())
            .map(|(open, close)| (open.as_str(), close.as_str()))
    }
}
