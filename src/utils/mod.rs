//! Shared helpers: path normalization and MIME lookup.

pub mod mime;
pub mod path;
