//! Path utilities.
//!
//! Pure functions for path manipulation. No side effects beyond
//! `canonicalize` lookups.
//!
//! - [`fs`]: Filesystem path normalization (`normalize_path`, `is_within`, `split_root`)
//! - [`logical`]: Extension chains and logical paths

pub mod fs;
pub mod logical;

pub use fs::{is_within, normalize_path, split_root};
pub use logical::{extension_chain, format_extension, logical_path, strip_processing_suffixes};
