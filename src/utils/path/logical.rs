//! Extension chains and logical paths.
//!
//! A file name like `application.js.erb` carries an extension chain
//! `["js", "erb"]`. Trailing processing suffixes (`erb`) are stripped to
//! find the format extension (`js`) and the logical path
//! (`application.js`).

use std::path::Path;

/// Extensions following the first dot of the file name, in order.
///
/// A leading dot (dotfiles) does not start the chain.
pub fn extension_chain(path: &Path) -> Vec<&str> {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return Vec::new();
    };
    let name = name.strip_prefix('.').unwrap_or(name);
    name.split('.').skip(1).filter(|e| !e.is_empty()).collect()
}

/// Drop trailing extensions that are recognized processing suffixes.
pub fn strip_processing_suffixes<'a, 'b>(
    mut chain: &'b [&'a str],
    suffixes: &[String],
) -> &'b [&'a str] {
    while let Some((last, rest)) = chain.split_last() {
        if !suffixes.iter().any(|s| s.eq_ignore_ascii_case(last)) {
            break;
        }
        chain = rest;
    }
    chain
}

/// Format extension of a file: the last extension left after stripping
/// processing suffixes, lowercased.
pub fn format_extension(path: &Path, suffixes: &[String]) -> Option<String> {
    let chain = extension_chain(path);
    strip_processing_suffixes(&chain, suffixes)
        .last()
        .map(|ext| ext.to_ascii_lowercase())
}

/// Logical path for a file relative to its root: forward slashes, with the
/// processing suffixes removed from the file name.
pub fn logical_path(relative: &Path, suffixes: &[String]) -> String {
    let mut parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();

    if let Some(name) = parts.pop() {
        let chain = extension_chain(Path::new(&name));
        let kept = strip_processing_suffixes(&chain, suffixes).len();
        let stripped = chain.len() - kept;
        let mut trimmed = name.as_str();
        for _ in 0..stripped {
            if let Some(idx) = trimmed.rfind('.') {
                trimmed = &trimmed[..idx];
            }
        }
        parts.push(trimmed.to_string());
    }

    parts.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn suffixes() -> Vec<String> {
        vec!["erb".into(), "str".into()]
    }

    #[test]
    fn test_extension_chain() {
        assert_eq!(extension_chain(Path::new("app.js.erb")), vec!["js", "erb"]);
        assert_eq!(extension_chain(Path::new("dir/app.js")), vec!["js"]);
        assert!(extension_chain(Path::new("Makefile")).is_empty());
        assert_eq!(extension_chain(Path::new(".env.js")), vec!["js"]);
    }

    #[test]
    fn test_format_extension() {
        assert_eq!(
            format_extension(Path::new("app.js.erb"), &suffixes()),
            Some("js".into())
        );
        assert_eq!(
            format_extension(Path::new("app.CSS"), &suffixes()),
            Some("css".into())
        );
        assert_eq!(format_extension(Path::new("template.erb"), &suffixes()), None);
    }

    #[test]
    fn test_logical_path() {
        assert_eq!(
            logical_path(Path::new("views/users.js.erb"), &suffixes()),
            "views/users.js"
        );
        assert_eq!(
            logical_path(Path::new("application.js"), &suffixes()),
            "application.js"
        );
        assert_eq!(
            logical_path(Path::new("a.js.str.erb"), &suffixes()),
            "a.js"
        );
    }
}
