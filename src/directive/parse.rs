//! Directive header scanning.

use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

use super::{CommentSyntax, Directive, DirectiveHeader, DirectiveKind};
use crate::error::{BundleError, Result};

/// `= keyword [argument]`, after the comment marker.
/// Leading decoration such as the ` * ` of block comment bodies is skipped.
static DIRECTIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^A-Za-z0-9_]*?=[ \t]*([A-Za-z0-9_]+)(?:[ \t]+(.*?))?[ \t]*$")
        .expect("directive pattern is valid")
});

/// One header line, classified.
struct HeaderLine<'a> {
    /// Text after the comment marker, used for directive matching.
    content: &'a str,
    /// Marker text that must survive if the line is dropped as a directive
    /// (an unclosed block opener or a block closer).
    keep: Option<&'a str>,
}

/// Scan the leading comment block of `source` for directives.
///
/// `path` is used for error reporting only.
pub fn parse(path: &Path, source: &str, syntax: &CommentSyntax) -> Result<DirectiveHeader> {
    let mut directives = Vec::new();
    let mut processed = String::with_capacity(source.len());
    let mut header_end = 0;
    let mut offset = 0;
    let mut open_block: Option<&str> = None;

    for (idx, raw_line) in source.split_inclusive('\n').enumerate() {
        let text = raw_line.trim_end_matches(['\n', '\r']);
        let trimmed = text.trim_start();

        let line = if let Some(close) = open_block {
            match trimmed.find(close) {
                // Code after the closer ends the header
                Some(pos) if !trimmed[pos + close.len()..].trim().is_empty() => break,
                Some(pos) => {
                    open_block = None;
                    HeaderLine {
                        content: &trimmed[..pos],
                        keep: Some(close),
                    }
                }
                None => HeaderLine {
                    content: trimmed,
                    keep: None,
                },
            }
        } else if trimmed.is_empty() {
            processed.push_str(raw_line);
            offset += raw_line.len();
            continue;
        } else {
            // Longest marker wins, so `###` opens a block even though `#`
            // is also a line prefix.
            let prefix = syntax.line_prefix(trimmed);
            let block = syntax
                .block_open(trimmed)
                .filter(|(open, _)| prefix.is_none_or(|p| open.len() > p.len()));

            if let Some((open, close)) = block {
                let rest = &trimmed[open.len()..];
                match rest.find(close) {
                    Some(pos) if !rest[pos + close.len()..].trim().is_empty() => break,
                    Some(pos) => HeaderLine {
                        content: &rest[..pos],
                        keep: None,
                    },
                    None => {
                        open_block = Some(close);
                        HeaderLine {
                            content: rest,
                            keep: Some(open),
                        }
                    }
                }
            } else if let Some(prefix) = prefix {
                HeaderLine {
                    content: &trimmed[prefix.len()..],
                    keep: None,
                }
            } else {
                break;
            }
        };

        offset += raw_line.len();
        header_end = offset;

        match parse_directive(path, line.content, idx + 1)? {
            Some(directive) => {
                directives.push(directive);
                if let Some(marker) = line.keep {
                    processed.push_str(marker);
                    processed.push('\n');
                }
            }
            None => processed.push_str(raw_line),
        }
    }

    processed.push_str(&source[offset..]);

    Ok(DirectiveHeader {
        directives,
        header_end,
        processed,
    })
}

/// Match one comment line against the directive grammar.
///
/// Returns `None` for plain comments and for unknown keywords.
fn parse_directive(path: &Path, content: &str, line: usize) -> Result<Option<Directive>> {
    let Some(caps) = DIRECTIVE.captures(content) else {
        return Ok(None);
    };
    let Some(kind) = DirectiveKind::from_keyword(&caps[1]) else {
        return Ok(None);
    };
    let argument = caps
        .get(2)
        .map(|m| unquote(m.as_str()).to_string())
        .filter(|a| !a.is_empty());

    let fail = |message: String| BundleError::DirectiveArgument {
        path: path.to_path_buf(),
        line,
        message,
    };

    let argument = match kind {
        DirectiveKind::Require | DirectiveKind::DependOn | DirectiveKind::DependOnAsset => {
            match argument {
                Some(arg) => Some(arg),
                None => return Err(fail(format!("{} requires a path argument", kind.keyword()))),
            }
        }
        DirectiveKind::RequireSelf => {
            if argument.is_some() {
                return Err(fail("require_self takes no argument".into()));
            }
            None
        }
        DirectiveKind::RequireDirectory | DirectiveKind::RequireTree => {
            let arg = argument.unwrap_or_else(|| ".".into());
            if !is_relative(&arg) {
                return Err(fail(format!(
                    "{} argument must be a relative path",
                    kind.keyword()
                )));
            }
            Some(arg)
        }
    };

    Ok(Some(Directive {
        kind,
        argument,
        line,
    }))
}

/// `.`, `..`, `./x`, `../x`
pub(crate) fn is_relative(arg: &str) -> bool {
    arg == "." || arg == ".." || arg.starts_with("./") || arg.starts_with("../")
}

fn unquote(arg: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = arg
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner;
        }
    }
    arg
}

#[cfg(test)]
mod tests {
    use super::*;

    fn js(source: &str) -> Result<DirectiveHeader> {
        parse(Path::new("/app/a.js"), source, &CommentSyntax::c_style())
    }

    fn kinds(header: &DirectiveHeader) -> Vec<(DirectiveKind, Option<&str>)> {
        header
            .directives
            .iter()
            .map(|d| (d.kind, d.argument.as_deref()))
            .collect()
    }

    #[test]
    fn test_line_comment_directives() {
        let source = "// Application bundle\n//= require project\n//= require \"users\"\n\nvar App = {};\n";
        let header = js(source).unwrap();

        assert_eq!(
            kinds(&header),
            vec![
                (DirectiveKind::Require, Some("project")),
                (DirectiveKind::Require, Some("users")),
            ]
        );
        assert_eq!(header.directives[0].line, 2);
        assert_eq!(header.processed, "// Application bundle\n\nvar App = {};\n");
        assert_eq!(&source[header.header_end..], "\nvar App = {};\n");
    }

    #[test]
    fn test_block_comment_directives() {
        let source = "/*\n *= require reset\n *= require_tree ./widgets\n *= require_self\n */\nbody {}\n";
        let header = parse(Path::new("/app/a.css"), source, &CommentSyntax::block_only()).unwrap();

        assert_eq!(
            kinds(&header),
            vec![
                (DirectiveKind::Require, Some("reset")),
                (DirectiveKind::RequireTree, Some("./widgets")),
                (DirectiveKind::RequireSelf, None),
            ]
        );
        assert_eq!(header.processed, "/*\n */\nbody {}\n");
    }

    #[test]
    fn test_hash_comment_directives() {
        let source = "#= require_directory\n###\n#= depend_on config.yml\n###\nx = 1\n";
        let header = parse(Path::new("/app/a.coffee"), source, &CommentSyntax::hash()).unwrap();

        assert_eq!(
            kinds(&header),
            vec![
                (DirectiveKind::RequireDirectory, Some(".")),
                (DirectiveKind::DependOn, Some("config.yml")),
            ]
        );
        assert_eq!(header.processed, "###\n###\nx = 1\n");
    }

    #[test]
    fn test_stops_at_first_code_line() {
        let header = js("var a = 1;\n//= require late\n").unwrap();
        assert!(header.directives.is_empty());
        assert_eq!(header.header_end, 0);
        assert_eq!(header.processed, "var a = 1;\n//= require late\n");
    }

    #[test]
    fn test_code_after_block_closer_ends_header() {
        let header = js("/* c */ var x;\n//= require late\n").unwrap();
        assert!(header.directives.is_empty());
        assert_eq!(header.header_end, 0);
        assert_eq!(header.processed, "/* c */ var x;\n//= require late\n");

        let source = "/*\n *= require a\n */ var x;\n//= require b\n";
        let header = js(source).unwrap();
        assert_eq!(kinds(&header), vec![(DirectiveKind::Require, Some("a"))]);
        assert_eq!(header.processed, "/*\n */ var x;\n//= require b\n");
    }

    #[test]
    fn test_non_ascii_comment_text() {
        let header = js("// Grüße = ☃\n//= require café\nx();\n").unwrap();
        assert_eq!(kinds(&header), vec![(DirectiveKind::Require, Some("café"))]);
        assert_eq!(header.processed, "// Grüße = ☃\nx();\n");
    }

    #[test]
    fn test_unknown_directive_is_kept() {
        let header = js("//= stub jquery\n//= require app\nx();\n").unwrap();
        assert_eq!(kinds(&header), vec![(DirectiveKind::Require, Some("app"))]);
        assert_eq!(header.processed, "//= stub jquery\nx();\n");
    }

    #[test]
    fn test_plain_comment_with_equals_is_not_directive() {
        let header = js("// a = b\n// == notes ==\nx();\n").unwrap();
        assert!(header.directives.is_empty());
        assert_eq!(header.processed, "// a = b\n// == notes ==\nx();\n");
    }

    #[test]
    fn test_missing_argument() {
        let err = js("//= require\n").unwrap_err();
        assert!(matches!(err, BundleError::DirectiveArgument { line: 1, .. }));

        let err = js("//= depend_on_asset\n").unwrap_err();
        assert!(matches!(err, BundleError::DirectiveArgument { .. }));
    }

    #[test]
    fn test_tree_rejects_logical_path() {
        let err = js("//= require_tree vendor/plugins\n").unwrap_err();
        match err {
            BundleError::DirectiveArgument { message, .. } => {
                assert!(message.contains("relative path"));
            }
            other => panic!("unexpected error: {other}"),
        }

        let err = js("//= require_directory lib\n").unwrap_err();
        assert!(matches!(err, BundleError::DirectiveArgument { .. }));

        assert!(js("//= require_tree ../shared\n").is_ok());
    }

    #[test]
    fn test_require_self_with_argument() {
        assert!(js("//= require_self now\n").is_err());
    }

    #[test]
    fn test_empty_source() {
        let header = js("").unwrap();
        assert!(header.directives.is_empty());
        assert_eq!(header.processed, "");
    }

    #[test]
    fn test_crlf_lines() {
        let header = js("//= require a\r\nx();\r\n").unwrap();
        assert_eq!(kinds(&header), vec![(DirectiveKind::Require, Some("a"))]);
        assert_eq!(header.processed, "x();\r\n");
    }
}
