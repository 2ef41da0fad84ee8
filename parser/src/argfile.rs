//! Argument-file expansion.
//!
//! A token made of the configured prefix (default `@`) followed by a path is
//! replaced in place by the arguments read from that file, which are expanded
//! again in turn. `@@path` stands for the literal token `@path`. Paths are
//! resolved against the current working directory.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use argtree_core::{ArgFileFormat, ParserConfig};
use tracing::debug;

use crate::error::{ParseError, ParseErrorKind, Result};
use crate::shell;

/// Expands every argument-file token in `args`.
///
/// Returns `args` unchanged when argument files are disabled or none of the
/// tokens is a trigger.
///
/// # Errors
///
/// Argument-file errors carry `args` as given and the index of the top-level
/// token whose expansion failed.
///
/// # Examples
///
/// ```
/// use argtree_core::ParserConfig;
/// use argtree_parser::expand_args;
///
/// let args = vec!["--flag".to_string(), "@@literal".to_string()];
/// let expanded = expand_args(&args, &ParserConfig::default()).unwrap();
/// assert_eq!(expanded, ["--flag", "@literal"]);
/// ```
pub fn expand_args(args: &[String], config: &ParserConfig) -> Result<Vec<String>> {
    let Some(prefix) = config.argfile_prefix() else {
        return Ok(args.to_vec());
    };

    let mut out = Vec::with_capacity(args.len());
    let mut chain = Vec::new();
    for (index, arg) in args.iter().enumerate() {
        expand_token(arg, prefix, config, &mut chain, &mut out)
            .map_err(|kind| ParseError::new(kind, args.to_vec(), index, Vec::new()))?;
    }
    Ok(out)
}

enum Token<'a> {
    Literal(&'a str),
    File(&'a str),
}

fn classify(token: &str, prefix: char) -> Token<'_> {
    match token.strip_prefix(prefix) {
        Some("") | None => Token::Literal(token),
        Some(rest) if rest.starts_with(prefix) => Token::Literal(rest),
        Some(path) => Token::File(path),
    }
}

/// `chain` holds the files currently being expanded, outermost first; its
/// length is the depth of `token`.
fn expand_token(
    token: &str,
    prefix: char,
    config: &ParserConfig,
    chain: &mut Vec<PathBuf>,
    out: &mut Vec<String>,
) -> std::result::Result<(), ParseErrorKind> {
    let path = match classify(token, prefix) {
        Token::Literal(literal) => {
            out.push(literal.to_string());
            return Ok(());
        }
        Token::File(path) => resolve_path(path),
    };

    let max_depth = config.max_argfile_depth();
    if chain.len() >= max_depth || chain.contains(&path) {
        let mut files = chain.clone();
        files.push(path);
        return Err(ParseErrorKind::ArgFileRecursion {
            chain: files,
            max_depth,
        });
    }

    let tokens = read_tokens(&path, config)?;
    debug!(
        path = %path.display(),
        depth = chain.len() + 1,
        count = tokens.len(),
        "Expanding argument file"
    );

    chain.push(path);
    for inner in &tokens {
        expand_token(inner, prefix, config, chain, out)?;
    }
    chain.pop();
    Ok(())
}

fn resolve_path(path: &str) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| PathBuf::from(path))
}

fn read_tokens(
    path: &Path,
    config: &ParserConfig,
) -> std::result::Result<Vec<String>, ParseErrorKind> {
    let bytes = fs::read(path).map_err(|err| match err.kind() {
        ErrorKind::NotFound => ParseErrorKind::ArgFileNotFound {
            path: path.to_path_buf(),
        },
        _ => ParseErrorKind::ArgFileUnreadable {
            path: path.to_path_buf(),
            reason: err.to_string(),
        },
    })?;

    let text = String::from_utf8(bytes).map_err(|err| {
        let valid = &err.as_bytes()[..err.utf8_error().valid_up_to()];
        ParseErrorKind::ArgFileMalformed {
            path: path.to_path_buf(),
            line: valid.iter().filter(|&&b| b == b'\n').count() + 1,
            reason: "invalid UTF-8".to_string(),
        }
    })?;
    let text = text.strip_prefix('\u{feff}').unwrap_or(&text);

    match config.argfile_format() {
        ArgFileFormat::Line => Ok(split_lines(text, config.argfile_comment_char())),
        ArgFileFormat::Shell => shell::split(text, config.argfile_comment_char()).map_err(|err| {
            ParseErrorKind::ArgFileMalformed {
                path: path.to_path_buf(),
                line: err.line,
                reason: err.reason.to_string(),
            }
        }),
    }
}

/// One argument per non-blank line; `\n`, `\r\n` and `\r` all break lines.
fn split_lines(text: &str, comment: Option<char>) -> Vec<String> {
    text.split(['\r', '\n'])
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter(|line| comment.is_none_or(|c| !line.starts_with(c)))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_file(dir: &TempDir, name: &str, content: &[u8]) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(content).unwrap();
        path
    }

    fn args(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn trigger(path: &Path) -> String {
        format!("@{}", path.display())
    }

    #[test]
    fn test_line_format_trims_and_drops_comments() {
        let dir = TempDir::new().unwrap();
        let file = write_file(
            &dir,
            "args.txt",
            b"\xEF\xBB\xBF--verbose\r\n  # comment\n\n  --name  \rJohn Smith\n",
        );

        let input = args(&["a", &trigger(&file), "b"]);
        let expanded = expand_args(&input, &ParserConfig::default()).unwrap();
        assert_eq!(expanded, ["a", "--verbose", "--name", "John Smith", "b"]);
    }

    #[test]
    fn test_shell_format() {
        let dir = TempDir::new().unwrap();
        let file = write_file(&dir, "args.sh", b"--name 'John Smith' # who\n-v\n");
        let config = ParserConfig::builder()
            .argfile_format(ArgFileFormat::Shell)
            .build()
            .unwrap();

        let expanded = expand_args(&args(&[&trigger(&file)]), &config).unwrap();
        assert_eq!(expanded, ["--name", "John Smith", "-v"]);
    }

    #[test]
    fn test_escaped_and_bare_prefix_are_literal() {
        let config = ParserConfig::default();
        let expanded = expand_args(&args(&["@@file", "@", "x@y"]), &config).unwrap();
        assert_eq!(expanded, ["@file", "@", "x@y"]);
    }

    #[test]
    fn test_disabled_prefix_keeps_tokens() {
        let config = ParserConfig::builder().argfile_prefix(None).build().unwrap();
        let input = args(&["@missing.txt"]);
        assert_eq!(expand_args(&input, &config).unwrap(), input);
    }

    #[test]
    fn test_custom_prefix() {
        let dir = TempDir::new().unwrap();
        let file = write_file(&dir, "args.txt", b"-v\n");
        let config = ParserConfig::builder().argfile_prefix(Some('+')).build().unwrap();

        let token = format!("+{}", file.display());
        let expanded = expand_args(&args(&["@keep", &token]), &config).unwrap();
        assert_eq!(expanded, ["@keep", "-v"]);
    }

    #[test]
    fn test_missing_file_names_absolute_path() {
        let err = expand_args(&args(&["x", "@missing.txt"]), &ParserConfig::default()).unwrap_err();

        let ParseErrorKind::ArgFileNotFound { path } = &err.kind else {
            panic!("unexpected error: {err:?}");
        };
        assert!(path.is_absolute());
        assert!(path.ends_with("missing.txt"));
        assert_eq!(err.index, 1);
        assert!(err.command_path.is_empty());
    }

    #[test]
    fn test_nested_file_beyond_depth_is_recursion() {
        let dir = TempDir::new().unwrap();
        let inner = write_file(&dir, "inner.txt", b"-v\n");
        let outer = write_file(&dir, "outer.txt", trigger(&inner).as_bytes());

        let err = expand_args(&args(&[&trigger(&outer)]), &ParserConfig::default()).unwrap_err();
        assert_eq!(
            err.kind,
            ParseErrorKind::ArgFileRecursion {
                chain: vec![outer.clone(), inner.clone()],
                max_depth: 1,
            }
        );

        let deeper = ParserConfig::builder().max_argfile_depth(2).build().unwrap();
        assert_eq!(expand_args(&args(&[&trigger(&outer)]), &deeper).unwrap(), ["-v"]);
    }

    #[test]
    fn test_cycle_is_recursion() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("self.txt");
        fs::write(&path, trigger(&path)).unwrap();
        let config = ParserConfig::builder().max_argfile_depth(10).build().unwrap();

        let err = expand_args(&args(&[&trigger(&path)]), &config).unwrap_err();
        assert_eq!(
            err.kind,
            ParseErrorKind::ArgFileRecursion {
                chain: vec![path.clone(), path],
                max_depth: 10,
            }
        );
    }

    #[test]
    fn test_invalid_utf8_is_malformed() {
        let dir = TempDir::new().unwrap();
        let file = write_file(&dir, "bad.txt", b"ok\nstill ok\n\xFF\n");

        let err = expand_args(&args(&[&trigger(&file)]), &ParserConfig::default()).unwrap_err();
        assert!(matches!(err.kind, ParseErrorKind::ArgFileMalformed { line: 3, .. }));
    }

    #[test]
    fn test_directory_is_unreadable() {
        let dir = TempDir::new().unwrap();
        let input = args(&[&trigger(dir.path())]);
        let err = expand_args(&input, &ParserConfig::default()).unwrap_err();
        assert!(matches!(err.kind, ParseErrorKind::ArgFileUnreadable { .. }));
    }

    #[test]
    fn test_expansion_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let file = write_file(&dir, "args.txt", b"--a\nb\n");
        let config = ParserConfig::default();

        let once = expand_args(&args(&["x", &trigger(&file)]), &config).unwrap();
        assert_eq!(expand_args(&once, &config).unwrap(), once);
    }
}
