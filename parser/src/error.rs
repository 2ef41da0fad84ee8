//! Parse-time errors.
//!
//! Every failure carries the argument snapshot it was raised against, the
//! index of the offending token, and the command path traversed so far.
//! Construction-time failures ([`SpecError`]) live in `argtree-core`.

use std::path::PathBuf;

use argtree_core::{Arity, SpecError};
use thiserror::Error;

/// Why a dict token did not match the key grammar.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DictSyntaxError {
    #[error("missing key/value separator '{0}'")]
    MissingSeparator(char),
    #[error("empty key segment")]
    EmptySegment,
    #[error("dangling escape character")]
    DanglingEscape,
    #[error("invalid list index '{0}'")]
    InvalidIndex(String),
    #[error("unclosed list index bracket")]
    UnclosedBracket,
    #[error("unexpected '{0}' after list index")]
    TrailingAfterIndex(char),
    #[error("list index {index} leaves a gap (list has {len} items)")]
    IndexGap { index: usize, len: usize },
    #[error("list index {index} is more than {max_gap} past the end (list has {len} items)")]
    GapTooLarge {
        index: usize,
        len: usize,
        max_gap: usize,
    },
    #[error("key nests deeper than {0} segments")]
    TooDeep(usize),
}

/// Structured detail of a [`ParseError`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    #[error("unknown option '{name}'")]
    UnknownOption { name: String },

    #[error("ambiguous option '{name}': could be {}", .candidates.join(", "))]
    AmbiguousOption {
        name: String,
        candidates: Vec<String>,
    },

    #[error("ambiguous subcommand '{name}': could be {}", .candidates.join(", "))]
    AmbiguousSubcommand {
        name: String,
        candidates: Vec<String>,
    },

    /// An option occurrence or a positional got a value count outside its
    /// arity.
    #[error("'{name}' expects {expected} values, got {actual}")]
    ArityViolation {
        name: String,
        expected: Arity,
        actual: usize,
    },

    #[error("flag '{name}' does not take a value (got '{value}')")]
    FlagWithValue { name: String, value: String },

    #[error("malformed value '{token}' for dict option '{option}': {reason}")]
    MalformedDict {
        option: String,
        token: String,
        reason: DictSyntaxError,
    },

    /// A repeated occurrence under `error` accumulation.
    #[error("option '{name}' given more than once")]
    DuplicateOccurrence { name: String },

    #[error("unexpected positional argument '{value}'")]
    UnexpectedPositional { value: String },

    #[error("argument file not found: {}", .path.display())]
    ArgFileNotFound { path: PathBuf },

    #[error("cannot read argument file {}: {reason}", .path.display())]
    ArgFileUnreadable { path: PathBuf, reason: String },

    #[error("malformed argument file {} at line {line}: {reason}", .path.display())]
    ArgFileMalformed {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("argument files nested deeper than {max_depth}: {}", display_chain(.chain))]
    ArgFileRecursion { chain: Vec<PathBuf>, max_depth: usize },
}

fn display_chain(chain: &[PathBuf]) -> String {
    chain
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// A failed parse.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} (at argument {index})")]
pub struct ParseError {
    /// What went wrong.
    pub kind: ParseErrorKind,
    /// The argument snapshot the error refers to. Argument-file errors carry
    /// the arguments as given; every other error the expanded arguments.
    pub argv: Vec<String>,
    /// Index of the offending token in `argv`. Equal to `argv.len()` when
    /// input ran out.
    pub index: usize,
    /// Canonical command names from the root to the level that failed. Empty
    /// for argument-file errors, which occur before parsing.
    pub command_path: Vec<String>,
}

impl ParseError {
    pub fn new(
        kind: ParseErrorKind,
        argv: Vec<String>,
        index: usize,
        command_path: Vec<String>,
    ) -> Self {
        Self {
            kind,
            argv,
            index,
            command_path,
        }
    }

    /// The token at [`index`](Self::index), if input had not run out.
    pub fn token(&self) -> Option<&str> {
        self.argv.get(self.index).map(String::as_str)
    }
}

/// Convenience alias for results with [`ParseError`].
pub type Result<T> = std::result::Result<T, ParseError>;

/// Either failure family, for one-shot helpers like [`parse_args`].
///
/// [`parse_args`]: crate::parse_args
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid specification: {0}")]
    Spec(#[from] SpecError),
    #[error(transparent)]
    Parse(#[from] ParseError),
}
