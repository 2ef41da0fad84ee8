//! Single-pass, specification-driven command-line argument parser.
//!
//! Parsing runs in two stages:
//!
//! 1. [`expand_args`] replaces `@file` tokens with the arguments read from
//!    those files (line-based or shell-style, see
//!    [`ArgFileFormat`](argtree_core::ArgFileFormat)).
//! 2. The engine walks the expanded arguments once, left to right, resolving
//!    option names, consuming values by arity, recursing into subcommands and
//!    finally grouping positionals.
//!
//! The outcome is a [`ParseResult`](argtree_core::ParseResult) tree of
//! strings, booleans, counts and maps, or a [`ParseError`] with the argument
//! snapshot, the offending index and the command path. Nothing is converted
//! or validated beyond the grammar.
//!
//! # Example
//!
//! ```
//! use argtree_core::*;
//! use argtree_parser::Parser;
//!
//! let spec = CommandDef::new("git")
//!     .with_option(
//!         OptionDef::flag("verbose")
//!             .with_short('v')
//!             .with_accumulation(Accumulation::Count),
//!     )
//!     .with_subcommand(
//!         CommandDef::new("commit")
//!             .with_option(OptionDef::value("message").with_short('m'))
//!             .with_option(OptionDef::dict("config").with_short('c')),
//!     )
//!     .build()
//!     .unwrap();
//! let config = ParserConfig::default();
//! let parser = Parser::new(&spec, &config).unwrap();
//!
//! let result = parser
//!     .parse(["-vv", "commit", "-m", "fix", "-c", "user.name=me"])
//!     .unwrap();
//! assert_eq!(result.option("verbose"), Some(&Value::Count(2)));
//!
//! let commit = result.subcommand().unwrap();
//! assert_eq!(commit.option("message"), Some(&Value::from("fix")));
//! assert_eq!(
//!     commit.option("config"),
//!     Some(&Value::map([("user", Value::map([("name", Value::from("me"))]))]))
//! );
//! ```

mod accumulate;
mod argfile;
mod dict;
mod engine;
mod error;
mod parser;
mod resolve;
mod shell;

pub use argfile::expand_args;
pub use error::{DictSyntaxError, Error, ParseError, ParseErrorKind, Result};
pub use parser::{Parser, parse_args};
