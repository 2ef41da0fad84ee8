//! Specification model, configuration and result types for argtree.
//!
//! This crate holds everything the parser consumes or produces, but no
//! parsing logic:
//!
//! - [`CommandDef`], [`OptionDef`], [`PositionalDef`]: unchecked,
//!   serde-loadable definitions with `with_*` builders.
//! - [`CommandSpec`] and [`OptionSpec`]: the validated, immutable tree
//!   produced by [`CommandDef::build`]. Options are a closed enum over
//!   [`FlagSpec`], [`ValueSpec`] and [`DictSpec`].
//! - [`Arity`]: `(min, max)` value counts that also fix the result shape.
//! - [`ParserConfig`]: validated parser settings with three-tier
//!   resolution (option > configuration > [`defaults`]).
//! - [`ParseResult`] and [`Value`]: the per-level result tree.
//!
//! Construction errors ([`SpecError`], [`ConfigError`]) are only raised
//! here, never while parsing.
//!
//! # Example
//!
//! ```
//! use argtree_core::*;
//!
//! let spec = CommandDef::new("git")
//!     .with_option(
//!         OptionDef::flag("verbose")
//!             .with_short('v')
//!             .with_accumulation(Accumulation::Count),
//!     )
//!     .with_subcommand(
//!         CommandDef::new("log")
//!             .with_option(OptionDef::value("range").with_arity(Arity::exactly(2)))
//!             .with_positional(PositionalDef::new("paths", Arity::any())),
//!     )
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(spec.subcommands()[0].name(), "log");
//! assert!(spec.find_subcommand("log").unwrap().find_option("range").is_some());
//!
//! let config = ParserConfig::builder().allow_abbreviations(true).build().unwrap();
//! assert_eq!(config.min_abbreviation_length(), 3);
//! ```

mod arity;
mod config;
mod merge;
mod result;
mod spec;
mod types;
mod validate;

pub use arity::Arity;
pub use config::{
    ConfigError, DictGrammar, ParserConfig, ParserConfigBuilder, compile_negative_number_pattern,
    defaults, find_char_conflict,
};
pub use merge::{MergeStrategy, merge_maps};
pub use result::{ParseResult, Value};
pub use spec::{
    CommandSpec, DictOverrides, DictSpec, FlagSpec, OptionNames, OptionSpec, PositionalSpec,
    ValueSpec,
};
pub use types::*;
pub use validate::SpecError;
