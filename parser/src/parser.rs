use argtree_core::{CommandSpec, ParseResult, ParserConfig, SpecError};
use tracing::debug;

use crate::argfile::expand_args;
use crate::engine;
use crate::error::{Error, Result};
use crate::resolve::LevelTables;

/// A parser bound to one specification and configuration.
///
/// Creating a parser builds the name tables of every command level once;
/// [`parse`](Parser::parse) keeps no state between calls, so one parser can
/// serve any number of calls, from any number of threads.
///
/// # Examples
///
/// ```
/// use argtree_core::*;
/// use argtree_parser::Parser;
///
/// let spec = CommandDef::new("cp")
///     .with_option(OptionDef::flag("recursive").with_short('r'))
///     .with_positional(PositionalDef::new("sources", Arity::at_least(1)))
///     .with_positional(PositionalDef::required("dest"))
///     .build()
///     .unwrap();
/// let config = ParserConfig::default();
/// let parser = Parser::new(&spec, &config).unwrap();
///
/// let result = parser.parse(["-r", "a", "b", "out/"]).unwrap();
/// assert_eq!(result.option("recursive"), Some(&Value::Bool(true)));
/// assert_eq!(result.positional("sources"), Some(&Value::strings(["a", "b"])));
/// assert_eq!(result.positional("dest"), Some(&Value::from("out/")));
/// ```
#[derive(Debug)]
pub struct Parser<'a> {
    spec: &'a CommandSpec,
    config: &'a ParserConfig,
    tables: LevelTables,
}

impl<'a> Parser<'a> {
    /// Prepares a parser.
    ///
    /// # Errors
    ///
    /// Fails when the configuration makes the specification invalid: a
    /// synthesized negation name collides with another name, or a dict
    /// option's effective key grammar reuses a character.
    pub fn new(
        spec: &'a CommandSpec,
        config: &'a ParserConfig,
    ) -> std::result::Result<Self, SpecError> {
        let tables = LevelTables::build(spec, config)?;
        debug!(command = spec.name(), "Prepared parser");
        Ok(Self {
            spec,
            config,
            tables,
        })
    }

    pub fn spec(&self) -> &'a CommandSpec {
        self.spec
    }

    pub fn config(&self) -> &'a ParserConfig {
        self.config
    }

    /// Expands argument files in `args`, then parses the result.
    ///
    /// `args` excludes the program name.
    pub fn parse<I, S>(&self, args: I) -> Result<ParseResult>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let args: Vec<String> = args.into_iter().map(Into::into).collect();
        let argv = expand_args(&args, self.config)?;
        self.parse_expanded(&argv)
    }

    /// Parses arguments without argument-file expansion.
    pub fn parse_expanded(&self, argv: &[String]) -> Result<ParseResult> {
        debug!(command = self.spec.name(), count = argv.len(), "Parsing arguments");
        engine::parse(self.spec, &self.tables, self.config, argv)
    }
}

/// Builds a parser and runs it once.
///
/// # Examples
///
/// ```
/// use argtree_core::*;
/// use argtree_parser::parse_args;
///
/// let spec = CommandDef::new("tool")
///     .with_option(OptionDef::value("range").with_arity(Arity::exactly(2)))
///     .build()
///     .unwrap();
///
/// let result = parse_args(&spec, &ParserConfig::default(), ["--range", "1", "10"]).unwrap();
/// assert_eq!(result.option("range"), Some(&Value::strings(["1", "10"])));
/// ```
pub fn parse_args<I, S>(
    spec: &CommandSpec,
    config: &ParserConfig,
    args: I,
) -> std::result::Result<ParseResult, Error>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    Ok(Parser::new(spec, config)?.parse(args)?)
}
