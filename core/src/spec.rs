//! Validated, immutable command specifications.
//!
//! Values of these types only come out of [`CommandDef::build`], so every
//! [`CommandSpec`] tree satisfies the construction invariants (unique names
//! per level, sane arities, kind-appropriate settings). Parsers rely on that
//! and never re-check them.
//!
//! [`CommandDef::build`]: crate::CommandDef::build

use crate::{
    Arity, DictAccumulation, FlagAccumulation, MergeStrategy, OptionKind, ValueAccumulation,
};

/// Names shared by every option kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionNames {
    pub(crate) name: String,
    pub(crate) short: Vec<char>,
    pub(crate) aliases: Vec<String>,
    pub(crate) description: Option<String>,
}

impl OptionNames {
    /// Canonical name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Short forms.
    pub fn short(&self) -> &[char] {
        &self.short
    }

    /// Alternative long names.
    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    /// Description, if any.
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

/// A flag: arity `(0, 0)`, yields a boolean or a count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagSpec {
    pub(crate) names: OptionNames,
    pub(crate) accumulation: Option<FlagAccumulation>,
    pub(crate) negation_prefixes: Option<Vec<String>>,
    pub(crate) negation_shorts: Vec<char>,
}

impl FlagSpec {
    /// Option names.
    pub fn names(&self) -> &OptionNames {
        &self.names
    }

    /// Declared accumulation mode, if any.
    pub fn accumulation(&self) -> Option<FlagAccumulation> {
        self.accumulation
    }

    /// Declared negation prefixes, if any.
    pub fn negation_prefixes(&self) -> Option<&[String]> {
        self.negation_prefixes.as_deref()
    }

    /// Short forms that force the flag to `false`.
    pub fn negation_shorts(&self) -> &[char] {
        &self.negation_shorts
    }
}

/// A value option consuming strings according to its arity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueSpec {
    pub(crate) names: OptionNames,
    pub(crate) arity: Arity,
    pub(crate) accumulation: Option<ValueAccumulation>,
    pub(crate) greedy: bool,
    pub(crate) allow_negative_numbers: Option<bool>,
}

impl ValueSpec {
    /// Option names.
    pub fn names(&self) -> &OptionNames {
        &self.names
    }

    /// Value count.
    pub fn arity(&self) -> Arity {
        self.arity
    }

    /// Declared accumulation mode, if any.
    pub fn accumulation(&self) -> Option<ValueAccumulation> {
        self.accumulation
    }

    /// Whether the option consumes tokens regardless of boundaries.
    pub fn greedy(&self) -> bool {
        self.greedy
    }

    /// Declared negative-number override, if any.
    pub fn allow_negative_numbers(&self) -> Option<bool> {
        self.allow_negative_numbers
    }
}

/// Per-option overrides of the dict key grammar.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DictOverrides {
    pub nesting_separator: Option<char>,
    pub key_value_separator: Option<char>,
    pub escape_char: Option<char>,
    pub nested_keys: Option<bool>,
    pub list_indices: Option<bool>,
    pub sparse_lists: Option<bool>,
}

/// A dict option folding `key=value` tokens into a nested map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DictSpec {
    pub(crate) names: OptionNames,
    pub(crate) arity: Arity,
    pub(crate) accumulation: Option<DictAccumulation>,
    pub(crate) merge_strategy: Option<MergeStrategy>,
    pub(crate) overrides: DictOverrides,
}

impl DictSpec {
    /// Option names.
    pub fn names(&self) -> &OptionNames {
        &self.names
    }

    /// Token count per occurrence.
    pub fn arity(&self) -> Arity {
        self.arity
    }

    /// Declared accumulation mode, if any.
    pub fn accumulation(&self) -> Option<DictAccumulation> {
        self.accumulation
    }

    /// Declared merge strategy, if any.
    pub fn merge_strategy(&self) -> Option<MergeStrategy> {
        self.merge_strategy
    }

    /// Declared key grammar overrides.
    pub fn overrides(&self) -> &DictOverrides {
        &self.overrides
    }
}

/// A validated option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionSpec {
    Flag(FlagSpec),
    Value(ValueSpec),
    Dict(DictSpec),
}

impl OptionSpec {
    /// Option names, whatever the kind.
    pub fn names(&self) -> &OptionNames {
        match self {
            OptionSpec::Flag(f) => &f.names,
            OptionSpec::Value(v) => &v.names,
            OptionSpec::Dict(d) => &d.names,
        }
    }

    /// Canonical name.
    pub fn name(&self) -> &str {
        self.names().name()
    }

    /// Option kind.
    pub fn kind(&self) -> OptionKind {
        match self {
            OptionSpec::Flag(_) => OptionKind::Flag,
            OptionSpec::Value(_) => OptionKind::Value,
            OptionSpec::Dict(_) => OptionKind::Dict,
        }
    }

    /// Value count per occurrence; always `(0, 0)` for flags.
    pub fn arity(&self) -> Arity {
        match self {
            OptionSpec::Flag(_) => Arity::NONE,
            OptionSpec::Value(v) => v.arity,
            OptionSpec::Dict(d) => d.arity,
        }
    }
}

/// A validated positional.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionalSpec {
    pub(crate) name: String,
    pub(crate) arity: Arity,
    pub(crate) greedy: bool,
    pub(crate) description: Option<String>,
}

impl PositionalSpec {
    /// Name used as the result key.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Value count.
    pub fn arity(&self) -> Arity {
        self.arity
    }

    /// Whether the positional ignores later positionals' reservations.
    pub fn greedy(&self) -> bool {
        self.greedy
    }

    /// Description, if any.
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

/// A validated command level and its subtree.
///
/// # Examples
///
/// ```
/// use argtree_core::*;
///
/// let spec = CommandDef::new("cp")
///     .with_option(OptionDef::flag("recursive").with_short('r'))
///     .with_positional(PositionalDef::new("sources", Arity::at_least(1)))
///     .with_positional(PositionalDef::required("dest"))
///     .build()
///     .unwrap();
///
/// assert_eq!(spec.find_option("recursive").unwrap().kind(), OptionKind::Flag);
/// assert_eq!(spec.positionals()[1].name(), "dest");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub(crate) name: String,
    pub(crate) aliases: Vec<String>,
    pub(crate) description: Option<String>,
    pub(crate) options: Vec<OptionSpec>,
    pub(crate) positionals: Vec<PositionalSpec>,
    pub(crate) subcommands: Vec<CommandSpec>,
}

impl CommandSpec {
    /// Canonical command name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Aliases usable when this level is a subcommand.
    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    /// Description, if any.
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Options in declaration order.
    pub fn options(&self) -> &[OptionSpec] {
        &self.options
    }

    /// Positionals in slot-filling order.
    pub fn positionals(&self) -> &[PositionalSpec] {
        &self.positionals
    }

    /// Child commands in declaration order.
    pub fn subcommands(&self) -> &[CommandSpec] {
        &self.subcommands
    }

    /// Finds an option by canonical name.
    pub fn find_option(&self, name: &str) -> Option<&OptionSpec> {
        self.options.iter().find(|o| o.name() == name)
    }

    /// Finds a subcommand by canonical name or alias.
    pub fn find_subcommand(&self, name: &str) -> Option<&CommandSpec> {
        self.subcommands
            .iter()
            .find(|s| s.name == name || s.aliases.iter().any(|a| a == name))
    }
}
