//! Command definition types.
//!
//! This module defines the unchecked, serializable description of a command
//! tree: [`CommandDef`], [`OptionDef`] and [`PositionalDef`]. Definitions are
//! plain data with builder methods and may describe invalid trees; calling
//! [`CommandDef::build`] validates them into an immutable
//! [`CommandSpec`](crate::CommandSpec).
//!
//! The accumulation enums live here as well since definitions, validated
//! specifications and the configuration all refer to them.

use serde::{Deserialize, Serialize};

use crate::{Arity, MergeStrategy};

/// The three closed kinds of option.
///
/// # Examples
///
/// ```
/// use argtree_core::OptionKind;
///
/// let kind: OptionKind = serde_json::from_str("\"dict\"").unwrap();
/// assert_eq!(kind, OptionKind::Dict);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionKind {
    /// Takes no values; yields a boolean or a count.
    Flag,
    /// Takes string values bounded by an arity.
    Value,
    /// Takes `key=value` tokens folded into a nested map.
    Dict,
}

impl std::fmt::Display for OptionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Flag => "flag",
            Self::Value => "value",
            Self::Dict => "dict",
        })
    }
}

/// Every accumulation mode a definition may request.
///
/// Which modes are legal depends on the option kind; validation narrows this
/// into [`FlagAccumulation`], [`ValueAccumulation`] or [`DictAccumulation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Accumulation {
    /// Keep the first occurrence.
    First,
    /// Keep the last occurrence.
    Last,
    /// Count occurrences (flags only).
    Count,
    /// Keep every occurrence as its own group.
    Append,
    /// Flatten every occurrence into one sequence (values only).
    Extend,
    /// Merge maps across occurrences (dicts only).
    Merge,
    /// Reject a second occurrence.
    Error,
}

impl std::fmt::Display for Accumulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::First => "first",
            Self::Last => "last",
            Self::Count => "count",
            Self::Append => "append",
            Self::Extend => "extend",
            Self::Merge => "merge",
            Self::Error => "error",
        })
    }
}

/// Accumulation modes legal for flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlagAccumulation {
    First,
    Last,
    Count,
    Error,
}

impl FlagAccumulation {
    /// Narrows a general mode, returning `None` if flags do not support it.
    pub fn from_mode(mode: Accumulation) -> Option<Self> {
        match mode {
            Accumulation::First => Some(Self::First),
            Accumulation::Last => Some(Self::Last),
            Accumulation::Count => Some(Self::Count),
            Accumulation::Error => Some(Self::Error),
            _ => None,
        }
    }
}

/// Accumulation modes legal for value options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueAccumulation {
    First,
    Last,
    Append,
    Extend,
    Error,
}

impl ValueAccumulation {
    /// Narrows a general mode, returning `None` if value options do not
    /// support it.
    pub fn from_mode(mode: Accumulation) -> Option<Self> {
        match mode {
            Accumulation::First => Some(Self::First),
            Accumulation::Last => Some(Self::Last),
            Accumulation::Append => Some(Self::Append),
            Accumulation::Extend => Some(Self::Extend),
            Accumulation::Error => Some(Self::Error),
            _ => None,
        }
    }
}

/// Accumulation modes legal for dict options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DictAccumulation {
    Merge,
    First,
    Last,
    Append,
    Error,
}

impl DictAccumulation {
    /// Narrows a general mode, returning `None` if dict options do not
    /// support it.
    pub fn from_mode(mode: Accumulation) -> Option<Self> {
        match mode {
            Accumulation::Merge => Some(Self::Merge),
            Accumulation::First => Some(Self::First),
            Accumulation::Last => Some(Self::Last),
            Accumulation::Append => Some(Self::Append),
            Accumulation::Error => Some(Self::Error),
            _ => None,
        }
    }
}

/// How argument files are split into tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArgFileFormat {
    /// One argument per non-blank line (the default).
    #[default]
    Line,
    /// Whitespace-separated words with shell quoting and escaping.
    Shell,
}

/// Unchecked definition of an option.
///
/// Use [`flag`](OptionDef::flag), [`value`](OptionDef::value) or
/// [`dict`](OptionDef::dict) to start, then chain `with_*` methods. Settings
/// that do not belong to the option's kind are accepted here and rejected by
/// validation.
///
/// # Examples
///
/// ```
/// use argtree_core::{Accumulation, Arity, OptionDef, OptionKind};
///
/// let verbose = OptionDef::flag("verbose")
///     .with_short('v')
///     .with_accumulation(Accumulation::Count);
/// assert_eq!(verbose.kind, OptionKind::Flag);
///
/// let range = OptionDef::value("range").with_arity(Arity::exactly(2));
/// assert_eq!(range.effective_arity(), Arity::exactly(2));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionDef {
    /// Canonical name, used as the long form and as the result key.
    pub name: String,
    /// Option kind.
    pub kind: OptionKind,
    /// Short forms (e.g. `v` for `-v`).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub short: Vec<char>,
    /// Alternative long names.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    /// Value count; defaults to `(0, 0)` for flags and `(1, 1)` otherwise.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arity: Option<Arity>,
    /// Accumulation across repeated occurrences.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accumulation: Option<Accumulation>,
    /// Consume every remaining token regardless of boundaries (values only).
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub greedy: bool,
    /// Per-option negative-number recognition (values only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_negative_numbers: Option<bool>,
    /// Prefixes synthesizing negated long names (flags only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub negation_prefixes: Option<Vec<String>>,
    /// Short forms forcing the flag to `false` (flags only).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub negation_shorts: Vec<char>,
    /// Merge strategy for merge accumulation (dicts only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merge_strategy: Option<MergeStrategy>,
    /// Separator between nested key segments (dicts only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nesting_separator: Option<char>,
    /// Separator between key and value (dicts only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_value_separator: Option<char>,
    /// Escape character for literal separators in keys (dicts only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub escape_char: Option<char>,
    /// Split keys into nested segments (dicts only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nested_keys: Option<bool>,
    /// Recognize `[N]` list indices in keys (dicts only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list_indices: Option<bool>,
    /// Allow gaps between list indices (dicts only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sparse_lists: Option<bool>,
    /// Free-form description for help renderers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl OptionDef {
    fn new(name: &str, kind: OptionKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            short: Vec::new(),
            aliases: Vec::new(),
            arity: None,
            accumulation: None,
            greedy: false,
            allow_negative_numbers: None,
            negation_prefixes: None,
            negation_shorts: Vec::new(),
            merge_strategy: None,
            nesting_separator: None,
            key_value_separator: None,
            escape_char: None,
            nested_keys: None,
            list_indices: None,
            sparse_lists: None,
            description: None,
        }
    }

    /// Starts a flag definition.
    pub fn flag(name: &str) -> Self {
        Self::new(name, OptionKind::Flag)
    }

    /// Starts a value option definition with arity `(1, 1)`.
    pub fn value(name: &str) -> Self {
        Self::new(name, OptionKind::Value)
    }

    /// Starts a dict option definition with arity `(1, 1)`.
    pub fn dict(name: &str) -> Self {
        Self::new(name, OptionKind::Dict)
    }

    /// Adds a short form.
    pub fn with_short(mut self, short: char) -> Self {
        self.short.push(short);
        self
    }

    /// Adds an alias.
    pub fn with_alias(mut self, alias: &str) -> Self {
        self.aliases.push(alias.to_string());
        self
    }

    /// Sets the arity.
    pub fn with_arity(mut self, arity: Arity) -> Self {
        self.arity = Some(arity);
        self
    }

    /// Sets the accumulation mode.
    pub fn with_accumulation(mut self, mode: Accumulation) -> Self {
        self.accumulation = Some(mode);
        self
    }

    /// Marks as greedy.
    pub fn greedy(mut self) -> Self {
        self.greedy = true;
        self
    }

    /// Overrides negative-number recognition for this option's values.
    pub fn with_negative_numbers(mut self, allow: bool) -> Self {
        self.allow_negative_numbers = Some(allow);
        self
    }

    /// Adds a negation prefix such as `no-`.
    pub fn with_negation_prefix(mut self, prefix: &str) -> Self {
        self.negation_prefixes
            .get_or_insert_with(Vec::new)
            .push(prefix.to_string());
        self
    }

    /// Adds a negating short form.
    pub fn with_negation_short(mut self, short: char) -> Self {
        self.negation_shorts.push(short);
        self
    }

    /// Sets the merge strategy.
    pub fn with_merge_strategy(mut self, strategy: MergeStrategy) -> Self {
        self.merge_strategy = Some(strategy);
        self
    }

    /// Sets the nesting separator.
    pub fn with_nesting_separator(mut self, separator: char) -> Self {
        self.nesting_separator = Some(separator);
        self
    }

    /// Sets the key/value separator.
    pub fn with_key_value_separator(mut self, separator: char) -> Self {
        self.key_value_separator = Some(separator);
        self
    }

    /// Sets the escape character.
    pub fn with_escape_char(mut self, escape: char) -> Self {
        self.escape_char = Some(escape);
        self
    }

    /// Enables or disables nested keys.
    pub fn with_nested_keys(mut self, enabled: bool) -> Self {
        self.nested_keys = Some(enabled);
        self
    }

    /// Enables or disables `[N]` list indices.
    pub fn with_list_indices(mut self, enabled: bool) -> Self {
        self.list_indices = Some(enabled);
        self
    }

    /// Enables or disables sparse list indices.
    pub fn with_sparse_lists(mut self, enabled: bool) -> Self {
        self.sparse_lists = Some(enabled);
        self
    }

    /// Adds a description.
    pub fn with_description(mut self, desc: &str) -> Self {
        self.description = Some(desc.to_string());
        self
    }

    /// Returns the declared arity or the kind's default.
    pub fn effective_arity(&self) -> Arity {
        match (self.arity, self.kind) {
            (Some(arity), _) => arity,
            (None, OptionKind::Flag) => Arity::NONE,
            (None, _) => Arity::one(),
        }
    }
}

/// Unchecked definition of a positional parameter.
///
/// # Examples
///
/// ```
/// use argtree_core::{Arity, PositionalDef};
///
/// let src = PositionalDef::required("source");
/// assert_eq!(src.arity, Arity::one());
///
/// let files = PositionalDef::new("files", Arity::any()).greedy();
/// assert!(files.greedy);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionalDef {
    /// Name used as the result key.
    pub name: String,
    /// Value count.
    #[serde(default)]
    pub arity: Arity,
    /// Claim every remaining value, ignoring later positionals' minimums.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub greedy: bool,
    /// Free-form description for help renderers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl PositionalDef {
    /// Creates a positional with the given arity.
    pub fn new(name: &str, arity: Arity) -> Self {
        Self {
            name: name.to_string(),
            arity,
            greedy: false,
            description: None,
        }
    }

    /// Creates a positional taking exactly one value.
    pub fn required(name: &str) -> Self {
        Self::new(name, Arity::one())
    }

    /// Creates a positional taking zero or one value.
    pub fn optional(name: &str) -> Self {
        Self::new(name, Arity::optional())
    }

    /// Marks as greedy.
    pub fn greedy(mut self) -> Self {
        self.greedy = true;
        self
    }

    /// Adds a description.
    pub fn with_description(mut self, desc: &str) -> Self {
        self.description = Some(desc.to_string());
        self
    }
}

/// Unchecked definition of a command level.
///
/// # Examples
///
/// ```
/// use argtree_core::*;
///
/// let def = CommandDef::new("git")
///     .with_option(OptionDef::flag("verbose").with_short('v'))
///     .with_subcommand(
///         CommandDef::new("commit")
///             .with_option(OptionDef::value("message").with_short('m')),
///     );
///
/// let spec = def.build().unwrap();
/// assert_eq!(spec.name(), "git");
/// assert!(spec.find_subcommand("commit").is_some());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandDef {
    /// Command name.
    pub name: String,
    /// Alternative names when used as a subcommand.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    /// Short description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Options, in declaration order.
    #[serde(default)]
    pub options: Vec<OptionDef>,
    /// Positionals, in slot-filling order.
    #[serde(default)]
    pub positionals: Vec<PositionalDef>,
    /// Nested subcommands.
    #[serde(default)]
    pub subcommands: Vec<CommandDef>,
}

impl CommandDef {
    /// Creates an empty command definition.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// Adds an alias.
    pub fn with_alias(mut self, alias: &str) -> Self {
        self.aliases.push(alias.to_string());
        self
    }

    /// Adds a description.
    pub fn with_description(mut self, desc: &str) -> Self {
        self.description = Some(desc.to_string());
        self
    }

    /// Adds an option.
    pub fn with_option(mut self, option: OptionDef) -> Self {
        self.options.push(option);
        self
    }

    /// Adds a positional.
    pub fn with_positional(mut self, positional: PositionalDef) -> Self {
        self.positionals.push(positional);
        self
    }

    /// Adds a nested subcommand.
    pub fn with_subcommand(mut self, sub: CommandDef) -> Self {
        self.subcommands.push(sub);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_arity_per_kind() {
        assert_eq!(OptionDef::flag("v").effective_arity(), Arity::NONE);
        assert_eq!(OptionDef::value("o").effective_arity(), Arity::one());
        assert_eq!(OptionDef::dict("d").effective_arity(), Arity::one());
    }

    #[test]
    fn test_accumulation_narrowing() {
        assert_eq!(
            FlagAccumulation::from_mode(Accumulation::Count),
            Some(FlagAccumulation::Count)
        );
        assert_eq!(FlagAccumulation::from_mode(Accumulation::Append), None);
        assert_eq!(ValueAccumulation::from_mode(Accumulation::Merge), None);
        assert_eq!(DictAccumulation::from_mode(Accumulation::Extend), None);
        assert_eq!(
            DictAccumulation::from_mode(Accumulation::Merge),
            Some(DictAccumulation::Merge)
        );
    }

    #[test]
    fn test_command_def_deserializes_from_json() {
        let def: CommandDef = serde_json::from_str(
            r#"{
                "name": "tool",
                "options": [
                    {"name": "verbose", "kind": "flag", "short": ["v"], "accumulation": "count"},
                    {"name": "define", "kind": "dict", "merge_strategy": "shallow"}
                ],
                "positionals": [{"name": "files", "arity": {"min": 0}}]
            }"#,
        )
        .unwrap();

        assert_eq!(def.options.len(), 2);
        assert_eq!(def.options[0].short, vec!['v']);
        assert_eq!(def.options[1].merge_strategy, Some(MergeStrategy::Shallow));
        assert_eq!(def.positionals[0].arity, Arity::any());
    }
}
