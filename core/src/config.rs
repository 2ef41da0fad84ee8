//! Parser configuration.
//!
//! [`ParserConfig`] is an immutable settings record threaded by reference into
//! every parse. It is created with [`ParserConfig::builder`] (validated on
//! [`build`](ParserConfigBuilder::build)) or [`ParserConfig::default`].
//!
//! Settings an option may also declare (accumulation, merge strategy, dict
//! grammar, negative numbers, negation prefixes) resolve in three tiers: the
//! option's own field, then the configuration's global field, then the
//! system default in [`defaults`]. The `resolve_*` methods are the only place
//! that precedence is computed.
//!
//! The builder deserializes from JSON or YAML with every field optional:
//!
//! ```yaml
//! allow_abbreviations: true
//! min_abbreviation_length: 2
//! negation_prefixes: ["no-"]
//! argfile_format: shell
//! max_argfile_depth: 3
//! ```

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::spec::{DictSpec, FlagSpec, ValueSpec};
use crate::{ArgFileFormat, DictAccumulation, FlagAccumulation, MergeStrategy, ValueAccumulation};

/// System defaults, the last tier of setting resolution.
pub mod defaults {
    use crate::{
        ArgFileFormat, DictAccumulation, FlagAccumulation, MergeStrategy, ValueAccumulation,
    };

    pub const LONG_PREFIX: &str = "--";
    pub const SHORT_PREFIX: char = '-';
    pub const END_OF_OPTIONS: &str = "--";
    pub const INLINE_VALUE_SEPARATOR: char = '=';
    pub const SHORT_CLUSTERING: bool = true;
    pub const ALLOW_ALIASES: bool = true;
    pub const NORMALIZE_UNDERSCORES: bool = true;
    pub const CASE_INSENSITIVE: bool = false;
    pub const ALLOW_ABBREVIATIONS: bool = false;
    pub const MIN_ABBREVIATION_LENGTH: usize = 3;
    pub const ABBREVIATE_SUBCOMMANDS: bool = false;
    pub const STRICT_ORDERING: bool = false;
    pub const ALLOW_NEGATIVE_NUMBERS: bool = true;
    pub const NEGATIVE_NUMBER_PATTERN: &str = r"^-(\d+(\.\d*)?|\.\d+)([eE][+-]?\d+)?$";
    pub const NEGATION_PREFIXES: &[&str] = &[];
    pub const FLAG_ACCUMULATION: FlagAccumulation = FlagAccumulation::Last;
    pub const VALUE_ACCUMULATION: ValueAccumulation = ValueAccumulation::Last;
    pub const DICT_ACCUMULATION: DictAccumulation = DictAccumulation::Merge;
    pub const MERGE_STRATEGY: MergeStrategy = MergeStrategy::Deep;
    pub const NESTING_SEPARATOR: char = '.';
    pub const KEY_VALUE_SEPARATOR: char = '=';
    pub const ESCAPE_CHAR: char = '\\';
    pub const NESTED_KEYS: bool = true;
    pub const LIST_INDICES: bool = true;
    pub const SPARSE_LISTS: bool = false;
    pub const ARGFILE_PREFIX: Option<char> = Some('@');
    pub const ARGFILE_FORMAT: ArgFileFormat = ArgFileFormat::Line;
    pub const ARGFILE_COMMENT_CHAR: Option<char> = Some('#');
    pub const MAX_ARGFILE_DEPTH: usize = 1;
}

static DEFAULT_NEGATIVE_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    // Compile-time constant; a failure here is a programmer error.
    Regex::new(defaults::NEGATIVE_NUMBER_PATTERN).expect("static regex must compile")
});

/// Configuration errors, raised only by [`ParserConfigBuilder::build`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A string setting is empty.
    #[error("{field} cannot be empty")]
    EmptySetting { field: &'static str },
    /// A prefix or token setting contains whitespace.
    #[error("{field} cannot contain whitespace: '{value}'")]
    WhitespaceInSetting { field: &'static str, value: String },
    /// A numeric setting is below its minimum.
    #[error("{field} must be at least {min}, got {value}")]
    OutOfRange {
        field: &'static str,
        value: usize,
        min: usize,
    },
    /// The long and short prefixes are identical.
    #[error("long_prefix '{0}' is indistinguishable from short_prefix")]
    IndistinctPrefixes(String),
    /// Two grammar characters coincide.
    #[error("{first} and {second} both use '{ch}'")]
    ConflictingCharacters {
        first: &'static str,
        second: &'static str,
        ch: char,
    },
    /// A negation prefix is the empty string.
    #[error("negation_prefixes cannot contain an empty prefix")]
    EmptyNegationPrefix,
    /// The negative-number pattern does not compile.
    #[error("negative_number_pattern '{pattern}' is invalid: {reason}")]
    InvalidPattern { pattern: String, reason: String },
    /// The negative-number pattern matches the empty string.
    #[error("negative_number_pattern '{0}' matches the empty string")]
    PatternMatchesEmpty(String),
    /// The negative-number pattern repeats an already-unbounded group.
    #[error("negative_number_pattern '{0}' contains nested quantifiers")]
    NestedQuantifier(String),
}

/// Convenience alias for results with [`ConfigError`].
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Effective dict key grammar for one option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DictGrammar {
    pub nesting_separator: char,
    pub key_value_separator: char,
    pub escape_char: char,
    pub nested_keys: bool,
    pub list_indices: bool,
    pub sparse_lists: bool,
}

impl DictGrammar {
    /// Returns the first pair of grammar characters that coincide.
    pub fn conflict(&self) -> Option<(&'static str, &'static str, char)> {
        find_char_conflict(&[
            ("nesting_separator", self.nesting_separator),
            ("key_value_separator", self.key_value_separator),
            ("escape_char", self.escape_char),
        ])
    }
}

/// Returns the first pair of named characters that are equal.
pub fn find_char_conflict(
    chars: &[(&'static str, char)],
) -> Option<(&'static str, &'static str, char)> {
    chars.iter().enumerate().find_map(|(i, (first, a))| {
        chars[i + 1..]
            .iter()
            .find(|(_, b)| a == b)
            .map(|(second, _)| (*first, *second, *a))
    })
}

/// Immutable parser settings.
///
/// # Examples
///
/// ```
/// use argtree_core::{ParserConfig, ArgFileFormat};
///
/// let config = ParserConfig::builder()
///     .allow_abbreviations(true)
///     .argfile_format(ArgFileFormat::Shell)
///     .build()
///     .unwrap();
/// assert!(config.allow_abbreviations());
/// assert_eq!(config.argfile_prefix(), Some('@'));
///
/// assert!(ParserConfig::builder().min_abbreviation_length(0).build().is_err());
/// ```
#[derive(Debug, Clone)]
pub struct ParserConfig {
    long_prefix: String,
    short_prefix: char,
    end_of_options: String,
    inline_value_separator: char,
    short_clustering: bool,
    allow_aliases: bool,
    normalize_underscores: bool,
    case_insensitive: bool,
    allow_abbreviations: bool,
    min_abbreviation_length: usize,
    abbreviate_subcommands: bool,
    strict_ordering: bool,
    allow_negative_numbers: Option<bool>,
    negative_number_pattern: Regex,
    negation_prefixes: Option<Vec<String>>,
    flag_accumulation: Option<FlagAccumulation>,
    value_accumulation: Option<ValueAccumulation>,
    dict_accumulation: Option<DictAccumulation>,
    merge_strategy: Option<MergeStrategy>,
    nesting_separator: Option<char>,
    key_value_separator: Option<char>,
    escape_char: Option<char>,
    nested_keys: Option<bool>,
    list_indices: Option<bool>,
    sparse_lists: Option<bool>,
    argfile_prefix: Option<char>,
    argfile_format: ArgFileFormat,
    argfile_comment_char: Option<char>,
    max_argfile_depth: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            long_prefix: defaults::LONG_PREFIX.to_string(),
            short_prefix: defaults::SHORT_PREFIX,
            end_of_options: defaults::END_OF_OPTIONS.to_string(),
            inline_value_separator: defaults::INLINE_VALUE_SEPARATOR,
            short_clustering: defaults::SHORT_CLUSTERING,
            allow_aliases: defaults::ALLOW_ALIASES,
            normalize_underscores: defaults::NORMALIZE_UNDERSCORES,
            case_insensitive: defaults::CASE_INSENSITIVE,
            allow_abbreviations: defaults::ALLOW_ABBREVIATIONS,
            min_abbreviation_length: defaults::MIN_ABBREVIATION_LENGTH,
            abbreviate_subcommands: defaults::ABBREVIATE_SUBCOMMANDS,
            strict_ordering: defaults::STRICT_ORDERING,
            allow_negative_numbers: None,
            negative_number_pattern: DEFAULT_NEGATIVE_NUMBER.clone(),
            negation_prefixes: None,
            flag_accumulation: None,
            value_accumulation: None,
            dict_accumulation: None,
            merge_strategy: None,
            nesting_separator: None,
            key_value_separator: None,
            escape_char: None,
            nested_keys: None,
            list_indices: None,
            sparse_lists: None,
            argfile_prefix: defaults::ARGFILE_PREFIX,
            argfile_format: defaults::ARGFILE_FORMAT,
            argfile_comment_char: defaults::ARGFILE_COMMENT_CHAR,
            max_argfile_depth: defaults::MAX_ARGFILE_DEPTH,
        }
    }
}

impl ParserConfig {
    /// Returns a builder with every setting unset.
    pub fn builder() -> ParserConfigBuilder {
        ParserConfigBuilder::default()
    }

    /// Prefix introducing long options (`--`).
    pub fn long_prefix(&self) -> &str {
        &self.long_prefix
    }

    /// Prefix introducing short options (`-`).
    pub fn short_prefix(&self) -> char {
        self.short_prefix
    }

    /// Token ending option processing (`--`).
    pub fn end_of_options(&self) -> &str {
        &self.end_of_options
    }

    /// Separator of inline long-option values (`=`).
    pub fn inline_value_separator(&self) -> char {
        self.inline_value_separator
    }

    pub fn short_clustering(&self) -> bool {
        self.short_clustering
    }

    pub fn allow_aliases(&self) -> bool {
        self.allow_aliases
    }

    pub fn normalize_underscores(&self) -> bool {
        self.normalize_underscores
    }

    pub fn case_insensitive(&self) -> bool {
        self.case_insensitive
    }

    pub fn allow_abbreviations(&self) -> bool {
        self.allow_abbreviations
    }

    pub fn min_abbreviation_length(&self) -> usize {
        self.min_abbreviation_length
    }

    /// Whether subcommand names may be abbreviated (requires
    /// [`allow_abbreviations`](Self::allow_abbreviations) as well).
    pub fn abbreviate_subcommands(&self) -> bool {
        self.abbreviate_subcommands
    }

    /// Whether the first positional ends option processing at its level.
    pub fn strict_ordering(&self) -> bool {
        self.strict_ordering
    }

    /// Pattern recognizing negative numbers.
    pub fn negative_number_pattern(&self) -> &Regex {
        &self.negative_number_pattern
    }

    pub fn argfile_prefix(&self) -> Option<char> {
        self.argfile_prefix
    }

    pub fn argfile_format(&self) -> ArgFileFormat {
        self.argfile_format
    }

    pub fn argfile_comment_char(&self) -> Option<char> {
        self.argfile_comment_char
    }

    pub fn max_argfile_depth(&self) -> usize {
        self.max_argfile_depth
    }

    /// Negative-number recognition for positionals and options without an
    /// override.
    pub fn allow_negative_numbers(&self) -> bool {
        self.allow_negative_numbers
            .unwrap_or(defaults::ALLOW_NEGATIVE_NUMBERS)
    }

    /// Negative-number recognition while consuming a value option's values.
    pub fn resolve_negative_numbers(&self, option: &ValueSpec) -> bool {
        option
            .allow_negative_numbers()
            .unwrap_or_else(|| self.allow_negative_numbers())
    }

    /// Negation prefixes that apply to a flag.
    pub fn resolve_negation_prefixes(&self, flag: &FlagSpec) -> Vec<String> {
        flag.negation_prefixes()
            .map(<[String]>::to_vec)
            .or_else(|| self.negation_prefixes.clone())
            .unwrap_or_else(|| {
                defaults::NEGATION_PREFIXES
                    .iter()
                    .map(|p| p.to_string())
                    .collect()
            })
    }

    pub fn resolve_flag_accumulation(&self, flag: &FlagSpec) -> FlagAccumulation {
        flag.accumulation()
            .or(self.flag_accumulation)
            .unwrap_or(defaults::FLAG_ACCUMULATION)
    }

    pub fn resolve_value_accumulation(&self, option: &ValueSpec) -> ValueAccumulation {
        option
            .accumulation()
            .or(self.value_accumulation)
            .unwrap_or(defaults::VALUE_ACCUMULATION)
    }

    pub fn resolve_dict_accumulation(&self, option: &DictSpec) -> DictAccumulation {
        option
            .accumulation()
            .or(self.dict_accumulation)
            .unwrap_or(defaults::DICT_ACCUMULATION)
    }

    pub fn resolve_merge_strategy(&self, option: &DictSpec) -> MergeStrategy {
        option
            .merge_strategy()
            .or(self.merge_strategy)
            .unwrap_or(defaults::MERGE_STRATEGY)
    }

    /// Effective key grammar for a dict option.
    pub fn resolve_dict_grammar(&self, option: &DictSpec) -> DictGrammar {
        let own = option.overrides();
        DictGrammar {
            nesting_separator: own
                .nesting_separator
                .or(self.nesting_separator)
                .unwrap_or(defaults::NESTING_SEPARATOR),
            key_value_separator: own
                .key_value_separator
                .or(self.key_value_separator)
                .unwrap_or(defaults::KEY_VALUE_SEPARATOR),
            escape_char: own
                .escape_char
                .or(self.escape_char)
                .unwrap_or(defaults::ESCAPE_CHAR),
            nested_keys: own
                .nested_keys
                .or(self.nested_keys)
                .unwrap_or(defaults::NESTED_KEYS),
            list_indices: own
                .list_indices
                .or(self.list_indices)
                .unwrap_or(defaults::LIST_INDICES),
            sparse_lists: own
                .sparse_lists
                .or(self.sparse_lists)
                .unwrap_or(defaults::SPARSE_LISTS),
        }
    }
}

/// Builder for [`ParserConfig`]; every unset field falls back to
/// [`defaults`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ParserConfigBuilder {
    pub long_prefix: Option<String>,
    pub short_prefix: Option<char>,
    pub end_of_options: Option<String>,
    pub inline_value_separator: Option<char>,
    pub short_clustering: Option<bool>,
    pub allow_aliases: Option<bool>,
    pub normalize_underscores: Option<bool>,
    pub case_insensitive: Option<bool>,
    pub allow_abbreviations: Option<bool>,
    pub min_abbreviation_length: Option<usize>,
    pub abbreviate_subcommands: Option<bool>,
    pub strict_ordering: Option<bool>,
    pub allow_negative_numbers: Option<bool>,
    pub negative_number_pattern: Option<String>,
    pub negation_prefixes: Option<Vec<String>>,
    pub flag_accumulation: Option<FlagAccumulation>,
    pub value_accumulation: Option<ValueAccumulation>,
    pub dict_accumulation: Option<DictAccumulation>,
    pub merge_strategy: Option<MergeStrategy>,
    pub nesting_separator: Option<char>,
    pub key_value_separator: Option<char>,
    pub escape_char: Option<char>,
    pub nested_keys: Option<bool>,
    pub list_indices: Option<bool>,
    pub sparse_lists: Option<bool>,
    /// `Some(None)` disables argument files.
    #[serde(with = "argfile_prefix_serde")]
    pub argfile_prefix: Option<Option<char>>,
    pub argfile_format: Option<ArgFileFormat>,
    #[serde(with = "argfile_prefix_serde")]
    pub argfile_comment_char: Option<Option<char>>,
    pub max_argfile_depth: Option<usize>,
}

/// Distinguishes an absent field (`None`) from an explicit `null`
/// (`Some(None)`).
mod argfile_prefix_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<Option<char>>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            None => s.serialize_none(),
            Some(inner) => inner.serialize(s),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Option<char>>, D::Error> {
        Option::<char>::deserialize(d).map(Some)
    }
}

macro_rules! setters {
    ($($name:ident: $ty:ty),* $(,)?) => {
        $(
            pub fn $name(mut self, value: $ty) -> Self {
                self.$name = Some(value.into());
                self
            }
        )*
    };
}

impl ParserConfigBuilder {
    setters! {
        long_prefix: &str,
        short_prefix: char,
        end_of_options: &str,
        inline_value_separator: char,
        short_clustering: bool,
        allow_aliases: bool,
        normalize_underscores: bool,
        case_insensitive: bool,
        allow_abbreviations: bool,
        min_abbreviation_length: usize,
        abbreviate_subcommands: bool,
        strict_ordering: bool,
        allow_negative_numbers: bool,
        negative_number_pattern: &str,
        flag_accumulation: FlagAccumulation,
        value_accumulation: ValueAccumulation,
        dict_accumulation: DictAccumulation,
        merge_strategy: MergeStrategy,
        nesting_separator: char,
        key_value_separator: char,
        escape_char: char,
        nested_keys: bool,
        list_indices: bool,
        sparse_lists: bool,
        argfile_prefix: Option<char>,
        argfile_format: ArgFileFormat,
        argfile_comment_char: Option<char>,
        max_argfile_depth: usize,
    }

    /// Sets the global negation prefixes.
    pub fn negation_prefixes<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.negation_prefixes = Some(prefixes.into_iter().map(Into::into).collect());
        self
    }

    /// Validates the settings and produces a [`ParserConfig`].
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn build(self) -> Result<ParserConfig> {
        let base = ParserConfig::default();

        let long_prefix = self.long_prefix.unwrap_or(base.long_prefix);
        let short_prefix = self.short_prefix.unwrap_or(base.short_prefix);
        let end_of_options = self.end_of_options.unwrap_or(base.end_of_options);
        check_token("long_prefix", &long_prefix)?;
        check_token("end_of_options", &end_of_options)?;
        if short_prefix.is_whitespace() {
            return Err(ConfigError::WhitespaceInSetting {
                field: "short_prefix",
                value: short_prefix.to_string(),
            });
        }
        if long_prefix == short_prefix.to_string() {
            return Err(ConfigError::IndistinctPrefixes(long_prefix));
        }

        let min_abbreviation_length = self
            .min_abbreviation_length
            .unwrap_or(base.min_abbreviation_length);
        check_minimum("min_abbreviation_length", min_abbreviation_length, 1)?;
        let max_argfile_depth = self.max_argfile_depth.unwrap_or(base.max_argfile_depth);
        check_minimum("max_argfile_depth", max_argfile_depth, 1)?;

        if let Some(prefixes) = &self.negation_prefixes {
            if prefixes.iter().any(String::is_empty) {
                return Err(ConfigError::EmptyNegationPrefix);
            }
        }

        let grammar = [
            (
                "nesting_separator",
                self.nesting_separator.unwrap_or(defaults::NESTING_SEPARATOR),
            ),
            (
                "key_value_separator",
                self.key_value_separator
                    .unwrap_or(defaults::KEY_VALUE_SEPARATOR),
            ),
            (
                "escape_char",
                self.escape_char.unwrap_or(defaults::ESCAPE_CHAR),
            ),
        ];
        if let Some((first, second, ch)) = find_char_conflict(&grammar) {
            return Err(ConfigError::ConflictingCharacters { first, second, ch });
        }

        let negative_number_pattern = match &self.negative_number_pattern {
            Some(pattern) => compile_negative_number_pattern(pattern)?,
            None => base.negative_number_pattern,
        };

        Ok(ParserConfig {
            long_prefix,
            short_prefix,
            end_of_options,
            inline_value_separator: self
                .inline_value_separator
                .unwrap_or(base.inline_value_separator),
            short_clustering: self.short_clustering.unwrap_or(base.short_clustering),
            allow_aliases: self.allow_aliases.unwrap_or(base.allow_aliases),
            normalize_underscores: self
                .normalize_underscores
                .unwrap_or(base.normalize_underscores),
            case_insensitive: self.case_insensitive.unwrap_or(base.case_insensitive),
            allow_abbreviations: self.allow_abbreviations.unwrap_or(base.allow_abbreviations),
            min_abbreviation_length,
            abbreviate_subcommands: self
                .abbreviate_subcommands
                .unwrap_or(base.abbreviate_subcommands),
            strict_ordering: self.strict_ordering.unwrap_or(base.strict_ordering),
            allow_negative_numbers: self.allow_negative_numbers,
            negative_number_pattern,
            negation_prefixes: self.negation_prefixes,
            flag_accumulation: self.flag_accumulation,
            value_accumulation: self.value_accumulation,
            dict_accumulation: self.dict_accumulation,
            merge_strategy: self.merge_strategy,
            nesting_separator: self.nesting_separator,
            key_value_separator: self.key_value_separator,
            escape_char: self.escape_char,
            nested_keys: self.nested_keys,
            list_indices: self.list_indices,
            sparse_lists: self.sparse_lists,
            argfile_prefix: self.argfile_prefix.unwrap_or(base.argfile_prefix),
            argfile_format: self.argfile_format.unwrap_or(base.argfile_format),
            argfile_comment_char: self
                .argfile_comment_char
                .unwrap_or(base.argfile_comment_char),
            max_argfile_depth,
        })
    }
}

fn check_token(field: &'static str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(ConfigError::EmptySetting { field });
    }
    if value.chars().any(char::is_whitespace) {
        return Err(ConfigError::WhitespaceInSetting {
            field,
            value: value.to_string(),
        });
    }
    Ok(())
}

fn check_minimum(field: &'static str, value: usize, min: usize) -> Result<()> {
    if value < min {
        return Err(ConfigError::OutOfRange { field, value, min });
    }
    Ok(())
}

/// Compiles a user-supplied negative-number pattern.
///
/// The pattern must compile, must not match the empty string, and must not
/// repeat a group that already contains an unbounded quantifier.
pub fn compile_negative_number_pattern(pattern: &str) -> Result<Regex> {
    let regex = Regex::new(pattern).map_err(|err| ConfigError::InvalidPattern {
        pattern: pattern.to_string(),
        reason: err.to_string(),
    })?;
    if regex.is_match("") {
        return Err(ConfigError::PatternMatchesEmpty(pattern.to_string()));
    }
    if has_nested_quantifier(pattern) {
        return Err(ConfigError::NestedQuantifier(pattern.to_string()));
    }
    Ok(regex)
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Atom {
    None,
    Plain,
    Group { unbounded: bool },
}

/// Detects a repeating quantifier (`*`, `+`, `{n,}`, `{n,m}` with `m > 1`)
/// applied to a group that already contains an unbounded quantifier.
fn has_nested_quantifier(pattern: &str) -> bool {
    let chars: Vec<char> = pattern.chars().collect();
    // One flag per open group: does it contain an unbounded quantifier?
    let mut groups: Vec<bool> = vec![false];
    let mut last = Atom::None;
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '\\' => {
                i += 2;
                last = Atom::Plain;
                continue;
            }
            '[' => {
                i = skip_class(&chars, i);
                last = Atom::Plain;
                continue;
            }
            '(' => {
                i += 1;
                if chars.get(i) == Some(&'?') {
                    while i < chars.len() && !matches!(chars[i], ':' | ')' | '>') {
                        i += 1;
                    }
                    if chars.get(i) == Some(&')') {
                        // Flag-only group such as `(?i)`.
                        i += 1;
                        last = Atom::None;
                        continue;
                    }
                    i += 1;
                }
                groups.push(false);
                last = Atom::None;
                continue;
            }
            ')' => {
                let unbounded = groups.pop().unwrap_or(false);
                if let Some(parent) = groups.last_mut() {
                    *parent |= unbounded;
                }
                if groups.is_empty() {
                    groups.push(false);
                }
                last = Atom::Group { unbounded };
            }
            '*' | '+' => {
                if last == (Atom::Group { unbounded: true }) {
                    return true;
                }
                mark_unbounded(&mut groups);
                last = Atom::None;
                i = skip_lazy(&chars, i + 1);
                continue;
            }
            '?' => {
                last = Atom::None;
                i = skip_lazy(&chars, i + 1);
                continue;
            }
            '{' => {
                if let Some((end, upper)) = parse_counted(&chars, i) {
                    let repeating = upper.is_none_or(|max| max > 1);
                    if repeating && last == (Atom::Group { unbounded: true }) {
                        return true;
                    }
                    if upper.is_none() {
                        mark_unbounded(&mut groups);
                    }
                    last = Atom::None;
                    i = skip_lazy(&chars, end + 1);
                    continue;
                }
                last = Atom::Plain;
            }
            '|' => last = Atom::None,
            _ => last = Atom::Plain,
        }
        i += 1;
    }

    false
}

fn mark_unbounded(groups: &mut [bool]) {
    if let Some(top) = groups.last_mut() {
        *top = true;
    }
}

fn skip_lazy(chars: &[char], i: usize) -> usize {
    if chars.get(i) == Some(&'?') { i + 1 } else { i }
}

fn skip_class(chars: &[char], start: usize) -> usize {
    let mut i = start + 1;
    if chars.get(i) == Some(&'^') {
        i += 1;
    }
    if chars.get(i) == Some(&']') {
        i += 1;
    }
    while i < chars.len() {
        match chars[i] {
            '\\' => i += 2,
            ']' => return i + 1,
            _ => i += 1,
        }
    }
    i
}

/// Parses `{n}`, `{n,}` or `{n,m}` at `start`, returning the index of the
/// closing brace and the upper bound (`None` when unbounded).
fn parse_counted(chars: &[char], start: usize) -> Option<(usize, Option<usize>)> {
    let close = chars[start..].iter().position(|&c| c == '}')? + start;
    let body: String = chars[start + 1..close].iter().collect();
    let (low, high) = match body.split_once(',') {
        Some((low, high)) => (low, Some(high)),
        None => (body.as_str(), None),
    };
    let low: usize = low.trim().parse().ok()?;
    let upper = match high {
        None => Some(low),
        Some(h) if h.trim().is_empty() => None,
        Some(h) => Some(h.trim().parse().ok()?),
    };
    Some((close, upper))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults_match_default() {
        let built = ParserConfig::builder().build().unwrap();
        let default = ParserConfig::default();

        assert_eq!(built.long_prefix(), default.long_prefix());
        assert_eq!(built.end_of_options(), default.end_of_options());
        assert_eq!(built.min_abbreviation_length(), 3);
        assert_eq!(built.max_argfile_depth(), 1);
        assert_eq!(built.argfile_prefix(), Some('@'));
        assert_eq!(
            built.negative_number_pattern().as_str(),
            defaults::NEGATIVE_NUMBER_PATTERN
        );
    }

    #[test]
    fn test_default_pattern_matches_negative_numbers() {
        let config = ParserConfig::default();
        let re = config.negative_number_pattern();
        for token in ["-1", "-10", "-3.5", "-.5", "-1e10", "-2.5E-3"] {
            assert!(re.is_match(token), "{token} should match");
        }
        for token in ["-x", "--1", "-1a", "-", "1"] {
            assert!(!re.is_match(token), "{token} should not match");
        }
    }

    #[test]
    fn test_rejects_zero_numeric_settings() {
        assert_eq!(
            ParserConfig::builder()
                .min_abbreviation_length(0)
                .build()
                .unwrap_err(),
            ConfigError::OutOfRange {
                field: "min_abbreviation_length",
                value: 0,
                min: 1,
            }
        );
        assert_eq!(
            ParserConfig::builder()
                .max_argfile_depth(0)
                .build()
                .unwrap_err(),
            ConfigError::OutOfRange {
                field: "max_argfile_depth",
                value: 0,
                min: 1,
            }
        );
    }

    #[test]
    fn test_rejects_bad_patterns() {
        let err = ParserConfig::builder()
            .negative_number_pattern("(")
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPattern { .. }));

        let err = ParserConfig::builder()
            .negative_number_pattern("^-?\\d*$")
            .build()
            .unwrap_err();
        assert_eq!(err, ConfigError::PatternMatchesEmpty("^-?\\d*$".to_string()));

        let err = ParserConfig::builder()
            .negative_number_pattern("^-(\\d+)+$")
            .build()
            .unwrap_err();
        assert_eq!(err, ConfigError::NestedQuantifier("^-(\\d+)+$".to_string()));
    }

    #[test]
    fn test_nested_quantifier_detection() {
        assert!(has_nested_quantifier("(a*)*"));
        assert!(has_nested_quantifier("(?:x+){2,}"));
        assert!(has_nested_quantifier("((a+)b)*"));
        assert!(has_nested_quantifier("(a+){1,5}"));
        assert!(!has_nested_quantifier(defaults::NEGATIVE_NUMBER_PATTERN));
        assert!(!has_nested_quantifier("^-(\\d+)?$"));
        assert!(!has_nested_quantifier("^-[(+]+\\d$"));
        assert!(!has_nested_quantifier("(?i)^-\\d+$"));
        assert!(!has_nested_quantifier("(ab){3}"));
    }

    #[test]
    fn test_rejects_conflicting_dict_characters() {
        let err = ParserConfig::builder()
            .nesting_separator('=')
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            ConfigError::ConflictingCharacters {
                first: "nesting_separator",
                second: "key_value_separator",
                ch: '=',
            }
        );
    }

    #[test]
    fn test_rejects_indistinct_prefixes() {
        let err = ParserConfig::builder().long_prefix("-").build().unwrap_err();
        assert_eq!(err, ConfigError::IndistinctPrefixes("-".to_string()));
    }

    #[test]
    fn test_builder_deserializes_from_yaml() {
        let builder: ParserConfigBuilder = serde_yaml::from_str(
            "allow_abbreviations: true\nargfile_prefix: null\nnegation_prefixes: [\"no-\"]\n",
        )
        .unwrap();
        let config = builder.build().unwrap();

        assert!(config.allow_abbreviations());
        assert_eq!(config.argfile_prefix(), None);
        assert_eq!(config.argfile_comment_char(), Some('#'));
    }

    #[test]
    fn test_three_tier_resolution() {
        use crate::{CommandDef, OptionDef, OptionSpec};

        let spec = CommandDef::new("t")
            .with_option(OptionDef::dict("own").with_merge_strategy(MergeStrategy::Shallow))
            .with_option(OptionDef::dict("inherit"))
            .build()
            .unwrap();
        let (OptionSpec::Dict(own), OptionSpec::Dict(inherit)) =
            (&spec.options()[0], &spec.options()[1])
        else {
            panic!("expected dict options");
        };

        let system = ParserConfig::default();
        assert_eq!(system.resolve_merge_strategy(inherit), MergeStrategy::Deep);

        let global = ParserConfig::builder()
            .merge_strategy(MergeStrategy::Shallow)
            .build()
            .unwrap();
        assert_eq!(global.resolve_merge_strategy(inherit), MergeStrategy::Shallow);

        let global_deep = ParserConfig::builder()
            .merge_strategy(MergeStrategy::Deep)
            .build()
            .unwrap();
        assert_eq!(global_deep.resolve_merge_strategy(own), MergeStrategy::Shallow);
    }
}
