//! Construction-time validation.
//!
//! [`CommandDef::build`] walks a definition tree once, level by level, and
//! either returns a fully validated [`CommandSpec`] or the first
//! [`SpecError`] found. Each error names the offending field through a path
//! such as `git remote add --force` or `cp <dest>`.
//!
//! # Examples
//!
//! ```
//! use argtree_core::*;
//!
//! let ok = CommandDef::new("git")
//!     .with_option(OptionDef::flag("verbose").with_short('v'))
//!     .build();
//! assert!(ok.is_ok());
//!
//! // Negation only makes sense on flags.
//! let bad = CommandDef::new("git")
//!     .with_option(OptionDef::value("output").with_negation_prefix("no-"))
//!     .build();
//! assert!(matches!(bad, Err(SpecError::NegationOnNonFlag { .. })));
//! ```

use std::collections::HashSet;

use thiserror::Error;

use crate::spec::{DictOverrides, OptionNames};
use crate::{
    Accumulation, Arity, CommandDef, CommandSpec, DictAccumulation, DictSpec, FlagAccumulation,
    FlagSpec, OptionDef, OptionKind, OptionSpec, PositionalDef, PositionalSpec, ValueAccumulation,
    ValueSpec, find_char_conflict,
};

/// Specification errors, raised only while building a [`CommandSpec`] or a
/// parser over it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpecError {
    /// A command, option, alias or positional name is empty.
    #[error("empty name at {path}")]
    EmptyName { path: String },
    /// A name contains whitespace or starts with a dash.
    #[error("invalid name '{name}' at {path}")]
    InvalidName { path: String, name: String },
    /// A short form is whitespace or a dash.
    #[error("invalid short name '{short}' at {path}")]
    InvalidShortName { path: String, short: char },
    /// Two entities at one level share a name, alias or short form.
    #[error("duplicate name '{name}' in {path}")]
    DuplicateName { path: String, name: String },
    /// A bounded maximum is below the minimum.
    #[error("invalid arity {arity} at {path}: max must be >= min")]
    InvalidArity { path: String, arity: Arity },
    /// A flag declares an arity other than `(0, 0)`.
    #[error("flag {path} cannot take values (arity {arity})")]
    FlagArity { path: String, arity: Arity },
    /// Negation prefixes or short forms on a value or dict option.
    #[error("negation settings on non-flag option {path}")]
    NegationOnNonFlag { path: String },
    /// A kind-specific setting on an option of another kind.
    #[error("setting '{setting}' does not apply to {kind} option {path}")]
    SettingNotApplicable {
        path: String,
        setting: &'static str,
        kind: OptionKind,
    },
    /// An accumulation mode the option kind does not support.
    #[error("accumulation mode '{mode}' is not supported by {kind} option {path}")]
    InvalidAccumulation {
        path: String,
        mode: Accumulation,
        kind: OptionKind,
    },
    /// A negation prefix is the empty string.
    #[error("empty negation prefix at {path}")]
    EmptyNegationPrefix { path: String },
    /// Two dict grammar characters coincide.
    #[error("{first} and {second} both use '{ch}' at {path}")]
    ConflictingSeparators {
        path: String,
        first: &'static str,
        second: &'static str,
        ch: char,
    },
    /// A greedy positional precedes a positional that needs values.
    #[error("greedy positional {path} leaves nothing for required positional '{successor}'")]
    GreedyPositionalStarvesSuccessor { path: String, successor: String },
}

/// Convenience alias for results with [`SpecError`].
pub type Result<T> = std::result::Result<T, SpecError>;

impl CommandDef {
    /// Validates this definition tree into an immutable [`CommandSpec`].
    ///
    /// # Errors
    ///
    /// Returns the first [`SpecError`] found, walking levels top-down and
    /// options before positionals before subcommands.
    pub fn build(&self) -> Result<CommandSpec> {
        build_command(self, &[])
    }
}

fn build_command(def: &CommandDef, parent: &[&str]) -> Result<CommandSpec> {
    let display_parent = parent.join(" ");
    let label = if display_parent.is_empty() {
        "<root>".to_string()
    } else {
        display_parent
    };
    check_name(&def.name, &label)?;

    let mut path: Vec<&str> = parent.to_vec();
    path.push(&def.name);
    let here = path.join(" ");

    for alias in &def.aliases {
        check_name(alias, &here)?;
    }

    let options = def
        .options
        .iter()
        .map(|option| build_option(option, &format!("{here} --{}", option.name)))
        .collect::<Result<Vec<_>>>()?;

    let positionals = def
        .positionals
        .iter()
        .map(|positional| build_positional(positional, &format!("{here} <{}>", positional.name)))
        .collect::<Result<Vec<_>>>()?;

    check_unique_names(def, &here)?;
    check_greedy_positionals(&positionals, &here)?;

    let subcommands = def
        .subcommands
        .iter()
        .map(|sub| build_command(sub, &path))
        .collect::<Result<Vec<_>>>()?;

    Ok(CommandSpec {
        name: def.name.clone(),
        aliases: def.aliases.clone(),
        description: def.description.clone(),
        options,
        positionals,
        subcommands,
    })
}

fn check_name(name: &str, path: &str) -> Result<()> {
    if name.is_empty() {
        return Err(SpecError::EmptyName {
            path: path.to_string(),
        });
    }
    if name.starts_with('-') || name.chars().any(char::is_whitespace) {
        return Err(SpecError::InvalidName {
            path: path.to_string(),
            name: name.to_string(),
        });
    }
    Ok(())
}

fn check_short(short: char, path: &str) -> Result<()> {
    if short == '-' || short.is_whitespace() {
        return Err(SpecError::InvalidShortName {
            path: path.to_string(),
            short,
        });
    }
    Ok(())
}

fn build_option(def: &OptionDef, path: &str) -> Result<OptionSpec> {
    check_name(&def.name, path)?;
    for alias in &def.aliases {
        check_name(alias, path)?;
    }
    for short in def.short.iter().chain(&def.negation_shorts) {
        check_short(*short, path)?;
    }

    let arity = def.effective_arity();
    if arity.is_inverted() {
        return Err(SpecError::InvalidArity {
            path: path.to_string(),
            arity,
        });
    }

    check_kind_settings(def, path)?;

    let names = OptionNames {
        name: def.name.clone(),
        short: def.short.clone(),
        aliases: def.aliases.clone(),
        description: def.description.clone(),
    };

    let option = match def.kind {
        OptionKind::Flag => {
            if arity != Arity::NONE {
                return Err(SpecError::FlagArity {
                    path: path.to_string(),
                    arity,
                });
            }
            if let Some(prefixes) = &def.negation_prefixes {
                if prefixes.iter().any(String::is_empty) {
                    return Err(SpecError::EmptyNegationPrefix {
                        path: path.to_string(),
                    });
                }
            }
            OptionSpec::Flag(FlagSpec {
                names,
                accumulation: narrow(def, path, FlagAccumulation::from_mode)?,
                negation_prefixes: def.negation_prefixes.clone(),
                negation_shorts: def.negation_shorts.clone(),
            })
        }
        OptionKind::Value => OptionSpec::Value(ValueSpec {
            names,
            arity,
            accumulation: narrow(def, path, ValueAccumulation::from_mode)?,
            greedy: def.greedy,
            allow_negative_numbers: def.allow_negative_numbers,
        }),
        OptionKind::Dict => {
            let chars = [
                ("nesting_separator", def.nesting_separator),
                ("key_value_separator", def.key_value_separator),
                ("escape_char", def.escape_char),
            ];
            let declared: Vec<(&'static str, char)> = chars
                .iter()
                .filter_map(|(field, ch)| ch.map(|c| (*field, c)))
                .collect();
            if let Some((first, second, ch)) = find_char_conflict(&declared) {
                return Err(SpecError::ConflictingSeparators {
                    path: path.to_string(),
                    first,
                    second,
                    ch,
                });
            }
            OptionSpec::Dict(DictSpec {
                names,
                arity,
                accumulation: narrow(def, path, DictAccumulation::from_mode)?,
                merge_strategy: def.merge_strategy,
                overrides: DictOverrides {
                    nesting_separator: def.nesting_separator,
                    key_value_separator: def.key_value_separator,
                    escape_char: def.escape_char,
                    nested_keys: def.nested_keys,
                    list_indices: def.list_indices,
                    sparse_lists: def.sparse_lists,
                },
            })
        }
    };

    Ok(option)
}

fn narrow<T>(
    def: &OptionDef,
    path: &str,
    from_mode: fn(Accumulation) -> Option<T>,
) -> Result<Option<T>> {
    match def.accumulation {
        None => Ok(None),
        Some(mode) => from_mode(mode)
            .map(Some)
            .ok_or_else(|| SpecError::InvalidAccumulation {
                path: path.to_string(),
                mode,
                kind: def.kind,
            }),
    }
}

fn check_kind_settings(def: &OptionDef, path: &str) -> Result<()> {
    let not_applicable = |setting: &'static str| SpecError::SettingNotApplicable {
        path: path.to_string(),
        setting,
        kind: def.kind,
    };

    if def.kind != OptionKind::Flag
        && (def.negation_prefixes.is_some() || !def.negation_shorts.is_empty())
    {
        return Err(SpecError::NegationOnNonFlag {
            path: path.to_string(),
        });
    }

    if def.kind != OptionKind::Value {
        if def.greedy {
            return Err(not_applicable("greedy"));
        }
        if def.allow_negative_numbers.is_some() {
            return Err(not_applicable("allow_negative_numbers"));
        }
    }

    if def.kind != OptionKind::Dict {
        let dict_settings = [
            ("merge_strategy", def.merge_strategy.is_some()),
            ("nesting_separator", def.nesting_separator.is_some()),
            ("key_value_separator", def.key_value_separator.is_some()),
            ("escape_char", def.escape_char.is_some()),
            ("nested_keys", def.nested_keys.is_some()),
            ("list_indices", def.list_indices.is_some()),
            ("sparse_lists", def.sparse_lists.is_some()),
        ];
        if let Some(&(setting, _)) = dict_settings.iter().find(|(_, set)| *set) {
            return Err(not_applicable(setting));
        }
    }

    Ok(())
}

fn build_positional(def: &PositionalDef, path: &str) -> Result<PositionalSpec> {
    check_name(&def.name, path)?;
    if def.arity.is_inverted() {
        return Err(SpecError::InvalidArity {
            path: path.to_string(),
            arity: def.arity,
        });
    }
    Ok(PositionalSpec {
        name: def.name.clone(),
        arity: def.arity,
        greedy: def.greedy,
        description: def.description.clone(),
    })
}

fn check_unique_names(def: &CommandDef, path: &str) -> Result<()> {
    let duplicate = |name: &str| SpecError::DuplicateName {
        path: path.to_string(),
        name: name.to_string(),
    };

    // Canonical names share one namespace per level.
    let mut canonical: HashSet<&str> = HashSet::new();
    let names = def
        .options
        .iter()
        .map(|o| o.name.as_str())
        .chain(def.positionals.iter().map(|p| p.name.as_str()))
        .chain(def.subcommands.iter().map(|s| s.name.as_str()));
    for name in names {
        if !canonical.insert(name) {
            return Err(duplicate(name));
        }
    }

    let mut long: HashSet<&str> = HashSet::new();
    for option in &def.options {
        for name in std::iter::once(&option.name).chain(&option.aliases) {
            if !long.insert(name.as_str()) {
                return Err(duplicate(name));
            }
        }
    }

    let mut short: HashSet<char> = HashSet::new();
    for option in &def.options {
        for ch in option.short.iter().chain(&option.negation_shorts) {
            if !short.insert(*ch) {
                return Err(duplicate(&ch.to_string()));
            }
        }
    }

    let mut commands: HashSet<&str> = HashSet::new();
    for sub in &def.subcommands {
        for name in std::iter::once(&sub.name).chain(&sub.aliases) {
            if !commands.insert(name.as_str()) {
                return Err(duplicate(name));
            }
        }
    }

    Ok(())
}

fn check_greedy_positionals(positionals: &[PositionalSpec], path: &str) -> Result<()> {
    for (i, positional) in positionals.iter().enumerate() {
        if !positional.greedy {
            continue;
        }
        if let Some(starved) = positionals[i + 1..].iter().find(|p| p.arity.min > 0) {
            return Err(SpecError::GreedyPositionalStarvesSuccessor {
                path: format!("{path} <{}>", positional.name),
                successor: starved.name.clone(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::MergeStrategy;

    use super::*;

    #[test]
    fn test_build_rejects_duplicate_across_options_and_positionals() {
        let err = CommandDef::new("tool")
            .with_option(OptionDef::value("input"))
            .with_positional(PositionalDef::required("input"))
            .build()
            .unwrap_err();

        assert_eq!(
            err,
            SpecError::DuplicateName {
                path: "tool".to_string(),
                name: "input".to_string(),
            }
        );
    }

    #[test]
    fn test_build_rejects_duplicate_short() {
        let err = CommandDef::new("tool")
            .with_option(OptionDef::flag("verbose").with_short('v'))
            .with_option(OptionDef::flag("version").with_short('v'))
            .build()
            .unwrap_err();

        assert!(matches!(err, SpecError::DuplicateName { name, .. } if name == "v"));
    }

    #[test]
    fn test_same_name_at_different_levels_is_allowed() {
        let spec = CommandDef::new("tool")
            .with_option(OptionDef::flag("verbose"))
            .with_subcommand(CommandDef::new("run").with_option(OptionDef::flag("verbose")))
            .build();

        assert!(spec.is_ok());
    }

    #[test]
    fn test_build_rejects_inverted_arity_with_path() {
        let err = CommandDef::new("git")
            .with_subcommand(
                CommandDef::new("log")
                    .with_option(OptionDef::value("range").with_arity(Arity::range(2, 1))),
            )
            .build()
            .unwrap_err();

        assert_eq!(
            err,
            SpecError::InvalidArity {
                path: "git log --range".to_string(),
                arity: Arity::range(2, 1),
            }
        );
    }

    #[test]
    fn test_build_rejects_flag_with_arity() {
        let err = CommandDef::new("tool")
            .with_option(OptionDef::flag("force").with_arity(Arity::one()))
            .build()
            .unwrap_err();

        assert!(matches!(err, SpecError::FlagArity { .. }));
    }

    #[test]
    fn test_build_rejects_accumulation_for_wrong_kind() {
        let err = CommandDef::new("tool")
            .with_option(OptionDef::value("out").with_accumulation(Accumulation::Count))
            .build()
            .unwrap_err();

        assert_eq!(
            err,
            SpecError::InvalidAccumulation {
                path: "tool --out".to_string(),
                mode: Accumulation::Count,
                kind: OptionKind::Value,
            }
        );
    }

    #[test]
    fn test_build_rejects_dict_settings_on_value() {
        let err = CommandDef::new("tool")
            .with_option(OptionDef::value("out").with_merge_strategy(MergeStrategy::Shallow))
            .build()
            .unwrap_err();

        assert!(matches!(
            err,
            SpecError::SettingNotApplicable { setting: "merge_strategy", .. }
        ));
    }

    #[test]
    fn test_build_rejects_greedy_on_flag() {
        let err = CommandDef::new("tool")
            .with_option(OptionDef::flag("all").greedy())
            .build()
            .unwrap_err();

        assert!(matches!(err, SpecError::SettingNotApplicable { setting: "greedy", .. }));
    }

    #[test]
    fn test_build_rejects_conflicting_dict_separators() {
        let err = CommandDef::new("tool")
            .with_option(
                OptionDef::dict("set")
                    .with_nesting_separator(':')
                    .with_key_value_separator(':'),
            )
            .build()
            .unwrap_err();

        assert!(matches!(err, SpecError::ConflictingSeparators { ch: ':', .. }));
    }

    #[test]
    fn test_build_rejects_greedy_positional_before_required() {
        let err = CommandDef::new("cp")
            .with_positional(PositionalDef::new("sources", Arity::at_least(1)).greedy())
            .with_positional(PositionalDef::required("dest"))
            .build()
            .unwrap_err();

        assert_eq!(
            err,
            SpecError::GreedyPositionalStarvesSuccessor {
                path: "cp <sources>".to_string(),
                successor: "dest".to_string(),
            }
        );
    }

    #[test]
    fn test_build_allows_greedy_positional_before_optional() {
        let spec = CommandDef::new("run")
            .with_positional(PositionalDef::new("args", Arity::any()).greedy())
            .with_positional(PositionalDef::optional("extra"))
            .build();

        assert!(spec.is_ok());
    }

    #[test]
    fn test_build_rejects_dash_prefixed_name() {
        let err = CommandDef::new("tool")
            .with_option(OptionDef::flag("--verbose"))
            .build()
            .unwrap_err();

        assert!(matches!(err, SpecError::InvalidName { name, .. } if name == "--verbose"));
    }

    #[test]
    fn test_build_rejects_empty_root_name() {
        let err = CommandDef::new("").build().unwrap_err();
        assert_eq!(
            err,
            SpecError::EmptyName {
                path: "<root>".to_string()
            }
        );
    }
}
