//! Name resolution.
//!
//! One [`NameTable`] is built per command level when a parser is created and
//! shared read-only by every parse. A user-supplied name is matched against
//! it by strategies in fixed precedence, stopping at the first strategy that
//! matches anything:
//!
//! 1. exact canonical name (including synthesized negations),
//! 2. alias,
//! 3. underscore/dash normalization,
//! 4. case-insensitive,
//! 5. unambiguous prefix of at least `min_abbreviation_length` characters.
//!
//! A strategy matching more than one target is an ambiguity error.

use std::collections::{BTreeSet, HashMap};

use argtree_core::{CommandSpec, OptionSpec, ParserConfig, SpecError};

use crate::error::ParseErrorKind;

/// Resolved option occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct OptionMatch {
    /// Index into the level's options.
    pub option: usize,
    /// A negation form matched; the flag is forced to `false`.
    pub negated: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Origin {
    Canonical,
    Alias,
}

#[derive(Debug)]
struct Entry<T> {
    key: String,
    origin: Origin,
    target: T,
    /// Canonical name of the target, reported in ambiguity errors. Aliases
    /// and synthesized negations report the name they stand for.
    display: String,
}

#[derive(Debug)]
pub(crate) struct NameTable {
    long: Vec<Entry<OptionMatch>>,
    short: HashMap<char, OptionMatch>,
    subcommands: Vec<Entry<usize>>,
}

/// Name tables for a command level and, in the same order, its subcommands.
#[derive(Debug)]
pub(crate) struct LevelTables {
    pub names: NameTable,
    pub children: Vec<LevelTables>,
}

impl LevelTables {
    /// Builds tables for a whole specification tree.
    ///
    /// Synthesized negation names must not collide with any other long name
    /// at their level, and every dict option's effective grammar must use
    /// distinct characters.
    pub fn build(spec: &CommandSpec, config: &ParserConfig) -> Result<Self, SpecError> {
        Self::build_level(spec, config, spec.name())
    }

    fn build_level(
        spec: &CommandSpec,
        config: &ParserConfig,
        path: &str,
    ) -> Result<Self, SpecError> {
        let names = NameTable::build(spec, config, path)?;
        let children = spec
            .subcommands()
            .iter()
            .map(|sub| Self::build_level(sub, config, &format!("{path} {}", sub.name())))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { names, children })
    }
}

impl NameTable {
    fn build(spec: &CommandSpec, config: &ParserConfig, path: &str) -> Result<Self, SpecError> {
        let mut long = Vec::new();
        let mut short = HashMap::new();

        for (index, option) in spec.options().iter().enumerate() {
            let names = option.names();
            let plain = OptionMatch {
                option: index,
                negated: false,
            };
            long.push(Entry {
                key: names.name().to_string(),
                origin: Origin::Canonical,
                target: plain,
                display: names.name().to_string(),
            });
            for alias in names.aliases() {
                long.push(Entry {
                    key: alias.clone(),
                    origin: Origin::Alias,
                    target: plain,
                    display: names.name().to_string(),
                });
            }
            for &c in names.short() {
                short.insert(c, plain);
            }

            match option {
                OptionSpec::Flag(flag) => {
                    let negated = OptionMatch {
                        option: index,
                        negated: true,
                    };
                    for prefix in config.resolve_negation_prefixes(flag) {
                        let key = format!("{prefix}{}", names.name());
                        long.push(Entry {
                            key,
                            origin: Origin::Canonical,
                            target: negated,
                            display: names.name().to_string(),
                        });
                    }
                    for &c in flag.negation_shorts() {
                        short.insert(c, negated);
                    }
                }
                OptionSpec::Dict(dict) => {
                    let grammar = config.resolve_dict_grammar(dict);
                    if let Some((first, second, ch)) = grammar.conflict() {
                        return Err(SpecError::ConflictingSeparators {
                            path: format!("{path} --{}", names.name()),
                            first,
                            second,
                            ch,
                        });
                    }
                }
                OptionSpec::Value(_) => {}
            }
        }

        let mut seen = BTreeSet::new();
        for entry in &long {
            if !seen.insert(entry.key.as_str()) {
                return Err(SpecError::DuplicateName {
                    path: path.to_string(),
                    name: entry.key.clone(),
                });
            }
        }

        let mut subcommands = Vec::new();
        for (index, sub) in spec.subcommands().iter().enumerate() {
            subcommands.push(Entry {
                key: sub.name().to_string(),
                origin: Origin::Canonical,
                target: index,
                display: sub.name().to_string(),
            });
            for alias in sub.aliases() {
                subcommands.push(Entry {
                    key: alias.clone(),
                    origin: Origin::Alias,
                    target: index,
                    display: sub.name().to_string(),
                });
            }
        }

        Ok(Self {
            long,
            short,
            subcommands,
        })
    }

    /// Resolves a long option name (without prefix or inline value).
    pub fn resolve_long(
        &self,
        name: &str,
        config: &ParserConfig,
    ) -> Result<OptionMatch, ParseErrorKind> {
        match resolve(&self.long, name, config, config.allow_abbreviations()) {
            Lookup::Found(found) => Ok(found),
            Lookup::Ambiguous(candidates) => Err(ParseErrorKind::AmbiguousOption {
                name: name.to_string(),
                candidates,
            }),
            Lookup::Missing => Err(ParseErrorKind::UnknownOption {
                name: format!("{}{name}", config.long_prefix()),
            }),
        }
    }

    /// Resolves a single short option character.
    pub fn resolve_short(
        &self,
        c: char,
        config: &ParserConfig,
    ) -> Result<OptionMatch, ParseErrorKind> {
        self.short
            .get(&c)
            .copied()
            .ok_or_else(|| ParseErrorKind::UnknownOption {
                name: format!("{}{c}", config.short_prefix()),
            })
    }

    /// Resolves a subcommand name; `Ok(None)` means the token is not a
    /// subcommand.
    pub fn resolve_subcommand(
        &self,
        name: &str,
        config: &ParserConfig,
    ) -> Result<Option<usize>, ParseErrorKind> {
        if self.subcommands.is_empty() {
            return Ok(None);
        }
        let abbreviate = config.allow_abbreviations() && config.abbreviate_subcommands();
        match resolve(&self.subcommands, name, config, abbreviate) {
            Lookup::Found(found) => Ok(Some(found)),
            Lookup::Ambiguous(candidates) => Err(ParseErrorKind::AmbiguousSubcommand {
                name: name.to_string(),
                candidates,
            }),
            Lookup::Missing => Ok(None),
        }
    }

    /// Whether `name` resolves to exactly one subcommand.
    pub fn is_subcommand(&self, name: &str, config: &ParserConfig) -> bool {
        matches!(self.resolve_subcommand(name, config), Ok(Some(_)))
    }
}

enum Lookup<T> {
    Found(T),
    Ambiguous(Vec<String>),
    Missing,
}

fn resolve<T: Copy + PartialEq>(
    entries: &[Entry<T>],
    name: &str,
    config: &ParserConfig,
    abbreviate: bool,
) -> Lookup<T> {
    let aliases = config.allow_aliases();
    let usable = |e: &&Entry<T>| aliases || e.origin == Origin::Canonical;

    let folded = fold(name, config);
    let exact = |e: &Entry<T>| e.origin == Origin::Canonical && e.key == name;
    let alias = |e: &Entry<T>| e.origin == Origin::Alias && e.key == name;
    let normalized = |e: &Entry<T>| normalize(&e.key) == normalize(name);
    let caseless = |e: &Entry<T>| fold(&e.key, config) == folded;
    let prefix = |e: &Entry<T>| fold(&e.key, config).starts_with(&folded);

    let strategies: [(bool, &dyn Fn(&Entry<T>) -> bool); 5] = [
        (true, &exact),
        (aliases, &alias),
        (config.normalize_underscores(), &normalized),
        (config.case_insensitive(), &caseless),
        (
            abbreviate && name.chars().count() >= config.min_abbreviation_length(),
            &prefix,
        ),
    ];

    for (enabled, matches) in strategies {
        if !enabled {
            continue;
        }
        let hits: Vec<&Entry<T>> = entries.iter().filter(usable).filter(|e| matches(*e)).collect();
        let Some(first) = hits.first() else {
            continue;
        };
        if hits.iter().all(|e| e.target == first.target) {
            return Lookup::Found(first.target);
        }
        let candidates: BTreeSet<&str> = hits.iter().map(|e| e.display.as_str()).collect();
        return Lookup::Ambiguous(candidates.into_iter().map(str::to_string).collect());
    }

    Lookup::Missing
}

fn normalize(name: &str) -> String {
    name.replace('_', "-")
}

/// Applies every enabled folding (normalization, case) to a name.
fn fold(name: &str, config: &ParserConfig) -> String {
    let name = if config.normalize_underscores() {
        normalize(name)
    } else {
        name.to_string()
    };
    if config.case_insensitive() {
        name.to_lowercase()
    } else {
        name
    }
}
