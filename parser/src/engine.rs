//! The single-pass engine.
//!
//! Each command level scans its tokens once, left to right, classifying
//! every token as end-of-options, negative number, long option, short
//! cluster, subcommand or positional. Option values are consumed as part of
//! the option's token; positionals are pooled and distributed across the
//! level's positional specs once the scan ends. A matched subcommand ends the
//! level and the remaining tokens are parsed against the child spec.

use std::collections::BTreeMap;

use argtree_core::{Arity, CommandSpec, OptionSpec, ParseResult, ParserConfig, Value};
use tracing::{debug, trace};

use crate::accumulate::{self, Duplicate, shape};
use crate::dict;
use crate::error::{ParseError, ParseErrorKind, Result};
use crate::resolve::{LevelTables, OptionMatch};

/// Parses an already-expanded argument list against a specification tree.
pub(crate) fn parse(
    spec: &CommandSpec,
    tables: &LevelTables,
    config: &ParserConfig,
    argv: &[String],
) -> Result<ParseResult> {
    Level::new(spec, tables, config, argv, vec![spec.name().to_string()]).run(0)
}

struct Level<'a> {
    spec: &'a CommandSpec,
    tables: &'a LevelTables,
    config: &'a ParserConfig,
    argv: &'a [String],
    path: Vec<String>,
    slots: Vec<Option<Value>>,
    /// Argv indices of positional tokens, in order.
    pool: Vec<usize>,
    /// Argv indices after `--` or after the strict-ordering lock.
    trailing: Vec<usize>,
    locked: bool,
}

impl<'a> Level<'a> {
    fn new(
        spec: &'a CommandSpec,
        tables: &'a LevelTables,
        config: &'a ParserConfig,
        argv: &'a [String],
        path: Vec<String>,
    ) -> Self {
        Self {
            spec,
            tables,
            config,
            argv,
            path,
            slots: vec![None; spec.options().len()],
            pool: Vec::new(),
            trailing: Vec::new(),
            locked: false,
        }
    }

    fn run(mut self, start: usize) -> Result<ParseResult> {
        let argv = self.argv;
        let mut cursor = start;
        let mut child = None;

        while cursor < argv.len() {
            let token = argv[cursor].as_str();
            trace!(index = cursor, token, command = ?self.path, "Classifying token");

            if self.locked {
                self.trailing.push(cursor);
                cursor += 1;
            } else if token == self.config.end_of_options() {
                self.trailing.extend(cursor + 1..argv.len());
                break;
            } else if self.is_negative_number(token, self.config.allow_negative_numbers()) {
                self.positional(cursor);
                cursor += 1;
            } else if let Some(body) = self.long_body(token) {
                cursor = self.long_option(body, cursor)?;
            } else if self.is_short(token) {
                cursor = self.short_cluster(token, cursor)?;
            } else if let Some(sub) = self
                .tables
                .names
                .resolve_subcommand(token, self.config)
                .map_err(|kind| self.fail(kind, cursor))?
            {
                child = Some((sub, cursor));
                break;
            } else {
                self.positional(cursor);
                cursor += 1;
            }
        }

        let end = child.map_or(argv.len(), |(_, at)| at);
        let positionals = self.group_positionals(end)?;

        let subcommand = match child {
            Some((sub, at)) => {
                let spec = &self.spec.subcommands()[sub];
                let mut path = self.path.clone();
                path.push(spec.name().to_string());
                debug!(command = ?path, index = at, "Entering subcommand");
                let level = Level::new(spec, &self.tables.children[sub], self.config, argv, path);
                Some(level.run(at + 1)?)
            }
            None => None,
        };

        let options = self
            .spec
            .options()
            .iter()
            .zip(self.slots)
            .filter_map(|(option, slot)| slot.map(|value| (option.name().to_string(), value)))
            .collect();

        Ok(ParseResult::new(
            self.spec.name(),
            argv[start..].to_vec(),
            options,
            positionals,
            subcommand,
        ))
    }

    fn fail(&self, kind: ParseErrorKind, index: usize) -> ParseError {
        ParseError::new(kind, self.argv.to_vec(), index, self.path.clone())
    }

    fn positional(&mut self, index: usize) {
        self.pool.push(index);
        if self.config.strict_ordering() {
            self.locked = true;
        }
    }

    fn is_negative_number(&self, token: &str, enabled: bool) -> bool {
        enabled && self.config.negative_number_pattern().is_match(token)
    }

    fn long_body<'t>(&self, token: &'t str) -> Option<&'t str> {
        token
            .strip_prefix(self.config.long_prefix())
            .filter(|body| !body.is_empty())
    }

    fn is_short(&self, token: &str) -> bool {
        token
            .strip_prefix(self.config.short_prefix())
            .is_some_and(|rest| !rest.is_empty())
    }

    /// Whether `token` ends a non-greedy option's values.
    fn is_boundary(&self, token: &str, negative_numbers: bool) -> bool {
        if token == self.config.end_of_options() {
            return true;
        }
        if self.long_body(token).is_some() || self.is_short(token) {
            return !self.is_negative_number(token, negative_numbers);
        }
        self.tables.names.is_subcommand(token, self.config)
    }

    fn long_option(&mut self, body: &str, at: usize) -> Result<usize> {
        let (name, inline) = match body.split_once(self.config.inline_value_separator()) {
            Some((name, value)) => (name, Some(value)),
            None => (body, None),
        };
        let found = self
            .tables
            .names
            .resolve_long(name, self.config)
            .map_err(|kind| self.fail(kind, at))?;
        self.occurrence(found, inline, at)
    }

    fn short_cluster(&mut self, token: &str, at: usize) -> Result<usize> {
        let body = &token[self.config.short_prefix().len_utf8()..];
        let separator = self.config.inline_value_separator();
        let spec = self.spec;

        for (offset, c) in body.char_indices() {
            let found = self
                .tables
                .names
                .resolve_short(c, self.config)
                .map_err(|kind| self.fail(kind, at))?;
            let rest = &body[offset + c.len_utf8()..];
            let option = &spec.options()[found.option];

            if !matches!(option, OptionSpec::Flag(_)) {
                let inline =
                    (!rest.is_empty()).then(|| rest.strip_prefix(separator).unwrap_or(rest));
                return self.occurrence(found, inline, at);
            }

            let unclustered = !self.config.short_clustering() && !rest.is_empty();
            if rest.starts_with(separator) || unclustered {
                let value = rest.strip_prefix(separator).unwrap_or(rest);
                return Err(self.fail(
                    ParseErrorKind::FlagWithValue {
                        name: option.name().to_string(),
                        value: value.to_string(),
                    },
                    at,
                ));
            }
            self.occurrence(found, None, at)?;
        }

        Ok(at + 1)
    }

    /// Records one occurrence of an option whose name token is at `at`,
    /// consuming its values. Returns the index of the next unconsumed token.
    fn occurrence(&mut self, found: OptionMatch, inline: Option<&str>, at: usize) -> Result<usize> {
        let (config, spec) = (self.config, self.spec);
        let option = &spec.options()[found.option];
        let name = option.name();

        let (recorded, next) = match option {
            OptionSpec::Flag(flag) => {
                if let Some(value) = inline {
                    return Err(self.fail(
                        ParseErrorKind::FlagWithValue {
                            name: name.to_string(),
                            value: value.to_string(),
                        },
                        at,
                    ));
                }
                let mode = config.resolve_flag_accumulation(flag);
                let slot = &mut self.slots[found.option];
                let recorded = accumulate::flag(slot, mode, !found.negated);
                (recorded, at + 1)
            }
            OptionSpec::Value(spec) => {
                let negative = config.resolve_negative_numbers(spec);
                let (values, next) =
                    self.consume(spec.arity(), spec.greedy(), negative, inline, at);
                self.check_arity(name, spec.arity(), values.len(), at)?;
                let occurrence = shape(values.into_iter().map(|(_, v)| v).collect(), spec.arity());
                let mode = config.resolve_value_accumulation(spec);
                let recorded = accumulate::value(&mut self.slots[found.option], mode, occurrence);
                (recorded, next)
            }
            OptionSpec::Dict(spec) => {
                let negative = config.allow_negative_numbers();
                let (values, next) = self.consume(spec.arity(), false, negative, inline, at);
                self.check_arity(name, spec.arity(), values.len(), at)?;

                let grammar = config.resolve_dict_grammar(spec);
                let tokens: Vec<String> = values.iter().map(|(_, v)| v.clone()).collect();
                let map = dict::parse_occurrence(&tokens, &grammar).map_err(|(token, reason)| {
                    let index = values
                        .iter()
                        .find(|(_, v)| v == token)
                        .map_or(at, |(i, _)| *i);
                    self.fail(
                        ParseErrorKind::MalformedDict {
                            option: name.to_string(),
                            token: token.to_string(),
                            reason,
                        },
                        index,
                    )
                })?;

                let mode = config.resolve_dict_accumulation(spec);
                let strategy = config.resolve_merge_strategy(spec);
                let recorded = accumulate::dict(&mut self.slots[found.option], mode, strategy, map);
                (recorded, next)
            }
        };

        recorded.map_err(|Duplicate| {
            self.fail(
                ParseErrorKind::DuplicateOccurrence {
                    name: name.to_string(),
                },
                at,
            )
        })?;
        trace!(option = name, negated = found.negated, "Recorded option");
        Ok(next)
    }

    /// Collects values for an option at `at`: the inline value first, then
    /// following tokens up to the arity maximum or the next boundary.
    fn consume(
        &self,
        arity: Arity,
        greedy: bool,
        negative_numbers: bool,
        inline: Option<&str>,
        at: usize,
    ) -> (Vec<(usize, String)>, usize) {
        let mut values: Vec<(usize, String)> =
            inline.map(|v| (at, v.to_string())).into_iter().collect();
        let mut next = at + 1;

        while next < self.argv.len() && arity.max.is_none_or(|max| values.len() < max) {
            let token = &self.argv[next];
            if !greedy && self.is_boundary(token, negative_numbers) {
                break;
            }
            values.push((next, token.clone()));
            next += 1;
        }

        (values, next)
    }

    fn check_arity(&self, name: &str, arity: Arity, actual: usize, at: usize) -> Result<()> {
        if arity.accepts(actual) {
            return Ok(());
        }
        Err(self.fail(
            ParseErrorKind::ArityViolation {
                name: name.to_string(),
                expected: arity,
                actual,
            },
            at,
        ))
    }

    /// Distributes pooled positionals (then trailing tokens) over the
    /// level's positional specs, left to right. Each spec leaves enough for
    /// the minimums of the specs after it, unless it is greedy.
    fn group_positionals(&self, end: usize) -> Result<BTreeMap<String, Value>> {
        let pool: Vec<usize> = self.pool.iter().chain(&self.trailing).copied().collect();
        let specs = self.spec.positionals();
        let mut groups = BTreeMap::new();
        let mut cursor = 0;

        for (k, positional) in specs.iter().enumerate() {
            let arity = positional.arity();
            let remaining = pool.len() - cursor;
            let available = if positional.greedy() {
                remaining
            } else {
                let reserved: usize = specs[k + 1..].iter().map(|s| s.arity().min).sum();
                remaining
                    .saturating_sub(reserved)
                    .max(arity.min.min(remaining))
            };
            let take = arity.max.map_or(available, |max| available.min(max));

            if take < arity.min {
                let index = pool.get(cursor + take).copied().unwrap_or(end);
                return Err(self.fail(
                    ParseErrorKind::ArityViolation {
                        name: positional.name().to_string(),
                        expected: arity,
                        actual: take,
                    },
                    index,
                ));
            }

            if take > 0 {
                let values = pool[cursor..cursor + take]
                    .iter()
                    .map(|&i| self.argv[i].clone())
                    .collect();
                groups.insert(positional.name().to_string(), shape(values, arity));
            }
            cursor += take;
        }

        if let Some(&index) = pool.get(cursor) {
            return Err(self.fail(
                ParseErrorKind::UnexpectedPositional {
                    value: self.argv[index].clone(),
                },
                index,
            ));
        }

        Ok(groups)
    }
}
