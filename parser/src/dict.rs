//! Key grammar for dict option tokens.
//!
//! A token reads `key=value`. The key splits on the nesting separator into
//! path segments, each optionally followed by `[N]` list indices, and the
//! escape character makes the next key character literal. The value is taken
//! verbatim after the first unescaped key/value separator.
//!
//! ```text
//! server.ports[0]=80     {"server": {"ports": ["80"]}}
//! a\.b=1                 {"a.b": "1"}
//! ```

use std::collections::BTreeMap;

use argtree_core::{DictGrammar, Value};

use crate::error::DictSyntaxError;

type Result<T> = std::result::Result<T, DictSyntaxError>;

/// Most key and index segments one assignment may nest.
pub(crate) const MAX_KEY_DEPTH: usize = 64;

/// Most padding entries a sparse list index may add past the end of a list.
pub(crate) const MAX_SPARSE_GAP: usize = 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Key(String),
    Index(usize),
}

/// Parses every token of one dict occurrence into a single map.
///
/// Returns the offending token alongside the error.
pub(crate) fn parse_occurrence<'t>(
    tokens: &'t [String],
    grammar: &DictGrammar,
) -> std::result::Result<BTreeMap<String, Value>, (&'t str, DictSyntaxError)> {
    let mut root = Value::Map(BTreeMap::new());
    for token in tokens {
        let (segments, value) =
            parse_assignment(token, grammar).map_err(|e| (token.as_str(), e))?;
        assign(&mut root, &segments, value, grammar.sparse_lists)
            .map_err(|e| (token.as_str(), e))?;
    }
    match root {
        Value::Map(map) => Ok(map),
        _ => unreachable!("dict keys always start with a named segment"),
    }
}

fn parse_assignment(token: &str, grammar: &DictGrammar) -> Result<(Vec<Segment>, String)> {
    let mut segments = Vec::new();
    let mut key = String::new();
    let mut key_started = false;
    let mut after_index = false;
    let mut chars = token.char_indices();

    while let Some((offset, c)) = chars.next() {
        if c == grammar.escape_char {
            let (_, escaped) = chars.next().ok_or(DictSyntaxError::DanglingEscape)?;
            if after_index {
                return Err(DictSyntaxError::TrailingAfterIndex(escaped));
            }
            key.push(escaped);
            key_started = true;
        } else if c == grammar.key_value_separator {
            end_segment(&mut segments, &mut key, key_started, after_index)?;
            let value = &token[offset + c.len_utf8()..];
            return Ok((segments, value.to_string()));
        } else if grammar.nested_keys && c == grammar.nesting_separator {
            end_segment(&mut segments, &mut key, key_started, after_index)?;
            key_started = false;
            after_index = false;
        } else if grammar.list_indices && c == '[' {
            if key_started {
                push(&mut segments, Segment::Key(std::mem::take(&mut key)))?;
                key_started = false;
            } else if !after_index {
                return Err(DictSyntaxError::EmptySegment);
            }
            let mut digits = String::new();
            loop {
                match chars.next() {
                    Some((_, ']')) => break,
                    Some((_, d)) => digits.push(d),
                    None => return Err(DictSyntaxError::UnclosedBracket),
                }
            }
            if digits.is_empty() || !digits.chars().all(|d| d.is_ascii_digit()) {
                return Err(DictSyntaxError::InvalidIndex(digits));
            }
            let index = digits
                .parse()
                .map_err(|_| DictSyntaxError::InvalidIndex(digits.clone()))?;
            push(&mut segments, Segment::Index(index))?;
            after_index = true;
        } else if after_index {
            return Err(DictSyntaxError::TrailingAfterIndex(c));
        } else {
            key.push(c);
            key_started = true;
        }
    }

    Err(DictSyntaxError::MissingSeparator(grammar.key_value_separator))
}

fn end_segment(
    segments: &mut Vec<Segment>,
    key: &mut String,
    key_started: bool,
    after_index: bool,
) -> Result<()> {
    if key_started {
        push(segments, Segment::Key(std::mem::take(key)))
    } else if after_index {
        Ok(())
    } else {
        Err(DictSyntaxError::EmptySegment)
    }
}

fn push(segments: &mut Vec<Segment>, segment: Segment) -> Result<()> {
    if segments.len() == MAX_KEY_DEPTH {
        return Err(DictSyntaxError::TooDeep(MAX_KEY_DEPTH));
    }
    segments.push(segment);
    Ok(())
}

/// Writes `value` at `segments` below `root`, replacing whatever is in the
/// way with the container the next segment needs.
fn assign(root: &mut Value, segments: &[Segment], value: String, sparse: bool) -> Result<()> {
    let mut slot = root;
    for segment in segments {
        slot = match segment {
            Segment::Key(key) => as_map_mut(slot)
                .entry(key.clone())
                .or_insert_with(|| Value::Str(String::new())),
            Segment::Index(index) => {
                let index = *index;
                let list = as_list_mut(slot);
                let len = list.len();
                if index > len {
                    if !sparse {
                        return Err(DictSyntaxError::IndexGap { index, len });
                    }
                    if index - len > MAX_SPARSE_GAP {
                        return Err(DictSyntaxError::GapTooLarge {
                            index,
                            len,
                            max_gap: MAX_SPARSE_GAP,
                        });
                    }
                    list.resize(index, Value::Str(String::new()));
                }
                if index == list.len() {
                    list.push(Value::Str(String::new()));
                }
                &mut list[index]
            }
        };
    }
    *slot = Value::Str(value);
    Ok(())
}

fn as_map_mut(slot: &mut Value) -> &mut BTreeMap<String, Value> {
    if !matches!(slot, Value::Map(_)) {
        *slot = Value::Map(BTreeMap::new());
    }
    match slot {
        Value::Map(map) => map,
        _ => unreachable!("slot was just replaced by a map"),
    }
}

fn as_list_mut(slot: &mut Value) -> &mut Vec<Value> {
    if !matches!(slot, Value::List(_)) {
        *slot = Value::List(Vec::new());
    }
    match slot {
        Value::List(list) => list,
        _ => unreachable!("slot was just replaced by a list"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use argtree_core::{CommandDef, DictSpec, OptionDef, OptionSpec, ParserConfig};

    fn grammar() -> DictGrammar {
        DictGrammar {
            nesting_separator: '.',
            key_value_separator: '=',
            escape_char: '\\',
            nested_keys: true,
            list_indices: true,
            sparse_lists: false,
        }
    }

    fn parse(
        tokens: &[&str],
        grammar: &DictGrammar,
    ) -> std::result::Result<Value, DictSyntaxError> {
        let tokens: Vec<String> = tokens.iter().map(|t| t.to_string()).collect();
        parse_occurrence(&tokens, grammar)
            .map(Value::Map)
            .map_err(|(_, e)| e)
    }

    fn s(v: &str) -> Value {
        Value::from(v)
    }

    #[test]
    fn test_nested_keys() {
        assert_eq!(
            parse(&["a.b=1", "a.c=2", "d=x=y"], &grammar()).unwrap(),
            Value::map([
                ("a", Value::map([("b", s("1")), ("c", s("2"))])),
                ("d", s("x=y")),
            ])
        );
    }

    #[test]
    fn test_escaped_separators_stay_in_key() {
        assert_eq!(
            parse(&[r"a\.b=1", r"k\=v=2"], &grammar()).unwrap(),
            Value::map([("a.b", s("1")), ("k=v", s("2"))])
        );
    }

    #[test]
    fn test_list_indices() {
        assert_eq!(
            parse(&["ports[0]=80", "ports[1]=443", "hosts[0].name=web"], &grammar()).unwrap(),
            Value::map([
                ("hosts", Value::List(vec![Value::map([("name", s("web"))])])),
                ("ports", Value::strings(["80", "443"])),
            ])
        );
        assert_eq!(
            parse(&["m[0][1]=x", "m[0][0]=y"], &grammar()).unwrap_err(),
            DictSyntaxError::IndexGap { index: 1, len: 0 }
        );
    }

    #[test]
    fn test_sparse_lists_pad_with_empty_strings() {
        let sparse = DictGrammar {
            sparse_lists: true,
            ..grammar()
        };
        assert_eq!(
            parse(&["l[2]=c"], &sparse).unwrap(),
            Value::map([("l", Value::strings(["", "", "c"]))])
        );
    }

    #[test]
    fn test_sparse_gap_is_bounded() {
        let sparse = DictGrammar {
            sparse_lists: true,
            ..grammar()
        };
        let last = format!("l[{MAX_SPARSE_GAP}]=x");
        let padded = parse(&[last.as_str()], &sparse).unwrap();
        let list = padded.as_map().unwrap()["l"].as_list().unwrap();
        assert_eq!(list.len(), MAX_SPARSE_GAP + 1);

        let beyond = format!("l[{}]=x", MAX_SPARSE_GAP + 1);
        assert_eq!(
            parse(&[beyond.as_str()], &sparse).unwrap_err(),
            DictSyntaxError::GapTooLarge {
                index: MAX_SPARSE_GAP + 1,
                len: 0,
                max_gap: MAX_SPARSE_GAP,
            }
        );
        assert_eq!(
            parse(&["l[0]=a", "l[18446744073709551615]=x"], &sparse).unwrap_err(),
            DictSyntaxError::GapTooLarge {
                index: usize::MAX,
                len: 1,
                max_gap: MAX_SPARSE_GAP,
            }
        );
    }

    #[test]
    fn test_key_depth_is_bounded() {
        let key = |depth: usize| vec!["a"; depth].join(".");
        let deepest = format!("{}=1", key(MAX_KEY_DEPTH));
        assert!(parse(&[deepest.as_str()], &grammar()).is_ok());

        let too_deep = format!("{}=1", key(MAX_KEY_DEPTH + 1));
        assert_eq!(
            parse(&[too_deep.as_str()], &grammar()).unwrap_err(),
            DictSyntaxError::TooDeep(MAX_KEY_DEPTH)
        );

        let huge = format!("{}=1", key(20_000));
        assert_eq!(
            parse(&[huge.as_str()], &grammar()).unwrap_err(),
            DictSyntaxError::TooDeep(MAX_KEY_DEPTH)
        );
        let indices = format!("m{}=1", "[0]".repeat(MAX_KEY_DEPTH));
        assert_eq!(
            parse(&[indices.as_str()], &grammar()).unwrap_err(),
            DictSyntaxError::TooDeep(MAX_KEY_DEPTH)
        );
    }

    #[test]
    fn test_flat_keys_when_nesting_disabled() {
        let flat = DictGrammar {
            nested_keys: false,
            list_indices: false,
            ..grammar()
        };
        assert_eq!(
            parse(&["a.b[0]=1"], &flat).unwrap(),
            Value::map([("a.b[0]", s("1"))])
        );
    }

    #[test]
    fn test_later_assignment_replaces_scalar() {
        assert_eq!(
            parse(&["a=1", "a.b=2"], &grammar()).unwrap(),
            Value::map([("a", Value::map([("b", s("2"))]))])
        );
    }

    #[test]
    fn test_syntax_errors() {
        let g = grammar();
        assert_eq!(parse(&["novalue"], &g).unwrap_err(), DictSyntaxError::MissingSeparator('='));
        assert_eq!(parse(&["=v"], &g).unwrap_err(), DictSyntaxError::EmptySegment);
        assert_eq!(parse(&["a..b=v"], &g).unwrap_err(), DictSyntaxError::EmptySegment);
        assert_eq!(parse(&["[0]=v"], &g).unwrap_err(), DictSyntaxError::EmptySegment);
        assert_eq!(parse(&["a\\"], &g).unwrap_err(), DictSyntaxError::DanglingEscape);
        assert_eq!(parse(&["a[x]=v"], &g).unwrap_err(), DictSyntaxError::InvalidIndex("x".into()));
        assert_eq!(
            parse(&["a[]=v"], &g).unwrap_err(),
            DictSyntaxError::InvalidIndex(String::new())
        );
        assert_eq!(parse(&["a[0=v"], &g).unwrap_err(), DictSyntaxError::UnclosedBracket);
        assert_eq!(parse(&["a[0]b=v"], &g).unwrap_err(), DictSyntaxError::TrailingAfterIndex('b'));
    }

    #[test]
    fn test_error_reports_offending_token() {
        let tokens = vec!["ok=1".to_string(), "bad".to_string()];
        let (token, _) = parse_occurrence(&tokens, &grammar()).unwrap_err();
        assert_eq!(token, "bad");
    }

    #[test]
    fn test_option_grammar_overrides_config() {
        let spec = CommandDef::new("t")
            .with_option(OptionDef::dict("env").with_nesting_separator(':'))
            .build()
            .unwrap();
        let OptionSpec::Dict(env) = &spec.options()[0] else {
            panic!("expected a dict option");
        };
        let env: &DictSpec = env;
        let config = ParserConfig::builder().nested_keys(true).build().unwrap();

        let grammar = config.resolve_dict_grammar(env);
        assert_eq!(
            parse(&["a:b=1", "c.d=2"], &grammar).unwrap(),
            Value::map([("a", Value::map([("b", s("1"))])), ("c.d", s("2"))])
        );
    }
}
