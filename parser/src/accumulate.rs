//! Folding repeated option occurrences into one result value.

use std::collections::BTreeMap;

use argtree_core::{
    Arity, DictAccumulation, FlagAccumulation, MergeStrategy, Value, ValueAccumulation, merge_maps,
};

/// A second occurrence under `error` accumulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Duplicate;

type Result = std::result::Result<(), Duplicate>;

/// Shapes one occurrence's values: scalar arity yields a string, anything
/// else a list.
pub(crate) fn shape(mut values: Vec<String>, arity: Arity) -> Value {
    if arity.is_scalar() && values.len() == 1 {
        Value::Str(values.remove(0))
    } else {
        Value::strings(values)
    }
}

fn single(slot: &mut Option<Value>, value: Value, first: bool, error: bool) -> Result {
    match slot {
        Some(_) if error => Err(Duplicate),
        Some(_) if first => Ok(()),
        _ => {
            *slot = Some(value);
            Ok(())
        }
    }
}

/// Records a flag occurrence; `on` is false for negated forms.
pub(crate) fn flag(slot: &mut Option<Value>, mode: FlagAccumulation, on: bool) -> Result {
    match mode {
        FlagAccumulation::First => single(slot, Value::Bool(on), true, false),
        FlagAccumulation::Last => single(slot, Value::Bool(on), false, false),
        FlagAccumulation::Error => single(slot, Value::Bool(on), false, true),
        FlagAccumulation::Count => {
            let count = match slot {
                _ if !on => 0,
                Some(Value::Count(n)) => *n + 1,
                _ => 1,
            };
            *slot = Some(Value::Count(count));
            Ok(())
        }
    }
}

/// Records a value option occurrence already shaped by [`shape`].
pub(crate) fn value(
    slot: &mut Option<Value>,
    mode: ValueAccumulation,
    occurrence: Value,
) -> Result {
    match mode {
        ValueAccumulation::First => single(slot, occurrence, true, false),
        ValueAccumulation::Last => single(slot, occurrence, false, false),
        ValueAccumulation::Error => single(slot, occurrence, false, true),
        ValueAccumulation::Append => {
            push_all(slot, std::iter::once(occurrence));
            Ok(())
        }
        ValueAccumulation::Extend => {
            match occurrence {
                Value::List(items) => push_all(slot, items),
                other => push_all(slot, std::iter::once(other)),
            }
            Ok(())
        }
    }
}

/// Records a dict option occurrence.
pub(crate) fn dict(
    slot: &mut Option<Value>,
    mode: DictAccumulation,
    strategy: MergeStrategy,
    occurrence: BTreeMap<String, Value>,
) -> Result {
    match mode {
        DictAccumulation::First => single(slot, Value::Map(occurrence), true, false),
        DictAccumulation::Last => single(slot, Value::Map(occurrence), false, false),
        DictAccumulation::Error => single(slot, Value::Map(occurrence), false, true),
        DictAccumulation::Append => {
            push_all(slot, std::iter::once(Value::Map(occurrence)));
            Ok(())
        }
        DictAccumulation::Merge => {
            match slot {
                Some(Value::Map(existing)) => merge_maps(existing, occurrence, strategy),
                _ => *slot = Some(Value::Map(occurrence)),
            }
            Ok(())
        }
    }
}

fn push_all(slot: &mut Option<Value>, items: impl IntoIterator<Item = Value>) {
    match slot {
        Some(Value::List(list)) => list.extend(items),
        _ => *slot = Some(Value::List(items.into_iter().collect())),
    }
}
