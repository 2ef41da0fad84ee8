//! Map merging for repeated dict options.
//!
//! When a dict option occurs more than once under merge accumulation,
//! [`merge_maps`] folds the later occurrence into the accumulated map using a
//! [`MergeStrategy`]. The later occurrence always wins on scalar conflicts.
//!
//! # Example
//!
//! ```
//! use std::collections::BTreeMap;
//! use argtree_core::*;
//!
//! let mut base = BTreeMap::new();
//! base.insert("a".to_string(), Value::map([("b", Value::from("1"))]));
//!
//! let mut overlay = BTreeMap::new();
//! overlay.insert("a".to_string(), Value::map([("c", Value::from("2"))]));
//!
//! merge_maps(&mut base, overlay, MergeStrategy::Deep);
//! assert_eq!(base["a"], Value::map([("b", Value::from("1")), ("c", Value::from("2"))]));
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::Value;

/// Dict merge behavior.
///
/// # Examples
///
/// ```
/// use std::collections::BTreeMap;
/// use argtree_core::*;
///
/// let base_map = || {
///     let mut m = BTreeMap::new();
///     m.insert("a".to_string(), Value::map([("b", Value::from("1"))]));
///     m
/// };
/// let mut overlay = BTreeMap::new();
/// overlay.insert("a".to_string(), Value::map([("c", Value::from("2"))]));
///
/// let mut shallow = base_map();
/// merge_maps(&mut shallow, overlay.clone(), MergeStrategy::Shallow);
/// assert_eq!(shallow["a"], Value::map([("c", Value::from("2"))]));
///
/// let mut deep = base_map();
/// merge_maps(&mut deep, overlay, MergeStrategy::Deep);
/// assert_eq!(deep["a"].as_map().unwrap().len(), 2);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeStrategy {
    /// Overwrite top-level keys only.
    Shallow,
    /// Recurse into nested maps (the default).
    #[default]
    Deep,
}

/// Merges `overlay` into `base`.
///
/// With [`MergeStrategy::Shallow`] every top-level key of `overlay` replaces
/// the one in `base`. With [`MergeStrategy::Deep`] maps present on both sides
/// are merged recursively; any other pairing (scalar, list, or a map meeting
/// a non-map) is replaced by the overlay value.
pub fn merge_maps(
    base: &mut BTreeMap<String, Value>,
    overlay: BTreeMap<String, Value>,
    strategy: MergeStrategy,
) {
    match strategy {
        MergeStrategy::Shallow => base.extend(overlay),
        MergeStrategy::Deep => merge_deep(base, overlay),
    }
}

fn merge_deep(base: &mut BTreeMap<String, Value>, overlay: BTreeMap<String, Value>) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(Value::Map(existing)), Value::Map(incoming)) => merge_deep(existing, incoming),
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(entries: &[(&str, Value)]) -> BTreeMap<String, Value> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_deep_merge_recurses_into_nested_maps() {
        let mut base = map(&[("a", Value::map([("b", Value::map([("x", Value::from("1"))]))]))]);
        let overlay = map(&[("a", Value::map([("b", Value::map([("y", Value::from("2"))]))]))]);

        merge_maps(&mut base, overlay, MergeStrategy::Deep);

        let inner = base["a"].as_map().unwrap()["b"].as_map().unwrap();
        assert_eq!(inner.len(), 2);
    }

    #[test]
    fn test_deep_merge_later_scalar_wins() {
        let mut base = map(&[("a", Value::map([("b", Value::from("1"))]))]);
        let overlay = map(&[("a", Value::from("flat"))]);

        merge_maps(&mut base, overlay, MergeStrategy::Deep);
        assert_eq!(base["a"], Value::from("flat"));
    }

    #[test]
    fn test_shallow_merge_keeps_untouched_keys() {
        let mut base = map(&[("a", Value::from("1")), ("b", Value::from("2"))]);
        let overlay = map(&[("b", Value::from("3"))]);

        merge_maps(&mut base, overlay, MergeStrategy::Shallow);
        assert_eq!(base, map(&[("a", Value::from("1")), ("b", Value::from("3"))]));
    }
}
