//! Value-count bounds for options and positionals.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The `(min, max)` number of values a parameter accepts.
///
/// `max == None` means unbounded. An arity of exactly one is *scalar* and
/// produces a single string in results; every other arity produces an
/// ordered sequence.
///
/// # Examples
///
/// ```
/// use argtree_core::Arity;
///
/// assert!(Arity::one().is_scalar());
/// assert!(!Arity::exactly(2).is_scalar());
/// assert!(Arity::at_least(1).accepts(40));
/// assert!(!Arity::range(1, 2).accepts(3));
/// assert_eq!(Arity::any().to_string(), "(0, *)");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Arity {
    /// Minimum number of values.
    pub min: usize,
    /// Maximum number of values, `None` when unbounded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<usize>,
}

impl Arity {
    /// No values at all; the fixed arity of flags.
    pub const NONE: Arity = Arity {
        min: 0,
        max: Some(0),
    };

    /// Exactly `n` values.
    pub const fn exactly(n: usize) -> Self {
        Self {
            min: n,
            max: Some(n),
        }
    }

    /// Between `min` and `max` values (inclusive).
    pub const fn range(min: usize, max: usize) -> Self {
        Self {
            min,
            max: Some(max),
        }
    }

    /// At least `min` values, no upper bound.
    pub const fn at_least(min: usize) -> Self {
        Self { min, max: None }
    }

    /// Exactly one value.
    pub const fn one() -> Self {
        Self::exactly(1)
    }

    /// Zero or one value.
    pub const fn optional() -> Self {
        Self::range(0, 1)
    }

    /// Any number of values, including none.
    pub const fn any() -> Self {
        Self::at_least(0)
    }

    /// Returns `true` for the `(1, 1)` arity, which yields a scalar string.
    pub fn is_scalar(&self) -> bool {
        self.min == 1 && self.max == Some(1)
    }

    /// Returns `true` when no upper bound is set.
    pub fn is_unbounded(&self) -> bool {
        self.max.is_none()
    }

    /// Returns `true` when `count` values satisfy both bounds.
    pub fn accepts(&self, count: usize) -> bool {
        count >= self.min && self.max.is_none_or(|max| count <= max)
    }

    /// Returns `true` when a bounded maximum is smaller than the minimum.
    pub fn is_inverted(&self) -> bool {
        self.max.is_some_and(|max| max < self.min)
    }
}

impl Default for Arity {
    fn default() -> Self {
        Self::one()
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.max {
            Some(max) => write!(f, "({}, {})", self.min, max),
            None => write!(f, "({}, *)", self.min),
        }
    }
}
