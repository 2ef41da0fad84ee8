//! Parse result tree.
//!
//! A [`ParseResult`] is produced fresh by every successful parse and is owned
//! by the caller. Each level holds the values of its own options and
//! positionals and, if a subcommand matched, the child level's result.

use std::collections::BTreeMap;

use serde::Serialize;

/// An untyped parsed value.
///
/// Serialized untagged, so a result renders as plain JSON/YAML data.
///
/// # Examples
///
/// ```
/// use argtree_core::Value;
///
/// let v = Value::strings(["1", "10"]);
/// assert_eq!(v.as_list().unwrap().len(), 2);
/// assert_eq!(Value::from("x").as_str(), Some("x"));
/// assert_eq!(serde_json::to_string(&v).unwrap(), r#"["1","10"]"#);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// Flag state.
    Bool(bool),
    /// Occurrence count of a counting flag.
    Count(u64),
    /// Single string (scalar arity).
    Str(String),
    /// Ordered sequence.
    List(Vec<Value>),
    /// String-keyed map (dict options).
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// Builds a list of strings.
    pub fn strings<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Value::List(items.into_iter().map(|s| Value::Str(s.into())).collect())
    }

    /// Builds a map from key/value pairs.
    pub fn map<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        Value::Map(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Returns the string if this is a [`Value::Str`].
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the boolean if this is a [`Value::Bool`].
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the count if this is a [`Value::Count`].
    pub fn as_count(&self) -> Option<u64> {
        match self {
            Value::Count(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the items if this is a [`Value::List`].
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the entries if this is a [`Value::Map`].
    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

/// Result of parsing one command level.
///
/// # Examples
///
/// ```
/// use std::collections::BTreeMap;
/// use argtree_core::{ParseResult, Value};
///
/// let child = ParseResult::new("commit", vec![], BTreeMap::new(), BTreeMap::new(), None);
/// let mut options = BTreeMap::new();
/// options.insert("verbose".to_string(), Value::Bool(true));
/// let root = ParseResult::new(
///     "git",
///     vec!["-v".into(), "commit".into()],
///     options,
///     BTreeMap::new(),
///     Some(child),
/// );
///
/// assert_eq!(root.command_path(), vec!["git", "commit"]);
/// assert_eq!(root.leaf().command(), "commit");
/// assert_eq!(root.option("verbose"), Some(&Value::Bool(true)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParseResult {
    command: String,
    argv: Vec<String>,
    options: BTreeMap<String, Value>,
    positionals: BTreeMap<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    subcommand: Option<Box<ParseResult>>,
}

impl ParseResult {
    /// Creates a result level.
    pub fn new(
        command: impl Into<String>,
        argv: Vec<String>,
        options: BTreeMap<String, Value>,
        positionals: BTreeMap<String, Value>,
        subcommand: Option<ParseResult>,
    ) -> Self {
        Self {
            command: command.into(),
            argv,
            options,
            positionals,
            subcommand: subcommand.map(Box::new),
        }
    }

    /// Canonical name of the command at this level.
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Tokens handed to this level (the whole expanded argv at the root, the
    /// tokens after the subcommand name below it).
    pub fn argv(&self) -> &[String] {
        &self.argv
    }

    /// Option values keyed by canonical name. Absent options have no entry.
    pub fn options(&self) -> &BTreeMap<String, Value> {
        &self.options
    }

    /// Positional values keyed by name. Positionals that received no values
    /// have no entry.
    pub fn positionals(&self) -> &BTreeMap<String, Value> {
        &self.positionals
    }

    /// Result of the matched subcommand, if any.
    pub fn subcommand(&self) -> Option<&ParseResult> {
        self.subcommand.as_deref()
    }

    /// Looks up an option value by canonical name.
    pub fn option(&self, name: &str) -> Option<&Value> {
        self.options.get(name)
    }

    /// Looks up a positional value by name.
    pub fn positional(&self, name: &str) -> Option<&Value> {
        self.positionals.get(name)
    }

    /// Command names from this level down to the deepest matched subcommand.
    pub fn command_path(&self) -> Vec<&str> {
        let mut path = vec![self.command.as_str()];
        let mut current = self;
        while let Some(child) = current.subcommand() {
            path.push(child.command());
            current = child;
        }
        path
    }

    /// The deepest matched level.
    pub fn leaf(&self) -> &ParseResult {
        let mut current = self;
        while let Some(child) = current.subcommand() {
            current = child;
        }
        current
    }
}
