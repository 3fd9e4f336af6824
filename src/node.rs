//! Compiled schema nodes.
//!
//! A `TypeNode` is the executable unit of a schema: a closed set of matcher
//! variants (`NodeKind`) plus an optional condition checked last. Composite
//! variants own their children outright; a compiled tree is immutable and is
//! `Send + Sync`, so one tree can serve any number of concurrent cleans.

use std::fmt;

use indexmap::IndexMap;
use regex::Regex;

use crate::error::SchemaError;
use crate::value::Value;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

type ConditionFn = dyn Fn(&Value) -> Result<bool, String> + Send + Sync;

/// User predicate over an already-cleaned value. `Ok(false)` and `Err(_)`
/// both reject; the error text becomes the failure detail.
pub struct Condition(Box<ConditionFn>);

#[derive(Debug)]
pub struct TypeNode {
    kind: NodeKind,
    condition: Option<Condition>,
}

#[derive(Debug)]
pub enum NodeKind {
    String { strict: bool },
    RegexString { source: String, regex: Regex },
    Number { min: Option<f64>, max: Option<f64>, strict: bool },
    Null,
    Date,
    Datetime,
    Boolean { strict: bool },
    Constant(Value),
    Optional(Box<TypeNode>),
    Any(Vec<TypeNode>),
    Tuple(Vec<TypeNode>),
    Sequence(Box<TypeNode>),
    Mapping(IndexMap<String, TypeNode>),
}

// ————————————————————————————————————————————————————————————————————————————
// CONDITION
// ————————————————————————————————————————————————————————————————————————————

impl Condition {
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        Condition(Box::new(move |v| Ok(predicate(v))))
    }

    pub fn fallible<F, E>(predicate: F) -> Self
    where
        F: Fn(&Value) -> Result<bool, E> + Send + Sync + 'static,
        E: fmt::Display,
    {
        Condition(Box::new(move |v| predicate(v).map_err(|e| e.to_string())))
    }

    pub(crate) fn check(&self, value: &Value) -> Result<bool, String> {
        (self.0)(value)
    }
}

impl fmt::Debug for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Condition(..)")
    }
}

// ————————————————————————————————————————————————————————————————————————————
// CONSTRUCTION
// ————————————————————————————————————————————————————————————————————————————

impl From<NodeKind> for TypeNode {
    fn from(kind: NodeKind) -> Self {
        TypeNode { kind, condition: None }
    }
}

impl TypeNode {
    /// Strict string: only string values pass. See [`TypeNode::lenient`].
    pub fn string() -> Self {
        NodeKind::String { strict: true }.into()
    }

    /// String that must match `pattern` in full (the pattern is anchored at
    /// both ends).
    pub fn regex(pattern: &str) -> Result<Self, SchemaError> {
        let regex = Regex::new(&format!("^(?:{pattern})$")).map_err(|source| {
            SchemaError::InvalidPattern { pattern: pattern.to_string(), source }
        })?;
        Ok(NodeKind::RegexString { source: pattern.to_string(), regex }.into())
    }

    /// Number, lenient by default: digit strings such as `"12"` or `"1.5"`
    /// are coerced.
    pub fn number() -> Self {
        NodeKind::Number { min: None, max: None, strict: false }.into()
    }

    pub fn null() -> Self {
        NodeKind::Null.into()
    }

    pub fn date() -> Self {
        NodeKind::Date.into()
    }

    pub fn datetime() -> Self {
        NodeKind::Datetime.into()
    }

    /// Strict boolean: only `true`/`false` pass. See [`TypeNode::lenient`].
    pub fn boolean() -> Self {
        NodeKind::Boolean { strict: true }.into()
    }

    pub fn constant(value: impl Into<Value>) -> Self {
        NodeKind::Constant(value.into()).into()
    }

    pub fn optional(inner: TypeNode) -> Self {
        NodeKind::Optional(Box::new(inner)).into()
    }

    /// Alternatives are tried in order; the first acceptance wins.
    pub fn any(alternatives: impl IntoIterator<Item = TypeNode>) -> Self {
        NodeKind::Any(alternatives.into_iter().collect()).into()
    }

    pub fn tuple(positions: impl IntoIterator<Item = TypeNode>) -> Self {
        NodeKind::Tuple(positions.into_iter().collect()).into()
    }

    pub fn sequence(element: TypeNode) -> Self {
        NodeKind::Sequence(Box::new(element)).into()
    }

    pub fn mapping<K: Into<String>>(fields: impl IntoIterator<Item = (K, TypeNode)>) -> Self {
        NodeKind::Mapping(fields.into_iter().map(|(k, v)| (k.into(), v)).collect()).into()
    }

    // -------------------- configuration --------------------

    /// Turn on coercion for `String`, `Number` and `Boolean`; no-op elsewhere.
    pub fn lenient(self) -> Self {
        self.with_strictness(false)
    }

    /// Turn off coercion for `String`, `Number` and `Boolean`; no-op elsewhere.
    pub fn strict(self) -> Self {
        self.with_strictness(true)
    }

    pub fn with_strictness(mut self, value: bool) -> Self {
        match &mut self.kind {
            NodeKind::String { strict }
            | NodeKind::Number { strict, .. }
            | NodeKind::Boolean { strict } => *strict = value,
            _ => {}
        }
        self
    }

    /// Inclusive lower bound; only meaningful on `Number`.
    pub fn min(mut self, bound: f64) -> Self {
        if let NodeKind::Number { min, .. } = &mut self.kind {
            *min = Some(bound);
        }
        self
    }

    /// Inclusive upper bound; only meaningful on `Number`.
    pub fn max(mut self, bound: f64) -> Self {
        if let NodeKind::Number { max, .. } = &mut self.kind {
            *max = Some(bound);
        }
        self
    }

    pub fn with_condition<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        self.condition = Some(Condition::new(predicate));
        self
    }

    pub fn with_fallible_condition<F, E>(mut self, predicate: F) -> Self
    where
        F: Fn(&Value) -> Result<bool, E> + Send + Sync + 'static,
        E: fmt::Display,
    {
        self.condition = Some(Condition::fallible(predicate));
        self
    }

    // -------------------- accessors --------------------

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn condition(&self) -> Option<&Condition> {
        self.condition.as_ref()
    }

    /// Mapping fields rooted in `Optional` may be absent.
    pub fn is_optional(&self) -> bool {
        matches!(self.kind, NodeKind::Optional(_))
    }
}

// ------------------------------- Tests ------------------------------------ //
