use std::fmt;

use thiserror::Error;

use crate::value::Value;

// ————————————————————————————————————————————————————————————————————————————
// PATHS
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

/// Location inside a value tree, root first. Renders as `$.nest.items[2]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Path(Vec<PathSegment>);

impl Path {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub(crate) fn push(&mut self, segment: PathSegment) {
        self.0.push(segment);
    }

    pub(crate) fn pop(&mut self) {
        self.0.pop();
    }
}

impl From<Vec<PathSegment>> for Path {
    fn from(segments: Vec<PathSegment>) -> Self {
        Path(segments)
    }
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        PathSegment::Key(key.to_string())
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        PathSegment::Index(index)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("$")?;
        for segment in &self.0 {
            match segment {
                PathSegment::Index(i) => write!(f, "[{i}]")?,
                PathSegment::Key(k) if is_plain_key(k) => write!(f, ".{k}")?,
                PathSegment::Key(k) => write!(f, "[{k:?}]")?,
            }
        }
        Ok(())
    }
}

fn is_plain_key(k: &str) -> bool {
    !k.is_empty() && k.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

// ————————————————————————————————————————————————————————————————————————————
// VALIDATION FAILURES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FailureKind {
    #[error("expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: &'static str },

    #[error("is outside the range {}", render_range(.min, .max))]
    RangeError { min: Option<f64>, max: Option<f64> },

    #[error("doesn't match pattern {pattern}")]
    PatternMismatch { pattern: String },

    #[error("is not a valid {expected}")]
    FormatError { expected: &'static str },

    #[error("has {found} elements, requires exactly {expected}")]
    ArityMismatch { expected: usize, found: usize },

    #[error("required field is missing")]
    MissingField,

    #[error("doesn't match any of {} alternatives", .attempts.len())]
    NoAlternativeMatched { attempts: Vec<ValidationFailure> },

    #[error("condition failed: {detail}")]
    ConditionFailed { detail: String },
}

fn render_range(min: &Option<f64>, max: &Option<f64>) -> String {
    match (*min, *max) {
        (Some(lo), Some(hi)) => format!("[{lo}, {hi}]"),
        (Some(lo), None) => format!("[{lo}, ∞)"),
        (None, Some(hi)) => format!("(-∞, {hi}]"),
        (None, None) => "(-∞, ∞)".to_string(),
    }
}

impl FailureKind {
    /// Stable name of the kind, independent of its payload.
    pub fn name(&self) -> &'static str {
        match self {
            FailureKind::TypeMismatch { .. } => "TypeMismatch",
            FailureKind::RangeError { .. } => "RangeError",
            FailureKind::PatternMismatch { .. } => "PatternMismatch",
            FailureKind::FormatError { .. } => "FormatError",
            FailureKind::ArityMismatch { .. } => "ArityMismatch",
            FailureKind::MissingField => "MissingField",
            FailureKind::NoAlternativeMatched { .. } => "NoAlternativeMatched",
            FailureKind::ConditionFailed { .. } => "ConditionFailed",
        }
    }
}

/// One mismatch between a value and the schema, located by `path`.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{path}: {} {kind}", brief(.value))]
pub struct ValidationFailure {
    pub path: Path,
    pub kind: FailureKind,
    /// The offending input (`Null` for missing fields).
    pub value: Value,
}

fn brief(value: &Value) -> String {
    match value {
        Value::Sequence(xs) => format!("<sequence of {}>", xs.len()),
        Value::Mapping(m) => format!("<mapping with {} keys>", m.len()),
        other => other.to_string(),
    }
}

/// What `clean` surfaces: one failure in fail-fast mode, every failure found
/// in collect-all mode. Never empty.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{}", render_failures(.failures))]
pub struct ValidationError {
    failures: Vec<ValidationFailure>,
}

impl ValidationError {
    pub(crate) fn new(failures: Vec<ValidationFailure>) -> Self {
        debug_assert!(!failures.is_empty());
        Self { failures }
    }

    pub fn failures(&self) -> &[ValidationFailure] {
        &self.failures
    }

    pub fn into_failures(self) -> Vec<ValidationFailure> {
        self.failures
    }

    pub fn first(&self) -> &ValidationFailure {
        &self.failures[0]
    }
}

fn render_failures(failures: &[ValidationFailure]) -> String {
    match failures {
        [only] => only.to_string(),
        many => {
            let mut out = format!("{} validation failures", many.len());
            for failure in many {
                out.push_str("; ");
                out.push_str(&failure.to_string());
            }
            out
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// SCHEMA AUTHORING ERRORS
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("{path}: sequence literal must hold exactly one element schema, found {len}")]
    SequenceArity { path: Path, len: usize },

    #[error("{path}: `any` needs at least one alternative")]
    EmptyAny { path: Path },

    #[error("invalid pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("schema document at {path}: {message}")]
    Document { path: Path, message: String },

    #[error("schema document is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

// ------------------------------- Tests ------------------------------------ //
