//! Recursive validate-and-clean engine.
//!
//! Walks a compiled `TypeNode` tree and a `Value` in lock-step. Scalars live in
//! `scalar`, composites in `composite`; both funnel through
//! [`Evaluator::evaluate`], which owns the current path and runs the node's
//! condition as the final step.
//!
//! Work is linear in the size of the input: recursion follows the (finite)
//! schema depth, while sequences iterate. No depth or size limit is imposed
//! here; callers facing hostile inputs should bound them before cleaning.
pub mod scalar;
pub mod composite;

use crate::error::{FailureKind, Path, PathSegment, ValidationFailure};
use crate::node::{NodeKind, TypeNode};
use crate::value::Value;

/// Failure policy shared by every composite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Stop at the first failure.
    #[default]
    FailFast,
    /// Keep going inside composites and report everything found.
    CollectAll,
}

pub type Outcome = Result<Value, Vec<ValidationFailure>>;

const CONDITION_REJECTED: &str = "doesn't meet the validation criterion";

pub struct Evaluator {
    mode: Mode,
    path: Path,
}

impl Evaluator {
    pub fn new(mode: Mode) -> Self {
        Self { mode, path: Path::root() }
    }

    /// Start below the root, e.g. when cleaning one branch of a larger document.
    pub fn at(path: Path, mode: Mode) -> Self {
        Self { mode, path }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn evaluate(&mut self, node: &TypeNode, value: &Value) -> Outcome {
        let cleaned = match node.kind() {
            NodeKind::String { strict } => self.scalar(value, scalar::string(*strict, value))?,
            NodeKind::RegexString { source, regex } => {
                self.scalar(value, scalar::regex_string(source, regex, value))?
            }
            NodeKind::Number { min, max, strict } => {
                self.scalar(value, scalar::number(*min, *max, *strict, value))?
            }
            NodeKind::Null => self.scalar(value, scalar::null(value))?,
            NodeKind::Date => self.scalar(value, scalar::date(value))?,
            NodeKind::Datetime => self.scalar(value, scalar::datetime(value))?,
            NodeKind::Boolean { strict } => self.scalar(value, scalar::boolean(*strict, value))?,
            NodeKind::Constant(constant) => self.scalar(value, scalar::constant(constant, value))?,
            NodeKind::Optional(inner) => self.optional(inner, value)?,
            NodeKind::Any(alternatives) => self.any(alternatives, value)?,
            NodeKind::Tuple(positions) => self.tuple(positions, value)?,
            NodeKind::Sequence(element) => self.sequence(element, value)?,
            NodeKind::Mapping(fields) => self.mapping(fields, value)?,
        };
        self.apply_condition(node, value, cleaned)
    }

    // -------------------- shared steps --------------------

    fn scalar(&self, value: &Value, result: Result<Value, FailureKind>) -> Outcome {
        result.map_err(|kind| self.fail(kind, value))
    }

    pub(crate) fn fail(&self, kind: FailureKind, value: &Value) -> Vec<ValidationFailure> {
        vec![ValidationFailure { path: self.path.clone(), kind, value: value.clone() }]
    }

    /// Evaluate `node` one level down, at `path + segment`.
    pub(crate) fn child(&mut self, segment: PathSegment, node: &TypeNode, value: &Value) -> Outcome {
        self.path.push(segment);
        let out = self.evaluate(node, value);
        self.path.pop();
        out
    }

    /// Record `failed` into `failures`; true when the caller should stop.
    pub(crate) fn absorb(&self, failures: &mut Vec<ValidationFailure>, mut failed: Vec<ValidationFailure>) -> bool {
        failures.append(&mut failed);
        self.mode == Mode::FailFast
    }

    fn apply_condition(&self, node: &TypeNode, input: &Value, cleaned: Value) -> Outcome {
        let Some(condition) = node.condition() else {
            return Ok(cleaned);
        };
        let detail = match condition.check(&cleaned) {
            Ok(true) => return Ok(cleaned),
            Ok(false) => CONDITION_REJECTED.to_string(),
            Err(detail) => detail,
        };
        Err(self.fail(FailureKind::ConditionFailed { detail }, input))
    }
}

/// One-shot evaluation from the root.
pub fn evaluate(node: &TypeNode, value: &Value, mode: Mode) -> Outcome {
    Evaluator::new(mode).evaluate(node, value)
}

// ------------------------------- Tests ------------------------------------ //
