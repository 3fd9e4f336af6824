//! Matchers that combine other nodes. Children are evaluated through
//! [`Evaluator::child`] so every failure carries its full path.
use indexmap::IndexMap;

use super::{Evaluator, Outcome};
use crate::error::{FailureKind, PathSegment, ValidationFailure};
use crate::node::TypeNode;
use crate::value::Value;

static ABSENT: Value = Value::Null;

impl Evaluator {
    /// Null (or an absent mapping field, which arrives here as Null) short-circuits
    /// to Null without consulting `inner`.
    pub(super) fn optional(&mut self, inner: &TypeNode, value: &Value) -> Outcome {
        if value.is_null() {
            return Ok(Value::Null);
        }
        self.evaluate(inner, value)
    }

    /// First acceptance in declaration order wins. Every rejected branch is kept
    /// under `NoAlternativeMatched`.
    pub(super) fn any(&mut self, alternatives: &[TypeNode], value: &Value) -> Outcome {
        let mut attempts = Vec::new();
        for (index, alternative) in alternatives.iter().enumerate() {
            match self.evaluate(alternative, value) {
                Ok(cleaned) => return Ok(cleaned),
                Err(mut failed) => {
                    tracing::trace!(alternative = index, failures = failed.len(), "any: alternative rejected");
                    attempts.append(&mut failed);
                }
            }
        }
        Err(self.fail(FailureKind::NoAlternativeMatched { attempts }, value))
    }

    pub(super) fn tuple(&mut self, positions: &[TypeNode], value: &Value) -> Outcome {
        let Value::Sequence(items) = value else {
            return Err(self.type_mismatch("sequence", value));
        };
        if items.len() != positions.len() {
            let kind = FailureKind::ArityMismatch { expected: positions.len(), found: items.len() };
            return Err(self.fail(kind, value));
        }
        let mut out = Vec::with_capacity(items.len());
        let mut failures = Vec::new();
        for (index, (node, item)) in positions.iter().zip(items).enumerate() {
            match self.child(PathSegment::Index(index), node, item) {
                Ok(cleaned) => out.push(cleaned),
                Err(failed) => {
                    if self.absorb(&mut failures, failed) {
                        break;
                    }
                }
            }
        }
        finish(failures, Value::Sequence(out))
    }

    pub(super) fn sequence(&mut self, element: &TypeNode, value: &Value) -> Outcome {
        let Value::Sequence(items) = value else {
            return Err(self.type_mismatch("sequence", value));
        };
        let mut out = Vec::with_capacity(items.len());
        let mut failures = Vec::new();
        for (index, item) in items.iter().enumerate() {
            match self.child(PathSegment::Index(index), element, item) {
                Ok(cleaned) => out.push(cleaned),
                Err(failed) => {
                    if self.absorb(&mut failures, failed) {
                        break;
                    }
                }
            }
        }
        finish(failures, Value::Sequence(out))
    }

    /// Declared fields only: undeclared input keys are dropped from the output.
    pub(super) fn mapping(&mut self, fields: &IndexMap<String, TypeNode>, value: &Value) -> Outcome {
        let Value::Mapping(input) = value else {
            return Err(self.type_mismatch("mapping", value));
        };
        let mut out = IndexMap::with_capacity(fields.len());
        let mut failures = Vec::new();
        for (name, node) in fields {
            let present = match input.get(name) {
                Some(present) => present,
                None if node.is_optional() => &ABSENT,
                None => {
                    self.path.push(PathSegment::Key(name.clone()));
                    let missing = self.fail(FailureKind::MissingField, &Value::Null);
                    self.path.pop();
                    if self.absorb(&mut failures, missing) {
                        break;
                    }
                    continue;
                }
            };
            match self.child(PathSegment::Key(name.clone()), node, present) {
                Ok(cleaned) => {
                    out.insert(name.clone(), cleaned);
                }
                Err(failed) => {
                    if self.absorb(&mut failures, failed) {
                        break;
                    }
                }
            }
        }
        let dropped = input.keys().filter(|k| !fields.contains_key(*k)).count();
        if dropped > 0 {
            tracing::trace!(path = %self.path, dropped, "mapping: undeclared keys dropped");
        }
        finish(failures, Value::Mapping(out))
    }

    fn type_mismatch(&self, expected: &str, value: &Value) -> Vec<ValidationFailure> {
        let kind = FailureKind::TypeMismatch { expected: expected.to_string(), found: value.type_name() };
        self.fail(kind, value)
    }
}

fn finish(failures: Vec<ValidationFailure>, cleaned: Value) -> Outcome {
    if failures.is_empty() { Ok(cleaned) } else { Err(failures) }
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::super::{Mode, evaluate};
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn clean(node: &TypeNode, j: serde_json::Value) -> Outcome {
        evaluate(node, &Value::from(j), Mode::FailFast)
    }

    fn clean_all(node: &TypeNode, j: serde_json::Value) -> Outcome {
        evaluate(node, &Value::from(j), Mode::CollectAll)
    }

    fn paths(failures: &[ValidationFailure]) -> Vec<String> {
        failures.iter().map(|f| f.path.to_string()).collect()
    }

    #[test]
    fn optional_accepts_null_even_if_inner_rejects_it() {
        let node = TypeNode::optional(TypeNode::number().strict());
        assert_eq!(clean(&node, json!(null)), Ok(Value::Null));
        assert_eq!(clean(&node, json!(3)), Ok(Value::from(3)));
        assert_eq!(clean(&node, json!("x")).unwrap_err()[0].kind.name(), "TypeMismatch");
    }

    #[test]
    fn optional_condition_still_sees_null() {
        let node = TypeNode::optional(TypeNode::string()).with_condition(|v| !v.is_null());
        assert_eq!(clean(&node, json!(null)).unwrap_err()[0].kind.name(), "ConditionFailed");
    }

    #[test]
    fn any_prefers_declaration_order() {
        let node = TypeNode::any([TypeNode::constant(1), TypeNode::number()]);
        let cleaned = clean(&node, json!(1.0)).unwrap();
        // the constant's own representation wins over Number's coercion
        assert!(matches!(cleaned, Value::Number(crate::value::Number::Int(1))));

        let node = TypeNode::any([TypeNode::string().lenient(), TypeNode::number()]);
        assert_eq!(clean(&node, json!(5)), Ok(Value::from("5")));
    }

    #[test]
    fn any_keeps_every_rejected_branch() {
        let node = TypeNode::any([
            TypeNode::constant("FOO"),
            TypeNode::constant("BAR"),
            TypeNode::constant("BAZ"),
        ]);
        assert_eq!(clean(&node, json!("BAZ")), Ok(Value::from("BAZ")));
        let err = clean(&node, json!("BARZ")).unwrap_err();
        match &err[0].kind {
            FailureKind::NoAlternativeMatched { attempts } => assert_eq!(attempts.len(), 3),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn tuple_checks_arity_then_positions() {
        let node = TypeNode::tuple([TypeNode::number(), TypeNode::boolean()]);
        assert_eq!(clean(&node, json!([1, false])), Ok(Value::from(json!([1, false]))));
        assert_eq!(
            clean(&node, json!([1, false, 2])).unwrap_err()[0].kind,
            FailureKind::ArityMismatch { expected: 2, found: 3 }
        );
        let err = clean(&node, json!([1, "no"])).unwrap_err();
        assert_eq!(paths(&err), vec!["$[1]"]);
        assert_eq!(clean(&node, json!({"0": 1})).unwrap_err()[0].kind.name(), "TypeMismatch");
    }

    #[test]
    fn sequence_validates_every_item() {
        let node = TypeNode::sequence(TypeNode::number().min(0.0));
        assert_eq!(clean(&node, json!([])), Ok(Value::Sequence(vec![])));
        assert_eq!(clean(&node, json!([1, "2", 3])), Ok(Value::from(json!([1, 2, 3]))));
        assert_eq!(paths(&clean(&node, json!([1, -1, -2])).unwrap_err()), vec!["$[1]"]);
        assert_eq!(paths(&clean_all(&node, json!([1, -1, -2])).unwrap_err()), vec!["$[1]", "$[2]"]);
        assert_eq!(
            clean(&node, json!({"0": 1})).unwrap_err()[0].kind,
            FailureKind::TypeMismatch { expected: "sequence".into(), found: "mapping" }
        );
    }

    #[test]
    fn mapping_drops_undeclared_and_reports_missing() {
        let node = TypeNode::mapping([("a", TypeNode::number())]);
        assert_eq!(clean(&node, json!({"a": 1, "b": 2})), Ok(Value::from(json!({"a": 1}))));
        let err = clean(&node, json!({})).unwrap_err();
        assert_eq!(err[0].kind, FailureKind::MissingField);
        assert_eq!(paths(&err), vec!["$.a"]);
        assert_eq!(
            clean(&node, json!([1])).unwrap_err()[0].kind,
            FailureKind::TypeMismatch { expected: "mapping".into(), found: "sequence" }
        );
    }

    #[test]
    fn mapping_absent_optional_field_becomes_null() {
        let node = TypeNode::mapping([
            ("a", TypeNode::number()),
            ("b", TypeNode::optional(TypeNode::number())),
        ]);
        assert_eq!(clean(&node, json!({"a": 1})), Ok(Value::from(json!({"a": 1, "b": null}))));
        // present but invalid still goes through the inner node
        let err = clean(&node, json!({"a": 1, "b": "x1"})).unwrap_err();
        assert_eq!(paths(&err), vec!["$.b"]);
    }

    #[test]
    fn collect_all_reports_across_nested_composites() {
        let node = TypeNode::mapping([
            ("a", TypeNode::number()),
            ("b", TypeNode::mapping([("c", TypeNode::date())])),
            ("d", TypeNode::sequence(TypeNode::boolean())),
        ]);
        let input = json!({"b": {"c": "nope"}, "d": [true, "x", false, 3]});
        let err = clean_all(&node, input.clone()).unwrap_err();
        assert_eq!(paths(&err), vec!["$.a", "$.b.c", "$.d[1]", "$.d[3]"]);
        assert_eq!(paths(&clean(&node, input).unwrap_err()), vec!["$.a"]);
    }

    #[test]
    fn output_is_stable_under_recleaning() {
        let node = TypeNode::mapping([
            ("n", TypeNode::number()),
            ("s", TypeNode::string().lenient()),
            ("o", TypeNode::optional(TypeNode::boolean().lenient())),
            ("l", TypeNode::sequence(TypeNode::tuple([TypeNode::string(), TypeNode::number()]))),
        ]);
        let first = clean(&node, json!({"n": "7", "s": 1, "l": [["a", "1"]], "x": 0})).unwrap();
        let second = evaluate(&node, &first, Mode::FailFast).unwrap();
        assert_eq!(first, second);
    }
}
