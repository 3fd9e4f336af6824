//! Container-literal schemas and their compiler.
//!
//! `Schema` is the authoring form: ready-made `TypeNode`s mixed with mapping,
//! single-element sequence and fixed-arity tuple literals (plus `Optional` /
//! `Any` wrappers so literals can nest inside them). `compile` lowers it, depth
//! first and in one pass, to a pure `TypeNode` tree.

use indexmap::IndexMap;

use crate::error::{Path, PathSegment, SchemaError};
use crate::node::TypeNode;

#[derive(Debug)]
pub enum Schema {
    Node(TypeNode),
    Mapping(IndexMap<String, Schema>),
    /// Must hold exactly one element schema.
    Sequence(Vec<Schema>),
    Tuple(Vec<Schema>),
    Optional(Box<Schema>),
    Any(Vec<Schema>),
}

impl From<TypeNode> for Schema {
    fn from(node: TypeNode) -> Self {
        Schema::Node(node)
    }
}

// -------------------- literal helpers --------------------

pub fn mapping<K, S>(fields: impl IntoIterator<Item = (K, S)>) -> Schema
where
    K: Into<String>,
    S: Into<Schema>,
{
    Schema::Mapping(fields.into_iter().map(|(k, s)| (k.into(), s.into())).collect())
}

pub fn sequence(element: impl Into<Schema>) -> Schema {
    Schema::Sequence(vec![element.into()])
}

pub fn tuple<S: Into<Schema>>(positions: impl IntoIterator<Item = S>) -> Schema {
    Schema::Tuple(positions.into_iter().map(Into::into).collect())
}

pub fn optional(inner: impl Into<Schema>) -> Schema {
    Schema::Optional(Box::new(inner.into()))
}

pub fn any<S: Into<Schema>>(alternatives: impl IntoIterator<Item = S>) -> Schema {
    Schema::Any(alternatives.into_iter().map(Into::into).collect())
}

// -------------------- compiler --------------------

/// Lower a schema to a `TypeNode` tree. Fails only on malformed authoring;
/// ready-made nodes are returned unchanged.
pub fn compile(schema: Schema) -> Result<TypeNode, SchemaError> {
    let mut path = Path::root();
    let node = compile_at(schema, &mut path)?;
    tracing::debug!("schema compiled");
    Ok(node)
}

fn compile_at(schema: Schema, path: &mut Path) -> Result<TypeNode, SchemaError> {
    match schema {
        Schema::Node(node) => Ok(node),
        Schema::Mapping(fields) => {
            let mut out = IndexMap::with_capacity(fields.len());
            for (name, sub) in fields {
                path.push(PathSegment::Key(name.clone()));
                let node = compile_at(sub, path);
                path.pop();
                out.insert(name, node?);
            }
            Ok(TypeNode::mapping(out))
        }
        Schema::Sequence(mut elements) => {
            if elements.len() != 1 {
                return Err(SchemaError::SequenceArity { path: path.clone(), len: elements.len() });
            }
            let element = elements.remove(0);
            path.push(PathSegment::Index(0));
            let node = compile_at(element, path);
            path.pop();
            Ok(TypeNode::sequence(node?))
        }
        Schema::Tuple(positions) => {
            let nodes = compile_indexed(positions, path)?;
            Ok(TypeNode::tuple(nodes))
        }
        Schema::Optional(inner) => Ok(TypeNode::optional(compile_at(*inner, path)?)),
        Schema::Any(alternatives) => {
            if alternatives.is_empty() {
                return Err(SchemaError::EmptyAny { path: path.clone() });
            }
            let nodes = compile_indexed(alternatives, path)?;
            Ok(TypeNode::any(nodes))
        }
    }
}

fn compile_indexed(schemas: Vec<Schema>, path: &mut Path) -> Result<Vec<TypeNode>, SchemaError> {
    schemas
        .into_iter()
        .enumerate()
        .map(|(index, sub)| {
            path.push(PathSegment::Index(index));
            let node = compile_at(sub, path);
            path.pop();
            node
        })
        .collect()
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::{Mode, evaluate};
    use crate::node::NodeKind;
    use crate::value::Value;
    use serde_json::json;

    #[test]
    fn literals_lower_to_composites() {
        let node = compile(mapping([
            ("list", sequence(TypeNode::number())),
            ("pair", tuple([TypeNode::string(), TypeNode::number()])),
            ("maybe", optional(sequence(TypeNode::null()))),
            ("either", any([Schema::from(TypeNode::null()), sequence(TypeNode::string())])),
        ]))
        .unwrap();
        let NodeKind::Mapping(fields) = node.kind() else { panic!("not a mapping") };
        assert!(matches!(fields["list"].kind(), NodeKind::Sequence(_)));
        assert!(matches!(fields["pair"].kind(), NodeKind::Tuple(xs) if xs.len() == 2));
        assert!(fields["maybe"].is_optional());
        assert!(matches!(fields["either"].kind(), NodeKind::Any(xs) if xs.len() == 2));
    }

    #[test]
    fn bare_node_passes_through() {
        let node = compile(TypeNode::date().into()).unwrap();
        assert!(matches!(node.kind(), NodeKind::Date));
    }

    #[test]
    fn sequence_literal_needs_one_element() {
        let err = compile(mapping([("xs", Schema::Sequence(vec![]))])).unwrap_err();
        assert_eq!(err.to_string(), "$.xs: sequence literal must hold exactly one element schema, found 0");

        let two = Schema::Sequence(vec![TypeNode::null().into(), TypeNode::null().into()]);
        assert!(matches!(compile(two), Err(SchemaError::SequenceArity { len: 2, .. })));
    }

    #[test]
    fn empty_any_is_rejected_with_location() {
        let err = compile(tuple([any(Vec::<Schema>::new())])).unwrap_err();
        assert_eq!(err.to_string(), "$[0]: `any` needs at least one alternative");
    }

    #[test]
    fn compiled_literals_clean_like_explicit_nodes() {
        let node = compile(sequence(tuple([TypeNode::string(), TypeNode::number()]))).unwrap();
        let out = evaluate(&node, &Value::from(json!([["hello", 1], ["goodbye", "120"]])), Mode::FailFast);
        assert_eq!(out, Ok(Value::from(json!([["hello", 1], ["goodbye", 120]]))));
    }
}
