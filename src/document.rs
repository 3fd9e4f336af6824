//! Schemas authored as JSON documents.
//!
//! - `"string"`, `"number"`, `"null"`, `"date"`, `"datetime"`, `"boolean"`: default nodes
//! - `{"$type": "...", ...}`: a configured node (see [`Descriptor`])
//! - `{"$tuple": [...]}`: tuple literal
//! - `[schema]`: sequence literal
//! - any other object: mapping literal
//!
//! Conditions are code and cannot be expressed here.

use serde::Deserialize;
use serde_json::Value as Json;

use crate::compile::{Schema, compile};
use crate::error::{Path, PathSegment, SchemaError};
use crate::node::TypeNode;
use crate::value::Value;

pub const TYPE_TAG: &str = "$type";
pub const TUPLE_TAG: &str = "$tuple";

/// Body of a `{"$type": ...}` object. Options that don't apply to the chosen
/// type are rejected when the node is built.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Descriptor {
    #[serde(rename = "$type")]
    kind: DescriptorKind,
    #[serde(default)]
    strict: Option<bool>,
    #[serde(default)]
    min: Option<f64>,
    #[serde(default)]
    max: Option<f64>,
    #[serde(default)]
    pattern: Option<String>,
    /// `Some(Null)` when the document says `"value": null`.
    #[serde(default, deserialize_with = "present")]
    value: Option<Json>,
    #[serde(default)]
    of: Option<Json>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum DescriptorKind {
    String,
    Regex,
    Number,
    Null,
    Date,
    Datetime,
    Boolean,
    Constant,
    Optional,
    Any,
}

fn present<'de, D: serde::Deserializer<'de>>(de: D) -> Result<Option<Json>, D::Error> {
    Json::deserialize(de).map(Some)
}

impl Descriptor {
    /// Names of the options set on this descriptor.
    fn options(&self) -> Vec<&'static str> {
        let mut set = Vec::new();
        if self.strict.is_some() { set.push("strict"); }
        if self.min.is_some() { set.push("min"); }
        if self.max.is_some() { set.push("max"); }
        if self.pattern.is_some() { set.push("pattern"); }
        if self.value.is_some() { set.push("value"); }
        if self.of.is_some() { set.push("of"); }
        set
    }
}

impl DescriptorKind {
    fn accepts(self) -> &'static [&'static str] {
        match self {
            DescriptorKind::String | DescriptorKind::Boolean => &["strict"],
            DescriptorKind::Number => &["strict", "min", "max"],
            DescriptorKind::Regex => &["pattern"],
            DescriptorKind::Constant => &["value"],
            DescriptorKind::Optional | DescriptorKind::Any => &["of"],
            DescriptorKind::Null | DescriptorKind::Date | DescriptorKind::Datetime => &[],
        }
    }
}

// ------------------------------- Front API -------------------------------- //

/// Parse JSON text into a schema (not yet compiled).
pub fn from_str(src: &str) -> Result<Schema, SchemaError> {
    let doc: Json = serde_json::from_str(src)?;
    from_value(&doc)
}

pub fn from_value(doc: &Json) -> Result<Schema, SchemaError> {
    parse(doc, &mut Path::root())
}

/// Parse and compile in one go.
pub fn load(src: &str) -> Result<TypeNode, SchemaError> {
    compile(from_str(src)?)
}

// ------------------------------- Internals -------------------------------- //

fn document_error(path: &Path, message: impl Into<String>) -> SchemaError {
    SchemaError::Document { path: path.clone(), message: message.into() }
}

fn parse(doc: &Json, path: &mut Path) -> Result<Schema, SchemaError> {
    match doc {
        Json::String(name) => shorthand(name)
            .map(Schema::Node)
            .ok_or_else(|| document_error(path, format!("unknown type shorthand {name:?}"))),
        Json::Array(items) => Ok(Schema::Sequence(parse_indexed(items, path)?)),
        Json::Object(map) if map.contains_key(TYPE_TAG) => descriptor(doc, path),
        Json::Object(map) if map.contains_key(TUPLE_TAG) => {
            if map.len() != 1 {
                return Err(document_error(path, format!("`{TUPLE_TAG}` takes no sibling keys")));
            }
            let Some(Json::Array(items)) = map.get(TUPLE_TAG) else {
                return Err(document_error(path, format!("`{TUPLE_TAG}` must be an array")));
            };
            Ok(Schema::Tuple(parse_indexed(items, path)?))
        }
        Json::Object(map) => {
            let mut fields = indexmap::IndexMap::with_capacity(map.len());
            for (name, sub) in map {
                path.push(PathSegment::Key(name.clone()));
                let schema = parse(sub, path);
                path.pop();
                fields.insert(name.clone(), schema?);
            }
            Ok(Schema::Mapping(fields))
        }
        other => Err(document_error(
            path,
            format!("expected a schema, found {}", Value::from(other).type_name()),
        )),
    }
}

fn parse_indexed(items: &[Json], path: &mut Path) -> Result<Vec<Schema>, SchemaError> {
    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            path.push(PathSegment::Index(index));
            let schema = parse(item, path);
            path.pop();
            schema
        })
        .collect()
}

fn shorthand(name: &str) -> Option<TypeNode> {
    Some(match name {
        "string" => TypeNode::string(),
        "number" => TypeNode::number(),
        "null" => TypeNode::null(),
        "date" => TypeNode::date(),
        "datetime" => TypeNode::datetime(),
        "boolean" => TypeNode::boolean(),
        _ => return None,
    })
}

fn descriptor(doc: &Json, path: &mut Path) -> Result<Schema, SchemaError> {
    let descriptor: Descriptor = serde_path_to_error::deserialize(doc).map_err(|err| {
        let field = err.path().to_string();
        let inner = err.into_inner();
        if field == "." {
            document_error(path, inner.to_string())
        } else {
            document_error(path, format!("field `{field}`: {inner}"))
        }
    })?;

    let kind = descriptor.kind;
    if let Some(extra) = descriptor.options().into_iter().find(|o| !kind.accepts().contains(o)) {
        return Err(document_error(path, format!("option `{extra}` does not apply to {kind:?}")));
    }
    let missing = |option: &str| document_error(path, format!("{kind:?} requires `{option}`"));

    let node = match kind {
        DescriptorKind::String => TypeNode::string().with_strictness(descriptor.strict.unwrap_or(true)),
        DescriptorKind::Regex => {
            let pattern = descriptor.pattern.ok_or_else(|| missing("pattern"))?;
            TypeNode::regex(&pattern)?
        }
        DescriptorKind::Number => {
            let mut node = TypeNode::number().with_strictness(descriptor.strict.unwrap_or(false));
            if let Some(lo) = descriptor.min {
                node = node.min(lo);
            }
            if let Some(hi) = descriptor.max {
                node = node.max(hi);
            }
            node
        }
        DescriptorKind::Null => TypeNode::null(),
        DescriptorKind::Date => TypeNode::date(),
        DescriptorKind::Datetime => TypeNode::datetime(),
        DescriptorKind::Boolean => TypeNode::boolean().with_strictness(descriptor.strict.unwrap_or(true)),
        DescriptorKind::Constant => {
            let value = descriptor.value.ok_or_else(|| missing("value"))?;
            TypeNode::constant(Value::from(value))
        }
        DescriptorKind::Optional => {
            let of = descriptor.of.ok_or_else(|| missing("of"))?;
            path.push(PathSegment::Key("of".to_string()));
            let inner = parse(&of, path);
            path.pop();
            return Ok(Schema::Optional(Box::new(inner?)));
        }
        DescriptorKind::Any => {
            let Some(Json::Array(of)) = descriptor.of else {
                return Err(document_error(path, "Any requires `of` to be an array"));
            };
            path.push(PathSegment::Key("of".to_string()));
            let alternatives = parse_indexed(&of, path);
            path.pop();
            return Ok(Schema::Any(alternatives?));
        }
    };
    Ok(Schema::Node(node))
}

// ------------------------------- Tests ------------------------------------ //
