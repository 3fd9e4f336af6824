//! Schema-driven validation and normalization of decoded JSON-like data.
//!
//! Describe the expected shape with [`TypeNode`]s and container literals
//! ([`compile::mapping`], [`compile::sequence`], [`compile::tuple`]), compile it
//! once into a [`Cleaner`], then clean any number of values: each call returns
//! the canonical value (coerced scalars, parsed dates, undeclared keys dropped)
//! or a [`ValidationError`] locating every mismatch by path.
//!
//! ```
//! use json_clean::{Cleaner, TypeNode, compile::{mapping, sequence}};
//! use serde_json::json;
//!
//! let cleaner = Cleaner::new(mapping([
//!     ("id", TypeNode::number().into()),
//!     ("tags", sequence(TypeNode::string())),
//! ])).unwrap();
//! let out = cleaner.clean_json(&json!({"id": "7", "tags": ["a"], "x": 1})).unwrap();
//! assert_eq!(out.to_json(), json!({"id": 7, "tags": ["a"]}));
//! ```
pub mod value;
pub mod error;
pub mod node;
pub mod eval;
pub mod compile;
pub mod document;
pub mod cleaner;
pub mod cli;

pub use cleaner::{Cleaner, clean};
pub use compile::{Schema, compile};
pub use error::{FailureKind, Path, PathSegment, SchemaError, ValidationError, ValidationFailure};
pub use eval::{Mode, evaluate};
pub use node::{Condition, NodeKind, TypeNode};
pub use value::{Number, Value};
