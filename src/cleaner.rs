//! Reusable, compiled-once entry point.
use crate::compile::{Schema, compile};
use crate::error::{SchemaError, ValidationError};
use crate::eval::{Evaluator, Mode};
use crate::node::TypeNode;
use crate::value::Value;

/// A compiled schema plus the failure policy to clean with. Immutable, so a
/// single `Cleaner` can be shared across threads.
#[derive(Debug)]
pub struct Cleaner {
    root: TypeNode,
    mode: Mode,
}

impl Cleaner {
    pub fn new(schema: impl Into<Schema>) -> Result<Self, SchemaError> {
        Ok(Self { root: compile(schema.into())?, mode: Mode::default() })
    }

    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn root(&self) -> &TypeNode {
        &self.root
    }

    pub fn clean(&self, value: &Value) -> Result<Value, ValidationError> {
        Evaluator::new(self.mode).evaluate(&self.root, value).map_err(|failures| {
            tracing::debug!(failures = failures.len(), first = %failures[0], "clean rejected input");
            ValidationError::new(failures)
        })
    }

    /// Clean a decoded JSON tree directly.
    pub fn clean_json(&self, value: &serde_json::Value) -> Result<Value, ValidationError> {
        self.clean(&Value::from(value))
    }
}

/// Compile `schema` once and hand back a fail-fast cleaning function.
pub fn clean(
    schema: impl Into<Schema>,
) -> Result<impl Fn(&Value) -> Result<Value, ValidationError> + Send + Sync, SchemaError> {
    let cleaner = Cleaner::new(schema)?;
    Ok(move |value: &Value| cleaner.clean(value))
}

// ------------------------------- Tests ------------------------------------ //
