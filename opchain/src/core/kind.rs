//! Operation category enum and value type tags.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// The semantic category an operation belongs to.
///
/// Ordering follows declaration order and is used when listing operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationType {
    /// Produces a new value from the input.
    Transformation,
    /// Checks a constraint and passes the input through unchanged.
    Validation,
    /// Performs an external action and passes the input through unchanged.
    SideEffect,
    /// Directs execution into nested sub-pipelines.
    ControlFlow,
}

impl OperationType {
    /// All categories, in listing order.
    pub const ALL: [Self; 4] = [
        Self::Transformation,
        Self::Validation,
        Self::SideEffect,
        Self::ControlFlow,
    ];

    /// Returns the snake_case tag.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Transformation => "transformation",
            Self::Validation => "validation",
            Self::SideEffect => "side_effect",
            Self::ControlFlow => "control_flow",
        }
    }
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// JSON truthiness: null, false, zero, and empty strings, lists and maps are false.
#[must_use]
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Returns the coarse type tag recorded in step metadata.
#[must_use]
pub fn type_tag(value: &Value) -> &'static str {
    match value {
        Value::Null => "None",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "int",
        Value::String(_) => "str",
        Value::Array(_) => "list",
        Value::Object(_) => "dict",
    }
}
