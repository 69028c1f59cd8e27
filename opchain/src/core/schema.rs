//! Configuration schemas declared by operations.
//!
//! A schema is both the source for static pipeline validation and
//! machine-readable self-documentation.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Coarse type tag for a configuration parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ParamType {
    /// A string.
    Str,
    /// An integer. Booleans are not integers.
    Int,
    /// A boolean.
    Bool,
    /// A number. Integers are accepted.
    Float,
    /// A list.
    List,
    /// A mapping.
    Dict,
    /// Anything.
    Any,
    /// A tag this crate does not recognize. Always accepted.
    Other(String),
}

impl ParamType {
    /// Returns the tag as written in schemas.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Str => "str",
            Self::Int => "int",
            Self::Bool => "bool",
            Self::Float => "float",
            Self::List => "list",
            Self::Dict => "dict",
            Self::Any => "any",
            Self::Other(tag) => tag,
        }
    }

    /// Checks whether `value` matches this type.
    #[must_use]
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            Self::Str => value.is_string(),
            Self::Int => value.is_i64() || value.is_u64(),
            Self::Bool => value.is_boolean(),
            Self::Float => value.is_number(),
            Self::List => value.is_array(),
            Self::Dict => value.is_object(),
            Self::Any | Self::Other(_) => true,
        }
    }
}

impl From<&str> for ParamType {
    fn from(tag: &str) -> Self {
        match tag {
            "str" => Self::Str,
            "int" => Self::Int,
            "bool" => Self::Bool,
            "float" => Self::Float,
            "list" => Self::List,
            "dict" => Self::Dict,
            "any" => Self::Any,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<String> for ParamType {
    fn from(tag: String) -> Self {
        Self::from(tag.as_str())
    }
}

impl From<ParamType> for String {
    fn from(param_type: ParamType) -> Self {
        param_type.as_str().to_string()
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declaration of one configuration parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamSpec {
    /// Expected type.
    #[serde(rename = "type")]
    pub param_type: ParamType,
    /// Human-readable description.
    pub description: String,
    /// Value used when the parameter is omitted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Example value used for documentation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,
}

impl ParamSpec {
    /// Creates a new parameter declaration.
    #[must_use]
    pub fn new(param_type: ParamType, description: impl Into<String>) -> Self {
        Self {
            param_type,
            description: description.into(),
            default: None,
            example: None,
        }
    }

    /// Sets the default.
    #[must_use]
    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    /// Sets the example.
    #[must_use]
    pub fn with_example(mut self, example: Value) -> Self {
        self.example = Some(example);
        self
    }

    fn to_value(&self) -> Value {
        let mut map = Map::new();
        map.insert("type".to_string(), Value::String(self.param_type.to_string()));
        map.insert(
            "description".to_string(),
            Value::String(self.description.clone()),
        );
        if let Some(ref default) = self.default {
            map.insert("default".to_string(), default.clone());
        }
        if let Some(ref example) = self.example {
            map.insert("example".to_string(), example.clone());
        }
        Value::Object(map)
    }
}

/// The recognized configuration parameters of an operation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigSchema {
    /// Parameters that must be supplied.
    #[serde(default)]
    pub required: BTreeMap<String, ParamSpec>,
    /// Parameters that may be supplied.
    #[serde(default)]
    pub optional: BTreeMap<String, ParamSpec>,
}

impl ConfigSchema {
    /// Creates an empty schema.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a required parameter.
    #[must_use]
    pub fn required(mut self, name: impl Into<String>, spec: ParamSpec) -> Self {
        self.required.insert(name.into(), spec);
        self
    }

    /// Declares an optional parameter.
    #[must_use]
    pub fn optional(mut self, name: impl Into<String>, spec: ParamSpec) -> Self {
        self.optional.insert(name.into(), spec);
        self
    }

    /// Returns true if no parameters are declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.required.is_empty() && self.optional.is_empty()
    }

    /// Looks up a parameter in either section.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&ParamSpec> {
        self.required.get(name).or_else(|| self.optional.get(name))
    }

    /// Collects example values for every parameter that declares one.
    ///
    /// Required parameters come first.
    #[must_use]
    pub fn example_config(&self) -> Map<String, Value> {
        self.required
            .iter()
            .chain(&self.optional)
            .filter_map(|(name, spec)| spec.example.clone().map(|ex| (name.clone(), ex)))
            .collect()
    }

    /// Serializes to the `{required: {...}, optional: {...}}` form.
    #[must_use]
    pub fn to_value(&self) -> Value {
        let section = |params: &BTreeMap<String, ParamSpec>| -> Value {
            Value::Object(
                params
                    .iter()
                    .map(|(name, spec)| (name.clone(), spec.to_value()))
                    .collect(),
            )
        };
        let mut map = Map::new();
        map.insert("required".to_string(), section(&self.required));
        map.insert("optional".to_string(), section(&self.optional));
        Value::Object(map)
    }
}
