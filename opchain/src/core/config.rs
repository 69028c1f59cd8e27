//! Per-operation configuration and error-handling policies.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Reserved configuration key carrying a caller-supplied failure message.
pub const ERROR_MESSAGE_KEY: &str = "error_message";

/// Configuration key selecting the `onError` policy.
pub const ON_ERROR_KEY: &str = "on_error";

/// An operation's opaque key/value configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OperationConfig(Map<String, Value>);

impl OperationConfig {
    /// Creates an empty configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the raw value for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Returns the value for `key`, treating JSON null as absent.
    #[must_use]
    pub fn get_present(&self, key: &str) -> Option<&Value> {
        self.0.get(key).filter(|v| !v.is_null())
    }

    /// Returns true if `key` is set.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Returns a string option.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// Returns a string option or `default`.
    #[must_use]
    pub fn str_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get_str(key).unwrap_or(default)
    }

    /// Returns a boolean option or `default`.
    #[must_use]
    pub fn bool_or(&self, key: &str, default: bool) -> bool {
        self.0.get(key).and_then(Value::as_bool).unwrap_or(default)
    }

    /// Returns an integer option.
    #[must_use]
    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.0.get(key).and_then(Value::as_i64)
    }

    /// Returns a numeric option.
    #[must_use]
    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.0.get(key).and_then(Value::as_f64)
    }

    /// Returns a list option.
    #[must_use]
    pub fn get_array(&self, key: &str) -> Option<&Vec<Value>> {
        self.0.get(key).and_then(Value::as_array)
    }

    /// Returns a mapping option.
    #[must_use]
    pub fn get_object(&self, key: &str) -> Option<&Map<String, Value>> {
        self.0.get(key).and_then(Value::as_object)
    }

    /// Returns the caller-supplied failure message, if any.
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        self.get_str(ERROR_MESSAGE_KEY)
    }

    /// Sets a value.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.0.insert(key.into(), value);
    }

    /// Returns a copy with `key` set.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: Value) -> Self {
        self.insert(key, value);
        self
    }

    /// Returns the underlying map.
    #[must_use]
    pub const fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Converts to a JSON object.
    #[must_use]
    pub fn to_value(&self) -> Value {
        Value::Object(self.0.clone())
    }

    /// Transformation error policy selected by `on_error`.
    #[must_use]
    pub fn transform_error_policy(&self) -> TransformErrorPolicy {
        self.get_str(ON_ERROR_KEY)
            .map_or(TransformErrorPolicy::Raise, TransformErrorPolicy::parse)
    }

    /// Side-effect error policy selected by `on_error`.
    #[must_use]
    pub fn side_effect_error_policy(&self) -> SideEffectErrorPolicy {
        self.get_str(ON_ERROR_KEY)
            .map_or(SideEffectErrorPolicy::Ignore, SideEffectErrorPolicy::parse)
    }
}

impl From<Map<String, Value>> for OperationConfig {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl From<OperationConfig> for Map<String, Value> {
    fn from(config: OperationConfig) -> Self {
        config.0
    }
}

impl TryFrom<Value> for OperationConfig {
    type Error = Value;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            Value::Null => Ok(Self::new()),
            other => Err(other),
        }
    }
}

/// How a transformation reacts to a non-validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransformErrorPolicy {
    /// Re-raise as a validation failure.
    Raise,
    /// Substitute null.
    ReturnNone,
    /// Substitute the original input.
    ReturnOriginal,
    /// An unrecognized policy. Behaves like `Raise` after logging.
    Unknown(String),
}

impl TransformErrorPolicy {
    /// Parses an `on_error` value.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value {
            "raise" => Self::Raise,
            "return_none" => Self::ReturnNone,
            "return_original" => Self::ReturnOriginal,
            other => Self::Unknown(other.to_string()),
        }
    }
}

/// How a side effect reacts to a non-validation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SideEffectErrorPolicy {
    /// Log and pass the input through.
    Ignore,
    /// Re-raise as a validation failure.
    Raise,
}

impl SideEffectErrorPolicy {
    /// Parses an `on_error` value. Anything but `raise` ignores.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        if value == "raise" {
            Self::Raise
        } else {
            Self::Ignore
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config(value: Value) -> OperationConfig {
        OperationConfig::try_from(value).unwrap()
    }

    #[test]
    fn test_typed_getters() {
        let cfg = config(json!({
            "field": "user.name",
            "count": 2,
            "min": 0.5,
            "flag": true,
            "items": [1, 2],
            "mapping": {"A": "Active"},
        }));

        assert_eq!(cfg.get_str("field"), Some("user.name"));
        assert_eq!(cfg.get_i64("count"), Some(2));
        assert_eq!(cfg.get_f64("min"), Some(0.5));
        assert!(cfg.bool_or("flag", false));
        assert!(!cfg.bool_or("missing", false));
        assert_eq!(cfg.get_array("items").map(Vec::len), Some(2));
        assert!(cfg.get_object("mapping").is_some());
        assert_eq!(cfg.str_or("mode", "both"), "both");
    }

    #[test]
    fn test_get_present_skips_null() {
        let cfg = config(json!({"default": null}));
        assert!(cfg.contains_key("default"));
        assert!(cfg.get_present("default").is_none());
    }

    #[test]
    fn test_try_from_rejects_non_objects() {
        assert!(OperationConfig::try_from(json!([1])).is_err());
        assert!(OperationConfig::try_from(Value::Null).unwrap().as_map().is_empty());
    }

    #[test]
    fn test_transform_policy() {
        assert_eq!(OperationConfig::new().transform_error_policy(), TransformErrorPolicy::Raise);
        assert_eq!(
            config(json!({"on_error": "return_none"})).transform_error_policy(),
            TransformErrorPolicy::ReturnNone
        );
        assert_eq!(
            config(json!({"on_error": "explode"})).transform_error_policy(),
            TransformErrorPolicy::Unknown("explode".to_string())
        );
    }

    #[test]
    fn test_side_effect_policy() {
        assert_eq!(OperationConfig::new().side_effect_error_policy(), SideEffectErrorPolicy::Ignore);
        assert_eq!(
            config(json!({"on_error": "raise"})).side_effect_error_policy(),
            SideEffectErrorPolicy::Raise
        );
        assert_eq!(
            config(json!({"on_error": "whatever"})).side_effect_error_policy(),
            SideEffectErrorPolicy::Ignore
        );
    }

    #[test]
    fn test_error_message_key() {
        let cfg = OperationConfig::new().with(ERROR_MESSAGE_KEY, json!("Name is required"));
        assert_eq!(cfg.error_message(), Some("Name is required"));
    }
}
