//! Parsed pipeline step specifications.

use crate::core::{OperationConfig, ERROR_MESSAGE_KEY};
use serde_json::{json, Value};

/// Immutable description of one pipeline step.
///
/// Built by the parser from a declarative record (or directly with the
/// builder methods) and consumed read-only by the executor.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationSpec {
    operation: String,
    operation_config: OperationConfig,
    order_index: i64,
    is_required: bool,
    error_message: Option<String>,
}

impl OperationSpec {
    /// Creates a required step with empty configuration at order index 0.
    #[must_use]
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            operation_config: OperationConfig::new(),
            order_index: 0,
            is_required: true,
            error_message: None,
        }
    }

    /// Sets the configuration.
    #[must_use]
    pub fn with_config(mut self, config: OperationConfig) -> Self {
        self.operation_config = config;
        self
    }

    /// Sets the order index.
    #[must_use]
    pub const fn with_order_index(mut self, order_index: i64) -> Self {
        self.order_index = order_index;
        self
    }

    /// Sets whether a failure aborts the pipeline.
    #[must_use]
    pub const fn with_required(mut self, is_required: bool) -> Self {
        self.is_required = is_required;
        self
    }

    /// Marks the step as optional.
    #[must_use]
    pub const fn optional(self) -> Self {
        self.with_required(false)
    }

    /// Sets the failure message override.
    #[must_use]
    pub fn with_error_message(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }

    /// Returns the operation name.
    #[must_use]
    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Returns the configuration as declared.
    #[must_use]
    pub const fn operation_config(&self) -> &OperationConfig {
        &self.operation_config
    }

    /// Returns the order index.
    #[must_use]
    pub const fn order_index(&self) -> i64 {
        self.order_index
    }

    /// Returns whether a failure aborts the pipeline.
    #[must_use]
    pub const fn is_required(&self) -> bool {
        self.is_required
    }

    /// Returns the failure message override.
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    /// Returns the configuration handed to the operation.
    ///
    /// A copy of the declared configuration with the failure message override
    /// merged in under the reserved `error_message` key.
    #[must_use]
    pub fn effective_config(&self) -> OperationConfig {
        let mut config = self.operation_config.clone();
        if let Some(ref message) = self.error_message {
            config.insert(ERROR_MESSAGE_KEY, Value::String(message.clone()));
        }
        config
    }

    /// Serializes to the declarative record form.
    #[must_use]
    pub fn to_record(&self) -> Value {
        json!({
            "operation": self.operation,
            "operation_config": self.operation_config,
            "order_index": self.order_index,
            "is_required": self.is_required,
            "error_message": self.error_message,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let spec = OperationSpec::new("uppercase");
        assert_eq!(spec.operation(), "uppercase");
        assert!(spec.is_required());
        assert_eq!(spec.order_index(), 0);
        assert!(spec.error_message().is_none());
        assert!(spec.operation_config().as_map().is_empty());
    }

    #[test]
    fn test_effective_config_merges_error_message() {
        let spec = OperationSpec::new("required")
            .with_config(OperationConfig::new().with("allow_empty_string", json!(true)))
            .with_error_message("Name is required");

        let config = spec.effective_config();
        assert_eq!(config.error_message(), Some("Name is required"));
        assert!(config.bool_or("allow_empty_string", false));
        assert!(spec.operation_config().error_message().is_none());
    }

    #[test]
    fn test_to_record() {
        let record = OperationSpec::new("range")
            .with_config(OperationConfig::new().with("min", json!(0)))
            .with_order_index(3)
            .optional()
            .to_record();

        assert_eq!(
            record,
            json!({
                "operation": "range",
                "operation_config": {"min": 0},
                "order_index": 3,
                "is_required": false,
                "error_message": null,
            })
        );
    }
}
