//! Self-documentation records produced by the registry.

use crate::core::{ConfigSchema, OperationType};
use serde::Serialize;
use serde_json::{json, Value};

/// Full documentation for one registered operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperationDescription {
    /// The name that was looked up.
    pub name: String,
    /// The operation's category.
    pub operation_type: OperationType,
    /// One-line summary.
    pub description: String,
    /// Recognized configuration.
    pub config_schema: ConfigSchema,
    /// A ready-to-use pipeline step built from the schema's examples.
    pub example: Value,
}

impl OperationDescription {
    pub(crate) fn new(
        name: &str,
        operation_type: OperationType,
        description: &str,
        config_schema: ConfigSchema,
    ) -> Self {
        let example_config = config_schema.example_config();
        let example = if example_config.is_empty() {
            json!({ "operation": name })
        } else {
            json!({ "operation": name, "operation_config": example_config })
        };
        Self {
            name: name.to_string(),
            operation_type,
            description: description.to_string(),
            config_schema,
            example,
        }
    }
}

/// One row of the deduplicated operation listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperationSummary {
    /// The first name the implementation was registered under.
    pub name: String,
    /// The operation's category.
    pub operation_type: OperationType,
    /// One-line summary.
    pub description: String,
}
