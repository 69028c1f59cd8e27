//! The audit record produced by one operation execution.

use super::{type_tag, OperationType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Result of executing one operation.
///
/// Appended to the pipeline context's step history and never mutated afterward.
/// On failure `value` holds the original input, not a partial output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationResult {
    /// The value passed downstream (or the input, on failure).
    pub value: Value,
    /// The operation's registered name.
    pub operation_name: String,
    /// The operation's category.
    pub operation_type: OperationType,
    /// Whether execution succeeded.
    pub success: bool,
    /// Error text if execution failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Free-form metadata: input/output type tags and the resolved config.
    #[serde(default)]
    pub metadata: Map<String, Value>,
    /// Wall-clock execution time.
    pub execution_time_ms: f64,
    /// When the result was created.
    pub timestamp: DateTime<Utc>,
}

impl OperationResult {
    /// Creates a successful result.
    #[must_use]
    pub fn success(
        value: Value,
        operation_name: impl Into<String>,
        operation_type: OperationType,
    ) -> Self {
        Self {
            value,
            operation_name: operation_name.into(),
            operation_type,
            success: true,
            error: None,
            metadata: Map::new(),
            execution_time_ms: 0.0,
            timestamp: Utc::now(),
        }
    }

    /// Creates a failed result carrying the original input.
    #[must_use]
    pub fn failure(
        input: Value,
        operation_name: impl Into<String>,
        operation_type: OperationType,
        error: impl Into<String>,
    ) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Self::success(input, operation_name, operation_type)
        }
    }

    /// Sets the execution time.
    #[must_use]
    pub const fn with_execution_time_ms(mut self, ms: f64) -> Self {
        self.execution_time_ms = ms;
        self
    }

    /// Merges metadata entries.
    #[must_use]
    pub fn with_metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata.extend(metadata);
        self
    }

    /// Returns the coarse type tag of the recorded value.
    #[must_use]
    pub fn value_type(&self) -> &'static str {
        type_tag(&self.value)
    }

    /// Serializes to the execution log entry format.
    ///
    /// The value itself is omitted; only its type tag is kept.
    #[must_use]
    pub fn to_dict(&self) -> Value {
        json!({
            "operation_name": self.operation_name,
            "operation_type": self.operation_type,
            "success": self.success,
            "error": self.error,
            "metadata": self.metadata,
            "execution_time_ms": self.execution_time_ms,
            "timestamp": self.timestamp.to_rfc3339(),
            "value_type": self.value_type(),
        })
    }
}
