//! Error types for the opchain pipeline engine.
//!
//! Validation failures are the only error kind that control flow treats as a
//! branch selector and that the executor's non-required policy recovers from by
//! keeping the prior value. Everything else propagates.

use serde_json::{json, Value};
use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T, E = OperationError> = std::result::Result<T, E>;

/// The main error type for pipeline operations.
#[derive(Debug, Error)]
pub enum OperationError {
    /// A value failed a constraint.
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// An operation name could not be resolved in the registry.
    #[error("{0}")]
    NotFound(#[from] OperationNotFoundError),

    /// An operation's configuration does not satisfy its schema.
    #[error("{0}")]
    Configuration(#[from] ConfigurationError),

    /// A required step failed with a non-validation error.
    #[error("{0}")]
    PipelineExecution(#[from] PipelineExecutionError),

    /// A pipeline definition is structurally malformed.
    #[error("{0}")]
    Definition(#[from] DefinitionError),

    /// A path-scoped operation could not resolve its path.
    #[error("{operation}: Path '{path}' does not exist in the input data.")]
    PathNotFound {
        /// The operation name.
        operation: String,
        /// The dot-separated path.
        path: String,
    },

    /// A path-scoped operation received a non-mapping input.
    #[error("{operation}: Input value must be a dictionary to access path '{path}'.")]
    NotAMapping {
        /// The operation name.
        operation: String,
        /// The dot-separated path.
        path: String,
    },

    /// Control-flow recursion went deeper than the executor allows.
    #[error("Maximum pipeline nesting depth exceeded ({max_depth})")]
    DepthExceeded {
        /// The configured maximum.
        max_depth: usize,
    },

    /// Any other failure raised by an operation implementation.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl OperationError {
    /// Creates an untyped operation failure from a message.
    #[must_use]
    pub fn other(message: impl std::fmt::Display) -> Self {
        Self::Other(anyhow::anyhow!("{message}"))
    }

    /// Creates a validation failure attributed to `operation`.
    #[must_use]
    pub fn validation(message: impl Into<String>, operation: impl Into<String>) -> Self {
        Self::Validation(ValidationError::new(message).with_operation(operation))
    }

    /// Returns true for validation failures.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns the validation failure, if this is one.
    #[must_use]
    pub const fn as_validation(&self) -> Option<&ValidationError> {
        match self {
            Self::Validation(err) => Some(err),
            _ => None,
        }
    }

    /// Converts to a structured, serializable representation.
    #[must_use]
    pub fn to_dict(&self) -> Value {
        match self {
            Self::Validation(err) => err.to_dict(),
            Self::NotFound(err) => err.to_dict(),
            Self::Configuration(err) => err.to_dict(),
            Self::PipelineExecution(err) => err.to_dict(),
            Self::Definition(err) => err.to_dict(),
            Self::PathNotFound { operation, path } | Self::NotAMapping { operation, path } => {
                json!({
                    "error": "PATH_NOT_FOUND",
                    "message": self.to_string(),
                    "operation": operation,
                    "path": path,
                })
            }
            Self::DepthExceeded { max_depth } => json!({
                "error": "MAX_DEPTH_EXCEEDED",
                "message": self.to_string(),
                "max_depth": max_depth,
            }),
            Self::Other(err) => json!({
                "error": "OPERATION_ERROR",
                "message": err.to_string(),
            }),
        }
    }
}

/// Raised when a value fails a constraint.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct ValidationError {
    /// The error message.
    pub message: String,
    /// The operation that raised the failure.
    pub operation: Option<String>,
    /// Optional path to the offending field.
    pub path: Option<String>,
}

impl ValidationError {
    /// Creates a new validation error.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            operation: None,
            path: None,
        }
    }

    /// Sets the operation name.
    #[must_use]
    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.operation = Some(operation.into());
        self
    }

    /// Sets the field path.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> Value {
        json!({
            "error": "VALIDATION_ERROR",
            "message": self.message,
            "operation": self.operation,
            "path": self.path,
        })
    }
}

/// Maximum number of valid names spelled out in the not-found message.
const LISTED_OPERATIONS: usize = 10;

/// Raised when an operation name has no registry entry.
#[derive(Debug, Clone, Error)]
pub struct OperationNotFoundError {
    /// The requested name.
    pub operation: String,
    /// Close matches, best first.
    pub suggestions: Vec<String>,
    /// Every registered name.
    pub valid_operations: Vec<String>,
}

impl OperationNotFoundError {
    /// Creates a new not-found error.
    #[must_use]
    pub fn new(
        operation: impl Into<String>,
        suggestions: Vec<String>,
        mut valid_operations: Vec<String>,
    ) -> Self {
        valid_operations.sort();
        Self {
            operation: operation.into(),
            suggestions,
            valid_operations,
        }
    }

    fn render(&self) -> String {
        let mut msg = format!("Unknown operation: '{}'.", self.operation);
        if !self.suggestions.is_empty() {
            msg.push_str(&format!(" Did you mean: {}?", self.suggestions.join(", ")));
        }
        if !self.valid_operations.is_empty() {
            let shown: Vec<&str> = self
                .valid_operations
                .iter()
                .take(LISTED_OPERATIONS)
                .map(String::as_str)
                .collect();
            msg.push_str(&format!("\nAvailable operations: {}", shown.join(", ")));
            if self.valid_operations.len() > LISTED_OPERATIONS {
                msg.push_str(&format!(
                    " ... ({} more)",
                    self.valid_operations.len() - LISTED_OPERATIONS
                ));
            }
        }
        msg
    }

    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> Value {
        json!({
            "error": "OPERATION_NOT_FOUND",
            "message": self.to_string(),
            "operation": self.operation,
            "suggestions": self.suggestions,
            "valid_operations": self.valid_operations,
        })
    }
}

impl std::fmt::Display for OperationNotFoundError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.render())
    }
}

/// Raised when supplied configuration does not satisfy an operation's schema.
#[derive(Debug, Clone, Error)]
#[error("[{operation}] {message}")]
pub struct ConfigurationError {
    /// The error message.
    pub message: String,
    /// The operation name.
    pub operation: String,
    /// The expected configuration schema.
    pub config_schema: Option<Value>,
    /// The configuration that was supplied.
    pub provided_config: Option<Value>,
}

impl ConfigurationError {
    /// Creates a new configuration error.
    #[must_use]
    pub fn new(message: impl Into<String>, operation: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            operation: operation.into(),
            config_schema: None,
            provided_config: None,
        }
    }

    /// Attaches the expected schema.
    #[must_use]
    pub fn with_schema(mut self, schema: Value) -> Self {
        self.config_schema = Some(schema);
        self
    }

    /// Attaches the offending configuration.
    #[must_use]
    pub fn with_provided_config(mut self, config: Value) -> Self {
        self.provided_config = Some(config);
        self
    }

    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> Value {
        json!({
            "error": "CONFIGURATION_ERROR",
            "message": self.message,
            "operation": self.operation,
            "config_schema": self.config_schema,
            "provided_config": self.provided_config,
        })
    }
}

/// Wraps a non-validation failure raised by a required step.
#[derive(Debug, Error)]
#[error("Step {step_index}: {message}")]
pub struct PipelineExecutionError {
    /// The error message.
    pub message: String,
    /// Position of the failing step in execution order.
    pub step_index: usize,
    /// The operation name.
    pub operation: String,
    /// The underlying failure.
    #[source]
    pub original_error: Option<Box<OperationError>>,
}

impl PipelineExecutionError {
    /// Creates a new pipeline execution error.
    #[must_use]
    pub fn new(message: impl Into<String>, step_index: usize, operation: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            step_index,
            operation: operation.into(),
            original_error: None,
        }
    }

    /// Chains the underlying failure.
    #[must_use]
    pub fn with_original_error(mut self, err: OperationError) -> Self {
        self.original_error = Some(Box::new(err));
        self
    }

    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> Value {
        json!({
            "error": "PIPELINE_EXECUTION_ERROR",
            "message": self.message,
            "step_index": self.step_index,
            "operation": self.operation,
            "original_error": self.original_error.as_ref().map(ToString::to_string),
        })
    }
}

/// Structural problems in a declarative pipeline definition.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DefinitionError {
    /// The encoded text form could not be decoded.
    #[error("Invalid JSON in pipeline for '{pipeline}': {reason}")]
    InvalidEncoding {
        /// The pipeline name.
        pipeline: String,
        /// The decoder's message.
        reason: String,
    },

    /// The definition is neither a list nor encoded text.
    #[error("Pipeline definition for '{pipeline}' must be a list or JSON string, got {found}")]
    NotAList {
        /// The pipeline name.
        pipeline: String,
        /// Type tag of what was supplied.
        found: String,
    },

    /// A step record is not a mapping.
    #[error("Pipeline operation at index {index} in '{pipeline}' must be an object, got {found}")]
    InvalidStep {
        /// Position in the declared list.
        index: usize,
        /// The pipeline name.
        pipeline: String,
        /// Type tag of what was supplied.
        found: String,
    },

    /// A step's `operation_config` is not a mapping.
    #[error("Pipeline operation at index {index} in '{pipeline}' has invalid 'operation_config': expected dict, got {found}")]
    InvalidConfig {
        /// Position in the declared list.
        index: usize,
        /// The pipeline name.
        pipeline: String,
        /// Type tag of what was supplied.
        found: String,
    },

    /// No free order index remains at or above the declared one.
    #[error("Pipeline operation at index {index} in '{pipeline}' has no free order index at or above {order_index}")]
    OrderIndexExhausted {
        /// Position in the declared list.
        index: usize,
        /// The pipeline name.
        pipeline: String,
        /// The declared order index.
        order_index: i64,
    },

    /// A step record lacks an operation name.
    #[error("Pipeline operation at index {index} in '{pipeline}' is missing required 'operation' field.")]
    MissingOperation {
        /// Position in the declared list.
        index: usize,
        /// The pipeline name.
        pipeline: String,
    },
}

impl DefinitionError {
    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> Value {
        json!({
            "error": "PIPELINE_DEFINITION_ERROR",
            "message": self.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_to_dict() {
        let err = ValidationError::new("too short")
            .with_operation("length")
            .with_path("user.name");
        let dict = err.to_dict();

        assert_eq!(dict["error"], "VALIDATION_ERROR");
        assert_eq!(dict["message"], "too short");
        assert_eq!(dict["operation"], "length");
        assert_eq!(dict["path"], "user.name");
    }

    #[test]
    fn test_not_found_message_with_suggestions() {
        let err = OperationNotFoundError::new(
            "uppercse",
            vec!["uppercase".to_string()],
            vec!["uppercase".to_string(), "lowercase".to_string()],
        );
        let msg = err.to_string();

        assert!(msg.starts_with("Unknown operation: 'uppercse'. Did you mean: uppercase?"));
        assert!(msg.contains("Available operations: lowercase, uppercase"));
        assert!(!msg.contains("more)"));
    }

    #[test]
    fn test_not_found_truncates_long_name_lists() {
        let names: Vec<String> = (0..13).map(|i| format!("op_{i:02}")).collect();
        let err = OperationNotFoundError::new("missing", Vec::new(), names);
        let msg = err.to_string();

        assert!(!msg.contains("Did you mean"));
        assert!(msg.contains("op_09"));
        assert!(!msg.contains("op_10,"));
        assert!(msg.ends_with(" ... (3 more)"));
    }

    #[test]
    fn test_not_found_to_dict_sorts_valid_operations() {
        let err = OperationNotFoundError::new(
            "x",
            Vec::new(),
            vec!["b".to_string(), "a".to_string()],
        );
        let dict = err.to_dict();

        assert_eq!(dict["error"], "OPERATION_NOT_FOUND");
        assert_eq!(dict["valid_operations"], json!(["a", "b"]));
    }

    #[test]
    fn test_configuration_error_display() {
        let err = ConfigurationError::new("Missing required config 'field'", "extract_field")
            .with_provided_config(json!({}));

        assert_eq!(err.to_string(), "[extract_field] Missing required config 'field'");
        assert_eq!(err.to_dict()["provided_config"], json!({}));
    }

    #[test]
    fn test_pipeline_execution_error_chains_source() {
        let err = PipelineExecutionError::new("Operation boom failed: kaput", 2, "boom")
            .with_original_error(OperationError::other("kaput"));

        assert_eq!(err.to_string(), "Step 2: Operation boom failed: kaput");
        assert!(std::error::Error::source(&err).is_some());

        let dict = err.to_dict();
        assert_eq!(dict["step_index"], 2);
        assert_eq!(dict["original_error"], "kaput");
    }

    #[test]
    fn test_is_validation() {
        assert!(OperationError::validation("nope", "required").is_validation());
        assert!(!OperationError::other("nope").is_validation());
        assert!(!OperationError::DepthExceeded { max_depth: 3 }.is_validation());
    }

    #[test]
    fn test_definition_error_message() {
        let err = DefinitionError::MissingOperation {
            index: 1,
            pipeline: "Unnamed".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Pipeline operation at index 1 in 'Unnamed' is missing required 'operation' field."
        );
    }
}
