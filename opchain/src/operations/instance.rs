//! Configured operation instances and the category execution rules.

use super::{OperationBehavior, OperationCall};
use crate::context::PipelineContext;
use crate::core::{
    type_tag, ConfigSchema, OperationConfig, OperationResult, OperationType,
    SideEffectErrorPolicy, TransformErrorPolicy,
};
use crate::errors::{OperationError, Result, ValidationError};
use serde_json::{Map, Value};
use std::time::Instant;
use tracing::{debug, debug_span, error, warn, Instrument};

/// A named, configured operation ready to run.
///
/// Instances are cheap to build and hold no execution state; the registry
/// creates a fresh one for every resolution.
#[derive(Debug, Clone)]
pub struct Operation {
    name: String,
    config: OperationConfig,
    behavior: OperationBehavior,
}

impl Operation {
    /// Creates a new operation instance.
    #[must_use]
    pub fn new(name: impl Into<String>, config: OperationConfig, behavior: OperationBehavior) -> Self {
        Self {
            name: name.into(),
            config,
            behavior,
        }
    }

    /// Returns the name the operation was resolved under.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the instance configuration.
    #[must_use]
    pub const fn config(&self) -> &OperationConfig {
        &self.config
    }

    /// Returns the underlying behavior.
    #[must_use]
    pub const fn behavior(&self) -> &OperationBehavior {
        &self.behavior
    }

    /// Returns the category.
    #[must_use]
    pub const fn operation_type(&self) -> OperationType {
        self.behavior.operation_type()
    }

    /// Returns the one-line description.
    #[must_use]
    pub fn description(&self) -> &str {
        self.behavior.description()
    }

    /// Returns the configuration schema.
    #[must_use]
    pub fn config_schema(&self) -> ConfigSchema {
        self.behavior.config_schema()
    }

    fn call(&self) -> OperationCall<'_> {
        OperationCall {
            name: &self.name,
            config: &self.config,
        }
    }

    /// Runs the category-specific effect and returns the downstream value.
    ///
    /// Validations and side effects hand back the very input they were given.
    pub async fn execute(&self, value: Value, ctx: &PipelineContext) -> Result<Value> {
        let call = self.call();
        match &self.behavior {
            OperationBehavior::Transformation(op) => match op.transform(call, &value, ctx).await {
                Ok(output) => Ok(output),
                Err(err) if err.is_validation() => Err(err),
                Err(err) => self.recover_transformation(err, value),
            },
            OperationBehavior::Validation(op) => {
                if op.validate(call, &value, ctx).await? {
                    Ok(value)
                } else {
                    let message = self.config.error_message().map_or_else(
                        || format!("Validation failed: {}", self.name),
                        ToString::to_string,
                    );
                    Err(ValidationError::new(message)
                        .with_operation(self.name.as_str())
                        .into())
                }
            }
            OperationBehavior::SideEffect(op) => match op.perform(call, &value, ctx).await {
                Ok(()) => Ok(value),
                Err(err) if err.is_validation() => Err(err),
                Err(err) => self.recover_side_effect(err, value),
            },
            OperationBehavior::ControlFlow(op) => op.direct_flow(call, value, ctx).await,
        }
    }

    fn escalate(&self, err: &OperationError) -> OperationError {
        OperationError::validation(format!("{}: {err}", self.name), self.name.as_str())
    }

    fn recover_transformation(&self, err: OperationError, original: Value) -> Result<Value> {
        match self.config.transform_error_policy() {
            TransformErrorPolicy::Raise => {
                error!(operation = %self.name, error = %err, "Transformation error");
                Err(self.escalate(&err))
            }
            TransformErrorPolicy::ReturnNone => {
                warn!(operation = %self.name, error = %err, "Transformation error, returning null");
                Ok(Value::Null)
            }
            TransformErrorPolicy::ReturnOriginal => {
                warn!(operation = %self.name, error = %err, "Transformation error, returning original");
                Ok(original)
            }
            TransformErrorPolicy::Unknown(policy) => {
                error!(
                    operation = %self.name,
                    on_error = %policy,
                    "Unknown on_error value, defaulting to raise"
                );
                Err(self.escalate(&err))
            }
        }
    }

    fn recover_side_effect(&self, err: OperationError, original: Value) -> Result<Value> {
        match self.config.side_effect_error_policy() {
            SideEffectErrorPolicy::Raise => {
                error!(operation = %self.name, error = %err, "Side effect error");
                Err(self.escalate(&err))
            }
            SideEffectErrorPolicy::Ignore => {
                warn!(operation = %self.name, error = %err, "Side effect error ignored");
                Ok(original)
            }
        }
    }

    /// Executes with timing and records an [`OperationResult`] in `ctx`.
    ///
    /// A result is recorded whether or not execution succeeds. On failure it
    /// carries the original input and the error text, and the error is
    /// returned unchanged.
    pub async fn execute_with_metadata(
        &self,
        value: &Value,
        ctx: &mut PipelineContext,
    ) -> Result<Value> {
        let started = Instant::now();
        let outcome = self
            .execute(value.clone(), ctx)
            .instrument(debug_span!("operation", name = %self.name))
            .await;
        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;

        let mut metadata = Map::new();
        metadata.insert("input_type".to_string(), Value::from(type_tag(value)));
        metadata.insert("config".to_string(), self.config.to_value());

        let result = match &outcome {
            Ok(output) => {
                metadata.insert("output_type".to_string(), Value::from(type_tag(output)));
                debug!(operation = %self.name, duration_ms = elapsed_ms, "Operation succeeded");
                OperationResult::success(output.clone(), self.name.as_str(), self.operation_type())
            }
            Err(err) => {
                metadata.insert("output_type".to_string(), Value::from(type_tag(value)));
                debug!(operation = %self.name, duration_ms = elapsed_ms, error = %err, "Operation failed");
                OperationResult::failure(
                    value.clone(),
                    self.name.as_str(),
                    self.operation_type(),
                    err.to_string(),
                )
            }
        };

        ctx.add_step(
            result
                .with_execution_time_ms(elapsed_ms)
                .with_metadata(metadata),
        );
        outcome
    }
}
