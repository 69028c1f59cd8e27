//! The sequential pipeline control loop.

use super::{ExecutorConfig, OperationSpec, PipelineParser};
use crate::context::{PipelineContext, SharedData};
use crate::core::OperationResult;
use crate::errors::{OperationError, PipelineExecutionError, Result, ValidationError};
use crate::registry::{global_registry, OperationRegistry};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Runs ordered operation specs against a value.
///
/// Each executor owns one [`PipelineContext`]. Steps run strictly one after
/// another; a step never starts before the previous one has returned.
///
/// # Example
///
/// ```rust,ignore
/// use opchain::prelude::*;
/// use serde_json::json;
///
/// let specs = PipelineParser::from_definition(
///     &json!([{"operation": "extract", "operation_config": {"field": "name"}},
///             {"operation": "uppercase"}]),
///     None,
/// )?;
/// let mut executor = PipelineExecutor::new();
/// let name = executor.execute_pipeline(&specs, json!({"name": "alice"})).await?;
/// assert_eq!(name, json!("ALICE"));
/// ```
#[derive(Debug)]
pub struct PipelineExecutor {
    context: PipelineContext,
}

impl Default for PipelineExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineExecutor {
    /// Creates an executor over fresh shared data and the global registry.
    #[must_use]
    pub fn new() -> Self {
        Self::with_shared_data(SharedData::new())
    }

    /// Creates an executor over existing shared data and the global registry.
    #[must_use]
    pub fn with_shared_data(shared_data: SharedData) -> Self {
        Self {
            context: PipelineContext::new(shared_data, global_registry()),
        }
    }

    /// Resolves operations against `registry` instead of the global one.
    #[must_use]
    pub fn with_registry(self, registry: Arc<OperationRegistry>) -> Self {
        let config = self.context.config().clone();
        Self {
            context: PipelineContext::new(self.context.shared_data().clone(), registry)
                .with_config(config),
        }
    }

    /// Sets the executor configuration.
    #[must_use]
    pub fn with_config(self, config: ExecutorConfig) -> Self {
        Self {
            context: self.context.with_config(config),
        }
    }

    /// Creates the executor a control-flow operation uses for a sub-pipeline.
    ///
    /// The child shares the parent's shared data, registry, and configuration
    /// and starts with an empty step history one level deeper.
    ///
    /// # Errors
    ///
    /// Returns `DepthExceeded` when the child would be deeper than
    /// `max_nesting_depth`.
    pub fn nested(parent: &PipelineContext) -> Result<Self> {
        let max_depth = parent.config().max_nesting_depth;
        if parent.depth() + 1 > max_depth {
            error!(depth = parent.depth(), max_depth, "Sub-pipeline nesting too deep");
            return Err(OperationError::DepthExceeded { max_depth });
        }
        Ok(Self {
            context: parent.child(),
        })
    }

    /// Returns the context.
    #[must_use]
    pub const fn context(&self) -> &PipelineContext {
        &self.context
    }

    /// Executes `specs` in ascending order index against `initial_value`.
    ///
    /// The step history is reset at the start of every run; shared data is
    /// kept. Unknown operations abort required steps and are skipped for
    /// optional ones. A failing optional step leaves the running value as it
    /// was before the step.
    ///
    /// # Errors
    ///
    /// For a required step, a validation failure is returned as is (or with
    /// the step's message override) and any other failure is wrapped in a
    /// `PipelineExecutionError` carrying the step index.
    pub async fn execute_pipeline(
        &mut self,
        specs: &[OperationSpec],
        initial_value: Value,
    ) -> Result<Value> {
        let mut ordered: Vec<&OperationSpec> = specs.iter().collect();
        ordered.sort_by_key(|spec| spec.order_index());

        self.context.clear_steps();
        debug!(
            run_id = %self.context.run_id(),
            depth = self.context.depth(),
            steps = ordered.len(),
            "Executing pipeline"
        );

        let mut current = initial_value;
        for (index, spec) in ordered.into_iter().enumerate() {
            let name = spec.operation();

            let operation = match self
                .context
                .registry()
                .get_operation(name, spec.effective_config())
            {
                Ok(operation) => operation,
                Err(err) if spec.is_required() => {
                    error!(step_index = index, operation = name, error = %err, "Unknown operation in required step");
                    return Err(PipelineExecutionError::new(err.to_string(), index, name)
                        .with_original_error(err.into())
                        .into());
                }
                Err(err) => {
                    warn!(step_index = index, operation = name, error = %err, "Skipping optional step with unknown operation");
                    continue;
                }
            };

            match operation.execute_with_metadata(&current, &mut self.context).await {
                Ok(output) => {
                    debug!(step_index = index, operation = name, "Step completed");
                    current = output;
                }
                Err(err) if !spec.is_required() => {
                    warn!(
                        step_index = index,
                        operation = name,
                        error = %err,
                        "Optional step failed, keeping previous value"
                    );
                }
                Err(err) if err.is_validation() => {
                    error!(step_index = index, operation = name, error = %err, "Required step failed validation");
                    return Err(match spec.error_message() {
                        Some(message) => ValidationError::new(message).with_operation(name).into(),
                        None => err,
                    });
                }
                Err(err) => {
                    error!(step_index = index, operation = name, error = %err, "Required step failed");
                    let message = spec.error_message().map_or_else(
                        || format!("Operation {name} failed: {err}"),
                        ToString::to_string,
                    );
                    return Err(PipelineExecutionError::new(message, index, name)
                        .with_original_error(err)
                        .into());
                }
            }
        }

        Ok(current)
    }

    /// Parses `definition` and executes it.
    ///
    /// # Errors
    ///
    /// Returns `Definition` errors from parsing, then anything
    /// [`execute_pipeline`](Self::execute_pipeline) returns.
    pub async fn execute_definition(
        &mut self,
        definition: &Value,
        name: Option<&str>,
        initial_value: Value,
    ) -> Result<Value> {
        let specs = PipelineParser::from_definition(definition, name)?;
        self.execute_pipeline(&specs, initial_value).await
    }

    /// Returns the serialized step results of the last run.
    #[must_use]
    pub fn execution_log(&self) -> Vec<Value> {
        self.context
            .steps()
            .iter()
            .map(OperationResult::to_dict)
            .collect()
    }

    /// Returns a snapshot of the shared data.
    #[must_use]
    pub fn context_data(&self) -> Map<String, Value> {
        self.context.shared_data().to_map()
    }

    /// Returns the step log together with the shared data.
    #[must_use]
    pub fn full_log(&self) -> Value {
        self.context.to_dict()
    }
}
