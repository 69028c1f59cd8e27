//! Running a sub-pipeline on one nested field of a mapping.

use super::sub_pipeline;
use crate::context::PipelineContext;
use crate::core::{is_truthy, lookup, lookup_mut, ConfigSchema, ParamSpec, ParamType};
use crate::errors::{ConfigurationError, OperationError, Result};
use crate::operations::{ControlFlow, OperationCall, OperationDescriptor};
use crate::pipeline::PipelineExecutor;
use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

/// Runs `pipeline` on the value at `path` and writes the result back.
///
/// Returns the whole input with the field replaced; sibling keys are kept.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExecutePipelineOnPath;

impl OperationDescriptor for ExecutePipelineOnPath {
    fn description(&self) -> &str {
        "Execute a sub-pipeline on the value at a nested path and write the result back"
    }

    fn config_schema(&self) -> ConfigSchema {
        ConfigSchema::new()
            .required(
                "path",
                ParamSpec::new(ParamType::Str, "Dot-separated path to the target value")
                    .with_example(json!("user.profile.name")),
            )
            .required(
                "pipeline",
                ParamSpec::new(
                    ParamType::List,
                    "The sub-pipeline to execute on the value at path",
                )
                .with_example(json!([{"operation": "strip"}, {"operation": "lowercase"}])),
            )
    }
}

#[async_trait]
impl ControlFlow for ExecutePipelineOnPath {
    async fn direct_flow(
        &self,
        call: OperationCall<'_>,
        mut value: Value,
        ctx: &PipelineContext,
    ) -> Result<Value> {
        let path = call.config.get_str("path").unwrap_or_default();
        if !value.is_object() {
            return Err(OperationError::NotAMapping {
                operation: call.name.to_string(),
                path: path.to_string(),
            });
        }
        if path.is_empty() || !call.config.get("pipeline").is_some_and(is_truthy) {
            return Err(ConfigurationError::new(
                "'path' and 'pipeline' must be provided in the config.",
                call.name,
            )
            .with_schema(self.config_schema().to_value())
            .with_provided_config(call.config.to_value())
            .into());
        }

        let initial = lookup(&value, path)
            .cloned()
            .ok_or_else(|| OperationError::PathNotFound {
                operation: call.name.to_string(),
                path: path.to_string(),
            })?;

        debug!(operation = call.name, path, "Executing sub-pipeline on path");
        let specs = sub_pipeline(call.config, "pipeline", &format!("{}_sub_pipeline", call.name))?;
        let result = PipelineExecutor::nested(ctx)?
            .execute_pipeline(&specs, initial)
            .await?;

        if let Some(slot) = lookup_mut(&mut value, path) {
            *slot = result;
        }
        debug!(operation = call.name, path, "Path updated with sub-pipeline result");
        Ok(value)
    }
}
