//! Conditional branching on the outcome of a validation sub-pipeline.

use super::sub_pipeline;
use crate::context::PipelineContext;
use crate::core::{is_truthy, ConfigSchema, ParamSpec, ParamType};
use crate::errors::Result;
use crate::operations::{ControlFlow, OperationCall, OperationDescriptor};
use crate::pipeline::PipelineExecutor;
use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

/// Runs `then_branch` if the `condition` pipeline passes, else `else_branch`.
///
/// Only a validation failure from the condition selects the else branch; any
/// other failure propagates. Failures inside the chosen branch propagate too.
/// Without an `else_branch` a failed condition returns the input unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct IfElse;

impl OperationDescriptor for IfElse {
    fn description(&self) -> &str {
        "Execute one of two sub-pipelines depending on a validation condition"
    }

    fn config_schema(&self) -> ConfigSchema {
        ConfigSchema::new()
            .required(
                "condition",
                ParamSpec::new(ParamType::List, "Sub-pipeline of validations to evaluate")
                    .with_example(json!([{"operation": "required"}])),
            )
            .required(
                "then_branch",
                ParamSpec::new(ParamType::List, "Sub-pipeline for the \"if true\" branch")
                    .with_example(json!([{"operation": "uppercase"}])),
            )
            .optional(
                "else_branch",
                ParamSpec::new(ParamType::List, "Sub-pipeline for the \"if false\" branch")
                    .with_default(json!([]))
                    .with_example(json!([
                        {"operation": "set", "operation_config": {"value": "N/A"}}
                    ])),
            )
    }
}

#[async_trait]
impl ControlFlow for IfElse {
    async fn direct_flow(
        &self,
        call: OperationCall<'_>,
        value: Value,
        ctx: &PipelineContext,
    ) -> Result<Value> {
        let condition = sub_pipeline(call.config, "condition", "ifelse_condition")?;
        let verdict = PipelineExecutor::nested(ctx)?
            .execute_pipeline(&condition, value.clone())
            .await;

        match verdict {
            Ok(_) => {
                debug!(operation = call.name, "Condition passed, executing then_branch");
                let then_branch = sub_pipeline(call.config, "then_branch", "ifelse_then_branch")?;
                PipelineExecutor::nested(ctx)?
                    .execute_pipeline(&then_branch, value)
                    .await
            }
            Err(err) if err.is_validation() => {
                debug!(operation = call.name, reason = %err, "Condition failed, executing else_branch");
                if !call.config.get("else_branch").is_some_and(is_truthy) {
                    return Ok(value);
                }
                let else_branch = sub_pipeline(call.config, "else_branch", "ifelse_else_branch")?;
                PipelineExecutor::nested(ctx)?
                    .execute_pipeline(&else_branch, value)
                    .await
            }
            Err(err) => Err(err),
        }
    }
}
