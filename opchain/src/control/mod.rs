//! Control-flow operations that run nested sub-pipelines.
//!
//! Each sub-pipeline gets its own executor built with
//! [`PipelineExecutor::nested`](crate::pipeline::PipelineExecutor::nested): it
//! shares the parent's shared data and starts a fresh step history.

mod conditional;
mod on_path;

pub use conditional::IfElse;
pub use on_path::ExecutePipelineOnPath;

use crate::core::OperationConfig;
use crate::errors::Result;
use crate::operations::OperationBehavior;
use crate::pipeline::{OperationSpec, PipelineParser};
use crate::registry::OperationRegistry;
use serde_json::Value;

/// Registers `if_else`/`if` and `execute_pipeline_on_path`/`on_path`.
pub fn register_control_flow(registry: &OperationRegistry) {
    registry.register_aliases(&["if_else", "if"], &OperationBehavior::control_flow(IfElse));
    registry.register_aliases(
        &["execute_pipeline_on_path", "on_path"],
        &OperationBehavior::control_flow(ExecutePipelineOnPath),
    );
}

/// Parses the sub-pipeline stored under `key`; absent or null is empty.
fn sub_pipeline(config: &OperationConfig, key: &str, name: &str) -> Result<Vec<OperationSpec>> {
    match config.get(key) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(definition) => Ok(PipelineParser::from_definition(definition, Some(name))?),
    }
}
