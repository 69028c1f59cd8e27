//! The mutable context owned by one pipeline run.

use super::SharedData;
use crate::core::OperationResult;
use crate::pipeline::ExecutorConfig;
use crate::registry::OperationRegistry;
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

/// Per-run state: an append-only step history and the shared data map.
///
/// The step history reflects actual execution order and is the authoritative
/// audit trail. Nested sub-pipelines get a child context that shares the
/// shared data and registry but starts with an empty history.
#[derive(Debug)]
pub struct PipelineContext {
    run_id: Uuid,
    depth: usize,
    steps: Vec<OperationResult>,
    shared_data: SharedData,
    registry: Arc<OperationRegistry>,
    config: ExecutorConfig,
}

impl PipelineContext {
    /// Creates a top-level context.
    #[must_use]
    pub fn new(shared_data: SharedData, registry: Arc<OperationRegistry>) -> Self {
        Self {
            run_id: Uuid::now_v7(),
            depth: 0,
            steps: Vec::new(),
            shared_data,
            registry,
            config: ExecutorConfig::default(),
        }
    }

    /// Sets the executor configuration.
    #[must_use]
    pub fn with_config(mut self, config: ExecutorConfig) -> Self {
        self.config = config;
        self
    }

    /// Creates the context for a nested sub-pipeline.
    #[must_use]
    pub fn child(&self) -> Self {
        Self {
            run_id: Uuid::now_v7(),
            depth: self.depth + 1,
            steps: Vec::new(),
            shared_data: self.shared_data.clone(),
            registry: Arc::clone(&self.registry),
            config: self.config.clone(),
        }
    }

    /// Returns the run identifier.
    #[must_use]
    pub const fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Returns the nesting depth; zero for a top-level run.
    #[must_use]
    pub const fn depth(&self) -> usize {
        self.depth
    }

    /// Returns the shared data handle.
    #[must_use]
    pub const fn shared_data(&self) -> &SharedData {
        &self.shared_data
    }

    /// Returns the registry operations are resolved against.
    #[must_use]
    pub const fn registry(&self) -> &Arc<OperationRegistry> {
        &self.registry
    }

    /// Returns the executor configuration.
    #[must_use]
    pub const fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Appends a step result.
    pub fn add_step(&mut self, result: OperationResult) {
        self.steps.push(result);
    }

    /// Returns the recorded steps in execution order.
    #[must_use]
    pub fn steps(&self) -> &[OperationResult] {
        &self.steps
    }

    /// Returns the value of the most recent step, or `None` before any step ran.
    #[must_use]
    pub fn last_value(&self) -> Option<&Value> {
        self.steps.last().map(|step| &step.value)
    }

    /// Returns every recorded step value in order.
    #[must_use]
    pub fn step_values(&self) -> Vec<&Value> {
        self.steps.iter().map(|step| &step.value).collect()
    }

    /// Discards the step history. Shared data is untouched.
    pub fn clear_steps(&mut self) {
        self.steps.clear();
    }

    /// Serializes steps and shared data for logging.
    #[must_use]
    pub fn to_dict(&self) -> Value {
        json!({
            "total_steps": self.steps.len(),
            "steps": self.steps.iter().map(OperationResult::to_dict).collect::<Vec<_>>(),
            "shared_data": self.shared_data.to_map(),
        })
    }
}
