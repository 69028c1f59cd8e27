//! Executor configuration.

use serde::{Deserialize, Serialize};

/// Name used in definition errors when a pipeline is not named.
pub const DEFAULT_PIPELINE_NAME: &str = "Unnamed";

/// Configuration for [`PipelineExecutor`](super::PipelineExecutor).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// Deepest allowed nesting of control-flow sub-pipelines.
    #[serde(default = "default_max_nesting_depth")]
    pub max_nesting_depth: usize,
}

fn default_max_nesting_depth() -> usize {
    32
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_nesting_depth: default_max_nesting_depth(),
        }
    }
}

impl ExecutorConfig {
    /// Creates a configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum nesting depth.
    #[must_use]
    pub const fn with_max_nesting_depth(mut self, depth: usize) -> Self {
        self.max_nesting_depth = depth;
        self
    }
}
