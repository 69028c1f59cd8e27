//! Context management for pipeline execution.
//!
//! This module provides:
//! - The shared key/value map passed by reference into sub-pipelines
//! - The per-run pipeline context holding the step history

mod pipeline;
mod shared;

pub use pipeline::PipelineContext;
pub use shared::SharedData;
