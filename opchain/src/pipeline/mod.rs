//! Pipeline parsing and execution.
//!
//! This module provides:
//! - Operation specs parsed from declarative definitions
//! - Static validation of definitions against a registry
//! - The sequential executor

mod config;
mod executor;
mod parser;
mod spec;

pub use config::{ExecutorConfig, DEFAULT_PIPELINE_NAME};
pub use executor::PipelineExecutor;
pub use parser::PipelineParser;
pub use spec::OperationSpec;
