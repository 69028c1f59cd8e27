//! # Opchain
//!
//! A configurable pipeline engine that runs chains of named operations over
//! JSON values.
//!
//! Opchain provides:
//!
//! - **A typed operation catalog**: transformations, validations, side effects
//!   and control flow, each with a self-describing configuration schema
//! - **Declarative pipelines**: ordered lists of operation steps loaded from
//!   JSON, with per-step required/optional semantics
//! - **Audited execution**: every step is timed and recorded in the pipeline
//!   context next to a shared data map
//! - **Nested pipelines**: conditional branches and sub-pipelines applied to a
//!   path inside the value
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use opchain::prelude::*;
//! use serde_json::json;
//!
//! let definition = json!([
//!     {"operation": "extract", "operation_config": {"field": "user.name"}},
//!     {"operation": "required", "operation_config": {"error_message": "Name is required"}},
//!     {"operation": "upper"}
//! ]);
//!
//! let mut executor = PipelineExecutor::new();
//! let name = executor
//!     .execute_definition(&definition, Some("names"), json!({"user": {"name": "ada"}}))
//!     .await?;
//! assert_eq!(name, json!("ADA"));
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod builtins;
pub mod context;
pub mod control;
pub mod core;
pub mod errors;
pub mod observability;
pub mod operations;
pub mod pipeline;
pub mod registry;
pub mod testing;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::context::{PipelineContext, SharedData};
    pub use crate::core::{
        ConfigSchema, OperationConfig, OperationResult, OperationType, ParamSpec, ParamType,
    };
    pub use crate::errors::{
        ConfigurationError, DefinitionError, OperationError, OperationNotFoundError,
        PipelineExecutionError, ValidationError,
    };
    pub use crate::observability::init_tracing;
    pub use crate::operations::{
        ControlFlow, Operation, OperationBehavior, OperationCall, OperationDescriptor,
        SideEffect, Transformation, Validation,
    };
    pub use crate::pipeline::{ExecutorConfig, OperationSpec, PipelineExecutor, PipelineParser};
    pub use crate::registry::{global_registry, register_operation, OperationRegistry};
}
