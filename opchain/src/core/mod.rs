//! Core domain model types for opchain.
//!
//! This module contains the fundamental types used throughout the engine:
//! - Operation category enum and value type tags
//! - Operation results recorded in the step history
//! - Configuration schemas and per-operation configuration
//! - Dot-separated path lookups into nested values

mod config;
mod kind;
mod path;
mod result;
mod schema;

pub use config::{
    OperationConfig, SideEffectErrorPolicy, TransformErrorPolicy, ERROR_MESSAGE_KEY, ON_ERROR_KEY,
};
pub use kind::{is_truthy, type_tag, OperationType};
pub use path::{lookup, lookup_mut};
pub use result::OperationResult;
pub use schema::{ConfigSchema, ParamSpec, ParamType};
