//! The operation contract.
//!
//! Every operation belongs to exactly one of four categories, each with its
//! own narrow effect method:
//!
//! - [`Transformation::transform`] produces a new value
//! - [`Validation::validate`] answers whether the value satisfies a constraint
//! - [`SideEffect::perform`] acts on the outside world or the shared data
//! - [`ControlFlow::direct_flow`] runs nested sub-pipelines
//!
//! [`Operation`] pairs a name and configuration with one of these behaviors and
//! owns the category-specific execution rules and the timed, audited
//! [`Operation::execute_with_metadata`] entry point.

mod behavior;
mod instance;

pub use behavior::OperationBehavior;
pub use instance::Operation;

use crate::context::PipelineContext;
use crate::core::{ConfigSchema, OperationConfig};
use crate::errors::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::fmt::Debug;

/// Name and configuration of the operation instance being executed.
#[derive(Debug, Clone, Copy)]
pub struct OperationCall<'a> {
    /// The name the operation was resolved under.
    pub name: &'a str,
    /// The instance configuration.
    pub config: &'a OperationConfig,
}

/// Self-documentation shared by every operation category.
pub trait OperationDescriptor: Send + Sync + Debug {
    /// One-line summary of what the operation does.
    fn description(&self) -> &str;

    /// Recognized configuration parameters.
    fn config_schema(&self) -> ConfigSchema {
        ConfigSchema::new()
    }
}

/// An operation that maps the input to a new value.
///
/// Non-validation failures are handled by the `on_error` policy before they
/// reach the executor.
#[async_trait]
pub trait Transformation: OperationDescriptor {
    /// Produces the transformed value.
    async fn transform(
        &self,
        call: OperationCall<'_>,
        value: &Value,
        ctx: &PipelineContext,
    ) -> Result<Value>;
}

/// An operation that checks a constraint.
///
/// The input always passes through unchanged on success.
#[async_trait]
pub trait Validation: OperationDescriptor {
    /// Returns whether `value` satisfies the constraint.
    async fn validate(
        &self,
        call: OperationCall<'_>,
        value: &Value,
        ctx: &PipelineContext,
    ) -> Result<bool>;
}

/// An operation that performs an action and passes the input through.
#[async_trait]
pub trait SideEffect: OperationDescriptor {
    /// Performs the action. May read or write the shared data.
    async fn perform(
        &self,
        call: OperationCall<'_>,
        value: &Value,
        ctx: &PipelineContext,
    ) -> Result<()>;
}

/// An operation that directs execution into nested sub-pipelines.
#[async_trait]
pub trait ControlFlow: OperationDescriptor {
    /// Runs the control-flow logic and returns the resulting value.
    async fn direct_flow(
        &self,
        call: OperationCall<'_>,
        value: Value,
        ctx: &PipelineContext,
    ) -> Result<Value>;
}
