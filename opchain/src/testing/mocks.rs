//! Mock operations for testing.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;

use crate::context::PipelineContext;
use crate::errors::{OperationError, Result};
use crate::operations::{
    ControlFlow, OperationBehavior, OperationCall, OperationDescriptor, Transformation,
};
use crate::registry::OperationRegistry;

/// A single call seen by a [`RecordingOperation`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    /// The name the operation was resolved under.
    pub name: String,
    /// The configured `tag`, if any.
    pub tag: Option<String>,
    /// The input value.
    pub value: Value,
}

/// A transformation that returns its input and records every call.
///
/// Clones share the same call log, so a clone can be registered while the
/// original is kept for inspection.
#[derive(Debug, Clone, Default)]
pub struct RecordingOperation {
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

impl RecordingOperation {
    /// Creates a recorder with an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a behavior sharing this recorder's log.
    #[must_use]
    pub fn behavior(&self) -> OperationBehavior {
        OperationBehavior::transformation(self.clone())
    }

    /// Returns all recorded calls.
    #[must_use]
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    /// Returns the number of calls.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Returns the configured tags in call order, skipping untagged calls.
    #[must_use]
    pub fn tags(&self) -> Vec<String> {
        self.calls
            .lock()
            .iter()
            .filter_map(|call| call.tag.clone())
            .collect()
    }

    /// Returns the input values in call order.
    #[must_use]
    pub fn values(&self) -> Vec<Value> {
        self.calls.lock().iter().map(|call| call.value.clone()).collect()
    }

    /// Clears the log.
    pub fn reset(&self) {
        self.calls.lock().clear();
    }
}

impl OperationDescriptor for RecordingOperation {
    fn description(&self) -> &str {
        "Records its input and passes it through"
    }
}

#[async_trait]
impl Transformation for RecordingOperation {
    async fn transform(
        &self,
        call: OperationCall<'_>,
        value: &Value,
        _ctx: &PipelineContext,
    ) -> Result<Value> {
        self.calls.lock().push(RecordedCall {
            name: call.name.to_string(),
            tag: call.config.get_str("tag").map(ToString::to_string),
            value: value.clone(),
        });
        Ok(value.clone())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FailureKind {
    Generic,
    Validation,
}

/// An operation that always fails.
///
/// Registered as control flow so its error reaches the executor exactly as
/// raised, without an `on_error` policy in the way.
#[derive(Debug, Clone)]
pub struct FailingOperation {
    message: String,
    kind: FailureKind,
}

impl FailingOperation {
    /// Fails with a non-validation error.
    #[must_use]
    pub fn generic(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: FailureKind::Generic,
        }
    }

    /// Fails with a validation error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: FailureKind::Validation,
        }
    }

    /// Returns the behavior to register.
    #[must_use]
    pub fn behavior(&self) -> OperationBehavior {
        OperationBehavior::control_flow(self.clone())
    }
}

impl OperationDescriptor for FailingOperation {
    fn description(&self) -> &str {
        "Always fails"
    }
}

#[async_trait]
impl ControlFlow for FailingOperation {
    async fn direct_flow(
        &self,
        call: OperationCall<'_>,
        _value: Value,
        _ctx: &PipelineContext,
    ) -> Result<Value> {
        Err(match self.kind {
            FailureKind::Generic => OperationError::other(&self.message),
            FailureKind::Validation => OperationError::validation(&self.message, call.name),
        })
    }
}

/// Builds a registry holding the built-ins plus the given operations.
#[must_use]
pub fn registry_with(operations: &[(&str, OperationBehavior)]) -> Arc<OperationRegistry> {
    let registry = OperationRegistry::with_builtins();
    for (name, behavior) in operations {
        registry.register(*name, behavior.clone());
    }
    Arc::new(registry)
}
