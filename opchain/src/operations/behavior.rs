//! Type-erased operation behavior, one variant per category.

use super::{ControlFlow, SideEffect, Transformation, Validation};
use crate::core::{ConfigSchema, OperationType};
use std::sync::Arc;

/// A shared, stateless operation implementation.
///
/// Cloning is cheap. Two behaviors cloned from the same registration compare
/// equal under [`OperationBehavior::same_implementation`], which is how
/// aliases are collapsed when listing.
#[derive(Debug, Clone)]
pub enum OperationBehavior {
    /// A value transformation.
    Transformation(Arc<dyn Transformation>),
    /// A constraint check.
    Validation(Arc<dyn Validation>),
    /// An external action.
    SideEffect(Arc<dyn SideEffect>),
    /// A sub-pipeline director.
    ControlFlow(Arc<dyn ControlFlow>),
}

impl OperationBehavior {
    /// Wraps a transformation.
    pub fn transformation(op: impl Transformation + 'static) -> Self {
        Self::Transformation(Arc::new(op))
    }

    /// Wraps a validation.
    pub fn validation(op: impl Validation + 'static) -> Self {
        Self::Validation(Arc::new(op))
    }

    /// Wraps a side effect.
    pub fn side_effect(op: impl SideEffect + 'static) -> Self {
        Self::SideEffect(Arc::new(op))
    }

    /// Wraps a control-flow operation.
    pub fn control_flow(op: impl ControlFlow + 'static) -> Self {
        Self::ControlFlow(Arc::new(op))
    }

    /// Returns the category tag.
    #[must_use]
    pub const fn operation_type(&self) -> OperationType {
        match self {
            Self::Transformation(_) => OperationType::Transformation,
            Self::Validation(_) => OperationType::Validation,
            Self::SideEffect(_) => OperationType::SideEffect,
            Self::ControlFlow(_) => OperationType::ControlFlow,
        }
    }

    /// Returns the one-line description.
    #[must_use]
    pub fn description(&self) -> &str {
        match self {
            Self::Transformation(op) => op.description(),
            Self::Validation(op) => op.description(),
            Self::SideEffect(op) => op.description(),
            Self::ControlFlow(op) => op.description(),
        }
    }

    /// Returns the configuration schema.
    #[must_use]
    pub fn config_schema(&self) -> ConfigSchema {
        match self {
            Self::Transformation(op) => op.config_schema(),
            Self::Validation(op) => op.config_schema(),
            Self::SideEffect(op) => op.config_schema(),
            Self::ControlFlow(op) => op.config_schema(),
        }
    }

    fn data_ptr(&self) -> *const () {
        match self {
            Self::Transformation(op) => Arc::as_ptr(op).cast::<()>(),
            Self::Validation(op) => Arc::as_ptr(op).cast::<()>(),
            Self::SideEffect(op) => Arc::as_ptr(op).cast::<()>(),
            Self::ControlFlow(op) => Arc::as_ptr(op).cast::<()>(),
        }
    }

    /// Returns true if both behaviors share one implementation instance.
    #[must_use]
    pub fn same_implementation(&self, other: &Self) -> bool {
        std::ptr::eq(self.data_ptr(), other.data_ptr())
    }
}
