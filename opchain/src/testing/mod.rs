//! Testing utilities for opchain pipelines.
//!
//! This module provides:
//! - Mock operations that record or fail
//! - A registry builder for mixing mocks with the built-ins
//! - Assertions over execution logs

mod assertions;
mod mocks;

pub use assertions::{assert_all_succeeded, assert_step_failed, assert_step_names};
pub use mocks::{registry_with, FailingOperation, RecordedCall, RecordingOperation};
