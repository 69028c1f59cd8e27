//! Operation registry.
//!
//! This module provides:
//! - The name to implementation catalog with alias support
//! - The process-wide registry pre-loaded with built-ins
//! - Fuzzy suggestions for unknown names
//! - Description and listing records for self-documentation

mod catalog;
mod describe;
mod suggestions;

pub use catalog::{global_registry, register_operation, OperationRegistry};
pub use describe::{OperationDescription, OperationSummary};
pub use suggestions::{close_matches, similarity, MAX_SUGGESTIONS, SIMILARITY_CUTOFF};
