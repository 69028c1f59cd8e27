//! Observability utilities.
//!
//! Step timing lives with the step record in
//! [`Operation::execute_with_metadata`](crate::operations::Operation::execute_with_metadata).

mod subscriber;

pub use subscriber::{init_json_tracing, init_tracing};
