//! Assertions over execution logs.
//!
//! Each log entry is a step record as returned by
//! [`PipelineExecutor::execution_log`](crate::pipeline::PipelineExecutor::execution_log).

use serde_json::Value;

fn step_name(step: &Value) -> &str {
    step["operation_name"].as_str().unwrap_or_default()
}

fn step_succeeded(step: &Value) -> bool {
    step["success"].as_bool().unwrap_or(false)
}

/// Asserts that the log holds exactly the named steps, in order.
pub fn assert_step_names(log: &[Value], expected: &[&str]) {
    let actual: Vec<&str> = log.iter().map(step_name).collect();
    assert_eq!(
        actual, expected,
        "Expected steps {expected:?}, got {actual:?}"
    );
}

/// Asserts that every step in the log succeeded.
pub fn assert_all_succeeded(log: &[Value]) {
    let failed: Vec<&str> = log
        .iter()
        .filter(|step| !step_succeeded(step))
        .map(step_name)
        .collect();
    assert!(failed.is_empty(), "Expected all steps to succeed, failed: {failed:?}");
}

/// Asserts that a step with the given name was recorded as failed.
pub fn assert_step_failed(log: &[Value], name: &str) {
    let step = log.iter().find(|step| step_name(step) == name);
    match step {
        Some(step) => assert!(
            !step_succeeded(step),
            "Expected step '{name}' to fail, but it succeeded"
        ),
        None => panic!("No step named '{name}' in the log"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn log() -> Vec<Value> {
        vec![
            json!({"operation_name": "extract", "success": true}),
            json!({"operation_name": "required", "success": false, "error": "missing"}),
        ]
    }

    #[test]
    fn test_assert_step_names() {
        assert_step_names(&log(), &["extract", "required"]);
    }

    #[test]
    #[should_panic(expected = "Expected steps")]
    fn test_assert_step_names_fails() {
        assert_step_names(&log(), &["extract"]);
    }

    #[test]
    fn test_assert_all_succeeded() {
        assert_all_succeeded(&log()[..1]);
    }

    #[test]
    #[should_panic(expected = "Expected all steps to succeed")]
    fn test_assert_all_succeeded_fails() {
        assert_all_succeeded(&log());
    }

    #[test]
    fn test_assert_step_failed() {
        assert_step_failed(&log(), "required");
    }

    #[test]
    #[should_panic(expected = "No step named")]
    fn test_assert_step_failed_missing() {
        assert_step_failed(&log(), "upper");
    }
}
