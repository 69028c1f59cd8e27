//! Built-in side effects.
//!
//! Side effects act on shared data or the outside world and always pass the
//! input through. Failures default to being logged and ignored.

use super::template::{display_value, render, value_args};
use crate::context::PipelineContext;
use crate::core::{lookup, type_tag, ConfigSchema, ParamSpec, ParamType};
use crate::errors::{OperationError, Result};
use crate::operations::{OperationCall, OperationDescriptor, SideEffect};
use async_trait::async_trait;
use serde_json::{json, Map, Number, Value};
use tracing::{debug, error, info, warn};

/// Logs the current value through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogValue;

impl OperationDescriptor for LogValue {
    fn description(&self) -> &str {
        "Log the current value for debugging"
    }

    fn config_schema(&self) -> ConfigSchema {
        ConfigSchema::new()
            .optional(
                "level",
                ParamSpec::new(ParamType::Str, "Log level: debug, info, warning, or error")
                    .with_default(json!("info"))
                    .with_example(json!("debug")),
            )
            .optional(
                "message",
                ParamSpec::new(ParamType::Str, "Optional message prefix")
                    .with_example(json!("Processing value")),
            )
    }
}

#[async_trait]
impl SideEffect for LogValue {
    async fn perform(
        &self,
        call: OperationCall<'_>,
        value: &Value,
        _ctx: &PipelineContext,
    ) -> Result<()> {
        let prefix = call.config.str_or("message", call.name);
        let line = format!("{prefix}: {}", display_value(value));

        match call.config.str_or("level", "info").to_lowercase().as_str() {
            "debug" => debug!(operation = call.name, "{line}"),
            "warning" => warn!(operation = call.name, "{line}"),
            "error" => error!(operation = call.name, "{line}"),
            _ => info!(operation = call.name, "{line}"),
        }
        Ok(())
    }
}

#[derive(Debug, PartialEq, Eq)]
enum StoreOutcome {
    Stored,
    Kept,
    Conflict,
}

fn store_at(shared: &mut Map<String, Value>, path: &str, value: Value, overwrite: bool) -> StoreOutcome {
    let mut keys: Vec<&str> = path.split('.').collect();
    let Some(last) = keys.pop() else {
        return StoreOutcome::Conflict;
    };

    let mut target = shared;
    for key in keys {
        target = match target
            .entry(key)
            .or_insert_with(|| Value::Object(Map::new()))
        {
            Value::Object(inner) => inner,
            _ => return StoreOutcome::Conflict,
        };
    }

    if !overwrite && target.contains_key(last) {
        return StoreOutcome::Kept;
    }
    target.insert(last.to_string(), value);
    StoreOutcome::Stored
}

/// Writes the value, or part of it, into shared data at a dot path.
#[derive(Debug, Clone, Copy, Default)]
pub struct StoreInContext;

impl OperationDescriptor for StoreInContext {
    fn description(&self) -> &str {
        "Store all or part of the current value in the shared data"
    }

    fn config_schema(&self) -> ConfigSchema {
        ConfigSchema::new()
            .required(
                "context_path",
                ParamSpec::new(ParamType::Str, "Dot-separated path to store value under in context")
                    .with_example(json!("user.id")),
            )
            .optional(
                "value_path",
                ParamSpec::new(
                    ParamType::Str,
                    "Optional dot-separated path to extract value from input",
                )
                .with_example(json!("data.user_id")),
            )
            .optional(
                "overwrite",
                ParamSpec::new(ParamType::Bool, "If False, do not overwrite existing value")
                    .with_default(json!(true)),
            )
    }
}

#[async_trait]
impl SideEffect for StoreInContext {
    async fn perform(
        &self,
        call: OperationCall<'_>,
        value: &Value,
        ctx: &PipelineContext,
    ) -> Result<()> {
        let Some(context_path) = call.config.get_str("context_path").filter(|p| !p.is_empty())
        else {
            warn!(operation = call.name, "'context_path' not specified in configuration");
            return Ok(());
        };

        let to_store = match call.config.get_str("value_path").filter(|p| !p.is_empty()) {
            None => value.clone(),
            Some(_) if !value.is_object() => {
                warn!(operation = call.name, "'value_path' is set, but input is not a dict");
                return Ok(());
            }
            Some(value_path) => match lookup(value, value_path) {
                Some(found) => found.clone(),
                None => {
                    warn!(operation = call.name, value_path, "'value_path' not found in input");
                    return Ok(());
                }
            },
        };

        let overwrite = call.config.bool_or("overwrite", true);
        match ctx
            .shared_data()
            .update(|shared| store_at(shared, context_path, to_store, overwrite))
        {
            StoreOutcome::Stored => {
                debug!(operation = call.name, context_path, "Stored value in context");
            }
            StoreOutcome::Kept => {
                debug!(operation = call.name, context_path, "Context path exists and overwrite=false, skipping");
            }
            StoreOutcome::Conflict => {
                warn!(operation = call.name, context_path, "Context path conflicts with non-dict value");
            }
        }
        Ok(())
    }
}

fn add_numbers(current: &Value, increment: &Value) -> Result<Value> {
    if let (Some(a), Some(b)) = (current.as_i64(), increment.as_i64()) {
        if let Some(sum) = a.checked_add(b) {
            return Ok(Value::from(sum));
        }
    }
    current
        .as_f64()
        .zip(increment.as_f64())
        .and_then(|(a, b)| Number::from_f64(a + b))
        .map(Value::Number)
        .ok_or_else(|| {
            OperationError::other(format!(
                "unsupported operand type(s) for +: '{}' and '{}'",
                type_tag(current),
                type_tag(increment)
            ))
        })
}

/// Adds to a numeric counter in shared data.
#[derive(Debug, Clone, Copy, Default)]
pub struct IncrementCounter;

impl OperationDescriptor for IncrementCounter {
    fn description(&self) -> &str {
        "Increment a counter in the shared data"
    }

    fn config_schema(&self) -> ConfigSchema {
        ConfigSchema::new()
            .optional(
                "key",
                ParamSpec::new(ParamType::Str, "Counter key in context")
                    .with_default(json!("counter"))
                    .with_example(json!("processed_count")),
            )
            .optional(
                "increment",
                ParamSpec::new(ParamType::Int, "Amount to increment by")
                    .with_default(json!(1))
                    .with_example(json!(1)),
            )
    }
}

#[async_trait]
impl SideEffect for IncrementCounter {
    async fn perform(
        &self,
        call: OperationCall<'_>,
        _value: &Value,
        ctx: &PipelineContext,
    ) -> Result<()> {
        let key = call.config.str_or("key", "counter");
        let increment = call.config.get("increment").cloned().unwrap_or_else(|| json!(1));

        ctx.shared_data().update(|shared| {
            let current = shared.get(key).cloned().unwrap_or_else(|| json!(0));
            let next = add_numbers(&current, &increment)?;
            shared.insert(key.to_string(), next);
            Ok(())
        })
    }
}

/// Logs the notification it would send.
#[derive(Debug, Clone, Copy, Default)]
pub struct Notify;

impl OperationDescriptor for Notify {
    fn description(&self) -> &str {
        "Log a notification message for a channel and recipient"
    }

    fn config_schema(&self) -> ConfigSchema {
        ConfigSchema::new()
            .required(
                "channel",
                ParamSpec::new(ParamType::Str, "Notification channel: email, sms, or webhook")
                    .with_example(json!("email")),
            )
            .required(
                "recipient",
                ParamSpec::new(ParamType::Str, "Recipient address")
                    .with_example(json!("user@example.com")),
            )
            .optional(
                "message",
                ParamSpec::new(ParamType::Str, "Message template")
                    .with_default(json!("{value}"))
                    .with_example(json!("New item created: {value}")),
            )
    }
}

#[async_trait]
impl SideEffect for Notify {
    async fn perform(
        &self,
        call: OperationCall<'_>,
        value: &Value,
        ctx: &PipelineContext,
    ) -> Result<()> {
        let channel = call.config.str_or("channel", "email");
        let recipient = call.config.get("recipient").map_or_else(|| "None".to_string(), display_value);
        let args = ctx.shared_data().with(|shared| value_args(value, shared));
        let message =
            render(call.config.str_or("message", "{value}"), &args).map_err(OperationError::other)?;

        info!(operation = call.name, "Would send {channel} to {recipient}: {message}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_at_creates_intermediate_maps() {
        let mut shared = Map::new();
        assert_eq!(store_at(&mut shared, "user.profile.id", json!(7), true), StoreOutcome::Stored);
        assert_eq!(Value::Object(shared), json!({"user": {"profile": {"id": 7}}}));
    }

    #[test]
    fn test_store_at_respects_overwrite() {
        let mut shared = Map::new();
        shared.insert("id".to_string(), json!(1));
        assert_eq!(store_at(&mut shared, "id", json!(2), false), StoreOutcome::Kept);
        assert_eq!(shared["id"], json!(1));
        assert_eq!(store_at(&mut shared, "id", json!(2), true), StoreOutcome::Stored);
        assert_eq!(shared["id"], json!(2));
    }

    #[test]
    fn test_store_at_conflict() {
        let mut shared = Map::new();
        shared.insert("user".to_string(), json!("flat"));
        assert_eq!(store_at(&mut shared, "user.id", json!(1), true), StoreOutcome::Conflict);
        assert_eq!(shared["user"], json!("flat"));
    }

    #[test]
    fn test_add_numbers() {
        assert_eq!(add_numbers(&json!(1), &json!(2)).unwrap(), json!(3));
        assert_eq!(add_numbers(&json!(1.5), &json!(1)).unwrap(), json!(2.5));
        assert!(add_numbers(&json!("one"), &json!(1)).is_err());
    }
}
