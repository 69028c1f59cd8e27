//! Declarative pipeline definitions to executable specs.

use super::config::DEFAULT_PIPELINE_NAME;
use super::OperationSpec;
use crate::core::{is_truthy, type_tag, OperationConfig};
use crate::errors::DefinitionError;
use crate::registry::{global_registry, OperationRegistry};
use serde_json::Value;
use std::collections::HashSet;
use tracing::debug;

/// Translates pipeline definitions and validates them against a registry.
///
/// A definition is a list of step records:
///
/// ```json
/// [
///   {"operation": "extract_field", "operation_config": {"field": "name"}},
///   {"operation": "uppercase", "order_index": 5, "is_required": false}
/// ]
/// ```
///
/// or the same list encoded as a JSON string.
#[derive(Debug, Clone, Copy, Default)]
pub struct PipelineParser;

impl PipelineParser {
    /// Parses a definition into specs sorted by order index.
    ///
    /// `definition` may be the decoded list or a JSON string holding it.
    /// Declared order indices are advisory: a collision is resolved by
    /// incrementing the later step's index until it is free.
    ///
    /// # Errors
    ///
    /// Returns a `DefinitionError` for undecodable text, non-list input,
    /// non-object steps, non-object configuration, a missing operation name,
    /// or a collision with no free order index left above it.
    pub fn from_definition(
        definition: &Value,
        name: Option<&str>,
    ) -> Result<Vec<OperationSpec>, DefinitionError> {
        let name = name.unwrap_or(DEFAULT_PIPELINE_NAME);
        match definition {
            Value::String(text) => Self::from_json(text, Some(name)),
            Value::Array(steps) => Self::parse_steps(steps, name),
            other => Err(DefinitionError::NotAList {
                pipeline: name.to_string(),
                found: type_tag(other).to_string(),
            }),
        }
    }

    /// Decodes `text` and parses the resulting definition.
    pub fn from_json(text: &str, name: Option<&str>) -> Result<Vec<OperationSpec>, DefinitionError> {
        let name = name.unwrap_or(DEFAULT_PIPELINE_NAME);
        let decoded: Value =
            serde_json::from_str(text).map_err(|e| DefinitionError::InvalidEncoding {
                pipeline: name.to_string(),
                reason: e.to_string(),
            })?;
        match decoded {
            Value::Array(steps) => Self::parse_steps(&steps, name),
            other => Err(DefinitionError::NotAList {
                pipeline: name.to_string(),
                found: type_tag(&other).to_string(),
            }),
        }
    }

    fn parse_steps(steps: &[Value], name: &str) -> Result<Vec<OperationSpec>, DefinitionError> {
        let mut used = HashSet::with_capacity(steps.len());
        let mut specs = Vec::with_capacity(steps.len());

        for (index, step) in steps.iter().enumerate() {
            let record = step.as_object().ok_or_else(|| DefinitionError::InvalidStep {
                index,
                pipeline: name.to_string(),
                found: type_tag(step).to_string(),
            })?;

            let operation = record
                .get("operation")
                .and_then(Value::as_str)
                .filter(|op| !op.is_empty())
                .ok_or_else(|| DefinitionError::MissingOperation {
                    index,
                    pipeline: name.to_string(),
                })?;

            let config = match record.get("operation_config") {
                None | Some(Value::Null) => OperationConfig::new(),
                Some(Value::Object(map)) => OperationConfig::from(map.clone()),
                Some(other) => {
                    return Err(DefinitionError::InvalidConfig {
                        index,
                        pipeline: name.to_string(),
                        found: type_tag(other).to_string(),
                    })
                }
            };

            let declared = record
                .get("order_index")
                .and_then(Value::as_i64)
                .unwrap_or_else(|| i64::try_from(index).unwrap_or(i64::MAX));
            let mut order_index = declared;
            while !used.insert(order_index) {
                order_index = order_index.checked_add(1).ok_or_else(|| {
                    DefinitionError::OrderIndexExhausted {
                        index,
                        pipeline: name.to_string(),
                        order_index: declared,
                    }
                })?;
            }

            let mut spec = OperationSpec::new(operation)
                .with_config(config)
                .with_order_index(order_index)
                .with_required(record.get("is_required").map_or(true, is_truthy));
            if let Some(message) = record.get("error_message").and_then(Value::as_str) {
                spec = spec.with_error_message(message);
            }
            specs.push(spec);
        }

        specs.sort_by_key(OperationSpec::order_index);
        debug!(pipeline = name, steps = specs.len(), "Parsed pipeline definition");
        Ok(specs)
    }

    /// Serializes specs back to the declarative list form.
    #[must_use]
    pub fn to_definition(specs: &[OperationSpec]) -> Value {
        Value::Array(specs.iter().map(OperationSpec::to_record).collect())
    }

    /// Validates a definition against the process-wide registry.
    ///
    /// See [`PipelineParser::validate_with`].
    #[must_use]
    pub fn validate(definition: &Value, name: Option<&str>) -> Vec<String> {
        Self::validate_with(&global_registry(), definition, name)
    }

    /// Statically checks a definition without executing anything.
    ///
    /// Every step is checked: names must resolve in `registry`, and each
    /// schema-declared required parameter must be present and of the declared
    /// coarse type. Returns every problem found; an empty list means valid.
    #[must_use]
    pub fn validate_with(
        registry: &OperationRegistry,
        definition: &Value,
        name: Option<&str>,
    ) -> Vec<String> {
        let decoded;
        let steps = match definition {
            Value::String(text) => match serde_json::from_str::<Value>(text) {
                Ok(value) => {
                    decoded = value;
                    match &decoded {
                        Value::Array(steps) => steps,
                        other => {
                            return vec![format!(
                                "Expected JSON string or list, got {}",
                                type_tag(other)
                            )]
                        }
                    }
                }
                Err(e) => return vec![format!("Invalid JSON: {e}")],
            },
            Value::Array(steps) => steps,
            other => {
                return vec![format!(
                    "Expected JSON string or list, got {}",
                    type_tag(other)
                )]
            }
        };

        if steps.is_empty() {
            return vec!["Pipeline cannot be empty".to_string()];
        }

        let mut errors = Vec::new();
        for (index, step) in steps.iter().enumerate() {
            errors.extend(Self::validate_step(registry, index, step));
        }
        debug!(
            pipeline = name.unwrap_or(DEFAULT_PIPELINE_NAME),
            errors = errors.len(),
            "Validated pipeline definition"
        );
        errors
    }

    fn validate_step(registry: &OperationRegistry, index: usize, step: &Value) -> Vec<String> {
        let prefix = format!("Step {index}");

        let Some(record) = step.as_object() else {
            return vec![format!("{prefix}: Expected dict, got {}", type_tag(step))];
        };

        let Some(operation) = record
            .get("operation")
            .and_then(Value::as_str)
            .filter(|op| !op.is_empty())
        else {
            return vec![format!("{prefix}: Missing required 'operation' field")];
        };

        let schema = match registry.get_config_schema(operation) {
            Ok(schema) => schema,
            Err(err) => {
                let mut message = format!("{prefix}: Unknown operation '{operation}'");
                if !err.suggestions.is_empty() {
                    message.push_str(&format!(". Did you mean: {}?", err.suggestions.join(", ")));
                }
                return vec![message];
            }
        };

        let empty = serde_json::Map::new();
        let config = match record.get("operation_config") {
            None | Some(Value::Null) => &empty,
            Some(Value::Object(map)) => map,
            Some(other) => {
                return vec![format!(
                    "{prefix} ({operation}): Expected dict for 'operation_config', got {}",
                    type_tag(other)
                )]
            }
        };

        schema
            .required
            .iter()
            .filter_map(|(param, spec)| match config.get(param) {
                None => Some(format!(
                    "{prefix} ({operation}): Missing required config '{param}'"
                )),
                Some(value) if !spec.param_type.accepts(value) => Some(format!(
                    "{prefix} ({operation}): Config '{param}' has invalid type, expected {}",
                    spec.param_type
                )),
                Some(_) => None,
            })
            .collect()
    }
}
