//! Built-in transformations.
//!
//! Transformations produce a new value. Failures they return are handled by
//! the `on_error` policy unless they are validation failures.

use super::template::{display_value, render, TemplateError};
use crate::context::PipelineContext;
use crate::core::{is_truthy, lookup, type_tag, ConfigSchema, ParamSpec, ParamType};
use crate::errors::{OperationError, Result};
use crate::operations::{OperationCall, OperationDescriptor, Transformation};
use async_trait::async_trait;
use regex::Regex;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::{json, Map, Number, Value};
use std::fmt::Write as _;
use tracing::{error, warn};

/// Extracts a field from a mapping, following dot-separated paths.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtractField;

impl OperationDescriptor for ExtractField {
    fn description(&self) -> &str {
        "Extract a specific field from a dictionary, supporting dot notation"
    }

    fn config_schema(&self) -> ConfigSchema {
        ConfigSchema::new()
            .required(
                "field",
                ParamSpec::new(ParamType::Str, "Name of the field to extract (supports dot notation)")
                    .with_example(json!("user.email")),
            )
            .optional(
                "default",
                ParamSpec::new(ParamType::Any, "Default value if field does not exist")
                    .with_default(Value::Null)
                    .with_example(json!("unknown@example.com")),
            )
    }
}

#[async_trait]
impl Transformation for ExtractField {
    async fn transform(
        &self,
        call: OperationCall<'_>,
        value: &Value,
        _ctx: &PipelineContext,
    ) -> Result<Value> {
        let Some(field) = call.config.get_str("field").filter(|f| !f.is_empty()) else {
            warn!(operation = call.name, "No field specified");
            return Ok(value.clone());
        };
        let default = call.config.get("default").cloned().unwrap_or(Value::Null);

        Ok(lookup(value, field)
            .filter(|found| !found.is_null())
            .cloned()
            .unwrap_or(default))
    }
}

/// Joins mapping fields or list items into a string.
#[derive(Debug, Clone, Copy, Default)]
pub struct Concatenate;

impl OperationDescriptor for Concatenate {
    fn description(&self) -> &str {
        "Concatenate list items or selected dictionary fields into a string"
    }

    fn config_schema(&self) -> ConfigSchema {
        ConfigSchema::new()
            .optional(
                "separator",
                ParamSpec::new(ParamType::Str, "String to join values with")
                    .with_default(json!(""))
                    .with_example(json!(", ")),
            )
            .optional(
                "fields",
                ParamSpec::new(
                    ParamType::List,
                    "List of field names to extract and concatenate from input dict",
                )
                .with_example(json!(["first_name", "last_name"])),
            )
    }
}

#[async_trait]
impl Transformation for Concatenate {
    async fn transform(
        &self,
        call: OperationCall<'_>,
        value: &Value,
        _ctx: &PipelineContext,
    ) -> Result<Value> {
        let separator = call.config.str_or("separator", "");
        let fields = call
            .config
            .get_array("fields")
            .filter(|fields| !fields.is_empty());

        let parts: Vec<String> = match (fields, value) {
            (Some(fields), Value::Object(map)) => fields
                .iter()
                .filter_map(|field| map.get(display_value(field).as_str()))
                .filter(|part| is_truthy(part))
                .map(display_value)
                .collect(),
            (_, Value::Array(items)) => items
                .iter()
                .filter(|item| !item.is_null())
                .map(display_value)
                .collect(),
            (_, Value::Null) => return Ok(json!("")),
            (_, other) => return Ok(Value::String(display_value(other))),
        };

        Ok(Value::String(parts.join(separator)))
    }
}

/// Fills a `{placeholder}` template.
///
/// Placeholders resolve against `value`, the configured `fields`, then shared
/// data, later sources winning.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormatString;

impl OperationDescriptor for FormatString {
    fn description(&self) -> &str {
        "Format a string template with {field} placeholders"
    }

    fn config_schema(&self) -> ConfigSchema {
        ConfigSchema::new()
            .optional(
                "template",
                ParamSpec::new(ParamType::Str, "String template with {field} placeholders")
                    .with_default(json!("{value}"))
                    .with_example(json!("Hello, {value}!")),
            )
            .optional(
                "fields",
                ParamSpec::new(ParamType::Dict, "Dict mapping placeholder names to values")
                    .with_example(json!({"greeting": "Hello"})),
            )
    }
}

#[async_trait]
impl Transformation for FormatString {
    async fn transform(
        &self,
        call: OperationCall<'_>,
        value: &Value,
        ctx: &PipelineContext,
    ) -> Result<Value> {
        let template = call.config.str_or("template", "{value}");

        let mut args = Map::new();
        args.insert("value".to_string(), value.clone());
        if let Some(fields) = call.config.get_object("fields") {
            args.extend(fields.clone());
        }
        ctx.shared_data().with(|shared| args.extend(shared.clone()));

        match render(template, &args) {
            Ok(text) => Ok(Value::String(text)),
            Err(TemplateError::MissingKey(key)) => {
                error!(operation = call.name, key = %key, "Missing format key");
                Ok(value.clone())
            }
            Err(err) => Err(OperationError::other(err)),
        }
    }
}

/// Converts to int, float, str or bool.
///
/// Has its own `on_error`: `raise`, `return_default`, or `return_none`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TypeCast;

impl OperationDescriptor for TypeCast {
    fn description(&self) -> &str {
        "Cast value to a specific type (int, float, str, bool)"
    }

    fn config_schema(&self) -> ConfigSchema {
        ConfigSchema::new()
            .optional(
                "target_type",
                ParamSpec::new(ParamType::Str, "Target type: int, float, str, or bool")
                    .with_default(json!("str"))
                    .with_example(json!("int")),
            )
            .optional(
                "on_error",
                ParamSpec::new(
                    ParamType::Str,
                    "Error handling: raise, return_default, or return_none",
                )
                .with_default(json!("raise")),
            )
            .optional(
                "default",
                ParamSpec::new(ParamType::Any, "Default value if conversion fails")
                    .with_example(json!(0)),
            )
    }
}

#[allow(clippy::cast_possible_truncation)]
fn cast_int(value: &Value) -> std::result::Result<Value, String> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .map(Value::from)
            .or_else(|| n.as_u64().map(Value::from))
            .or_else(|| {
                n.as_f64()
                    .filter(|f| f.is_finite())
                    .map(|f| Value::from(f.trunc() as i64))
            })
            .ok_or_else(|| format!("cannot convert float {n} to integer")),
        Value::Bool(b) => Ok(Value::from(i64::from(*b))),
        Value::String(s) => s
            .trim()
            .replace('_', "")
            .parse::<i64>()
            .map(Value::from)
            .map_err(|_| format!("invalid literal for int(): '{s}'")),
        other => Err(format!(
            "int() argument must be a string or a number, not '{}'",
            type_tag(other)
        )),
    }
}

fn cast_float(value: &Value) -> std::result::Result<Value, String> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed
        .and_then(Number::from_f64)
        .map(Value::Number)
        .ok_or_else(|| format!("could not convert {} to float", display_value(value)))
}

#[async_trait]
impl Transformation for TypeCast {
    async fn transform(
        &self,
        call: OperationCall<'_>,
        value: &Value,
        _ctx: &PipelineContext,
    ) -> Result<Value> {
        let target_type = call.config.str_or("target_type", "str");

        let converted = match target_type {
            "int" => cast_int(value),
            "float" => cast_float(value),
            "str" => Ok(Value::String(display_value(value))),
            "bool" => Ok(Value::Bool(match value {
                Value::String(s) => matches!(s.to_lowercase().as_str(), "true" | "1" | "yes" | "on"),
                other => is_truthy(other),
            })),
            unknown => {
                error!(operation = call.name, target_type = unknown, "Unknown target type");
                return Ok(value.clone());
            }
        };

        match converted {
            Ok(cast) => Ok(cast),
            Err(reason) => match call.config.str_or("on_error", "raise") {
                "raise" => Err(OperationError::other(reason)),
                "return_default" => Ok(call.config.get("default").cloned().unwrap_or(Value::Null)),
                _ => Ok(Value::Null),
            },
        }
    }
}

/// Substitutes a default for null (and optionally empty) input.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultValue;

impl OperationDescriptor for DefaultValue {
    fn description(&self) -> &str {
        "Return default value if input is None or empty"
    }

    fn config_schema(&self) -> ConfigSchema {
        ConfigSchema::new()
            .required(
                "default",
                ParamSpec::new(ParamType::Any, "Default value to use when input is None or empty")
                    .with_example(json!("N/A")),
            )
            .optional(
                "check_empty",
                ParamSpec::new(ParamType::Bool, "If True, also check for empty strings/lists")
                    .with_default(json!(false)),
            )
    }
}

#[async_trait]
impl Transformation for DefaultValue {
    async fn transform(
        &self,
        call: OperationCall<'_>,
        value: &Value,
        _ctx: &PipelineContext,
    ) -> Result<Value> {
        let default = || call.config.get("default").cloned().unwrap_or(Value::Null);

        let empty = match value {
            Value::Null => true,
            Value::String(s) => s.is_empty(),
            Value::Array(a) => a.is_empty(),
            Value::Object(o) => o.is_empty(),
            _ => false,
        };
        if value.is_null() || (empty && call.config.bool_or("check_empty", false)) {
            return Ok(default());
        }
        Ok(value.clone())
    }
}

/// Maps codes to labels through a lookup table.
#[derive(Debug, Clone, Copy, Default)]
pub struct MapValues;

impl OperationDescriptor for MapValues {
    fn description(&self) -> &str {
        "Map input value to output value based on a mapping dictionary"
    }

    fn config_schema(&self) -> ConfigSchema {
        ConfigSchema::new()
            .required(
                "mapping",
                ParamSpec::new(ParamType::Dict, "Dict mapping input values to output values")
                    .with_example(json!({"A": "Active", "I": "Inactive"})),
            )
            .optional(
                "default",
                ParamSpec::new(ParamType::Any, "Default value if no mapping found")
                    .with_example(json!("Unknown")),
            )
            .optional(
                "case_sensitive",
                ParamSpec::new(ParamType::Bool, "Whether string comparison is case sensitive")
                    .with_default(json!(true)),
            )
    }
}

#[async_trait]
impl Transformation for MapValues {
    async fn transform(
        &self,
        call: OperationCall<'_>,
        value: &Value,
        _ctx: &PipelineContext,
    ) -> Result<Value> {
        let fallback = call.config.get("default").unwrap_or(value);
        let Value::String(key) = value else {
            return Ok(fallback.clone());
        };
        let Some(mapping) = call.config.get_object("mapping") else {
            return Ok(fallback.clone());
        };

        let mapped = if call.config.bool_or("case_sensitive", true) {
            mapping.get(key)
        } else {
            let key = key.to_lowercase();
            mapping
                .iter()
                .find(|(candidate, _)| candidate.to_lowercase() == key)
                .map(|(_, mapped)| mapped)
        };
        Ok(mapped.unwrap_or(fallback).clone())
    }
}

/// Decodes a JSON string. Non-strings pass through.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonParse;

impl OperationDescriptor for JsonParse {
    fn description(&self) -> &str {
        "Parse a JSON string into a structured value"
    }

    fn config_schema(&self) -> ConfigSchema {
        ConfigSchema::new()
            .optional(
                "on_error",
                ParamSpec::new(
                    ParamType::Str,
                    "Error handling: raise, return_default, or return_original",
                )
                .with_default(json!("raise")),
            )
            .optional(
                "default",
                ParamSpec::new(ParamType::Any, "Default value if parsing fails")
                    .with_example(json!({})),
            )
    }
}

#[async_trait]
impl Transformation for JsonParse {
    async fn transform(
        &self,
        call: OperationCall<'_>,
        value: &Value,
        _ctx: &PipelineContext,
    ) -> Result<Value> {
        let Value::String(text) = value else {
            return Ok(value.clone());
        };

        match serde_json::from_str(text) {
            Ok(parsed) => Ok(parsed),
            Err(err) => match call.config.str_or("on_error", "raise") {
                "raise" => Err(OperationError::other(err)),
                "return_default" => Ok(call.config.get("default").cloned().unwrap_or(Value::Null)),
                _ => Ok(value.clone()),
            },
        }
    }
}

/// Encodes a value as JSON text. Strings pass through.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSerialize;

impl OperationDescriptor for JsonSerialize {
    fn description(&self) -> &str {
        "Serialize a value to a JSON string"
    }

    fn config_schema(&self) -> ConfigSchema {
        ConfigSchema::new()
            .optional(
                "indent",
                ParamSpec::new(
                    ParamType::Int,
                    "Number of spaces for indentation (None for compact)",
                )
                .with_example(json!(2)),
            )
            .optional(
                "ensure_ascii",
                ParamSpec::new(ParamType::Bool, "Ensure output is ASCII").with_default(json!(false)),
            )
            .optional(
                "sort_keys",
                ParamSpec::new(ParamType::Bool, "Sort dictionary keys").with_default(json!(false)),
            )
    }
}

fn sort_keys(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(key, nested)| (key.clone(), sort_keys(nested)))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.iter().map(sort_keys).collect()),
        other => other.clone(),
    }
}

fn escape_non_ascii(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if c.is_ascii() {
            out.push(c);
        } else {
            let mut units = [0u16; 2];
            for unit in c.encode_utf16(&mut units) {
                let _ = write!(out, "\\u{unit:04x}");
            }
        }
    }
    out
}

#[async_trait]
impl Transformation for JsonSerialize {
    async fn transform(
        &self,
        call: OperationCall<'_>,
        value: &Value,
        _ctx: &PipelineContext,
    ) -> Result<Value> {
        if value.is_string() {
            return Ok(value.clone());
        }

        let sorted;
        let target = if call.config.bool_or("sort_keys", false) {
            sorted = sort_keys(value);
            &sorted
        } else {
            value
        };

        let text = match call.config.get_i64("indent") {
            Some(indent) => {
                let indent = " ".repeat(usize::try_from(indent).unwrap_or(0));
                let mut buf = Vec::new();
                let mut serializer = serde_json::Serializer::with_formatter(
                    &mut buf,
                    PrettyFormatter::with_indent(indent.as_bytes()),
                );
                target.serialize(&mut serializer).map_err(OperationError::other)?;
                String::from_utf8(buf).map_err(OperationError::other)?
            }
            None => serde_json::to_string(target).map_err(OperationError::other)?,
        };

        Ok(Value::String(if call.config.bool_or("ensure_ascii", false) {
            escape_non_ascii(&text)
        } else {
            text
        }))
    }
}

/// Trims whitespace from strings.
#[derive(Debug, Clone, Copy, Default)]
pub struct StripWhitespace;

impl OperationDescriptor for StripWhitespace {
    fn description(&self) -> &str {
        "Strip whitespace from string values"
    }

    fn config_schema(&self) -> ConfigSchema {
        ConfigSchema::new().optional(
            "mode",
            ParamSpec::new(ParamType::Str, "Strip mode: both, left, or right")
                .with_default(json!("both"))
                .with_example(json!("both")),
        )
    }
}

#[async_trait]
impl Transformation for StripWhitespace {
    async fn transform(
        &self,
        call: OperationCall<'_>,
        value: &Value,
        _ctx: &PipelineContext,
    ) -> Result<Value> {
        let Value::String(text) = value else {
            return Ok(value.clone());
        };
        let stripped = match call.config.str_or("mode", "both") {
            "left" => text.trim_start(),
            "right" => text.trim_end(),
            _ => text.trim(),
        };
        Ok(json!(stripped))
    }
}

/// Lowercases strings.
#[derive(Debug, Clone, Copy, Default)]
pub struct Lowercase;

impl OperationDescriptor for Lowercase {
    fn description(&self) -> &str {
        "Convert string to lowercase"
    }
}

#[async_trait]
impl Transformation for Lowercase {
    async fn transform(
        &self,
        _call: OperationCall<'_>,
        value: &Value,
        _ctx: &PipelineContext,
    ) -> Result<Value> {
        Ok(match value {
            Value::String(text) => Value::String(text.to_lowercase()),
            other => other.clone(),
        })
    }
}

/// Uppercases strings.
#[derive(Debug, Clone, Copy, Default)]
pub struct Uppercase;

impl OperationDescriptor for Uppercase {
    fn description(&self) -> &str {
        "Convert string to uppercase"
    }
}

#[async_trait]
impl Transformation for Uppercase {
    async fn transform(
        &self,
        _call: OperationCall<'_>,
        value: &Value,
        _ctx: &PipelineContext,
    ) -> Result<Value> {
        Ok(match value {
            Value::String(text) => Value::String(text.to_uppercase()),
            other => other.clone(),
        })
    }
}

/// Replaces substrings, optionally by regex.
///
/// Regex replacements use `$1`/`${name}` group references.
#[derive(Debug, Clone, Copy, Default)]
pub struct Replace;

impl OperationDescriptor for Replace {
    fn description(&self) -> &str {
        "Replace substrings in a string, with plain or regex matching"
    }

    fn config_schema(&self) -> ConfigSchema {
        ConfigSchema::new()
            .required(
                "search",
                ParamSpec::new(ParamType::Str, "String or regex to search for")
                    .with_example(json!("old")),
            )
            .required(
                "replace",
                ParamSpec::new(ParamType::Str, "Replacement string").with_example(json!("new")),
            )
            .optional(
                "count",
                ParamSpec::new(ParamType::Int, "Maximum replacements (0 for all)")
                    .with_default(json!(0)),
            )
            .optional(
                "use_regex",
                ParamSpec::new(ParamType::Bool, "Whether to use regex").with_default(json!(false)),
            )
    }
}

#[async_trait]
impl Transformation for Replace {
    async fn transform(
        &self,
        call: OperationCall<'_>,
        value: &Value,
        _ctx: &PipelineContext,
    ) -> Result<Value> {
        let Value::String(text) = value else {
            return Ok(value.clone());
        };
        let search = call.config.str_or("search", "");
        let replacement = call.config.str_or("replace", "");
        let count = call
            .config
            .get_i64("count")
            .and_then(|c| usize::try_from(c).ok())
            .unwrap_or(0);

        let replaced = if call.config.bool_or("use_regex", false) {
            let pattern = Regex::new(search).map_err(OperationError::other)?;
            pattern.replacen(text, count, replacement).into_owned()
        } else if count == 0 {
            text.replace(search, replacement)
        } else {
            text.replacen(search, replacement, count)
        };
        Ok(Value::String(replaced))
    }
}

/// Ignores the input and returns the configured value.
#[derive(Debug, Clone, Copy, Default)]
pub struct SetValue;

impl OperationDescriptor for SetValue {
    fn description(&self) -> &str {
        "Ignore input and return a static value from configuration"
    }

    fn config_schema(&self) -> ConfigSchema {
        ConfigSchema::new().required(
            "value",
            ParamSpec::new(ParamType::Any, "The static value to return").with_example(Value::Null),
        )
    }
}

#[async_trait]
impl Transformation for SetValue {
    async fn transform(
        &self,
        call: OperationCall<'_>,
        _value: &Value,
        _ctx: &PipelineContext,
    ) -> Result<Value> {
        Ok(call.config.get("value").cloned().unwrap_or(Value::Null))
    }
}
