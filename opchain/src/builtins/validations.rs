//! Built-in validations.
//!
//! A validation only answers yes or no; the operation wrapper turns a "no"
//! into a validation failure and passes the input through on "yes".

use crate::context::PipelineContext;
use crate::core::{ConfigSchema, ParamSpec, ParamType};
use crate::errors::Result;
use crate::operations::{OperationCall, OperationDescriptor, Validation};
use async_trait::async_trait;
use regex::{Regex, RegexBuilder};
use serde_json::{json, Value};
use std::cmp::Ordering;
use std::sync::LazyLock;
use tracing::{error, warn};

/// Equality where numbers compare by value, so `1` equals `1.0`.
pub(crate) fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => x == y,
        },
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(x, y)| values_equal(x, y))
        }
        _ => a == b,
    }
}

/// Ordering for like-kinded values: numbers (booleans count as 0/1),
/// strings, and lists compared element-wise. `None` means incomparable.
pub(crate) fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    fn numeric(value: &Value) -> Option<f64> {
        match value {
            Value::Number(n) => n.as_f64(),
            Value::Bool(b) => Some(f64::from(u8::from(*b))),
            _ => None,
        }
    }

    match (a, b) {
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Array(x), Value::Array(y)) => {
            for (x, y) in x.iter().zip(y) {
                match compare_values(x, y)? {
                    Ordering::Equal => {}
                    unequal => return Some(unequal),
                }
            }
            Some(x.len().cmp(&y.len()))
        }
        _ => numeric(a)?.partial_cmp(&numeric(b)?),
    }
}

fn contains(haystack: &[Value], needle: &Value, case_sensitive: bool) -> bool {
    match needle {
        Value::String(needle) if !case_sensitive => {
            let needle = needle.to_lowercase();
            haystack
                .iter()
                .filter_map(Value::as_str)
                .any(|candidate| candidate.to_lowercase() == needle)
        }
        _ => haystack.iter().any(|candidate| values_equal(candidate, needle)),
    }
}

/// Fails on null, blank strings and empty lists.
#[derive(Debug, Clone, Copy, Default)]
pub struct Required;

impl OperationDescriptor for Required {
    fn description(&self) -> &str {
        "Validate that value is not None or empty"
    }

    fn config_schema(&self) -> ConfigSchema {
        ConfigSchema::new()
            .optional(
                "allow_empty_string",
                ParamSpec::new(ParamType::Bool, "If False, empty strings fail validation")
                    .with_default(json!(false)),
            )
            .optional(
                "allow_empty_list",
                ParamSpec::new(ParamType::Bool, "If False, empty lists fail validation")
                    .with_default(json!(false)),
            )
    }
}

#[async_trait]
impl Validation for Required {
    async fn validate(
        &self,
        call: OperationCall<'_>,
        value: &Value,
        _ctx: &PipelineContext,
    ) -> Result<bool> {
        Ok(match value {
            Value::Null => false,
            Value::String(s) => {
                call.config.bool_or("allow_empty_string", false) || !s.trim().is_empty()
            }
            Value::Array(items) => call.config.bool_or("allow_empty_list", false) || !items.is_empty(),
            _ => true,
        })
    }
}

/// Checks a number, or numeric string, against inclusive bounds.
#[derive(Debug, Clone, Copy, Default)]
pub struct Range;

impl OperationDescriptor for Range {
    fn description(&self) -> &str {
        "Validate that numeric value is within a range"
    }

    fn config_schema(&self) -> ConfigSchema {
        ConfigSchema::new()
            .optional(
                "min",
                ParamSpec::new(ParamType::Float, "Minimum value (inclusive)").with_example(json!(0)),
            )
            .optional(
                "max",
                ParamSpec::new(ParamType::Float, "Maximum value (inclusive)")
                    .with_example(json!(100)),
            )
    }
}

#[async_trait]
impl Validation for Range {
    async fn validate(
        &self,
        call: OperationCall<'_>,
        value: &Value,
        _ctx: &PipelineContext,
    ) -> Result<bool> {
        let number = match value {
            Value::Number(n) => n.as_f64(),
            Value::Bool(b) => Some(f64::from(u8::from(*b))),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        let Some(number) = number else {
            warn!(operation = call.name, value = %value, "Cannot convert value to number");
            return Ok(false);
        };

        let above_min = call.config.get_f64("min").map_or(true, |min| number >= min);
        let below_max = call.config.get_f64("max").map_or(true, |max| number <= max);
        Ok(above_min && below_max)
    }
}

/// Checks the length of a string (in characters), list or mapping.
#[derive(Debug, Clone, Copy, Default)]
pub struct Length;

impl OperationDescriptor for Length {
    fn description(&self) -> &str {
        "Validate string or list length"
    }

    fn config_schema(&self) -> ConfigSchema {
        ConfigSchema::new()
            .optional(
                "min_length",
                ParamSpec::new(ParamType::Int, "Minimum length (inclusive)").with_example(json!(1)),
            )
            .optional(
                "max_length",
                ParamSpec::new(ParamType::Int, "Maximum length (inclusive)")
                    .with_example(json!(255)),
            )
    }
}

#[async_trait]
impl Validation for Length {
    async fn validate(
        &self,
        call: OperationCall<'_>,
        value: &Value,
        _ctx: &PipelineContext,
    ) -> Result<bool> {
        let length = match value {
            Value::String(s) => s.chars().count(),
            Value::Array(items) => items.len(),
            Value::Object(map) => map.len(),
            Value::Null => return Ok(false),
            other => {
                warn!(operation = call.name, value = %other, "Value has no length");
                return Ok(false);
            }
        };
        let length = i64::try_from(length).unwrap_or(i64::MAX);

        let long_enough = call.config.get_i64("min_length").map_or(true, |min| length >= min);
        let short_enough = call.config.get_i64("max_length").map_or(true, |max| length <= max);
        Ok(long_enough && short_enough)
    }
}

/// Matches a string against a pattern anchored at its start.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegexMatch;

impl OperationDescriptor for RegexMatch {
    fn description(&self) -> &str {
        "Validate string against regex pattern"
    }

    fn config_schema(&self) -> ConfigSchema {
        ConfigSchema::new()
            .required(
                "pattern",
                ParamSpec::new(ParamType::Str, "Regex pattern to match")
                    .with_example(json!(r"^[A-Z]{2}\d{4}$")),
            )
            .optional(
                "flags",
                ParamSpec::new(
                    ParamType::Str,
                    "Regex flags (i=case-insensitive, m=multiline, s=dotall)",
                )
                .with_example(json!("i")),
            )
    }
}

#[async_trait]
impl Validation for RegexMatch {
    async fn validate(
        &self,
        call: OperationCall<'_>,
        value: &Value,
        _ctx: &PipelineContext,
    ) -> Result<bool> {
        let Value::String(text) = value else {
            return Ok(false);
        };
        let Some(pattern) = call.config.get_str("pattern").filter(|p| !p.is_empty()) else {
            warn!(operation = call.name, "No pattern specified");
            return Ok(true);
        };

        let flags = call.config.str_or("flags", "");
        let compiled = RegexBuilder::new(&format!(r"\A(?:{pattern})"))
            .case_insensitive(flags.contains('i'))
            .multi_line(flags.contains('m'))
            .dot_matches_new_line(flags.contains('s'))
            .build();

        match compiled {
            Ok(regex) => Ok(regex.is_match(text)),
            Err(err) => {
                error!(operation = call.name, pattern, error = %err, "Invalid regex pattern");
                Ok(false)
            }
        }
    }
}

static EMAIL_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").ok());

/// Checks a simple `local@domain.tld` shape.
#[derive(Debug, Clone, Copy, Default)]
pub struct Email;

impl OperationDescriptor for Email {
    fn description(&self) -> &str {
        "Validate email address format"
    }
}

#[async_trait]
impl Validation for Email {
    async fn validate(
        &self,
        _call: OperationCall<'_>,
        value: &Value,
        _ctx: &PipelineContext,
    ) -> Result<bool> {
        Ok(match (value.as_str(), EMAIL_PATTERN.as_ref()) {
            (Some(text), Some(pattern)) => pattern.is_match(text),
            _ => false,
        })
    }
}

/// Checks a URL shape with an allowed scheme.
#[derive(Debug, Clone, Copy, Default)]
pub struct Url;

impl OperationDescriptor for Url {
    fn description(&self) -> &str {
        "Validate URL format"
    }

    fn config_schema(&self) -> ConfigSchema {
        ConfigSchema::new().optional(
            "schemes",
            ParamSpec::new(ParamType::List, "List of allowed URL schemes")
                .with_default(json!(["http", "https"]))
                .with_example(json!(["http", "https", "ftp"])),
        )
    }
}

#[async_trait]
impl Validation for Url {
    async fn validate(
        &self,
        call: OperationCall<'_>,
        value: &Value,
        _ctx: &PipelineContext,
    ) -> Result<bool> {
        let Value::String(text) = value else {
            return Ok(false);
        };
        let schemes: Vec<String> = call.config.get_array("schemes").map_or_else(
            || vec!["http".to_string(), "https".to_string()],
            |schemes| {
                schemes
                    .iter()
                    .filter_map(Value::as_str)
                    .map(regex::escape)
                    .collect()
            },
        );

        let pattern = format!(r"^({})://[^\s/$.?#].[^\s]*$", schemes.join("|"));
        match RegexBuilder::new(&pattern).case_insensitive(true).build() {
            Ok(regex) => Ok(regex.is_match(text)),
            Err(err) => {
                error!(operation = call.name, error = %err, "Invalid scheme list");
                Ok(false)
            }
        }
    }
}

/// Checks the value's JSON kind.
///
/// `int` does not match booleans and `float` only matches non-integers.
#[derive(Debug, Clone, Copy, Default)]
pub struct TypeCheck;

impl OperationDescriptor for TypeCheck {
    fn description(&self) -> &str {
        "Validate value type"
    }

    fn config_schema(&self) -> ConfigSchema {
        ConfigSchema::new().required(
            "expected_type",
            ParamSpec::new(
                ParamType::Str,
                "Expected type: str, int, float, bool, list, dict, or none",
            )
            .with_example(json!("str")),
        )
    }
}

#[async_trait]
impl Validation for TypeCheck {
    async fn validate(
        &self,
        call: OperationCall<'_>,
        value: &Value,
        _ctx: &PipelineContext,
    ) -> Result<bool> {
        let expected = call.config.get_str("expected_type").unwrap_or_default();
        Ok(match expected {
            "str" => value.is_string(),
            "int" => value.is_i64() || value.is_u64(),
            "float" => value.is_f64(),
            "bool" => value.is_boolean(),
            "list" => value.is_array(),
            "dict" => value.is_object(),
            "none" => value.is_null(),
            unknown => {
                warn!(operation = call.name, expected_type = unknown, "Unknown expected type");
                true
            }
        })
    }
}

/// Checks membership in `allowed_values`.
#[derive(Debug, Clone, Copy, Default)]
pub struct InList;

impl OperationDescriptor for InList {
    fn description(&self) -> &str {
        "Validate that value is in a list of allowed values"
    }

    fn config_schema(&self) -> ConfigSchema {
        ConfigSchema::new()
            .required(
                "allowed_values",
                ParamSpec::new(ParamType::List, "List of allowed values")
                    .with_example(json!(["active", "pending", "completed"])),
            )
            .optional(
                "case_sensitive",
                ParamSpec::new(ParamType::Bool, "For strings, case sensitivity")
                    .with_default(json!(true)),
            )
    }
}

#[async_trait]
impl Validation for InList {
    async fn validate(
        &self,
        call: OperationCall<'_>,
        value: &Value,
        _ctx: &PipelineContext,
    ) -> Result<bool> {
        let allowed = call.config.get_array("allowed_values").map_or(&[][..], Vec::as_slice);
        Ok(contains(allowed, value, call.config.bool_or("case_sensitive", true)))
    }
}

/// Checks the value is not in `forbidden_values`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotInList;

impl OperationDescriptor for NotInList {
    fn description(&self) -> &str {
        "Validate that value is NOT in a list of forbidden values"
    }

    fn config_schema(&self) -> ConfigSchema {
        ConfigSchema::new()
            .required(
                "forbidden_values",
                ParamSpec::new(ParamType::List, "List of forbidden values")
                    .with_example(json!(["admin", "root", "system"])),
            )
            .optional(
                "case_sensitive",
                ParamSpec::new(ParamType::Bool, "For strings, case sensitivity")
                    .with_default(json!(true)),
            )
    }
}

#[async_trait]
impl Validation for NotInList {
    async fn validate(
        &self,
        call: OperationCall<'_>,
        value: &Value,
        _ctx: &PipelineContext,
    ) -> Result<bool> {
        let forbidden = call
            .config
            .get_array("forbidden_values")
            .map_or(&[][..], Vec::as_slice);
        Ok(!contains(forbidden, value, call.config.bool_or("case_sensitive", true)))
    }
}

/// Compares against a fixed value or a shared-data entry.
#[derive(Debug, Clone, Copy, Default)]
pub struct Comparison;

impl OperationDescriptor for Comparison {
    fn description(&self) -> &str {
        "Compare value against another value or context field"
    }

    fn config_schema(&self) -> ConfigSchema {
        ConfigSchema::new()
            .required(
                "operator",
                ParamSpec::new(ParamType::Str, "Comparison operator: eq, ne, lt, le, gt, or ge")
                    .with_example(json!("gt")),
            )
            .optional(
                "compare_to",
                ParamSpec::new(ParamType::Any, "Value to compare against").with_example(json!(0)),
            )
            .optional(
                "context_key",
                ParamSpec::new(
                    ParamType::Str,
                    "If set, compare against context.shared_data[context_key]",
                )
                .with_example(json!("min_value")),
            )
    }
}

#[async_trait]
impl Validation for Comparison {
    async fn validate(
        &self,
        call: OperationCall<'_>,
        value: &Value,
        ctx: &PipelineContext,
    ) -> Result<bool> {
        let operator = call.config.str_or("operator", "eq");
        let other = match call.config.get_str("context_key") {
            Some(key) => ctx.shared_data().get(key).unwrap_or(Value::Null),
            None => call.config.get("compare_to").cloned().unwrap_or(Value::Null),
        };

        let ordering = || {
            let ordering = compare_values(value, &other);
            if ordering.is_none() {
                warn!(operation = call.name, left = %value, right = %other, "Cannot compare values");
            }
            ordering
        };

        Ok(match operator {
            "eq" => values_equal(value, &other),
            "ne" => !values_equal(value, &other),
            "lt" => ordering().is_some_and(Ordering::is_lt),
            "le" => ordering().is_some_and(Ordering::is_le),
            "gt" => ordering().is_some_and(Ordering::is_gt),
            "ge" => ordering().is_some_and(Ordering::is_ge),
            unknown => {
                warn!(operation = call.name, operator = unknown, "Unknown operator");
                true
            }
        })
    }
}

/// Fails if an earlier step in this run produced the same value.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unique;

impl OperationDescriptor for Unique {
    fn description(&self) -> &str {
        "Validate that value is unique (not seen before in this pipeline)"
    }

    fn config_schema(&self) -> ConfigSchema {
        ConfigSchema::new().optional(
            "scope",
            ParamSpec::new(
                ParamType::Str,
                "Uniqueness scope: pipeline (check against previous values)",
            )
            .with_default(json!("pipeline")),
        )
    }
}

#[async_trait]
impl Validation for Unique {
    async fn validate(
        &self,
        call: OperationCall<'_>,
        value: &Value,
        ctx: &PipelineContext,
    ) -> Result<bool> {
        if call.config.str_or("scope", "pipeline") != "pipeline" {
            return Ok(true);
        }
        Ok(!ctx
            .step_values()
            .into_iter()
            .any(|previous| values_equal(previous, value)))
    }
}
