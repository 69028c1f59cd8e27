//! The built-in operation library.
//!
//! Every built-in is registered under a canonical name plus short aliases:
//!
//! | Category | Names |
//! |----------|-------|
//! | Transformation | `extract_field`/`extract`, `concatenate`/`concat`, `format_string`/`format`, `type_cast`/`cast`, `default_value`/`default`, `map_values`/`map`, `json_parse`/`parse_json`, `json_serialize`/`serialize_json`, `strip_whitespace`/`strip`, `lowercase`/`lower`, `uppercase`/`upper`, `replace`, `set_value`/`set` |
//! | Validation | `required`/`validate_required`, `range`/`validate_range`, `length`/`validate_length`, `regex`/`validate_regex`, `email`/`validate_email`, `url`/`validate_url`, `type`/`validate_type`, `in_list`/`validate_in_list`, `not_in_list`/`validate_not_in_list`, `comparison`/`compare`, `unique`/`validate_unique` |
//! | Side effect | `log_value`/`log`, `store_in_context`/`store`, `increment_counter`, `http_request`/`http`, `notify` |

#[cfg(test)]
mod builtins_tests;
mod http;
mod side_effects;
pub mod template;
mod transformations;
mod validations;

pub use http::{HttpRequest, DEFAULT_TIMEOUT_SECS};
pub use side_effects::{IncrementCounter, LogValue, Notify, StoreInContext};
pub use transformations::{
    Concatenate, DefaultValue, ExtractField, FormatString, JsonParse, JsonSerialize, Lowercase,
    MapValues, Replace, SetValue, StripWhitespace, TypeCast, Uppercase,
};
pub use validations::{
    Comparison, Email, InList, Length, NotInList, Range, RegexMatch, Required, TypeCheck, Unique,
    Url,
};

use crate::operations::OperationBehavior;
use crate::registry::OperationRegistry;
use tracing::debug;

/// Registers every built-in transformation, validation and side effect.
pub fn register_builtins(registry: &OperationRegistry) {
    let transformations: [(&[&str], OperationBehavior); 13] = [
        (&["extract_field", "extract"], OperationBehavior::transformation(ExtractField)),
        (&["concatenate", "concat"], OperationBehavior::transformation(Concatenate)),
        (&["format_string", "format"], OperationBehavior::transformation(FormatString)),
        (&["type_cast", "cast"], OperationBehavior::transformation(TypeCast)),
        (&["default_value", "default"], OperationBehavior::transformation(DefaultValue)),
        (&["map_values", "map"], OperationBehavior::transformation(MapValues)),
        (&["json_parse", "parse_json"], OperationBehavior::transformation(JsonParse)),
        (&["json_serialize", "serialize_json"], OperationBehavior::transformation(JsonSerialize)),
        (&["strip_whitespace", "strip"], OperationBehavior::transformation(StripWhitespace)),
        (&["lowercase", "lower"], OperationBehavior::transformation(Lowercase)),
        (&["uppercase", "upper"], OperationBehavior::transformation(Uppercase)),
        (&["replace"], OperationBehavior::transformation(Replace)),
        (&["set_value", "set"], OperationBehavior::transformation(SetValue)),
    ];

    let validations: [(&[&str], OperationBehavior); 11] = [
        (&["required", "validate_required"], OperationBehavior::validation(Required)),
        (&["range", "validate_range"], OperationBehavior::validation(Range)),
        (&["length", "validate_length"], OperationBehavior::validation(Length)),
        (&["regex", "validate_regex"], OperationBehavior::validation(RegexMatch)),
        (&["email", "validate_email"], OperationBehavior::validation(Email)),
        (&["url", "validate_url"], OperationBehavior::validation(Url)),
        (&["type", "validate_type"], OperationBehavior::validation(TypeCheck)),
        (&["in_list", "validate_in_list"], OperationBehavior::validation(InList)),
        (&["not_in_list", "validate_not_in_list"], OperationBehavior::validation(NotInList)),
        (&["comparison", "compare"], OperationBehavior::validation(Comparison)),
        (&["unique", "validate_unique"], OperationBehavior::validation(Unique)),
    ];

    let side_effects: [(&[&str], OperationBehavior); 5] = [
        (&["log_value", "log"], OperationBehavior::side_effect(LogValue)),
        (&["store_in_context", "store"], OperationBehavior::side_effect(StoreInContext)),
        (&["increment_counter"], OperationBehavior::side_effect(IncrementCounter)),
        (&["http_request", "http"], OperationBehavior::side_effect(HttpRequest)),
        (&["notify"], OperationBehavior::side_effect(Notify)),
    ];

    for (names, behavior) in transformations
        .iter()
        .chain(validations.iter())
        .chain(side_effects.iter())
    {
        registry.register_aliases(names, behavior);
    }
    debug!(operations = registry.len(), "Registered built-in operations");
}
