//! `{placeholder}` templates used by formatting and notification operations.

use serde_json::{Map, Value};
use thiserror::Error;

/// Failure rendering a template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    /// A placeholder names a key absent from the arguments.
    #[error("Missing format key '{0}'")]
    MissingKey(String),

    /// A brace is not part of a placeholder or an escape.
    #[error("Unbalanced '{brace}' at position {position} in template")]
    Unbalanced {
        /// The offending brace.
        brace: char,
        /// Character offset in the template.
        position: usize,
    },
}

/// Renders a value for insertion into text: strings raw, everything else as
/// compact JSON.
#[must_use]
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Replaces `{name}` placeholders with values from `args`.
///
/// `{{` and `}}` produce literal braces.
///
/// # Errors
///
/// Returns `MissingKey` for an unknown placeholder and `Unbalanced` for a
/// stray or unterminated brace.
pub fn render(template: &str, args: &Map<String, Value>) -> Result<String, TemplateError> {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().enumerate().peekable();

    while let Some((position, c)) = chars.next() {
        match c {
            '{' if chars.peek().is_some_and(|&(_, next)| next == '{') => {
                chars.next();
                out.push('{');
            }
            '}' if chars.peek().is_some_and(|&(_, next)| next == '}') => {
                chars.next();
                out.push('}');
            }
            '{' => {
                let mut key = String::new();
                loop {
                    match chars.next() {
                        Some((_, '}')) => break,
                        Some((_, '{')) | None => {
                            return Err(TemplateError::Unbalanced { brace: '{', position })
                        }
                        Some((_, ch)) => key.push(ch),
                    }
                }
                let value = args
                    .get(&key)
                    .ok_or_else(|| TemplateError::MissingKey(key.clone()))?;
                out.push_str(&display_value(value));
            }
            '}' => return Err(TemplateError::Unbalanced { brace: '}', position }),
            other => out.push(other),
        }
    }

    Ok(out)
}

/// Builds placeholder arguments from the shared data plus the current value.
///
/// `value` takes precedence over a shared-data key of the same name.
#[must_use]
pub fn value_args(value: &Value, shared: &Map<String, Value>) -> Map<String, Value> {
    let mut args = shared.clone();
    args.insert("value".to_string(), value.clone());
    args
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn test_render_placeholders() {
        let rendered = render(
            "Hello, {name}! You are {age}.",
            &args(json!({"name": "Alice", "age": 30})),
        )
        .unwrap();
        assert_eq!(rendered, "Hello, Alice! You are 30.");
    }

    #[test]
    fn test_render_non_string_as_json() {
        let rendered = render("{v}", &args(json!({"v": {"a": [1, null]}}))).unwrap();
        assert_eq!(rendered, r#"{"a":[1,null]}"#);
    }

    #[test]
    fn test_escaped_braces() {
        let rendered = render(r#"{{"id": "{value}"}}"#, &args(json!({"value": 7}))).unwrap();
        assert_eq!(rendered, r#"{"id": "7"}"#);
    }

    #[test]
    fn test_missing_key() {
        let err = render("{missing}", &Map::new()).unwrap_err();
        assert_eq!(err, TemplateError::MissingKey("missing".to_string()));
    }

    #[test]
    fn test_unbalanced() {
        assert!(matches!(
            render("oops }", &Map::new()),
            Err(TemplateError::Unbalanced { brace: '}', position: 5 })
        ));
        assert!(matches!(
            render("{open", &Map::new()),
            Err(TemplateError::Unbalanced { brace: '{', position: 0 })
        ));
    }

    #[test]
    fn test_value_args_prefers_value() {
        let shared = args(json!({"value": "shadowed", "user": "bob"}));
        let merged = value_args(&json!("current"), &shared);
        assert_eq!(merged["value"], json!("current"));
        assert_eq!(merged["user"], json!("bob"));
    }
}
