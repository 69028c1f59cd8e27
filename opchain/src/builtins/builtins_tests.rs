//! Tests for the built-in operation library.

#[cfg(test)]
mod tests {
    use crate::context::{PipelineContext, SharedData};
    use crate::core::{OperationConfig, OperationResult, OperationType};
    use crate::errors::Result;
    use crate::registry::OperationRegistry;
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};
    use std::sync::Arc;

    fn test_context() -> PipelineContext {
        PipelineContext::new(
            SharedData::new(),
            Arc::new(OperationRegistry::with_builtins()),
        )
    }

    async fn run_in(ctx: &PipelineContext, name: &str, config: Value, value: Value) -> Result<Value> {
        let config = OperationConfig::try_from(config).unwrap();
        let operation = ctx.registry().get_operation(name, config).unwrap();
        operation.execute(value, ctx).await
    }

    async fn run(name: &str, config: Value, value: Value) -> Result<Value> {
        run_in(&test_context(), name, config, value).await
    }

    async fn passes(name: &str, config: Value, value: Value) -> bool {
        run(name, config, value).await.is_ok()
    }

    // Transformations

    #[tokio::test]
    async fn test_extract_field_dot_path_and_default() {
        let user = json!({"user": {"email": "ada@example.com", "phone": null}});

        let email = run("extract", json!({"field": "user.email"}), user.clone()).await;
        assert_eq!(email.unwrap(), json!("ada@example.com"));

        let phone = run(
            "extract_field",
            json!({"field": "user.phone", "default": "n/a"}),
            user.clone(),
        )
        .await;
        assert_eq!(phone.unwrap(), json!("n/a"));

        let missing = run("extract", json!({"field": "account.id"}), user).await;
        assert_eq!(missing.unwrap(), Value::Null);
    }

    #[tokio::test]
    async fn test_concatenate_fields_and_lists() {
        let person = json!({"first": "Ada", "middle": "", "last": "Lovelace"});
        let joined = run(
            "concat",
            json!({"fields": ["first", "middle", "last"], "separator": " "}),
            person,
        )
        .await;
        assert_eq!(joined.unwrap(), json!("Ada Lovelace"));

        let listed = run("concatenate", json!({"separator": "-"}), json!([1, "a", null, true])).await;
        assert_eq!(listed.unwrap(), json!("1-a-true"));

        assert_eq!(run("concat", json!({}), Value::Null).await.unwrap(), json!(""));
    }

    #[tokio::test]
    async fn test_format_string_sources() {
        let greeting = run("format", json!({"template": "Hello, {value}!"}), json!("Ada")).await;
        assert_eq!(greeting.unwrap(), json!("Hello, Ada!"));

        let ctx = test_context();
        ctx.shared_data().set("site", json!("opchain"));
        let rendered = run_in(
            &ctx,
            "format_string",
            json!({"template": "{greeting} {value} from {site} {{ok}}", "fields": {"greeting": "Hi"}}),
            json!("Ada"),
        )
        .await;
        assert_eq!(rendered.unwrap(), json!("Hi Ada from opchain {ok}"));
    }

    #[tokio::test]
    async fn test_format_string_missing_key_returns_input() {
        let result = run("format", json!({"template": "{nope}"}), json!("Ada")).await;
        assert_eq!(result.unwrap(), json!("Ada"));
    }

    #[tokio::test]
    async fn test_type_cast_targets() {
        assert_eq!(run("cast", json!({"target_type": "int"}), json!(" 42 ")).await.unwrap(), json!(42));
        assert_eq!(run("cast", json!({"target_type": "int"}), json!(4.9)).await.unwrap(), json!(4));
        assert_eq!(run("cast", json!({"target_type": "float"}), json!("3.5")).await.unwrap(), json!(3.5));
        assert_eq!(run("cast", json!({"target_type": "str"}), json!(12)).await.unwrap(), json!("12"));
        assert_eq!(run("cast", json!({"target_type": "bool"}), json!("Yes")).await.unwrap(), json!(true));
        assert_eq!(run("cast", json!({"target_type": "bool"}), json!(0)).await.unwrap(), json!(false));
        assert_eq!(
            run("cast", json!({"target_type": "decimal"}), json!("1")).await.unwrap(),
            json!("1")
        );
    }

    #[tokio::test]
    async fn test_type_cast_failure_policies() {
        let err = run("type_cast", json!({"target_type": "int"}), json!("abc"))
            .await
            .unwrap_err();
        assert!(err.is_validation());
        assert_eq!(err.to_string(), "type_cast: invalid literal for int(): 'abc'");

        let fallback = run(
            "cast",
            json!({"target_type": "int", "on_error": "return_default", "default": 0}),
            json!("abc"),
        )
        .await;
        assert_eq!(fallback.unwrap(), json!(0));

        let none = run(
            "cast",
            json!({"target_type": "float", "on_error": "return_none"}),
            json!([1]),
        )
        .await;
        assert_eq!(none.unwrap(), Value::Null);
    }

    #[tokio::test]
    async fn test_default_value() {
        assert_eq!(run("default", json!({"default": "N/A"}), Value::Null).await.unwrap(), json!("N/A"));
        assert_eq!(run("default", json!({"default": "N/A"}), json!("")).await.unwrap(), json!(""));
        assert_eq!(
            run("default_value", json!({"default": "N/A", "check_empty": true}), json!([]))
                .await
                .unwrap(),
            json!("N/A")
        );
        assert_eq!(run("default", json!({"default": 1}), json!(0)).await.unwrap(), json!(0));
    }

    #[tokio::test]
    async fn test_map_values() {
        let mapping = json!({"A": "Active", "I": "Inactive"});

        let exact = run("map", json!({"mapping": mapping}), json!("A")).await;
        assert_eq!(exact.unwrap(), json!("Active"));

        let folded = run(
            "map_values",
            json!({"mapping": mapping, "case_sensitive": false}),
            json!("i"),
        )
        .await;
        assert_eq!(folded.unwrap(), json!("Inactive"));

        let unknown = run("map", json!({"mapping": mapping, "default": "Unknown"}), json!("Z")).await;
        assert_eq!(unknown.unwrap(), json!("Unknown"));

        let untouched = run("map", json!({"mapping": mapping}), json!("Z")).await;
        assert_eq!(untouched.unwrap(), json!("Z"));
    }

    #[tokio::test]
    async fn test_json_parse() {
        let parsed = run("json_parse", json!({}), json!(r#"{"id": 7}"#)).await;
        assert_eq!(parsed.unwrap(), json!({"id": 7}));

        let passthrough = run("parse_json", json!({}), json!({"id": 7})).await;
        assert_eq!(passthrough.unwrap(), json!({"id": 7}));

        let original = run("parse_json", json!({"on_error": "return_original"}), json!("{oops")).await;
        assert_eq!(original.unwrap(), json!("{oops"));

        let default = run(
            "parse_json",
            json!({"on_error": "return_default", "default": {}}),
            json!("{oops"),
        )
        .await;
        assert_eq!(default.unwrap(), json!({}));

        assert!(run("parse_json", json!({}), json!("{oops")).await.unwrap_err().is_validation());
    }

    #[tokio::test]
    async fn test_json_serialize_options() {
        let compact = run("json_serialize", json!({}), json!({"b": 1, "a": [1, 2]})).await;
        assert_eq!(compact.unwrap(), json!(r#"{"b":1,"a":[1,2]}"#));

        let sorted = run(
            "serialize_json",
            json!({"sort_keys": true}),
            json!({"b": {"z": 1, "y": 2}, "a": 0}),
        )
        .await;
        assert_eq!(sorted.unwrap(), json!(r#"{"a":0,"b":{"y":2,"z":1}}"#));

        let indented = run("serialize_json", json!({"indent": 2}), json!({"a": 1})).await;
        assert_eq!(indented.unwrap(), json!("{\n  \"a\": 1\n}"));

        let ascii = run("serialize_json", json!({"ensure_ascii": true}), json!(["é"])).await;
        assert_eq!(ascii.unwrap(), json!(r#"["\u00e9"]"#));

        let text = run("serialize_json", json!({}), json!("already text")).await;
        assert_eq!(text.unwrap(), json!("already text"));
    }

    #[tokio::test]
    async fn test_string_helpers() {
        assert_eq!(run("strip", json!({}), json!("  hi  ")).await.unwrap(), json!("hi"));
        assert_eq!(run("strip", json!({"mode": "left"}), json!("  hi  ")).await.unwrap(), json!("hi  "));
        assert_eq!(run("strip", json!({"mode": "right"}), json!("  hi  ")).await.unwrap(), json!("  hi"));
        assert_eq!(run("lower", json!({}), json!("MiXeD")).await.unwrap(), json!("mixed"));
        assert_eq!(run("upper", json!({}), json!("MiXeD")).await.unwrap(), json!("MIXED"));
        assert_eq!(run("upper", json!({}), json!(5)).await.unwrap(), json!(5));
    }

    #[tokio::test]
    async fn test_replace_plain_and_regex() {
        let first = run(
            "replace",
            json!({"search": "-", "replace": "+", "count": 1}),
            json!("a-b-c"),
        )
        .await;
        assert_eq!(first.unwrap(), json!("a+b-c"));

        let all = run("replace", json!({"search": "-", "replace": "+"}), json!("a-b-c")).await;
        assert_eq!(all.unwrap(), json!("a+b+c"));

        let groups = run(
            "replace",
            json!({"search": r"(\d+)", "replace": "<$1>", "use_regex": true}),
            json!("a1b22"),
        )
        .await;
        assert_eq!(groups.unwrap(), json!("a<1>b<22>"));

        let bad = run(
            "replace",
            json!({"search": "(", "replace": "", "use_regex": true, "on_error": "return_original"}),
            json!("a(b"),
        )
        .await;
        assert_eq!(bad.unwrap(), json!("a(b"));
    }

    #[tokio::test]
    async fn test_set_value_ignores_input() {
        let set = run("set", json!({"value": {"status": "ok"}}), json!("ignored")).await;
        assert_eq!(set.unwrap(), json!({"status": "ok"}));
    }

    // Validations

    #[tokio::test]
    async fn test_validation_returns_input_unchanged() {
        let result = run("required", json!({}), json!({"id": 1})).await;
        assert_eq!(result.unwrap(), json!({"id": 1}));

        let err = run("validate_required", json!({}), Value::Null).await.unwrap_err();
        assert_eq!(err.to_string(), "Validation failed: validate_required");
    }

    #[tokio::test]
    async fn test_required() {
        assert!(!passes("required", json!({}), Value::Null).await);
        assert!(!passes("required", json!({}), json!("   ")).await);
        assert!(!passes("required", json!({}), json!([])).await);
        assert!(passes("required", json!({}), json!(0)).await);
        assert!(passes("required", json!({}), json!({})).await);
        assert!(passes("required", json!({"allow_empty_string": true}), json!("")).await);
        assert!(passes("required", json!({"allow_empty_list": true}), json!([])).await);
    }

    #[tokio::test]
    async fn test_range() {
        let bounds = json!({"min": 0, "max": 10});
        assert!(passes("range", bounds.clone(), json!(5)).await);
        assert!(passes("range", bounds.clone(), json!(10)).await);
        assert!(passes("range", bounds.clone(), json!(" 7.5 ")).await);
        assert!(!passes("range", bounds.clone(), json!(11)).await);
        assert!(!passes("range", bounds, json!("abc")).await);
        assert!(passes("validate_range", json!({"min": 1}), json!(1000)).await);
    }

    #[tokio::test]
    async fn test_length() {
        assert!(passes("length", json!({"min_length": 5, "max_length": 5}), json!("héllo")).await);
        assert!(!passes("length", json!({"max_length": 1}), json!([1, 2])).await);
        assert!(passes("length", json!({"max_length": 1}), json!({"a": 1})).await);
        assert!(!passes("length", json!({"min_length": 0}), json!(3)).await);
        assert!(!passes("length", json!({}), Value::Null).await);
    }

    #[tokio::test]
    async fn test_regex_matches_from_start() {
        let config = json!({"pattern": r"[A-Z]{2}\d{4}"});
        assert!(passes("regex", config.clone(), json!("AB1234")).await);
        assert!(passes("regex", config.clone(), json!("AB1234 trailing")).await);
        assert!(!passes("regex", config.clone(), json!("xAB1234")).await);
        assert!(!passes("regex", config, json!(1234)).await);

        assert!(passes("regex", json!({"pattern": r"[A-Z]{2}\d{4}", "flags": "i"}), json!("ab1234")).await);
        assert!(!passes("regex", json!({"pattern": "("}), json!("(")).await);
        assert!(passes("regex", json!({}), json!("anything")).await);
    }

    #[tokio::test]
    async fn test_email_and_url() {
        assert!(passes("email", json!({}), json!("ada@example.com")).await);
        assert!(!passes("email", json!({}), json!("ada@example")).await);
        assert!(!passes("validate_email", json!({}), json!(42)).await);

        assert!(passes("url", json!({}), json!("https://example.com/path?q=1")).await);
        assert!(!passes("url", json!({}), json!("ftp://example.com")).await);
        assert!(passes("url", json!({"schemes": ["ftp"]}), json!("ftp://example.com")).await);
        assert!(!passes("url", json!({"schemes": ["a+b"]}), json!("aab://example.com")).await);
        assert!(!passes("url", json!({}), json!("https:// spaces.com")).await);
    }

    #[tokio::test]
    async fn test_type_check() {
        assert!(passes("type", json!({"expected_type": "int"}), json!(3)).await);
        assert!(!passes("type", json!({"expected_type": "int"}), json!(true)).await);
        assert!(!passes("type", json!({"expected_type": "int"}), json!(3.5)).await);
        assert!(passes("type", json!({"expected_type": "float"}), json!(3.5)).await);
        assert!(passes("type", json!({"expected_type": "none"}), Value::Null).await);
        assert!(passes("type", json!({"expected_type": "dict"}), json!({})).await);
        assert!(passes("validate_type", json!({"expected_type": "tuple"}), json!(1)).await);
    }

    #[tokio::test]
    async fn test_in_list_and_not_in_list() {
        assert!(passes("in_list", json!({"allowed_values": [1, 2]}), json!(1.0)).await);
        assert!(!passes("in_list", json!({"allowed_values": ["active"]}), json!("ACTIVE")).await);
        assert!(
            passes(
                "in_list",
                json!({"allowed_values": ["active"], "case_sensitive": false}),
                json!("ACTIVE")
            )
            .await
        );
        assert!(!passes("not_in_list", json!({"forbidden_values": ["root"]}), json!("root")).await);
        assert!(passes("validate_not_in_list", json!({"forbidden_values": ["root"]}), json!("ada")).await);
    }

    #[tokio::test]
    async fn test_comparison() {
        assert!(passes("compare", json!({"operator": "gt", "compare_to": 3}), json!(5)).await);
        assert!(passes("compare", json!({"operator": "eq", "compare_to": 1.0}), json!(1)).await);
        assert!(passes("compare", json!({"operator": "ne", "compare_to": "a"}), json!("b")).await);
        assert!(passes("compare", json!({"operator": "lt", "compare_to": "b"}), json!("a")).await);
        assert!(!passes("compare", json!({"operator": "lt", "compare_to": 1}), json!("a")).await);
        assert!(passes("compare", json!({"operator": "le", "compare_to": [1, 3]}), json!([1, 2])).await);

        let ctx = test_context();
        ctx.shared_data().set("min_value", json!(10));
        let below = run_in(
            &ctx,
            "comparison",
            json!({"operator": "ge", "context_key": "min_value"}),
            json!(5),
        )
        .await;
        assert!(below.is_err());
    }

    #[tokio::test]
    async fn test_unique_checks_earlier_steps() {
        let mut ctx = test_context();
        ctx.add_step(OperationResult::success(json!(1), "set", OperationType::Transformation));

        assert!(run_in(&ctx, "unique", json!({}), json!(1)).await.is_err());
        assert!(run_in(&ctx, "unique", json!({}), json!(2)).await.is_ok());
        assert!(run_in(&ctx, "unique", json!({"scope": "global"}), json!(1)).await.is_ok());
    }

    // Side effects

    #[tokio::test]
    async fn test_log_value_passes_through() {
        let logged = run("log", json!({"level": "debug", "message": "seen"}), json!({"a": 1})).await;
        assert_eq!(logged.unwrap(), json!({"a": 1}));
    }

    #[tokio::test]
    async fn test_store_in_context() {
        let ctx = test_context();
        let input = json!({"data": {"user_id": 7}});

        let result = run_in(
            &ctx,
            "store",
            json!({"context_path": "user.id", "value_path": "data.user_id"}),
            input.clone(),
        )
        .await;
        assert_eq!(result.unwrap(), input);
        assert_eq!(ctx.shared_data().get("user"), Some(json!({"id": 7})));

        run_in(
            &ctx,
            "store_in_context",
            json!({"context_path": "user.id", "overwrite": false}),
            json!(8),
        )
        .await
        .unwrap();
        assert_eq!(ctx.shared_data().get("user"), Some(json!({"id": 7})));

        run_in(&ctx, "store", json!({"context_path": "whole"}), json!("all")).await.unwrap();
        assert_eq!(ctx.shared_data().get("whole"), Some(json!("all")));
    }

    #[tokio::test]
    async fn test_increment_counter() {
        let ctx = test_context();
        run_in(&ctx, "increment_counter", json!({}), json!("x")).await.unwrap();
        run_in(&ctx, "increment_counter", json!({}), json!("x")).await.unwrap();
        run_in(&ctx, "increment_counter", json!({"key": "seen", "increment": 5}), json!("x"))
            .await
            .unwrap();

        assert_eq!(ctx.shared_data().get("counter"), Some(json!(2)));
        assert_eq!(ctx.shared_data().get("seen"), Some(json!(5)));
    }

    #[tokio::test]
    async fn test_side_effect_failure_ignored_by_default() {
        let ctx = test_context();
        ctx.shared_data().set("counter", json!("many"));

        let result = run_in(&ctx, "increment_counter", json!({}), json!("x")).await;
        assert_eq!(result.unwrap(), json!("x"));
        assert_eq!(ctx.shared_data().get("counter"), Some(json!("many")));

        let raised = run_in(&ctx, "increment_counter", json!({"on_error": "raise"}), json!("x"))
            .await
            .unwrap_err();
        assert!(raised.is_validation());
        assert!(raised.to_string().starts_with("increment_counter: "));
    }

    #[tokio::test]
    async fn test_notify_renders_message() {
        let ctx = test_context();
        ctx.shared_data().set("team", json!("ops"));
        let sent = run_in(
            &ctx,
            "notify",
            json!({"channel": "email", "recipient": "ada@example.com", "message": "{team}: {value}"}),
            json!("deployed"),
        )
        .await;
        assert_eq!(sent.unwrap(), json!("deployed"));

        let err = run(
            "notify",
            json!({"channel": "sms", "recipient": "555", "message": "{nope}", "on_error": "raise"}),
            json!("deployed"),
        )
        .await
        .unwrap_err();
        assert_eq!(err.to_string(), "notify: Missing format key 'nope'");
    }

    #[tokio::test]
    async fn test_http_request_failures_follow_policy() {
        let ignored = run(
            "http",
            json!({"url": "https://example.invalid/{value}", "method": "BAD METHOD"}),
            json!(1),
        )
        .await;
        assert_eq!(ignored.unwrap(), json!(1));

        let raised = run(
            "http_request",
            json!({"url": "https://example.invalid/{missing}", "on_error": "raise"}),
            json!(1),
        )
        .await
        .unwrap_err();
        assert!(raised.is_validation());
        assert!(raised.to_string().starts_with("http_request: "));
    }

    #[test]
    fn test_builtin_catalog() {
        let registry = OperationRegistry::with_builtins();
        let categories = registry.list_by_category();

        assert_eq!(categories[&OperationType::Transformation].len(), 25);
        assert_eq!(categories[&OperationType::Validation].len(), 22);
        assert_eq!(categories[&OperationType::SideEffect].len(), 8);
        assert_eq!(categories[&OperationType::ControlFlow].len(), 4);
        assert_eq!(registry.operation_type("cast").unwrap(), OperationType::Transformation);
        assert_eq!(registry.operation_type("on_path").unwrap(), OperationType::ControlFlow);
    }
}
