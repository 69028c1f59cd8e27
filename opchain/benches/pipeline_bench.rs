//! Benchmarks for pipeline parsing and execution.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use opchain::pipeline::{PipelineExecutor, PipelineParser};
use opchain::registry::global_registry;
use serde_json::{json, Value};

fn signup_definition() -> Value {
    json!([
        {"operation": "extract", "operation_config": {"field": "user.email"}, "order_index": 0},
        {"operation": "strip", "order_index": 1},
        {"operation": "lower", "order_index": 2},
        {"operation": "email", "operation_config": {"error_message": "Invalid email"}, "order_index": 3},
        {"operation": "store", "operation_config": {"context_path": "signup.email"}, "order_index": 4},
        {"operation": "increment_counter", "operation_config": {"key": "signups"}, "order_index": 5},
        {"operation": "format", "operation_config": {"template": "Welcome, {value}!"}, "order_index": 6}
    ])
}

fn parse_benchmark(c: &mut Criterion) {
    let definition = signup_definition();
    c.bench_function("parse_definition", |b| {
        b.iter(|| PipelineParser::from_definition(black_box(&definition), Some("signup")));
    });
    c.bench_function("validate_definition", |b| {
        b.iter(|| PipelineParser::validate(black_box(&definition), Some("signup")));
    });
}

fn execute_benchmark(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let specs = PipelineParser::from_definition(&signup_definition(), Some("signup")).unwrap();
    let input = json!({"user": {"email": "  Ada@Example.com "}});

    c.bench_function("execute_signup_pipeline", |b| {
        b.to_async(&runtime).iter(|| async {
            let mut executor = PipelineExecutor::new();
            executor
                .execute_pipeline(black_box(&specs), input.clone())
                .await
                .unwrap()
        });
    });

    c.bench_function("nested_if_else", |b| {
        let definition = json!([{
            "operation": "if",
            "operation_config": {
                "condition": [{"operation": "type", "operation_config": {"expected_type": "str"}}],
                "then_branch": [{"operation": "upper"}],
                "else_branch": [{"operation": "set", "operation_config": {"value": "n/a"}}]
            }
        }]);
        let specs = PipelineParser::from_definition(&definition, None).unwrap();
        b.to_async(&runtime).iter(|| async {
            let mut executor = PipelineExecutor::new();
            executor.execute_pipeline(&specs, json!("hello")).await.unwrap()
        });
    });
}

fn registry_benchmark(c: &mut Criterion) {
    let registry = global_registry();
    c.bench_function("suggestions_for_typo", |b| {
        b.iter(|| registry.suggestions(black_box("uppercse")));
    });
}

criterion_group!(benches, parse_benchmark, execute_benchmark, registry_benchmark);
criterion_main!(benches);
