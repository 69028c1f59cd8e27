//! The name to implementation catalog.

use super::describe::{OperationDescription, OperationSummary};
use super::suggestions::close_matches;
use crate::core::{ConfigSchema, OperationConfig, OperationType};
use crate::errors::OperationNotFoundError;
use crate::operations::{Operation, OperationBehavior};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, LazyLock};

#[derive(Default)]
struct Catalog {
    /// Names in first-registration order.
    order: Vec<String>,
    operations: HashMap<String, OperationBehavior>,
}

/// Maps operation names, including aliases, to implementations.
///
/// The registry is the only place names are resolved to behavior; the parser's
/// validator and the executor both consult it. Registration may happen at any
/// time and overwrites an existing mapping for the same name.
#[derive(Default)]
pub struct OperationRegistry {
    catalog: RwLock<Catalog>,
}

impl OperationRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry pre-loaded with every built-in operation.
    #[must_use]
    pub fn with_builtins() -> Self {
        let registry = Self::new();
        crate::builtins::register_builtins(&registry);
        crate::control::register_control_flow(&registry);
        registry
    }

    /// Registers `behavior` under `name`, replacing any previous mapping.
    pub fn register(&self, name: impl Into<String>, behavior: OperationBehavior) {
        let name = name.into();
        let mut catalog = self.catalog.write();
        if catalog.operations.insert(name.clone(), behavior).is_none() {
            catalog.order.push(name);
        }
    }

    /// Registers one implementation under several names.
    ///
    /// The first name is treated as canonical when listing.
    pub fn register_aliases(&self, names: &[&str], behavior: &OperationBehavior) {
        for name in names {
            self.register(*name, behavior.clone());
        }
    }

    /// Returns true if `name` resolves.
    #[must_use]
    pub fn has_operation(&self, name: &str) -> bool {
        self.catalog.read().operations.contains_key(name)
    }

    /// Returns the implementation registered under `name`.
    #[must_use]
    pub fn behavior(&self, name: &str) -> Option<OperationBehavior> {
        self.catalog.read().operations.get(name).cloned()
    }

    /// Builds a configured instance of the operation registered under `name`.
    ///
    /// # Errors
    ///
    /// Returns `OperationNotFoundError` with suggestions if `name` is unknown.
    pub fn get_operation(
        &self,
        name: &str,
        config: OperationConfig,
    ) -> Result<Operation, OperationNotFoundError> {
        let behavior = self.behavior(name).ok_or_else(|| self.not_found(name))?;
        Ok(Operation::new(name, config, behavior))
    }

    /// Returns the configuration schema of `name`.
    pub fn get_config_schema(&self, name: &str) -> Result<ConfigSchema, OperationNotFoundError> {
        self.behavior(name)
            .map(|behavior| behavior.config_schema())
            .ok_or_else(|| self.not_found(name))
    }

    /// Returns the category of `name`.
    pub fn operation_type(&self, name: &str) -> Result<OperationType, OperationNotFoundError> {
        self.behavior(name)
            .map(|behavior| behavior.operation_type())
            .ok_or_else(|| self.not_found(name))
    }

    /// Returns full documentation for `name`, including a synthesized example.
    pub fn describe(&self, name: &str) -> Result<OperationDescription, OperationNotFoundError> {
        let behavior = self.behavior(name).ok_or_else(|| self.not_found(name))?;
        Ok(OperationDescription::new(
            name,
            behavior.operation_type(),
            behavior.description(),
            behavior.config_schema(),
        ))
    }

    /// Lists implementations, collapsing aliases, optionally filtered by category.
    ///
    /// Sorted by category, then name.
    #[must_use]
    pub fn list(&self, category: Option<OperationType>) -> Vec<OperationSummary> {
        let catalog = self.catalog.read();
        let mut seen: Vec<&OperationBehavior> = Vec::new();
        let mut summaries = Vec::new();

        for name in &catalog.order {
            let Some(behavior) = catalog.operations.get(name) else {
                continue;
            };
            if seen.iter().any(|b| b.same_implementation(behavior)) {
                continue;
            }
            seen.push(behavior);
            if category.is_some_and(|c| c != behavior.operation_type()) {
                continue;
            }
            summaries.push(OperationSummary {
                name: name.clone(),
                operation_type: behavior.operation_type(),
                description: behavior.description().to_string(),
            });
        }

        summaries.sort_by(|a, b| {
            a.operation_type
                .cmp(&b.operation_type)
                .then_with(|| a.name.cmp(&b.name))
        });
        summaries
    }

    /// Groups every registered name, aliases included, by category.
    ///
    /// All four categories are present even when empty.
    #[must_use]
    pub fn list_by_category(&self) -> BTreeMap<OperationType, Vec<String>> {
        let mut grouped: BTreeMap<OperationType, Vec<String>> = OperationType::ALL
            .into_iter()
            .map(|kind| (kind, Vec::new()))
            .collect();
        let catalog = self.catalog.read();
        for name in &catalog.order {
            if let Some(behavior) = catalog.operations.get(name) {
                grouped
                    .entry(behavior.operation_type())
                    .or_default()
                    .push(name.clone());
            }
        }
        for names in grouped.values_mut() {
            names.sort();
        }
        grouped
    }

    /// Returns every registered name in registration order.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.catalog.read().order.clone()
    }

    /// Returns the number of registered names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.catalog.read().order.len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.catalog.read().order.is_empty()
    }

    /// Returns registered names similar to `name`, best first.
    #[must_use]
    pub fn suggestions(&self, name: &str) -> Vec<String> {
        let catalog = self.catalog.read();
        close_matches(name, catalog.order.iter().map(String::as_str))
    }

    /// Builds the not-found error for `name`.
    #[must_use]
    pub fn not_found(&self, name: &str) -> OperationNotFoundError {
        OperationNotFoundError::new(name, self.suggestions(name), self.names())
    }
}

impl std::fmt::Debug for OperationRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperationRegistry")
            .field("operation_count", &self.len())
            .finish()
    }
}

static GLOBAL_REGISTRY: LazyLock<Arc<OperationRegistry>> =
    LazyLock::new(|| Arc::new(OperationRegistry::with_builtins()));

/// Returns the process-wide registry, pre-loaded with built-ins on first use.
pub fn global_registry() -> Arc<OperationRegistry> {
    Arc::clone(&GLOBAL_REGISTRY)
}

/// Registers an operation in the process-wide registry.
///
/// The mapping stays in place for the rest of the process lifetime.
pub fn register_operation(name: impl Into<String>, behavior: OperationBehavior) {
    GLOBAL_REGISTRY.register(name, behavior);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::PipelineContext;
    use crate::core::{ParamSpec, ParamType};
    use crate::errors::Result;
    use crate::operations::{OperationCall, OperationDescriptor, Transformation, Validation};
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};

    #[derive(Debug)]
    struct Shout;

    impl OperationDescriptor for Shout {
        fn description(&self) -> &str {
            "Uppercases text"
        }

        fn config_schema(&self) -> ConfigSchema {
            ConfigSchema::new().optional(
                "suffix",
                ParamSpec::new(ParamType::Str, "Appended text").with_example(json!("!")),
            )
        }
    }

    #[async_trait]
    impl Transformation for Shout {
        async fn transform(
            &self,
            _call: OperationCall<'_>,
            value: &Value,
            _ctx: &PipelineContext,
        ) -> Result<Value> {
            Ok(json!(value.as_str().unwrap_or_default().to_uppercase()))
        }
    }

    #[derive(Debug)]
    struct Anything;

    impl OperationDescriptor for Anything {
        fn description(&self) -> &str {
            "Accepts every value"
        }
    }

    #[async_trait]
    impl Validation for Anything {
        async fn validate(
            &self,
            _call: OperationCall<'_>,
            _value: &Value,
            _ctx: &PipelineContext,
        ) -> Result<bool> {
            Ok(true)
        }
    }

    fn registry() -> OperationRegistry {
        let registry = OperationRegistry::new();
        registry.register_aliases(&["shout", "yell"], &OperationBehavior::transformation(Shout));
        registry.register("anything", OperationBehavior::validation(Anything));
        registry
    }

    #[test]
    fn test_new_registry_is_empty() {
        let registry = OperationRegistry::new();
        assert!(registry.is_empty());
        assert!(!registry.has_operation("uppercase"));
    }

    #[test]
    fn test_register_and_resolve_alias() {
        let registry = registry();
        assert!(registry.has_operation("yell"));

        let op = registry.get_operation("yell", OperationConfig::new()).unwrap();
        assert_eq!(op.name(), "yell");
        assert_eq!(op.operation_type(), OperationType::Transformation);
    }

    #[test]
    fn test_register_overwrites() {
        let registry = registry();
        registry.register("shout", OperationBehavior::validation(Anything));

        assert_eq!(registry.operation_type("shout").unwrap(), OperationType::Validation);
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_unknown_operation_carries_suggestions() {
        let registry = registry();
        let err = registry.get_operation("shuot", OperationConfig::new()).unwrap_err();

        assert_eq!(err.operation, "shuot");
        assert!(err.suggestions.contains(&"shout".to_string()));
        assert_eq!(err.valid_operations, vec!["anything", "shout", "yell"]);
    }

    #[test]
    fn test_describe_builds_example() {
        let description = registry().describe("shout").unwrap();
        assert_eq!(description.description, "Uppercases text");
        assert_eq!(
            description.example,
            json!({"operation": "shout", "operation_config": {"suffix": "!"}})
        );

        let bare = registry().describe("anything").unwrap();
        assert_eq!(bare.example, json!({"operation": "anything"}));
    }

    #[test]
    fn test_list_collapses_aliases_and_sorts() {
        let names: Vec<String> = registry().list(None).into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["shout", "anything"]);

        let validations = registry().list(Some(OperationType::Validation));
        assert_eq!(validations.len(), 1);
        assert_eq!(validations[0].name, "anything");
    }

    #[test]
    fn test_list_by_category_has_every_category() {
        let grouped = registry().list_by_category();
        assert_eq!(grouped.len(), 4);
        assert_eq!(grouped[&OperationType::Transformation], vec!["shout", "yell"]);
        assert!(grouped[&OperationType::SideEffect].is_empty());
    }

    #[test]
    fn test_global_registry_has_builtins() {
        let registry = global_registry();
        assert!(registry.has_operation("extract_field"));
        assert!(registry.has_operation("extract"));
        assert!(registry.has_operation("if_else"));
        assert!(Arc::ptr_eq(&registry, &global_registry()));
    }

    #[test]
    fn test_register_operation_mutates_global() {
        register_operation("registry_test_shout", OperationBehavior::transformation(Shout));
        assert!(global_registry().has_operation("registry_test_shout"));
    }
}
