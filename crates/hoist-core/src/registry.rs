//! Propagation rule registry for per-operator dispatch.

use crate::rule::PropagationRule;
use std::collections::HashMap;

/// Registry of propagation rules.
///
/// Maps operator type names (e.g., "Add", "MatMul") to the rule describing
/// how slices and reshapes cross that operator. Operators without a rule
/// block propagation.
///
/// # Example
///
/// ```ignore
/// let mut registry = RuleRegistry::new();
/// registry.register("Add", BinaryElementwiseRule::add());
/// registry.register("MatMul", MatMulRule);
///
/// let rule = registry.get("Add").unwrap();
/// ```
pub struct RuleRegistry {
    /// Map from op_type string to rule implementation.
    rules: HashMap<String, Box<dyn PropagationRule>>,
}

impl RuleRegistry {
    /// Create a new empty rule registry.
    pub fn new() -> Self {
        Self {
            rules: HashMap::new(),
        }
    }

    /// Register a rule, replacing any rule already registered under `name`.
    ///
    /// Returns `self` for method chaining.
    pub fn register<R>(&mut self, name: &str, rule: R) -> &mut Self
    where
        R: PropagationRule + 'static,
    {
        self.rules.insert(name.to_string(), Box::new(rule));
        self
    }

    /// Look up a rule by operator type.
    pub fn get(&self, name: &str) -> Option<&dyn PropagationRule> {
        self.rules.get(name).map(|rule| rule.as_ref())
    }

    /// Check if a rule is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.rules.contains_key(name)
    }

    /// Get the number of registered rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Iterate over all registered operator names.
    pub fn rule_names(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(|s| s.as_str())
    }
}

impl Default for RuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NamedRule(&'static str);

    impl PropagationRule for NamedRule {
        fn name(&self) -> &str {
            self.0
        }
    }

    #[test]
    fn test_register_and_get() {
        let mut registry = RuleRegistry::new();
        registry
            .register("Add", NamedRule("Add"))
            .register("Relu", NamedRule("Relu"));

        assert_eq!(registry.len(), 2);
        assert!(registry.contains("Add"));
        assert!(!registry.contains("Conv"));
        assert_eq!(registry.get("Relu").map(|r| r.name()), Some("Relu"));
        assert!(registry.get("Conv").is_none());

        let mut names: Vec<_> = registry.rule_names().collect();
        names.sort();
        assert_eq!(names, vec!["Add", "Relu"]);
    }

    #[test]
    fn test_register_replaces() {
        let mut registry = RuleRegistry::new();
        registry.register("Gelu", NamedRule("old"));
        registry.register("Gelu", NamedRule("new"));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("Gelu").map(|r| r.name()), Some("new"));
    }

    #[test]
    fn test_empty_registry() {
        let registry = RuleRegistry::default();
        assert!(registry.is_empty());
    }
}
