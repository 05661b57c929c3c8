//! Default rule registry.

use hoist_core::RuleRegistry;

use crate::families::{BinaryElementwiseRule, UNARY_ELEMENTWISE_OPS, UnaryElementwiseRule};
use crate::operators::{LayerNormRule, MatMulRule, ReshapeRule, SoftmaxRule, TransposeRule};

/// Returns a rule registry pre-populated with every built-in rule.
///
/// The registry includes:
/// - binary elementwise operators (Add, Sub, Mul, Div, Pow, Max, Min)
/// - unary elementwise operators (see `UNARY_ELEMENTWISE_OPS`)
/// - MatMul
/// - LayerNormalization and SimplifiedLayerNormalization
/// - Softmax, Transpose, Reshape
///
/// Custom rules can be added to the returned registry via
/// `registry.register(name, rule)`.
pub fn default_rule_registry() -> RuleRegistry {
    let mut registry = RuleRegistry::new();

    // Binary elementwise operators
    registry
        .register("Add", BinaryElementwiseRule::add())
        .register("Sub", BinaryElementwiseRule::sub())
        .register("Mul", BinaryElementwiseRule::mul())
        .register("Div", BinaryElementwiseRule::div())
        .register("Pow", BinaryElementwiseRule::pow())
        .register("Max", BinaryElementwiseRule::max())
        .register("Min", BinaryElementwiseRule::min());

    // Unary elementwise operators
    for &op in UNARY_ELEMENTWISE_OPS {
        registry.register(op, UnaryElementwiseRule::new(op));
    }

    // Matrix and normalization operators
    registry.register("MatMul", MatMulRule);
    registry.register("LayerNormalization", LayerNormRule::layer_norm());
    registry.register("SimplifiedLayerNormalization", LayerNormRule::simplified());
    registry.register("Softmax", SoftmaxRule);

    // Shape manipulation operators
    registry.register("Transpose", TransposeRule);
    registry.register("Reshape", ReshapeRule);

    registry
}
