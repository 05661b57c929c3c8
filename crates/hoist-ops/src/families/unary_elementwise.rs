//! Unary elementwise operator family.
//!
//! Covers: Cast, Relu, Gelu, FastGelu, Tanh, Sigmoid, Erf, Neg, Sqrt, Exp, Log,
//! Abs, Identity, Dropout

use hoist_core::{
    Propagation, PropagationPlan, PropagationRule, ReshapeDescriptor, RuleCtx, SliceDescriptor,
};

/// Operator names covered by the unary elementwise family.
pub const UNARY_ELEMENTWISE_OPS: &[&str] = &[
    "Cast", "Relu", "Gelu", "FastGelu", "Tanh", "Sigmoid", "Erf", "Neg", "Sqrt", "Exp", "Log",
    "Abs", "Identity", "Dropout",
];

/// Unary elementwise operator family.
///
/// Output and primary input have the same shape, so any descriptor moves to
/// input 0 unchanged. Extra inputs (Dropout's ratio and training mode) are
/// left alone.
pub struct UnaryElementwiseRule {
    name: &'static str,
}

impl UnaryElementwiseRule {
    pub fn new(name: &'static str) -> Self {
        Self { name }
    }
}

impl PropagationRule for UnaryElementwiseRule {
    fn name(&self) -> &str {
        self.name
    }

    fn slice(&self, ctx: &RuleCtx, slice: &SliceDescriptor) -> Propagation<SliceDescriptor> {
        if ctx.input_count() == 0 {
            return Propagation::blocked(format!("{} has no inputs", self.name));
        }
        Propagation::Propagate(PropagationPlan::new().branch(0, slice.clone()))
    }

    fn reshape(
        &self,
        ctx: &RuleCtx,
        reshape: &ReshapeDescriptor,
    ) -> Propagation<ReshapeDescriptor> {
        if ctx.input_count() == 0 {
            return Propagation::blocked(format!("{} has no inputs", self.name));
        }
        Propagation::Propagate(PropagationPlan::new().branch(0, reshape.clone()))
    }
}
