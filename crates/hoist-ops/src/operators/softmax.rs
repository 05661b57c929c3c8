//! Softmax propagation rule.

use hoist_core::{
    AttributeValue, Propagation, PropagationPlan, PropagationRule, ReshapeDescriptor, RuleCtx,
    SliceDescriptor,
};

use crate::helpers::reshape_before_axis;

/// Softmax along a single `axis` (default -1).
pub struct SoftmaxRule;

impl PropagationRule for SoftmaxRule {
    fn name(&self) -> &str {
        "Softmax"
    }

    fn slice(&self, ctx: &RuleCtx, slice: &SliceDescriptor) -> Propagation<SliceDescriptor> {
        let Some(dims) = ctx.input_dims(0) else {
            return Propagation::blocked("Softmax input rank is unknown");
        };
        let Some((raw, axis)) = ctx.axis_attr("axis", -1, dims.len()) else {
            return Propagation::blocked("Softmax axis attribute is out of range");
        };
        if slice.axis == axis {
            return Propagation::blocked(format!("slice axis {} is the softmax axis", axis));
        }

        let mut plan = PropagationPlan::new().branch(0, slice.clone());
        if slice.is_scalar() && raw >= 0 && slice.axis < axis {
            plan = plan.rewrite_attribute("axis", AttributeValue::Int(raw - 1));
        }
        Propagation::Propagate(plan)
    }

    fn reshape(
        &self,
        ctx: &RuleCtx,
        reshape: &ReshapeDescriptor,
    ) -> Propagation<ReshapeDescriptor> {
        reshape_before_axis(ctx, reshape, -1)
    }
}
