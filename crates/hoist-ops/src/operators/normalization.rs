//! Normalization propagation rules.

use hoist_core::{
    AttributeValue, Propagation, PropagationPlan, PropagationRule, ReshapeDescriptor, RuleCtx,
    SliceDescriptor,
};

use crate::helpers::reshape_before_axis;

/// LayerNormalization and SimplifiedLayerNormalization.
///
/// Normalizes over the dims starting at `axis` (default -1). Descriptors only
/// cross on dims strictly before that axis and only reach input 0; scale and
/// bias are shaped like the normalized dims and stay untouched.
pub struct LayerNormRule {
    name: &'static str,
}

impl LayerNormRule {
    pub fn layer_norm() -> Self {
        Self {
            name: "LayerNormalization",
        }
    }

    pub fn simplified() -> Self {
        Self {
            name: "SimplifiedLayerNormalization",
        }
    }
}

impl PropagationRule for LayerNormRule {
    fn name(&self) -> &str {
        self.name
    }

    fn slice(&self, ctx: &RuleCtx, slice: &SliceDescriptor) -> Propagation<SliceDescriptor> {
        let Some(dims) = ctx.input_dims(0) else {
            return Propagation::blocked(format!("{} input rank is unknown", self.name));
        };
        let Some((raw, norm_axis)) = ctx.axis_attr("axis", -1, dims.len()) else {
            return Propagation::blocked(format!("{} axis attribute is out of range", self.name));
        };
        if slice.axis >= norm_axis {
            return Propagation::blocked(format!(
                "slice axis {} is inside the normalized dims starting at {}",
                slice.axis, norm_axis
            ));
        }

        let mut plan = PropagationPlan::new().branch(0, slice.clone());
        if slice.is_scalar() && raw >= 0 {
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
