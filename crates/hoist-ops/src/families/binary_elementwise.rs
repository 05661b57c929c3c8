//! Binary elementwise operator family.
//!
//! Covers: Add, Sub, Mul, Div, Pow, Max, Min

use hoist_core::broadcast::{aligned_axis, is_broadcast_dim};
use hoist_core::{
    OperandReshape, Propagation, PropagationPlan, PropagationRule, ReshapeDescriptor, RuleCtx,
    SliceDescriptor,
};

use crate::helpers::leading_collapse;

/// Binary elementwise operator family.
///
/// All members share NumPy-style broadcasting, so slices and leading-dim
/// reshapes commute with them operand by operand:
/// - an operand that owns a full-extent dim at the slice axis gets its own
///   copy of the slice, remapped by right alignment
/// - an operand with a size-1 broadcast dim there, or no dim at all, is left
///   untouched
pub struct BinaryElementwiseRule {
    name: &'static str,
}

impl BinaryElementwiseRule {
    /// Create an Add rule.
    pub fn add() -> Self {
        Self { name: "Add" }
    }

    /// Create a Sub rule.
    pub fn sub() -> Self {
        Self { name: "Sub" }
    }

    /// Create a Mul rule.
    pub fn mul() -> Self {
        Self { name: "Mul" }
    }

    /// Create a Div rule.
    pub fn div() -> Self {
        Self { name: "Div" }
    }

    /// Create a Pow rule.
    pub fn pow() -> Self {
        Self { name: "Pow" }
    }

    /// Create a Max rule.
    pub fn max() -> Self {
        Self { name: "Max" }
    }

    /// Create a Min rule.
    pub fn min() -> Self {
        Self { name: "Min" }
    }
}

impl PropagationRule for BinaryElementwiseRule {
    fn name(&self) -> &str {
        self.name
    }

    fn slice(&self, ctx: &RuleCtx, slice: &SliceDescriptor) -> Propagation<SliceDescriptor> {
        let Some(output) = ctx.output_dims() else {
            return Propagation::blocked(format!("{} output rank is unknown", self.name));
        };
        let Some(out_dim) = output.get(slice.axis) else {
            return Propagation::blocked(format!("axis {} is out of range", slice.axis));
        };

        let mut plan = PropagationPlan::new();
        // A scalar slice must not change how the untouched operands align.
        let mut keep_rank = false;

        for input in 0..ctx.input_count() {
            let Some(dims) = ctx.input_dims(input) else {
                return Propagation::blocked(format!("{} input {} rank is unknown", self.name, input));
            };
            let Some(axis) = aligned_axis(slice.axis, output.len(), dims.len()) else {
                continue;
            };
            let dim = &dims[axis];
            if is_broadcast_dim(dim, out_dim) {
                keep_rank |= slice.is_scalar();
                continue;
            }
            if dim != out_dim {
                return Propagation::blocked(format!(
                    "{} input {} extent {} at axis {} does not match output extent {}",
                    self.name, input, dim, axis, out_dim
                ));
            }
            plan = plan.branch(input, slice.at_axis(axis));
        }

        Propagation::from_plan(
            plan.keep_rank(keep_rank),
            format!("every {} operand broadcasts along axis {}", self.name, slice.axis),
        )
    }

    fn reshape(
        &self,
        ctx: &RuleCtx,
        reshape: &ReshapeDescriptor,
    ) -> Propagation<ReshapeDescriptor> {
        let (_, collapse) = match leading_collapse(ctx, reshape) {
            Ok(found) => found,
            Err(reason) => return Propagation::Blocked(reason),
        };

        let mut plan = PropagationPlan::new();
        for input in 0..ctx.input_count() {
            let Some(dims) = ctx.input_static(input) else {
                return Propagation::blocked(format!("{} input {} shape is not static", self.name, input));
            };
            match collapse.retarget(&dims) {
                OperandReshape::Untouched => {}
                OperandReshape::Reshape(target) => plan = plan.branch(input, target),
                OperandReshape::Blocked => {
                    return Propagation::blocked(format!(
                        "{} input {} {:?} broadcasts across the merged dims",
                        self.name, input, dims
                    ));
                }
            }
        }

        Propagation::from_plan(plan, format!("no {} operand spans the merged dims", self.name))
    }
}
