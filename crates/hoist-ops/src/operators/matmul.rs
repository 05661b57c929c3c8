//! MatMul propagation rule.

use hoist_core::broadcast::{aligned_axis, is_broadcast_dim};
use hoist_core::{
    OperandReshape, Propagation, PropagationPlan, PropagationRule, ReshapeDescriptor, RuleCtx,
    SliceDescriptor,
};

use crate::helpers::leading_collapse;

/// Matrix multiplication `[.., M, K] x [.., K, N] -> [.., M, N]`.
///
/// Slice routing depends on the output axis:
/// - column axis (last): right operand's last axis only
/// - row axis (second to last): left operand's second to last axis only
/// - batch axes: every operand owning a non-broadcast batch dim there
///
/// Scalar slices always keep rank on the sliced operands, since MatMul
/// semantics depend on operand rank. Reshapes only cross onto the left
/// operand and need a rank-2 right operand.
pub struct MatMulRule;

impl PropagationRule for MatMulRule {
    fn name(&self) -> &str {
        "MatMul"
    }

    fn slice(&self, ctx: &RuleCtx, slice: &SliceDescriptor) -> Propagation<SliceDescriptor> {
        let (Some(lhs), Some(rhs), Some(output)) =
            (ctx.input_dims(0), ctx.input_dims(1), ctx.output_dims())
        else {
            return Propagation::blocked("MatMul operand or output rank is unknown");
        };
        if lhs.len() < 2 || rhs.len() < 2 {
            return Propagation::blocked("MatMul with a 1-D operand");
        }

        let rank = output.len();
        let plan = if slice.axis + 1 == rank {
            PropagationPlan::new().branch(1, slice.at_axis(rhs.len() - 1))
        } else if slice.axis + 2 == rank {
            PropagationPlan::new().branch(0, slice.at_axis(lhs.len() - 2))
        } else if slice.axis + 2 < rank {
            let out_dim = &output[slice.axis];
            let mut plan = PropagationPlan::new();
            for (input, dims) in [(0, &lhs), (1, &rhs)] {
                let Some(axis) = aligned_axis(slice.axis, rank - 2, dims.len() - 2) else {
                    continue;
                };
                let dim = &dims[axis];
                if is_broadcast_dim(dim, out_dim) {
                    continue;
                }
                if dim != out_dim {
                    return Propagation::blocked(format!(
                        "MatMul input {} batch extent {} does not match output extent {}",
                        input, dim, out_dim
                    ));
                }
                plan = plan.branch(input, slice.at_axis(axis));
            }
            plan
        } else {
            return Propagation::blocked(format!("axis {} is out of range", slice.axis));
        };

        Propagation::from_plan(
            plan.keep_rank(slice.is_scalar()),
            format!("every MatMul operand broadcasts along batch axis {}", slice.axis),
        )
    }

    fn reshape(
        &self,
        ctx: &RuleCtx,
        reshape: &ReshapeDescriptor,
    ) -> Propagation<ReshapeDescriptor> {
        let (Some(lhs), Some(rhs)) = (ctx.input_static(0), ctx.input_static(1)) else {
            return Propagation::blocked("MatMul operand shapes are not static");
        };
        if rhs.len() != 2 || lhs.len() < 2 {
            return Propagation::blocked("MatMul reshape needs a rank-2 right operand");
        }
        let (_, collapse) = match leading_collapse(ctx, reshape) {
            Ok(found) => found,
            Err(reason) => return Propagation::Blocked(reason),
        };

        match collapse.retarget(&lhs) {
            OperandReshape::Reshape(target) => {
                Propagation::Propagate(PropagationPlan::new().branch(0, target))
            }
            _ => Propagation::blocked(format!(
                "MatMul left operand {:?} does not follow the output shape",
                lhs
            )),
        }
    }
}
