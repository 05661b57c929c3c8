//! Shape manipulation rules: Transpose, Reshape.

use hoist_core::{
    AttributeValue, Propagation, PropagationPlan, PropagationRule, RuleCtx, SliceCardinality,
    SliceDescriptor, SymbolicDim, TensorValue,
};

/// Transpose with `perm` (default: reversed axes).
///
/// `output[i] = input[perm[i]]`, so a slice on output axis `a` is a slice on
/// input axis `perm[a]`. Batched slices need the batch dims left in place.
pub struct TransposeRule;

impl PropagationRule for TransposeRule {
    fn name(&self) -> &str {
        "Transpose"
    }

    fn slice(&self, ctx: &RuleCtx, slice: &SliceDescriptor) -> Propagation<SliceDescriptor> {
        let Some(rank) = ctx.input_shape(0).ndim() else {
            return Propagation::blocked("Transpose input rank is unknown");
        };
        let perm: Vec<usize> = match ctx.attr_ints("perm") {
            Some(perm) => {
                let Some(perm) = perm
                    .iter()
                    .map(|&p| usize::try_from(p).ok().filter(|&p| p < rank))
                    .collect::<Option<Vec<_>>>()
                else {
                    return Propagation::blocked(format!("invalid perm {:?}", perm));
                };
                perm
            }
            None => (0..rank).rev().collect(),
        };
        if perm.len() != rank {
            return Propagation::blocked(format!("perm {:?} does not match rank {}", perm, rank));
        }
        let Some(&source) = perm.get(slice.axis) else {
            return Propagation::blocked(format!("axis {} is out of range", slice.axis));
        };
        if perm.iter().take(slice.batch.len()).enumerate().any(|(i, &p)| i != p) {
            return Propagation::blocked(format!("perm {:?} moves batch dims", perm));
        }

        let mut plan = PropagationPlan::new().branch(0, slice.at_axis(source));
        if slice.is_scalar() {
            let reduced: Vec<i64> = perm
                .iter()
                .enumerate()
                .filter(|&(i, _)| i != slice.axis)
                .map(|(_, &p)| if p > source { p as i64 - 1 } else { p as i64 })
                .collect();
            plan = plan.rewrite_attribute("perm", AttributeValue::Ints(reduced));
        }
        Propagation::Propagate(plan)
    }
}

/// Reshape whose target keeps every dim up to and including the slice axis.
///
/// The slice moves onto the data input and the constant target is rewritten:
/// a scalar slice drops the entry, a range slice replaces a literal entry with
/// the selected extent. `0` and `-1` entries stay valid as they are.
pub struct ReshapeRule;

impl PropagationRule for ReshapeRule {
    fn name(&self) -> &str {
        "Reshape"
    }

    fn slice(&self, ctx: &RuleCtx, slice: &SliceDescriptor) -> Propagation<SliceDescriptor> {
        if ctx.attr_i64_or("allowzero", 0) != 0 {
            return Propagation::blocked("Reshape with allowzero");
        }
        let Some(target) = ctx.input_value(1).and_then(TensorValue::to_i64_vec) else {
            return Propagation::blocked("Reshape target shape is not constant");
        };
        let (Some(input), Some(output)) = (ctx.input_dims(0), ctx.output_dims()) else {
            return Propagation::blocked("Reshape input or output rank is unknown");
        };
        let axis = slice.axis;
        if target.len() != output.len()
            || axis >= input.len()
            || axis >= output.len()
            || input[..=axis] != output[..=axis]
        {
            return Propagation::blocked(format!(
                "Reshape {:?} does not preserve dims up to axis {}",
                target, axis
            ));
        }

        let mut rewritten = target.clone();
        match &slice.cardinality {
            SliceCardinality::Scalar => {
                rewritten.remove(axis);
            }
            SliceCardinality::Range(extent) => {
                if rewritten[axis] > 0 {
                    let SymbolicDim::Fixed(extent) = extent else {
                        return Propagation::blocked(format!(
                            "range extent {} cannot replace literal {}",
                            extent, rewritten[axis]
                        ));
                    };
                    rewritten[axis] = *extent as i64;
                }
            }
        }

        Propagation::Propagate(
            PropagationPlan::new()
                .branch(0, slice.clone())
                .rewrite_input(1, TensorValue::i64_vector(rewritten)),
        )
    }
}
