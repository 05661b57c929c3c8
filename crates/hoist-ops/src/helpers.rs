//! Shared helpers for propagation rules.

use hoist_core::{
    AttributeValue, LeadingCollapse, OperandReshape, Propagation, PropagationPlan,
    ReshapeDescriptor, RuleCtx,
};

/// Resolve a reshape of the producer output and classify it as a
/// leading-dims collapse.
///
/// Returns the producer output dims and the collapse, or the reason the
/// reshape cannot be analyzed.
pub(crate) fn leading_collapse(
    ctx: &RuleCtx,
    reshape: &ReshapeDescriptor,
) -> Result<(Vec<usize>, LeadingCollapse), String> {
    let output = ctx
        .output_static()
        .ok_or_else(|| format!("{} output shape is not static", ctx.op_type()))?;
    let target = reshape.resolve(&output).map_err(|e| e.to_string())?;
    let collapse = LeadingCollapse::analyze(&output, &target).ok_or_else(|| {
        format!(
            "reshape {:?} -> {:?} does not only merge or split leading dims",
            output, target
        )
    })?;
    Ok((output, collapse))
}

/// Reshape rule for operators that reduce over the dims starting at an axis
/// attribute (LayerNormalization) or along a single axis (Softmax).
///
/// The merged leading dims must all lie before the axis. A non-negative
/// axis attribute is rewritten for the new rank.
pub(crate) fn reshape_before_axis(
    ctx: &RuleCtx,
    reshape: &ReshapeDescriptor,
    default_axis: i64,
) -> Propagation<ReshapeDescriptor> {
    let (output, collapse) = match leading_collapse(ctx, reshape) {
        Ok(found) => found,
        Err(reason) => return Propagation::Blocked(reason),
    };
    let Some((raw, axis)) = ctx.axis_attr("axis", default_axis, output.len()) else {
        return Propagation::blocked(format!("{} axis attribute is out of range", ctx.op_type()));
    };

    let preserved = output.len() - axis;
    if collapse.trailing < preserved {
        return Propagation::blocked(format!(
            "reshape merges dims at or after {} axis {}",
            ctx.op_type(),
            axis
        ));
    }
    let Some(input) = ctx.input_static(0) else {
        return Propagation::blocked("primary input shape is not static");
    };

    let OperandReshape::Reshape(target) = collapse.retarget(&input) else {
        return Propagation::blocked("primary input does not follow the output shape");
    };
    let mut plan = PropagationPlan::new().branch(0, target);
    if raw >= 0 {
        let new_axis = (collapse.output_rank() - preserved) as i64;
        plan = plan.rewrite_attribute("axis", AttributeValue::Int(new_axis));
    }
    Propagation::Propagate(plan)
}
