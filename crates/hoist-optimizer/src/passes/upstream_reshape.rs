//! Upstream reshape propagation pass.

use hoist_core::{
    IrEdgeId, IrGraph, IrNode, IrNodeId, Pass, Propagation, PropagationRule, ReshapeDescriptor,
    Result, RuleCtx, RuleRegistry, TensorShape,
};

use crate::engine::{UpstreamActor, UpstreamEngine, derived_tensor};

/// Frontier behaviour for `Reshape` nodes.
///
/// Only reshapes with a constant target, `allowzero == 0` and a static input
/// shape are candidates.
pub(crate) struct ReshapeActor;

impl UpstreamActor for ReshapeActor {
    type Descriptor = ReshapeDescriptor;

    fn frontier_op(&self) -> &'static str {
        "Reshape"
    }

    fn describe(&self, graph: &IrGraph, node: &IrNode) -> Option<ReshapeDescriptor> {
        if node.attr_i64_or("allowzero", 0) != 0 {
            return None;
        }
        let (&data, &shape) = (node.inputs.first()?, node.inputs.get(1)?);
        let input = graph.tensor(data).ok()?.shape.as_static()?.to_vec();
        let target = graph.initializer_value(shape)?.to_i64_vec()?;
        let descriptor = ReshapeDescriptor::from_i64(&target).ok()?;
        descriptor.resolve(&input).ok()?;
        Some(descriptor)
    }

    fn query(
        &self,
        rule: &dyn PropagationRule,
        ctx: &RuleCtx,
        descriptor: &ReshapeDescriptor,
    ) -> Propagation<ReshapeDescriptor> {
        rule.reshape(ctx, descriptor)
    }

    fn side_inputs(&self, _descriptor: &ReshapeDescriptor) -> Vec<IrEdgeId> {
        Vec::new()
    }

    fn kept_axis(&self, _descriptor: &ReshapeDescriptor) -> Option<usize> {
        None
    }

    fn apply_shape(
        &self,
        shape: &TensorShape,
        descriptor: &ReshapeDescriptor,
        _keep_rank: bool,
    ) -> Option<TensorShape> {
        let resolved = descriptor.resolve(shape.as_static()?).ok()?;
        Some(TensorShape::Static(resolved))
    }

    fn materialize(
        &self,
        graph: &mut IrGraph,
        input: IrEdgeId,
        descriptor: &ReshapeDescriptor,
        _keep_rank: bool,
        name: &str,
    ) -> Result<(IrNodeId, IrEdgeId)> {
        let shape = self
            .apply_shape(&graph.tensor(input)?.shape, descriptor, false)
            .unwrap_or(TensorShape::Unknown);
        let output = derived_tensor(graph, input, &format!("{name}_out"), shape)?;
        // Equal targets share one initializer so CSE can merge the reshapes.
        let target = graph.intern_initializer(&format!("{name}_shape"), descriptor.to_value())?;

        let reshape = IrNode::new("Reshape")
            .with_name(name)
            .with_inputs([input, target])
            .with_outputs([output]);
        Ok((graph.add_node(reshape)?, output))
    }
}

/// Pass that moves `Reshape` nodes above the operators producing their data.
///
/// Only reshapes that merge or split leading dims while keeping the trailing
/// dims move; each eligible producer input gets a reshape recomputed for its
/// own rank.
pub struct UpstreamReshapePass {
    engine: UpstreamEngine<ReshapeActor>,
}

impl UpstreamReshapePass {
    /// Create a new upstream reshape pass.
    pub fn new() -> Self {
        Self {
            engine: UpstreamEngine::new(ReshapeActor),
        }
    }
}

impl Default for UpstreamReshapePass {
    fn default() -> Self {
        Self::new()
    }
}

impl Pass for UpstreamReshapePass {
    fn name(&self) -> &str {
        "upstream_reshape"
    }

    fn run(&self, graph: &mut IrGraph, rules: &RuleRegistry) -> Result<bool> {
        Ok(self.engine.run(graph, rules)? > 0)
    }
}
