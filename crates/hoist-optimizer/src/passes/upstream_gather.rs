//! Upstream gather propagation pass.

use hoist_core::{
    AttributeValue, IndexSource, IrEdge, IrEdgeId, IrGraph, IrNode, IrNodeId, Pass, Propagation,
    PropagationRule, Result, RuleCtx, RuleRegistry, SliceCardinality, SliceDescriptor,
    SymbolicDim, TensorShape,
};
use hoist_core::types::normalize_axis;

use crate::engine::{UpstreamActor, UpstreamEngine, derived_tensor};

/// Frontier behaviour for `Gather` nodes.
pub(crate) struct GatherActor;

impl UpstreamActor for GatherActor {
    type Descriptor = SliceDescriptor;

    fn frontier_op(&self) -> &'static str {
        "Gather"
    }

    fn describe(&self, graph: &IrGraph, node: &IrNode) -> Option<SliceDescriptor> {
        let (&data, &indices) = (node.inputs.first()?, node.inputs.get(1)?);
        let rank = graph.tensor(data).ok()?.shape.ndim()?;
        let axis = normalize_axis(node.attr_i64_or("axis", 0), rank)?;

        let index_tensor = graph.tensor(indices).ok()?;
        let cardinality = match index_tensor.shape.dims()?.as_slice() {
            [] => SliceCardinality::Scalar,
            [extent] => SliceCardinality::Range(extent.clone()),
            _ => return None,
        };
        let source = index_source(index_tensor, indices)?;

        Some(SliceDescriptor::new(axis, cardinality, source))
    }

    fn query(
        &self,
        rule: &dyn PropagationRule,
        ctx: &RuleCtx,
        descriptor: &SliceDescriptor,
    ) -> Propagation<SliceDescriptor> {
        rule.slice(ctx, descriptor)
    }

    fn side_inputs(&self, descriptor: &SliceDescriptor) -> Vec<IrEdgeId> {
        vec![descriptor.indices.tensor()]
    }

    fn kept_axis(&self, descriptor: &SliceDescriptor) -> Option<usize> {
        descriptor.is_scalar().then_some(descriptor.axis)
    }

    fn apply_shape(
        &self,
        shape: &TensorShape,
        descriptor: &SliceDescriptor,
        keep_rank: bool,
    ) -> Option<TensorShape> {
        descriptor.sliced_shape(shape, keep_rank)
    }

    fn materialize(
        &self,
        graph: &mut IrGraph,
        input: IrEdgeId,
        descriptor: &SliceDescriptor,
        keep_rank: bool,
        name: &str,
    ) -> Result<(IrNodeId, IrEdgeId)> {
        let input_shape = graph.tensor(input)?.shape.clone();
        let shape = descriptor
            .sliced_shape(&input_shape, false)
            .unwrap_or(TensorShape::Unknown);
        let output = derived_tensor(graph, input, &format!("{name}_out"), shape)?;

        let gather = IrNode::new("Gather")
            .with_name(name)
            .with_inputs([input, descriptor.indices.tensor()])
            .with_outputs([output])
            .with_attribute("axis", AttributeValue::Int(descriptor.axis as i64));
        let gather = graph.add_node(gather)?;

        if !(keep_rank && descriptor.is_scalar()) {
            return Ok((gather, output));
        }

        let shape = descriptor
            .sliced_shape(&input_shape, true)
            .unwrap_or(TensorShape::Unknown);
        let restored = derived_tensor(graph, input, &format!("{name}_unsqueezed"), shape)?;
        let unsqueeze_name = graph.unique_node_name(&format!("{name}_unsqueeze"));
        let unsqueeze = IrNode::new("Unsqueeze")
            .with_name(unsqueeze_name)
            .with_inputs([output])
            .with_outputs([restored])
            .with_attribute("axes", AttributeValue::Ints(vec![descriptor.axis as i64]));
        graph.add_node(unsqueeze)?;

        Ok((gather, restored))
    }
}

/// Frontier behaviour for `GatherND` nodes.
///
/// Only single-coordinate lookups are candidates: indices of shape
/// `[b_0, .., b_{n-1}, k, 1]` with `n == batch_dims`, selecting `k` positions
/// along axis `n` of each batch entry. That is a range slice batched over the
/// leading `n` dims.
pub(crate) struct GatherNdActor;

impl UpstreamActor for GatherNdActor {
    type Descriptor = SliceDescriptor;

    fn frontier_op(&self) -> &'static str {
        "GatherND"
    }

    fn describe(&self, graph: &IrGraph, node: &IrNode) -> Option<SliceDescriptor> {
        let (&data, &indices) = (node.inputs.first()?, node.inputs.get(1)?);
        let batch_dims = usize::try_from(node.attr_or("batch_dims", 0i64).ok()?).ok()?;
        let data_dims = graph.tensor(data).ok()?.shape.dims()?;

        let index_tensor = graph.tensor(indices).ok()?;
        let index_dims = index_tensor.shape.dims()?;
        let [batch @ .., extent, last] = index_dims.as_slice() else {
            return None;
        };
        if batch.len() != batch_dims
            || *last != SymbolicDim::Fixed(1)
            || data_dims.len() <= batch_dims
            || data_dims[..batch_dims] != *batch
        {
            return None;
        }
        let source = index_source(index_tensor, indices)?;

        Some(
            SliceDescriptor::new(batch_dims, SliceCardinality::Range(extent.clone()), source)
                .with_batch(batch.to_vec()),
        )
    }

    fn query(
        &self,
        rule: &dyn PropagationRule,
        ctx: &RuleCtx,
        descriptor: &SliceDescriptor,
    ) -> Propagation<SliceDescriptor> {
        rule.slice(ctx, descriptor)
    }

    fn side_inputs(&self, descriptor: &SliceDescriptor) -> Vec<IrEdgeId> {
        vec![descriptor.indices.tensor()]
    }

    fn kept_axis(&self, _descriptor: &SliceDescriptor) -> Option<usize> {
        None
    }

    fn apply_shape(
        &self,
        shape: &TensorShape,
        descriptor: &SliceDescriptor,
        keep_rank: bool,
    ) -> Option<TensorShape> {
        // The lookup always selects along the axis after the batch dims.
        if descriptor.axis != descriptor.batch.len() {
            return None;
        }
        descriptor.sliced_shape(shape, keep_rank)
    }

    fn materialize(
        &self,
        graph: &mut IrGraph,
        input: IrEdgeId,
        descriptor: &SliceDescriptor,
        _keep_rank: bool,
        name: &str,
    ) -> Result<(IrNodeId, IrEdgeId)> {
        let shape = self
            .apply_shape(&graph.tensor(input)?.shape, descriptor, false)
            .unwrap_or(TensorShape::Unknown);
        let output = derived_tensor(graph, input, &format!("{name}_out"), shape)?;

        let gather = IrNode::new("GatherND")
            .with_name(name)
            .with_inputs([input, descriptor.indices.tensor()])
            .with_outputs([output])
            .with_attribute("batch_dims", AttributeValue::Int(descriptor.batch.len() as i64));
        Ok((graph.add_node(gather)?, output))
    }
}

/// Where a frontier's integer indices come from.
fn index_source(tensor: &IrEdge, id: IrEdgeId) -> Option<IndexSource> {
    if !tensor.dtype.is_index() {
        return None;
    }
    Some(match tensor.initializer_value() {
        Some(value) => IndexSource::Constant {
            tensor: id,
            indices: value.to_i64_vec()?,
        },
        None => IndexSource::Runtime(id),
    })
}

/// Pass that moves `Gather` and `GatherND` nodes above the operators
/// producing their data.
///
/// Every frontier is pushed upstream one producer at a time for as long as the
/// producer's propagation rule allows it. Producers with several eligible
/// operands get one copy per operand.
pub struct UpstreamGatherPass {
    gather: UpstreamEngine<GatherActor>,
    gather_nd: UpstreamEngine<GatherNdActor>,
}

impl UpstreamGatherPass {
    /// Create a new upstream gather pass.
    pub fn new() -> Self {
        Self {
            gather: UpstreamEngine::new(GatherActor),
            gather_nd: UpstreamEngine::new(GatherNdActor),
        }
    }
}

impl Default for UpstreamGatherPass {
    fn default() -> Self {
        Self::new()
    }
}

impl Pass for UpstreamGatherPass {
    fn name(&self) -> &str {
        "upstream_gather"
    }

    fn run(&self, graph: &mut IrGraph, rules: &RuleRegistry) -> Result<bool> {
        let moves = self.gather.run(graph, rules)? + self.gather_nd.run(graph, rules)?;
        Ok(moves > 0)
    }
}
