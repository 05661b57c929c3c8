//! Upstream propagation engine.
//!
//! Moves frontier nodes (Gather, Reshape) above their producers, one producer
//! at a time, following the answers of the registered propagation rules. Newly
//! created frontier nodes are queued and processed until every frontier is
//! blocked or reaches a graph input or initializer.

use std::collections::{HashSet, VecDeque};
use std::fmt;

use hoist_core::{
    AttributeValue, IrEdge, IrEdgeId, IrGraph, IrNode, IrNodeId, Propagation, PropagationPlan,
    PropagationRule, Result, RuleCtx, RuleRegistry, TensorShape,
};
use tracing::{debug, trace};

/// Frontier-specific behaviour plugged into the engine.
pub trait UpstreamActor {
    /// Description of one frontier node.
    type Descriptor: Clone + fmt::Debug;

    /// Operator type of frontier nodes.
    fn frontier_op(&self) -> &'static str;

    /// Describe a frontier node, or `None` if it cannot move at all.
    fn describe(&self, graph: &IrGraph, node: &IrNode) -> Option<Self::Descriptor>;

    /// Ask a rule how the descriptor crosses the producer.
    fn query(
        &self,
        rule: &dyn PropagationRule,
        ctx: &RuleCtx,
        descriptor: &Self::Descriptor,
    ) -> Propagation<Self::Descriptor>;

    /// Runtime tensors the descriptor reads besides the data input.
    fn side_inputs(&self, descriptor: &Self::Descriptor) -> Vec<IrEdgeId>;

    /// Axis re-inserted by a rank-preserving descriptor, if the descriptor
    /// supports rank preservation.
    fn kept_axis(&self, descriptor: &Self::Descriptor) -> Option<usize>;

    /// Shape of `shape` after applying the descriptor.
    fn apply_shape(
        &self,
        shape: &TensorShape,
        descriptor: &Self::Descriptor,
        keep_rank: bool,
    ) -> Option<TensorShape>;

    /// Insert nodes applying the descriptor to `input`.
    ///
    /// Returns the new frontier node and the tensor to feed the producer.
    fn materialize(
        &self,
        graph: &mut IrGraph,
        input: IrEdgeId,
        descriptor: &Self::Descriptor,
        keep_rank: bool,
        name: &str,
    ) -> Result<(IrNodeId, IrEdgeId)>;
}

/// Outcome of one hoisting attempt.
enum Hoist {
    /// The frontier moved; new frontier nodes to visit.
    Moved(Vec<IrNodeId>),

    /// The data input is a graph input or initializer.
    Boundary,

    /// The frontier stays where it is.
    Blocked(String),
}

/// Worklist-driven upstream propagation for one frontier kind.
pub struct UpstreamEngine<A> {
    actor: A,
}

impl<A: UpstreamActor> UpstreamEngine<A> {
    pub fn new(actor: A) -> Self {
        Self { actor }
    }

    /// Propagate every frontier node as far upstream as the rules allow.
    ///
    /// Returns the number of producers crossed.
    #[tracing::instrument(skip_all, fields(frontier = self.actor.frontier_op()))]
    pub fn run(&self, graph: &mut IrGraph, rules: &RuleRegistry) -> Result<usize> {
        let mut queue: VecDeque<IrNodeId> =
            graph.nodes_by_op(self.actor.frontier_op()).into_iter().collect();
        let mut visited = HashSet::new();
        let mut moves = 0;

        while let Some(frontier) = queue.pop_front() {
            if !visited.insert(frontier) {
                continue;
            }
            let is_frontier = graph
                .node(frontier)
                .is_ok_and(|node| node.op_type == self.actor.frontier_op());
            if !is_frontier {
                continue;
            }

            match self.try_hoist(graph, rules, frontier)? {
                Hoist::Moved(created) => {
                    moves += 1;
                    for id in created {
                        // Node ids of removed nodes are recycled.
                        visited.remove(&id);
                        queue.push_back(id);
                    }
                }
                Hoist::Boundary => trace!(?frontier, "reached graph boundary"),
                Hoist::Blocked(reason) => debug!(?frontier, %reason, "propagation blocked"),
            }
        }

        Ok(moves)
    }

    fn try_hoist(
        &self,
        graph: &mut IrGraph,
        rules: &RuleRegistry,
        frontier: IrNodeId,
    ) -> Result<Hoist> {
        let node = graph.node(frontier)?;
        let Some(descriptor) = self.actor.describe(graph, node) else {
            return Ok(Hoist::Blocked("unsupported frontier node".to_string()));
        };
        let Some(&data) = node.inputs.first() else {
            return Ok(Hoist::Blocked("frontier has no data input".to_string()));
        };
        let Some(&frontier_out) = node.outputs.first() else {
            return Ok(Hoist::Blocked("frontier has no output".to_string()));
        };
        let frontier_name = node.name.clone();

        let Some(producer) = graph.tensor_producer(data) else {
            return Ok(Hoist::Boundary);
        };
        if graph.tensor_consumers(data) != [frontier] || node.input_slots(data) != [0] {
            return Ok(Hoist::Blocked("producer output is shared".to_string()));
        }
        if graph.is_graph_output(data) {
            return Ok(Hoist::Blocked("producer output is a graph output".to_string()));
        }

        let producer_node = graph.node(producer)?;
        let Some(slot) = producer_node.output_slot(data) else {
            return Ok(Hoist::Blocked("inconsistent producer index".to_string()));
        };
        let other_outputs_used = producer_node.outputs.iter().any(|&output| {
            output != data
                && (graph.is_graph_output(output) || !graph.tensor_consumers(output).is_empty())
        });
        if other_outputs_used {
            return Ok(Hoist::Blocked(format!(
                "other outputs of '{}' are used",
                producer_node.name
            )));
        }
        for tensor in self.actor.side_inputs(&descriptor) {
            if graph.depends_on(tensor, producer) {
                return Ok(Hoist::Blocked(format!(
                    "'{}' input depends on '{}'",
                    frontier_name, producer_node.name
                )));
            }
        }

        let Some(rule) = rules.get(&producer_node.op_type) else {
            return Ok(Hoist::Blocked(format!(
                "no rule for {}",
                producer_node.op_type
            )));
        };
        let ctx = RuleCtx::new(producer_node, graph, slot);
        let plan = match self.actor.query(rule, &ctx, &descriptor) {
            Propagation::Propagate(plan) => plan,
            Propagation::Blocked(reason) => return Ok(Hoist::Blocked(reason)),
        };

        let Some(staged) = self.stage(graph, producer, data, frontier_out, &descriptor, &plan)?
        else {
            return Ok(Hoist::Blocked("cannot infer propagated shapes".to_string()));
        };

        debug!(
            frontier = %frontier_name,
            producer = %producer_node.name,
            op = %producer_node.op_type,
            branches = plan.branches.len(),
            keep_rank = plan.keep_rank,
            "hoisting"
        );

        let created = self.rewrite(graph, producer, &plan, &frontier_name)?;
        self.retire(graph, frontier, producer, slot, data, &descriptor, &plan, staged)?;

        Ok(Hoist::Moved(created))
    }

    /// Compute the new producer output shape and check every branch input
    /// shape can be derived before the graph is touched.
    fn stage(
        &self,
        graph: &IrGraph,
        producer: IrNodeId,
        data: IrEdgeId,
        frontier_out: IrEdgeId,
        descriptor: &A::Descriptor,
        plan: &PropagationPlan<A::Descriptor>,
    ) -> Result<Option<TensorShape>> {
        let node = graph.node(producer)?;
        for branch in &plan.branches {
            let Some(&input) = node.inputs.get(branch.input) else {
                return Ok(None);
            };
            let shape = &graph.tensor(input)?.shape;
            if self
                .actor
                .apply_shape(shape, &branch.descriptor, plan.keep_rank)
                .is_none()
            {
                return Ok(None);
            }
        }
        for (input, _) in &plan.input_rewrites {
            if *input >= node.inputs.len() {
                return Ok(None);
            }
        }

        if plan.keep_rank && self.actor.kept_axis(descriptor).is_none() {
            return Ok(None);
        }
        let reduced = self
            .actor
            .apply_shape(&graph.tensor(data)?.shape, descriptor, plan.keep_rank);
        if plan.keep_rank {
            return Ok(reduced);
        }
        Ok(Some(reduced.unwrap_or_else(|| {
            graph
                .tensor(frontier_out)
                .map(|t| t.shape.clone())
                .unwrap_or(TensorShape::Unknown)
        })))
    }

    /// Insert the branch nodes and apply constant and attribute rewrites.
    fn rewrite(
        &self,
        graph: &mut IrGraph,
        producer: IrNodeId,
        plan: &PropagationPlan<A::Descriptor>,
        frontier_name: &str,
    ) -> Result<Vec<IrNodeId>> {
        let producer_name = graph.node(producer)?.name.clone();
        let mut created = Vec::with_capacity(plan.branches.len());

        for branch in &plan.branches {
            let input = graph.node(producer)?.inputs[branch.input];
            let name = graph.unique_node_name(&format!(
                "{}/{}_in{}",
                frontier_name, producer_name, branch.input
            ));
            let (node, output) =
                self.actor
                    .materialize(graph, input, &branch.descriptor, plan.keep_rank, &name)?;
            graph.replace_input(producer, branch.input, output)?;
            created.push(node);
        }

        for (input, value) in &plan.input_rewrites {
            let old = graph.node(producer)?.inputs[*input];
            let prefix = graph.tensor(old)?.name.clone();
            let id = graph.intern_initializer(&prefix, value.clone())?;
            graph.replace_input(producer, *input, id)?;
        }

        let node = graph.node_mut(producer)?;
        for (key, value) in &plan.attribute_rewrites {
            node.set_attribute(key.clone(), value.clone());
        }

        Ok(created)
    }

    /// Remove the frontier node now that the producer computes its result,
    /// or turn it into a `Squeeze` for rank-preserving slices.
    #[allow(clippy::too_many_arguments)]
    fn retire(
        &self,
        graph: &mut IrGraph,
        frontier: IrNodeId,
        producer: IrNodeId,
        slot: usize,
        data: IrEdgeId,
        descriptor: &A::Descriptor,
        plan: &PropagationPlan<A::Descriptor>,
        producer_shape: TensorShape,
    ) -> Result<()> {
        let outputs = graph.node(producer)?.outputs.clone();
        for output in outputs {
            graph.tensor_mut(output)?.shape = if output == data {
                producer_shape.clone()
            } else {
                TensorShape::Unknown
            };
        }

        let removed = graph.remove_node(frontier)?;
        let frontier_out = removed.outputs[0];

        match self.actor.kept_axis(descriptor).filter(|_| plan.keep_rank) {
            Some(axis) => {
                let squeeze = IrNode::new("Squeeze")
                    .with_name(removed.name)
                    .with_inputs([data])
                    .with_outputs([frontier_out])
                    .with_attribute("axes", AttributeValue::Ints(vec![axis as i64]));
                let squeeze = graph.add_node(squeeze)?;
                cancel_squeeze_unsqueeze(graph, squeeze)?;
            }
            None if graph.is_graph_output(frontier_out) => {
                graph.tensor_mut(frontier_out)?.shape = producer_shape;
                graph.set_node_output(producer, slot, frontier_out)?;
            }
            None => {
                graph.replace_all_uses(frontier_out, data)?;
            }
        }
        Ok(())
    }
}

/// Drop a `Squeeze` whose only consumer is an `Unsqueeze` of the same axes.
fn cancel_squeeze_unsqueeze(graph: &mut IrGraph, squeeze: IrNodeId) -> Result<bool> {
    let node = graph.node(squeeze)?;
    let (input, output) = (node.inputs[0], node.outputs[0]);
    let axes = node.attr_ints("axes").map(<[i64]>::to_vec);

    let consumers = graph.tensor_consumers(output);
    let [unsqueeze] = consumers[..] else {
        return Ok(false);
    };
    let next = graph.node(unsqueeze)?;
    if next.op_type != "Unsqueeze"
        || next.inputs != [output]
        || next.attr_ints("axes").map(<[i64]>::to_vec) != axes
        || graph.is_graph_output(output)
    {
        return Ok(false);
    }
    let restored = next.outputs[0];
    if graph.is_graph_output(restored) {
        return Ok(false);
    }

    trace!(squeeze = %node.name, unsqueeze = %next.name, "cancelling squeeze/unsqueeze pair");
    graph.replace_all_uses(restored, input)?;
    graph.remove_node(unsqueeze)?;
    graph.remove_node(squeeze)?;
    Ok(true)
}

/// Register a new runtime tensor derived from `like`.
pub(crate) fn derived_tensor(
    graph: &mut IrGraph,
    like: IrEdgeId,
    name: &str,
    shape: TensorShape,
) -> Result<IrEdgeId> {
    let dtype = graph.tensor(like)?.dtype;
    let name = graph.unique_tensor_name(name);
    graph.add_edge(IrEdge::new(name, dtype, shape))
}
