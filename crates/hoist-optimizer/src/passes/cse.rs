//! Common subexpression elimination pass.

use std::collections::HashMap;

use hoist_core::{IrEdgeId, IrGraph, IrNode, Pass, Result, RuleRegistry};
use tracing::trace;

/// Operators whose outputs may differ between two identical invocations.
const NON_DETERMINISTIC_OPS: &[&str] = &[
    "Dropout",
    "RandomNormal",
    "RandomNormalLike",
    "RandomUniform",
    "RandomUniformLike",
    "Multinomial",
];

/// Structural identity of a node for CSE comparison.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct OpSignature {
    op_type: String,
    inputs: Vec<IrEdgeId>,
    /// Attributes sorted by key, values in debug form (floats are not `Hash`).
    attributes: Vec<(String, String)>,
    outputs: usize,
}

impl OpSignature {
    fn of(node: &IrNode) -> Self {
        let mut attributes: Vec<(String, String)> = node
            .attributes
            .iter()
            .map(|(key, value)| (key.clone(), format!("{value:?}")))
            .collect();
        attributes.sort();
        Self {
            op_type: node.op_type.clone(),
            inputs: node.inputs.clone(),
            attributes,
            outputs: node.outputs.len(),
        }
    }
}

/// Pass that merges nodes computing the same value.
///
/// Two nodes are merged when they share operator type, input tensors and
/// attributes. Consumers of the duplicate are rewired to the first node seen
/// in topological order. Non-deterministic operators and nodes producing
/// graph outputs are never merged.
pub struct CommonSubexpressionPass;

impl CommonSubexpressionPass {
    /// Create a new CSE pass.
    pub fn new() -> Self {
        Self
    }

    fn is_candidate(graph: &IrGraph, node: &IrNode) -> bool {
        !node.inputs.is_empty()
            && !NON_DETERMINISTIC_OPS.contains(&node.op_type.as_str())
            && !node.outputs.iter().any(|&output| graph.is_graph_output(output))
    }
}

impl Default for CommonSubexpressionPass {
    fn default() -> Self {
        Self::new()
    }
}

impl Pass for CommonSubexpressionPass {
    fn name(&self) -> &str {
        "common_subexpression_elimination"
    }

    fn run(&self, graph: &mut IrGraph, _rules: &RuleRegistry) -> Result<bool> {
        let mut canonical: HashMap<OpSignature, Vec<IrEdgeId>> = HashMap::new();
        let mut merged = 0;

        for node_id in graph.topological_order() {
            let node = graph.node(node_id)?;
            if !Self::is_candidate(graph, node) {
                continue;
            }

            // Inputs reflect earlier merges, so chains collapse in one run.
            let signature = OpSignature::of(node);
            let Some(existing) = canonical.get(&signature) else {
                canonical.insert(signature, node.outputs.clone());
                continue;
            };

            let duplicate = graph.remove_node(node_id)?;
            trace!(node = %duplicate.name, op = %duplicate.op_type, "merging duplicate node");
            for (&old, &new) in duplicate.outputs.iter().zip(existing) {
                graph.replace_all_uses(old, new)?;
            }
            merged += 1;
        }

        Ok(merged > 0)
    }
}
