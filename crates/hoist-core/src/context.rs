//! Read-only view of a producer node handed to propagation rules.

use crate::ir::{IrGraph, IrNode};
use crate::types::{SymbolicDim, TensorShape, TensorValue, normalize_axis};

/// Context for propagation rule queries.
///
/// Provides read-only access to the producer node `P`, its input shapes and
/// constant inputs, its attributes, and the shape of the output the frontier
/// reads.
pub struct RuleCtx<'a> {
    /// The producer node being crossed.
    pub node: &'a IrNode,

    /// The graph containing the node.
    pub graph: &'a IrGraph,

    /// Output slot of `node` that feeds the frontier.
    pub output_slot: usize,
}

impl<'a> RuleCtx<'a> {
    /// Create a new rule context.
    pub fn new(node: &'a IrNode, graph: &'a IrGraph, output_slot: usize) -> Self {
        Self {
            node,
            graph,
            output_slot,
        }
    }

    /// Operator type of the producer.
    pub fn op_type(&self) -> &str {
        &self.node.op_type
    }

    /// Get the number of inputs.
    pub fn input_count(&self) -> usize {
        self.node.inputs.len()
    }

    /// Shape of an input tensor (`Unknown` if the slot does not exist).
    pub fn input_shape(&self, index: usize) -> TensorShape {
        self.node
            .inputs
            .get(index)
            .and_then(|&id| self.graph.tensor(id).ok())
            .map(|edge| edge.shape.clone())
            .unwrap_or(TensorShape::Unknown)
    }

    /// Dimensions of an input tensor, if its rank is known.
    pub fn input_dims(&self, index: usize) -> Option<Vec<SymbolicDim>> {
        self.input_shape(index).dims()
    }

    /// Static dimensions of an input tensor, if fully known.
    pub fn input_static(&self, index: usize) -> Option<Vec<usize>> {
        self.input_shape(index).as_static().map(<[usize]>::to_vec)
    }

    /// Constant value of an input, if it is an initializer.
    pub fn input_value(&self, index: usize) -> Option<&'a TensorValue> {
        let id = *self.node.inputs.get(index)?;
        self.graph.initializer_value(id)
    }

    /// Shape of the output feeding the frontier.
    pub fn output_shape(&self) -> TensorShape {
        self.node
            .outputs
            .get(self.output_slot)
            .and_then(|&id| self.graph.tensor(id).ok())
            .map(|edge| edge.shape.clone())
            .unwrap_or(TensorShape::Unknown)
    }

    /// Dimensions of the output feeding the frontier, if its rank is known.
    pub fn output_dims(&self) -> Option<Vec<SymbolicDim>> {
        self.output_shape().dims()
    }

    /// Static dimensions of the output feeding the frontier, if fully known.
    pub fn output_static(&self) -> Option<Vec<usize>> {
        self.output_shape().as_static().map(<[usize]>::to_vec)
    }

    // --- Attribute accessors ---

    /// Get an integer attribute with a default value.
    pub fn attr_i64_or(&self, key: &str, default: i64) -> i64 {
        self.node.attr_i64_or(key, default)
    }

    /// Get an integer-array attribute.
    pub fn attr_ints(&self, key: &str) -> Option<&'a [i64]> {
        self.node.attr_ints(key)
    }

    /// Resolve an axis attribute against `rank`, returning the raw value too.
    pub fn axis_attr(&self, key: &str, default: i64, rank: usize) -> Option<(i64, usize)> {
        let raw = self.attr_i64_or(key, default);
        normalize_axis(raw, rank).map(|axis| (raw, axis))
    }
}
