//! Intermediate representation for the optimizer graph.
//!
//! The IR is a directed graph where:
//! - **Nodes** (`IrNode`) are operators (e.g., Add, MatMul, Gather)
//! - **Edges** (`IrEdge`) are tensors flowing between operators
//!
//! Tensors live in a side-table addressed by `IrEdgeId`. The petgraph edges
//! mirror producer/consumer relationships (one per consumed input slot) and
//! exist for ordering, reachability and cycle checks.

use crate::types::{AttributeValue, DataType, TensorShape, TensorValue};
use crate::{Error, Result};
use petgraph::Direction;
use petgraph::algo::{has_path_connecting, is_cyclic_directed};
use petgraph::graph::NodeIndex;
use petgraph::stable_graph::StableGraph;
use petgraph::visit::{EdgeRef, Topo};
use std::cell::OnceCell;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Type alias for IR node identifiers (backed by petgraph NodeIndex).
pub type IrNodeId = NodeIndex;

/// Unique identifier for a tensor in the IR graph.
///
/// This is an index into `IrGraph::edges`. Tensors are never removed from the
/// side-table, so an id stays valid for the lifetime of the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IrEdgeId(pub usize);

impl IrEdgeId {
    /// Create a new edge ID.
    pub fn new(id: usize) -> Self {
        Self(id)
    }

    /// Get the underlying index.
    pub fn index(&self) -> usize {
        self.0
    }
}

// ──────────────────────────────── IrGraph ────────────────────────────────

/// Intermediate representation graph.
///
/// Producer and consumer indexes are updated incrementally by every mutation.
/// Structural changes must go through the graph API; `node_mut` is meant for
/// attribute edits only.
pub struct IrGraph {
    /// Operator arena. Edge weights name the tensor carried between the two nodes.
    graph: StableGraph<IrNode, IrEdgeId>,

    /// Tensor side-table.
    edges: Vec<IrEdge>,

    /// Lookup table: tensor name -> tensor ID.
    edge_by_name: HashMap<String, IrEdgeId>,

    /// Lookup table: tensor ID -> producing node ID.
    edge_producer: HashMap<IrEdgeId, IrNodeId>,

    /// Lookup table: tensor ID -> distinct consuming node IDs.
    edge_consumers: HashMap<IrEdgeId, Vec<IrNodeId>>,

    /// Names of live nodes (for unique name generation).
    node_names: HashSet<String>,

    /// Cached topological order, cleared on mutation.
    topo_cache: OnceCell<Vec<IrNodeId>>,

    /// Graph input tensor IDs.
    pub inputs: Vec<IrEdgeId>,

    /// Graph output tensor IDs.
    pub outputs: Vec<IrEdgeId>,
}

impl IrGraph {
    /// Create a new empty IR graph.
    pub fn new() -> Self {
        Self {
            graph: StableGraph::new(),
            edges: Vec::new(),
            edge_by_name: HashMap::new(),
            edge_producer: HashMap::new(),
            edge_consumers: HashMap::new(),
            node_names: HashSet::new(),
            topo_cache: OnceCell::new(),
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    // ── Node access ──

    /// Get an immutable reference to a node.
    pub fn node(&self, id: IrNodeId) -> Result<&IrNode> {
        self.graph
            .node_weight(id)
            .ok_or_else(|| Error::InvalidGraph(format!("Node {:?} not found", id)))
    }

    /// Get a mutable reference to a node.
    pub fn node_mut(&mut self, id: IrNodeId) -> Result<&mut IrNode> {
        self.graph
            .node_weight_mut(id)
            .ok_or_else(|| Error::InvalidGraph(format!("Node {:?} not found", id)))
    }

    /// Iterate over all nodes in the graph.
    pub fn nodes(&self) -> impl Iterator<Item = (IrNodeId, &IrNode)> {
        self.graph
            .node_indices()
            .filter_map(|id| self.graph.node_weight(id).map(|node| (id, node)))
    }

    /// Get the number of nodes in the graph.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    // ── Tensor access ──

    /// Get an immutable reference to a tensor.
    pub fn tensor(&self, id: IrEdgeId) -> Result<&IrEdge> {
        self.edges
            .get(id.index())
            .ok_or_else(|| Error::InvalidGraph(format!("Tensor {:?} not found", id)))
    }

    /// Get a mutable reference to a tensor.
    pub fn tensor_mut(&mut self, id: IrEdgeId) -> Result<&mut IrEdge> {
        self.edges
            .get_mut(id.index())
            .ok_or_else(|| Error::InvalidGraph(format!("Tensor {:?} not found", id)))
    }

    /// Get the number of tensors ever added to the graph.
    pub fn tensor_count(&self) -> usize {
        self.edges.len()
    }

    /// Look up a tensor by name.
    pub fn tensor_by_name(&self, name: &str) -> Option<IrEdgeId> {
        self.edge_by_name.get(name).copied()
    }

    /// Get the node that produces a tensor, if any.
    pub fn tensor_producer(&self, id: IrEdgeId) -> Option<IrNodeId> {
        self.edge_producer.get(&id).copied()
    }

    /// Get the distinct nodes that consume a tensor.
    pub fn tensor_consumers(&self, id: IrEdgeId) -> Vec<IrNodeId> {
        self.edge_consumers.get(&id).cloned().unwrap_or_default()
    }

    /// Get the compile-time value of an initializer tensor.
    pub fn initializer_value(&self, id: IrEdgeId) -> Option<&TensorValue> {
        self.edges.get(id.index()).and_then(IrEdge::initializer_value)
    }

    /// Check whether a tensor is listed as a graph output.
    pub fn is_graph_output(&self, id: IrEdgeId) -> bool {
        self.outputs.contains(&id)
    }

    /// Check whether a tensor is listed as a graph input.
    pub fn is_graph_input(&self, id: IrEdgeId) -> bool {
        self.inputs.contains(&id)
    }

    // ── Graph construction ──

    /// Add a tensor to the graph and return its ID.
    ///
    /// Tensor names must be unique within the graph.
    pub fn add_edge(&mut self, edge: IrEdge) -> Result<IrEdgeId> {
        if self.edge_by_name.contains_key(&edge.name) {
            return Err(Error::InvalidGraph(format!(
                "Tensor '{}' already exists",
                edge.name
            )));
        }
        let id = IrEdgeId::new(self.edges.len());
        self.edge_by_name.insert(edge.name.clone(), id);
        self.edges.push(edge);
        Ok(id)
    }

    /// Add a tensor and register it as a graph input.
    pub fn add_input(&mut self, edge: IrEdge) -> Result<IrEdgeId> {
        let id = self.add_edge(edge)?;
        self.inputs.push(id);
        Ok(id)
    }

    /// Add a named constant tensor.
    pub fn add_initializer(
        &mut self,
        name: impl Into<String>,
        value: TensorValue,
    ) -> Result<IrEdgeId> {
        self.add_edge(IrEdge::with_initializer(name.into(), value))
    }

    /// Return an initializer holding `value`, reusing an existing one with an
    /// equal value. New initializers are named after `prefix`.
    ///
    /// Initializers that are also graph inputs can be overridden at runtime
    /// and are never reused.
    pub fn intern_initializer(&mut self, prefix: &str, value: TensorValue) -> Result<IrEdgeId> {
        let existing = (0..self.edges.len()).map(IrEdgeId::new).find(|&id| {
            self.initializer_value(id) == Some(&value) && !self.is_graph_input(id)
        });
        if let Some(id) = existing {
            return Ok(id);
        }
        let name = self.unique_tensor_name(prefix);
        self.add_initializer(name, value)
    }

    /// Register an existing tensor as a graph output.
    pub fn add_output(&mut self, id: IrEdgeId) -> Result<()> {
        self.tensor(id)?;
        if !self.outputs.contains(&id) {
            self.outputs.push(id);
        }
        Ok(())
    }

    /// Derive a tensor name from `prefix` that is not used yet.
    pub fn unique_tensor_name(&self, prefix: &str) -> String {
        unique_name(prefix, |name| self.edge_by_name.contains_key(name))
    }

    /// Derive a node name from `prefix` that is not used yet.
    pub fn unique_node_name(&self, prefix: &str) -> String {
        unique_name(prefix, |name| self.node_names.contains(name))
    }

    // ── Graph mutation ──

    /// Add a new node to the graph and return its ID.
    ///
    /// The node's inputs and outputs must refer to existing tensors, a
    /// non-empty name must not be taken, and none of its outputs may already
    /// have a producer. Consumers that already read one of the outputs are
    /// linked to the new node.
    pub fn add_node(&mut self, mut node: IrNode) -> Result<IrNodeId> {
        if !node.name.is_empty() && self.node_names.contains(&node.name) {
            return Err(Error::InvalidGraph(format!(
                "Node '{}' already exists",
                node.name
            )));
        }
        for &id in node.inputs.iter().chain(&node.outputs) {
            self.tensor(id)?;
        }
        for &output_id in &node.outputs {
            if let Some(existing) = self.edge_producer.get(&output_id) {
                return Err(Error::InvalidGraph(format!(
                    "Tensor '{}' is already produced by node {:?}",
                    self.edges[output_id.index()].name,
                    existing
                )));
            }
        }

        let node_id = self.graph.add_node(IrNode::new(String::new()));
        node.node_index = node_id;

        for &output_id in &node.outputs {
            self.edge_producer.insert(output_id, node_id);
        }
        for &input_id in &node.inputs {
            let consumers = self.edge_consumers.entry(input_id).or_default();
            if !consumers.contains(&node_id) {
                consumers.push(node_id);
            }
        }

        self.node_names.insert(node.name.clone());
        *self.node_mut(node_id)? = node;

        self.sync_incoming(node_id)?;
        self.sync_outgoing(node_id)?;
        self.invalidate();

        Ok(node_id)
    }

    /// Remove a node from the graph and return it.
    ///
    /// The node's tensors stay in the side-table; its outputs lose their
    /// producer. With `StableGraph`, other node indices remain valid.
    pub fn remove_node(&mut self, id: IrNodeId) -> Result<IrNode> {
        let node = self
            .graph
            .remove_node(id)
            .ok_or_else(|| Error::InvalidGraph(format!("Node {:?} not found", id)))?;

        for output_id in &node.outputs {
            if self.edge_producer.get(output_id) == Some(&id) {
                self.edge_producer.remove(output_id);
            }
        }
        for input_id in &node.inputs {
            if let Some(consumers) = self.edge_consumers.get_mut(input_id) {
                consumers.retain(|&c| c != id);
            }
        }

        self.node_names.remove(&node.name);
        self.invalidate();

        Ok(node)
    }

    /// Rewire one input slot of a node to read `tensor`.
    pub fn replace_input(
        &mut self,
        node_id: IrNodeId,
        slot: usize,
        tensor: IrEdgeId,
    ) -> Result<()> {
        self.tensor(tensor)?;
        let node = self.node_mut(node_id)?;
        let old = *node.inputs.get(slot).ok_or_else(|| {
            Error::InvalidGraph(format!("Node {:?} has no input slot {}", node_id, slot))
        })?;
        node.inputs[slot] = tensor;
        let still_reads_old = node.inputs.contains(&old);

        if !still_reads_old && let Some(consumers) = self.edge_consumers.get_mut(&old) {
            consumers.retain(|&c| c != node_id);
        }
        let consumers = self.edge_consumers.entry(tensor).or_default();
        if !consumers.contains(&node_id) {
            consumers.push(node_id);
        }

        self.sync_incoming(node_id)?;
        self.invalidate();
        Ok(())
    }

    /// Rewire every consumer of `old` to read `new` instead.
    ///
    /// Graph output lists are left untouched. Returns the number of input
    /// slots rewired.
    pub fn replace_all_uses(&mut self, old: IrEdgeId, new: IrEdgeId) -> Result<usize> {
        let mut rewired = 0;
        for consumer in self.tensor_consumers(old) {
            let slots: Vec<usize> = self
                .node(consumer)?
                .inputs
                .iter()
                .enumerate()
                .filter(|&(_, &input)| input == old)
                .map(|(slot, _)| slot)
                .collect();
            for slot in slots {
                self.replace_input(consumer, slot, new)?;
                rewired += 1;
            }
        }
        Ok(rewired)
    }

    /// Make a node produce `tensor` in output slot `slot`.
    ///
    /// The previous output tensor loses its producer; `tensor` must not
    /// already have one.
    pub fn set_node_output(
        &mut self,
        node_id: IrNodeId,
        slot: usize,
        tensor: IrEdgeId,
    ) -> Result<()> {
        self.tensor(tensor)?;
        if let Some(existing) = self.tensor_producer(tensor)
            && existing != node_id
        {
            return Err(Error::InvalidGraph(format!(
                "Tensor '{}' is already produced by node {:?}",
                self.edges[tensor.index()].name,
                existing
            )));
        }

        let node = self.node_mut(node_id)?;
        let old = *node.outputs.get(slot).ok_or_else(|| {
            Error::InvalidGraph(format!("Node {:?} has no output slot {}", node_id, slot))
        })?;
        node.outputs[slot] = tensor;

        self.edge_producer.remove(&old);
        self.edge_producer.insert(tensor, node_id);
        for consumer in self.tensor_consumers(old) {
            self.sync_incoming(consumer)?;
        }
        self.sync_outgoing(node_id)?;
        self.invalidate();
        Ok(())
    }

    /// Rebuild the petgraph edges entering `node_id` from its input list.
    fn sync_incoming(&mut self, node_id: IrNodeId) -> Result<()> {
        let stale: Vec<_> = self
            .graph
            .edges_directed(node_id, Direction::Incoming)
            .map(|e| e.id())
            .collect();
        for edge in stale {
            self.graph.remove_edge(edge);
        }

        let inputs = self.node(node_id)?.inputs.clone();
        for input_id in inputs {
            if let Some(&producer) = self.edge_producer.get(&input_id) {
                self.graph.add_edge(producer, node_id, input_id);
            }
        }
        Ok(())
    }

    /// Rebuild the petgraph edges leaving `node_id` from its consumers.
    fn sync_outgoing(&mut self, node_id: IrNodeId) -> Result<()> {
        let stale: Vec<_> = self
            .graph
            .edges_directed(node_id, Direction::Outgoing)
            .map(|e| e.id())
            .collect();
        for edge in stale {
            self.graph.remove_edge(edge);
        }

        let outputs = self.node(node_id)?.outputs.clone();
        for output_id in outputs {
            for consumer in self.tensor_consumers(output_id) {
                let uses = self
                    .node(consumer)?
                    .inputs
                    .iter()
                    .filter(|&&input| input == output_id)
                    .count();
                for _ in 0..uses {
                    self.graph.add_edge(node_id, consumer, output_id);
                }
            }
        }
        Ok(())
    }

    fn invalidate(&mut self) {
        self.topo_cache.take();
    }

    // ── Graph queries ──

    /// Get the topological order of nodes in the graph.
    ///
    /// The order is cached until the next structural mutation.
    pub fn topological_order(&self) -> Vec<IrNodeId> {
        self.topo_cache
            .get_or_init(|| {
                let mut topo = Topo::new(&self.graph);
                let mut order = Vec::with_capacity(self.graph.node_count());
                while let Some(id) = topo.next(&self.graph) {
                    order.push(id);
                }
                order
            })
            .clone()
    }

    /// Check whether `tensor` is computed (transitively) from `node`'s outputs.
    pub fn depends_on(&self, tensor: IrEdgeId, node: IrNodeId) -> bool {
        match self.tensor_producer(tensor) {
            Some(producer) => has_path_connecting(&self.graph, node, producer, None),
            None => false,
        }
    }

    /// Find a node by its name.
    pub fn find_node_by_name(&self, name: &str) -> Result<IrNodeId> {
        self.nodes()
            .find(|(_, node)| node.name == name)
            .map(|(id, _)| id)
            .ok_or_else(|| Error::InvalidGraph(format!("Node '{}' not found", name)))
    }

    /// All nodes of the given operator type, in topological order.
    pub fn nodes_by_op(&self, op_type: &str) -> Vec<IrNodeId> {
        self.topological_order()
            .into_iter()
            .filter(|&id| self.graph.node_weight(id).is_some_and(|n| n.op_type == op_type))
            .collect()
    }

    /// Count nodes per operator type.
    pub fn op_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for (_, node) in self.nodes() {
            *counts.entry(node.op_type.clone()).or_insert(0) += 1;
        }
        counts
    }

    /// Check the structural invariants of the graph.
    ///
    /// Verifies that every referenced tensor exists, producer and consumer
    /// indexes agree with node input/output lists, every consumed tensor is
    /// produced, a graph input, or an initializer, node names are unique and
    /// the graph is acyclic.
    pub fn validate(&self) -> Result<()> {
        let mut names = HashSet::new();
        for (node_id, node) in self.nodes() {
            if !node.name.is_empty() && !names.insert(node.name.as_str()) {
                return Err(Error::InvalidGraph(format!(
                    "Node name '{}' is used more than once",
                    node.name
                )));
            }
            for (slot, &input) in node.inputs.iter().enumerate() {
                let tensor = self.tensor(input).map_err(|_| {
                    Error::InvalidGraph(format!(
                        "Node '{}' input {} refers to a missing tensor {:?}",
                        node.name, slot, input
                    ))
                })?;
                if !self.tensor_consumers(input).contains(&node_id) {
                    return Err(Error::InvalidGraph(format!(
                        "Tensor '{}' does not list consumer '{}'",
                        tensor.name, node.name
                    )));
                }
                if self.tensor_producer(input).is_none()
                    && !tensor.is_initializer()
                    && !self.is_graph_input(input)
                {
                    return Err(Error::InvalidGraph(format!(
                        "Tensor '{}' consumed by '{}' has no producer",
                        tensor.name, node.name
                    )));
                }
            }
            for &output in &node.outputs {
                let tensor = self.tensor(output)?;
                if self.tensor_producer(output) != Some(node_id) {
                    return Err(Error::InvalidGraph(format!(
                        "Tensor '{}' does not list producer '{}'",
                        tensor.name, node.name
                    )));
                }
            }
        }

        for (&tensor_id, &producer) in &self.edge_producer {
            let node = self.node(producer)?;
            if !node.outputs.contains(&tensor_id) {
                return Err(Error::InvalidGraph(format!(
                    "Stale producer entry for tensor '{}'",
                    self.tensor(tensor_id)?.name
                )));
            }
        }
        for (&tensor_id, consumers) in &self.edge_consumers {
            for &consumer in consumers {
                let reads = self
                    .graph
                    .node_weight(consumer)
                    .is_some_and(|n| n.inputs.contains(&tensor_id));
                if !reads {
                    return Err(Error::InvalidGraph(format!(
                        "Stale consumer entry for tensor '{}'",
                        self.tensor(tensor_id)?.name
                    )));
                }
            }
        }

        for &output in &self.outputs {
            let tensor = self.tensor(output)?;
            if self.tensor_producer(output).is_none()
                && !tensor.is_initializer()
                && !self.is_graph_input(output)
            {
                return Err(Error::InvalidGraph(format!(
                    "Graph output '{}' has no producer",
                    tensor.name
                )));
            }
        }

        if is_cyclic_directed(&self.graph) {
            return Err(Error::InvalidGraph("Graph contains a cycle".to_string()));
        }

        Ok(())
    }
}

impl Default for IrGraph {
    fn default() -> Self {
        Self::new()
    }
}

fn unique_name(prefix: &str, taken: impl Fn(&str) -> bool) -> String {
    if !taken(prefix) {
        return prefix.to_string();
    }
    (1..)
        .map(|i| format!("{prefix}_{i}"))
        .find(|name| !taken(name))
        .unwrap_or_else(|| prefix.to_string())
}

// ──────────────────────────────── IrNode ─────────────────────────────────

/// A node in the IR graph: an operator reading and writing tensors.
#[derive(Debug, Clone)]
pub struct IrNode {
    /// Node name (unique within the graph).
    pub name: String,

    /// Operator type (e.g., "Add", "MatMul").
    pub op_type: String,

    /// Operator attributes (e.g., axis, perm, epsilon).
    pub attributes: HashMap<String, AttributeValue>,

    /// Input tensor IDs, in slot order.
    pub inputs: Vec<IrEdgeId>,

    /// Output tensor IDs, in slot order.
    pub outputs: Vec<IrEdgeId>,

    /// The graph node index.
    pub node_index: IrNodeId,
}

impl IrNode {
    /// Create a new operator node.
    pub fn new(op_type: impl Into<String>) -> Self {
        Self {
            name: String::new(),
            op_type: op_type.into(),
            attributes: HashMap::new(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            node_index: NodeIndex::default(),
        }
    }

    /// Set the node name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the input tensors.
    pub fn with_inputs(mut self, inputs: impl IntoIterator<Item = IrEdgeId>) -> Self {
        self.inputs = inputs.into_iter().collect();
        self
    }

    /// Set the output tensors.
    pub fn with_outputs(mut self, outputs: impl IntoIterator<Item = IrEdgeId>) -> Self {
        self.outputs = outputs.into_iter().collect();
        self
    }

    /// Set an attribute.
    pub fn with_attribute(mut self, key: impl Into<String>, value: AttributeValue) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    /// Get the operator type.
    pub fn op_type(&self) -> &str {
        &self.op_type
    }

    /// Add an input tensor.
    pub fn add_input(&mut self, edge_id: IrEdgeId) {
        self.inputs.push(edge_id);
    }

    /// Add an output tensor.
    pub fn add_output(&mut self, edge_id: IrEdgeId) {
        self.outputs.push(edge_id);
    }

    /// Set an attribute.
    pub fn set_attribute(&mut self, key: impl Into<String>, value: AttributeValue) {
        self.attributes.insert(key.into(), value);
    }

    /// Get an attribute.
    pub fn get_attribute(&self, key: &str) -> Option<&AttributeValue> {
        self.attributes.get(key)
    }

    /// Get a typed attribute, falling back to `default` when absent.
    ///
    /// # Errors
    ///
    /// Returns `Error::Attribute` if the attribute has another type.
    pub fn attr_or<T>(&self, key: &str, default: T) -> Result<T>
    where
        T: TryFrom<AttributeValue, Error = Error>,
    {
        match self.attributes.get(key) {
            None => Ok(default),
            Some(value) => T::try_from(value.clone()).map_err(|e| {
                Error::Attribute(format!("'{}' on node '{}': {}", key, self.name, e))
            }),
        }
    }

    /// Get an integer attribute, falling back to `default` when absent or mistyped.
    pub fn attr_i64_or(&self, key: &str, default: i64) -> i64 {
        self.attr_or(key, default).unwrap_or(default)
    }

    /// Get an integer-array attribute.
    pub fn attr_ints(&self, key: &str) -> Option<&[i64]> {
        match self.attributes.get(key) {
            Some(AttributeValue::Ints(v)) => Some(v),
            _ => None,
        }
    }

    /// Input slots that read `tensor`.
    pub fn input_slots(&self, tensor: IrEdgeId) -> Vec<usize> {
        self.inputs
            .iter()
            .enumerate()
            .filter(|&(_, &input)| input == tensor)
            .map(|(slot, _)| slot)
            .collect()
    }

    /// Output slot that writes `tensor`, if any.
    pub fn output_slot(&self, tensor: IrEdgeId) -> Option<usize> {
        self.outputs.iter().position(|&output| output == tensor)
    }
}

// ──────────────────────────────── EdgeData ───────────────────────────────

/// What compile-time data a tensor carries.
#[derive(Debug, Clone)]
pub enum EdgeData {
    /// No compile-time data; value arrives at runtime (graph input or operator output).
    Runtime,

    /// Constant initializer value.
    Initializer(TensorValue),
}

// ──────────────────────────────── IrEdge ─────────────────────────────────

/// A tensor in the IR graph.
#[derive(Debug, Clone)]
pub struct IrEdge {
    /// Tensor name (unique within the graph).
    pub name: String,

    /// Data type.
    pub dtype: DataType,

    /// Shape (static, symbolic, or unknown).
    pub shape: TensorShape,

    /// Compile-time data carried by this tensor.
    pub data: EdgeData,
}

impl IrEdge {
    /// Create a new runtime tensor (no compile-time data).
    pub fn new(name: impl Into<String>, dtype: DataType, shape: TensorShape) -> Self {
        Self {
            name: name.into(),
            dtype,
            shape,
            data: EdgeData::Runtime,
        }
    }

    /// Create a constant tensor whose dtype and shape come from `value`.
    pub fn with_initializer(name: impl Into<String>, value: TensorValue) -> Self {
        Self {
            name: name.into(),
            dtype: value.dtype,
            shape: TensorShape::Static(value.shape.clone()),
            data: EdgeData::Initializer(value),
        }
    }

    /// Check if this tensor is an initializer.
    pub fn is_initializer(&self) -> bool {
        matches!(self.data, EdgeData::Initializer(_))
    }

    /// Get the initializer value, if this tensor holds one.
    pub fn initializer_value(&self) -> Option<&TensorValue> {
        match &self.data {
            EdgeData::Initializer(value) => Some(value),
            EdgeData::Runtime => None,
        }
    }
}
