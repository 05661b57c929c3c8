//! Common test utilities for optimizer integration tests.
//!
//! Provides a small graph builder, seeded random inputs, and an f32 reference
//! interpreter used to check that an optimized graph computes the same values
//! as the original one.

#![allow(dead_code)]

use std::collections::HashMap;

use hoist_core::{
    AttributeValue, DataType, IrEdge, IrEdgeId, IrGraph, IrNode, ReshapeDescriptor, TensorData,
    TensorShape, TensorValue, broadcast_shape,
};
use hoist_optimizer::{ApplyReport, OptimizerConfig, optimize};
use rand::prelude::*;

/// Default comparison tolerance.
pub const TOLERANCE: f32 = 1e-4;

/// Tolerance for graphs where a gather moves ahead of a matmul.
pub const MATMUL_TOLERANCE: f32 = 2e-3;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_test_writer()
        .try_init();
}

// ================================================================================
// Graph builder
// ================================================================================

/// Builds f32 test graphs with deterministic weights.
pub struct GraphBuilder {
    graph: IrGraph,
    rng: StdRng,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self {
            graph: IrGraph::new(),
            rng: StdRng::seed_from_u64(7),
        }
    }

    /// Add an f32 graph input.
    pub fn input(&mut self, name: &str, dims: &[usize]) -> IrEdgeId {
        self.graph
            .add_input(IrEdge::new(name, DataType::F32, TensorShape::Static(dims.to_vec())))
            .unwrap()
    }

    /// Add a random f32 initializer.
    pub fn weight(&mut self, name: &str, dims: &[usize]) -> IrEdgeId {
        let data = random_values(&mut self.rng, dims.iter().product());
        let value = TensorValue::new(TensorData::F32(data), dims.to_vec()).unwrap();
        self.graph.add_initializer(name, value).unwrap()
    }

    /// Add a constant initializer.
    pub fn constant(&mut self, name: &str, value: TensorValue) -> IrEdgeId {
        self.graph.add_initializer(name, value).unwrap()
    }

    /// Add a node without attributes; returns its output tensor.
    pub fn op(&mut self, op_type: &str, inputs: &[IrEdgeId], dims: &[usize]) -> IrEdgeId {
        self.op_with(op_type, inputs, &[], dims)
    }

    /// Add a node named after its lowercased operator type (`add`, `add_1`, ...).
    pub fn op_with(
        &mut self,
        op_type: &str,
        inputs: &[IrEdgeId],
        attributes: &[(&str, AttributeValue)],
        dims: &[usize],
    ) -> IrEdgeId {
        let name = self.graph.unique_node_name(&op_type.to_lowercase());
        let output_name = self.graph.unique_tensor_name(&format!("{name}_out"));
        let output = self
            .graph
            .add_edge(IrEdge::new(
                output_name,
                DataType::F32,
                TensorShape::Static(dims.to_vec()),
            ))
            .unwrap();

        let mut node = IrNode::new(op_type)
            .with_name(name)
            .with_inputs(inputs.iter().copied())
            .with_outputs([output]);
        for (key, value) in attributes {
            node.set_attribute(*key, value.clone());
        }
        self.graph.add_node(node).unwrap();
        output
    }

    pub fn output(&mut self, id: IrEdgeId) {
        self.graph.add_output(id).unwrap();
    }

    pub fn build(self) -> IrGraph {
        self.graph.validate().unwrap();
        self.graph
    }
}

/// Shorthand for an integer attribute.
pub fn int(value: i64) -> AttributeValue {
    AttributeValue::Int(value)
}

/// Shorthand for an integer-list attribute.
pub fn ints(values: &[i64]) -> AttributeValue {
    AttributeValue::Ints(values.to_vec())
}

/// Producer node of the `slot`-th input of the node called `name`.
pub fn input_producer<'a>(graph: &'a IrGraph, name: &str, slot: usize) -> Option<&'a IrNode> {
    let node = graph.node(graph.find_node_by_name(name).ok()?).ok()?;
    let producer = graph.tensor_producer(*node.inputs.get(slot)?)?;
    graph.node(producer).ok()
}

/// Operator types of the consumers of the node called `name`.
pub fn consumer_ops(graph: &IrGraph, name: &str) -> Vec<String> {
    let node = graph.node(graph.find_node_by_name(name).unwrap()).unwrap();
    graph
        .tensor_consumers(node.outputs[0])
        .into_iter()
        .map(|id| graph.node(id).unwrap().op_type.clone())
        .collect()
}

// ================================================================================
// Random inputs
// ================================================================================

fn random_values(rng: &mut StdRng, len: usize) -> Vec<f32> {
    (0..len)
        .map(|_| (rng.next_u32() as f64 / u32::MAX as f64) as f32 * 2.0 - 1.0)
        .collect()
}

/// Random values in `[-1, 1]` for every graph input.
pub fn random_inputs(graph: &IrGraph, seed: u64) -> HashMap<String, Array> {
    let mut rng = StdRng::seed_from_u64(seed);
    graph
        .inputs
        .iter()
        .map(|&id| {
            let tensor = graph.tensor(id).unwrap();
            let dims = tensor.shape.as_static().expect("static input shape").to_vec();
            let data = random_values(&mut rng, dims.iter().product());
            (tensor.name.clone(), Array::new(dims, data))
        })
        .collect()
}

// ================================================================================
// Equivalence harness
// ================================================================================

/// Optimize a fresh copy of the graph and check it against the original on
/// random inputs. Returns the optimized graph and the optimizer report.
pub fn assert_equivalent(
    build: impl Fn() -> IrGraph,
    config: &OptimizerConfig,
    tolerance: f32,
) -> (IrGraph, ApplyReport) {
    init_tracing();

    let before = build();
    let mut after = build();
    let report = optimize(&mut after, config).unwrap();
    after.validate().unwrap();

    for seed in [1, 2] {
        let inputs = random_inputs(&before, seed);
        let expected = run(&before, &inputs);
        let actual = run(&after, &inputs);

        assert_eq!(expected.len(), actual.len());
        for (name, want) in &expected {
            let got = actual
                .get(name)
                .unwrap_or_else(|| panic!("missing output '{name}'"));
            assert_close(name, got, want, tolerance);
        }
    }

    (after, report)
}

pub fn assert_close(name: &str, got: &Array, want: &Array, tolerance: f32) {
    assert_eq!(got.dims, want.dims, "shape mismatch for '{name}'");
    for (i, (&g, &w)) in got.data.iter().zip(&want.data).enumerate() {
        assert!(
            (g - w).abs() <= tolerance + tolerance * w.abs(),
            "'{name}'[{i}]: got {g}, want {w}"
        );
    }
}

// ================================================================================
// Reference interpreter
// ================================================================================

/// A dense f32 tensor.
#[derive(Debug, Clone, PartialEq)]
pub struct Array {
    pub dims: Vec<usize>,
    pub data: Vec<f32>,
}

impl Array {
    pub fn new(dims: Vec<usize>, data: Vec<f32>) -> Self {
        assert_eq!(dims.iter().product::<usize>(), data.len());
        Self { dims, data }
    }

    fn from_value(value: &TensorValue) -> Self {
        let data = match &value.data {
            TensorData::F32(v) => v.clone(),
            TensorData::I64(v) => v.iter().map(|&x| x as f32).collect(),
            TensorData::I32(v) => v.iter().map(|&x| x as f32).collect(),
            TensorData::U8(v) => v.iter().map(|&x| x as f32).collect(),
            TensorData::Bool(v) => v.iter().map(|&x| if x { 1.0 } else { 0.0 }).collect(),
        };
        Self::new(value.shape.clone(), data)
    }

    fn map(&self, f: impl Fn(f32) -> f32) -> Self {
        Self::new(self.dims.clone(), self.data.iter().map(|&x| f(x)).collect())
    }

    fn to_i64(&self) -> Vec<i64> {
        self.data.iter().map(|&x| x as i64).collect()
    }
}

/// Evaluate every graph output.
///
/// Also checks every static tensor shape recorded in the graph against the
/// computed value.
pub fn run(graph: &IrGraph, inputs: &HashMap<String, Array>) -> HashMap<String, Array> {
    let mut values: HashMap<IrEdgeId, Array> = HashMap::new();
    for &id in &graph.inputs {
        let name = &graph.tensor(id).unwrap().name;
        values.insert(id, inputs[name].clone());
    }
    for i in 0..graph.tensor_count() {
        let id = IrEdgeId::new(i);
        if let Some(value) = graph.initializer_value(id) {
            values.insert(id, Array::from_value(value));
        }
    }

    for node_id in graph.topological_order() {
        let node = graph.node(node_id).unwrap();
        let result = {
            let args: Vec<&Array> = node.inputs.iter().map(|id| &values[id]).collect();
            eval(graph, node, &args)
        };
        let output = graph.tensor(node.outputs[0]).unwrap();
        if let Some(dims) = output.shape.as_static() {
            assert_eq!(
                dims,
                result.dims.as_slice(),
                "recorded shape of '{}' (from {} '{}') is wrong",
                output.name,
                node.op_type,
                node.name
            );
        }
        values.insert(node.outputs[0], result);
    }

    graph
        .outputs
        .iter()
        .map(|id| (graph.tensor(*id).unwrap().name.clone(), values[id].clone()))
        .collect()
}

fn eval(graph: &IrGraph, node: &IrNode, args: &[&Array]) -> Array {
    match node.op_type.as_str() {
        "Add" => broadcast_binary(args[0], args[1], |a, b| a + b),
        "Sub" => broadcast_binary(args[0], args[1], |a, b| a - b),
        "Mul" => broadcast_binary(args[0], args[1], |a, b| a * b),
        "Div" => broadcast_binary(args[0], args[1], |a, b| a / b),
        "Max" => broadcast_binary(args[0], args[1], f32::max),
        "Min" => broadcast_binary(args[0], args[1], f32::min),
        "Relu" => args[0].map(|x| x.max(0.0)),
        "Neg" => args[0].map(|x| -x),
        "Tanh" => args[0].map(f32::tanh),
        "Sigmoid" => args[0].map(|x| 1.0 / (1.0 + (-x).exp())),
        "Exp" => args[0].map(f32::exp),
        "Gelu" => args[0].map(|x| {
            let c = (2.0 / std::f32::consts::PI).sqrt();
            0.5 * x * (1.0 + (c * (x + 0.044715 * x * x * x)).tanh())
        }),
        "Identity" | "Cast" | "Dropout" => args[0].clone(),
        "MatMul" => matmul(args[0], args[1]),
        "LayerNormalization" => layer_norm(node, args, false),
        "SimplifiedLayerNormalization" => layer_norm(node, args, true),
        "Softmax" => softmax(args[0], node.attr_i64_or("axis", -1)),
        "Gather" => gather(args[0], args[1], node.attr_i64_or("axis", 0)),
        "GatherND" => gather_nd(args[0], args[1], node.attr_i64_or("batch_dims", 0) as usize),
        "Reshape" => {
            let target = match graph.initializer_value(node.inputs[1]) {
                Some(value) => value.to_i64_vec().unwrap(),
                None => args[1].to_i64(),
            };
            let dims = ReshapeDescriptor::from_i64(&target)
                .unwrap()
                .resolve(&args[0].dims)
                .unwrap();
            Array::new(dims, args[0].data.clone())
        }
        "Unsqueeze" => {
            let rank = args[0].dims.len() + node.attr_ints("axes").unwrap().len();
            let mut axes: Vec<usize> = node
                .attr_ints("axes")
                .unwrap()
                .iter()
                .map(|&a| normalize(a, rank))
                .collect();
            axes.sort_unstable();
            let mut dims = args[0].dims.clone();
            for axis in axes {
                dims.insert(axis, 1);
            }
            Array::new(dims, args[0].data.clone())
        }
        "Squeeze" => {
            let rank = args[0].dims.len();
            let mut axes: Vec<usize> = node
                .attr_ints("axes")
                .unwrap()
                .iter()
                .map(|&a| normalize(a, rank))
                .collect();
            axes.sort_unstable_by(|a, b| b.cmp(a));
            let mut dims = args[0].dims.clone();
            for axis in axes {
                assert_eq!(dims[axis], 1, "squeezing a non-unit axis");
                dims.remove(axis);
            }
            Array::new(dims, args[0].data.clone())
        }
        "Transpose" => {
            let rank = args[0].dims.len();
            let perm: Vec<usize> = match node.attr_ints("perm") {
                Some(perm) => perm.iter().map(|&p| p as usize).collect(),
                None => (0..rank).rev().collect(),
            };
            transpose(args[0], &perm)
        }
        other => panic!("reference interpreter does not support {other}"),
    }
}

fn normalize(axis: i64, rank: usize) -> usize {
    if axis < 0 {
        (axis + rank as i64) as usize
    } else {
        axis as usize
    }
}

fn strides(dims: &[usize]) -> Vec<usize> {
    let mut strides = vec![1; dims.len()];
    for i in (0..dims.len().saturating_sub(1)).rev() {
        strides[i] = strides[i + 1] * dims[i + 1];
    }
    strides
}

fn unravel(mut index: usize, dims: &[usize]) -> Vec<usize> {
    let mut position = vec![0; dims.len()];
    for i in (0..dims.len()).rev() {
        position[i] = index % dims[i];
        index /= dims[i];
    }
    position
}

/// Offset into an operand of shape `dims` broadcast to a result position.
fn broadcast_offset(position: &[usize], dims: &[usize]) -> usize {
    let strides = strides(dims);
    let lead = position.len() - dims.len();
    dims.iter()
        .enumerate()
        .map(|(j, &d)| if d == 1 { 0 } else { position[lead + j] * strides[j] })
        .sum()
}

fn broadcast_binary(a: &Array, b: &Array, f: impl Fn(f32, f32) -> f32) -> Array {
    let dims = broadcast_shape(&a.dims, &b.dims).unwrap();
    let data = (0..dims.iter().product())
        .map(|i| {
            let position = unravel(i, &dims);
            f(
                a.data[broadcast_offset(&position, &a.dims)],
                b.data[broadcast_offset(&position, &b.dims)],
            )
        })
        .collect();
    Array::new(dims, data)
}

fn matmul(a: &Array, b: &Array) -> Array {
    let (ra, rb) = (a.dims.len(), b.dims.len());
    assert!(ra >= 2 && rb >= 2, "reference MatMul needs rank >= 2");
    let (m, k) = (a.dims[ra - 2], a.dims[ra - 1]);
    let (k2, n) = (b.dims[rb - 2], b.dims[rb - 1]);
    assert_eq!(k, k2, "MatMul inner dims");

    let batch = broadcast_shape(&a.dims[..ra - 2], &b.dims[..rb - 2]).unwrap();
    let mut data = Vec::with_capacity(batch.iter().product::<usize>() * m * n);
    for bi in 0..batch.iter().product() {
        let position = unravel(bi, &batch);
        let a_off = broadcast_offset(&position, &a.dims[..ra - 2]) * m * k;
        let b_off = broadcast_offset(&position, &b.dims[..rb - 2]) * k * n;
        for i in 0..m {
            for j in 0..n {
                let sum: f32 = (0..k)
                    .map(|p| a.data[a_off + i * k + p] * b.data[b_off + p * n + j])
                    .sum();
                data.push(sum);
            }
        }
    }

    let mut dims = batch;
    dims.extend([m, n]);
    Array::new(dims, data)
}

fn layer_norm(node: &IrNode, args: &[&Array], simplified: bool) -> Array {
    let x = args[0];
    let axis = normalize(node.attr_i64_or("axis", -1), x.dims.len());
    let epsilon = match node.get_attribute("epsilon") {
        Some(AttributeValue::Float(eps)) => *eps,
        _ => 1e-5,
    };
    let inner: usize = x.dims[axis..].iter().product();
    let scale = args[1];
    let bias = args.get(2).filter(|_| !simplified);
    assert_eq!(scale.data.len(), inner, "scale must match the normalized dims");

    let mut data = Vec::with_capacity(x.data.len());
    for row in x.data.chunks(inner) {
        let n = inner as f32;
        let (center, denom) = if simplified {
            let mean_sq = row.iter().map(|v| v * v).sum::<f32>() / n;
            (0.0, (mean_sq + epsilon).sqrt())
        } else {
            let mean = row.iter().sum::<f32>() / n;
            let var = row.iter().map(|v| (v - mean) * (v - mean)).sum::<f32>() / n;
            (mean, (var + epsilon).sqrt())
        };
        for (j, &v) in row.iter().enumerate() {
            let mut y = (v - center) / denom * scale.data[j];
            if let Some(bias) = bias {
                y += bias.data[j];
            }
            data.push(y);
        }
    }
    Array::new(x.dims.clone(), data)
}

fn softmax(x: &Array, axis: i64) -> Array {
    let axis = normalize(axis, x.dims.len());
    let len = x.dims[axis];
    let inner: usize = x.dims[axis + 1..].iter().product();
    let outer: usize = x.dims[..axis].iter().product();

    let mut data = x.data.clone();
    for o in 0..outer {
        for i in 0..inner {
            let at = |l: usize| (o * len + l) * inner + i;
            let max = (0..len).map(|l| x.data[at(l)]).fold(f32::NEG_INFINITY, f32::max);
            let sum: f32 = (0..len).map(|l| (x.data[at(l)] - max).exp()).sum();
            for l in 0..len {
                data[at(l)] = (x.data[at(l)] - max).exp() / sum;
            }
        }
    }
    Array::new(x.dims.clone(), data)
}

fn gather(x: &Array, indices: &Array, axis: i64) -> Array {
    let axis = normalize(axis, x.dims.len());
    let len = x.dims[axis];
    let inner: usize = x.dims[axis + 1..].iter().product();
    let outer: usize = x.dims[..axis].iter().product();
    let picks: Vec<usize> = indices
        .to_i64()
        .into_iter()
        .map(|i| if i < 0 { (i + len as i64) as usize } else { i as usize })
        .collect();

    let mut data = Vec::with_capacity(outer * picks.len() * inner);
    for o in 0..outer {
        for &t in &picks {
            let start = (o * len + t) * inner;
            data.extend_from_slice(&x.data[start..start + inner]);
        }
    }

    let mut dims = x.dims[..axis].to_vec();
    dims.extend(&indices.dims);
    dims.extend(&x.dims[axis + 1..]);
    Array::new(dims, data)
}

/// GatherND with single-coordinate indices (last index dim of 1).
fn gather_nd(x: &Array, indices: &Array, batch_dims: usize) -> Array {
    assert_eq!(indices.dims.last(), Some(&1), "only single-coordinate lookups");
    let len = x.dims[batch_dims];
    let inner: usize = x.dims[batch_dims + 1..].iter().product();
    let batches: usize = x.dims[..batch_dims].iter().product();
    let picks = indices.to_i64();
    let per_batch = picks.len() / batches;

    let mut data = Vec::with_capacity(picks.len() * inner);
    for b in 0..batches {
        for &i in &picks[b * per_batch..(b + 1) * per_batch] {
            let t = if i < 0 { (i + len as i64) as usize } else { i as usize };
            let start = (b * len + t) * inner;
            data.extend_from_slice(&x.data[start..start + inner]);
        }
    }

    let mut dims = indices.dims[..indices.dims.len() - 1].to_vec();
    dims.extend(&x.dims[batch_dims + 1..]);
    Array::new(dims, data)
}

fn transpose(x: &Array, perm: &[usize]) -> Array {
    let dims: Vec<usize> = perm.iter().map(|&p| x.dims[p]).collect();
    let in_strides = strides(&x.dims);
    let data = (0..x.data.len())
        .map(|i| {
            let position = unravel(i, &dims);
            let offset: usize = position
                .iter()
                .zip(perm)
                .map(|(&pos, &p)| pos * in_strides[p])
                .sum();
            x.data[offset]
        })
        .collect();
    Array::new(dims, data)
}
