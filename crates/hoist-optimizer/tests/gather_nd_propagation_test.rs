//! End-to-end tests for upstream GatherND propagation.
//!
//! Every graph selects 4 positions per batch entry from a `[2,16,32]`
//! activation, the way masked-LM heads pick the masked tokens.

mod common;

use common::*;
use hoist_core::{IrEdgeId, IrGraph, IrNode, TensorData, TensorShape, TensorValue};
use hoist_optimizer::OptimizerConfig;

/// Positions `[2,4,1]`, including a negative index.
fn positions(b: &mut GraphBuilder) -> IrEdgeId {
    let value = TensorValue::new(
        TensorData::I64(vec![0, 3, 7, -1, 15, 2, 2, 9]),
        vec![2, 4, 1],
    )
    .unwrap();
    b.constant("positions", value)
}

/// The only GatherND in the graph.
fn gather_nd(graph: &IrGraph) -> &IrNode {
    let nodes = graph.nodes_by_op("GatherND");
    assert_eq!(nodes.len(), 1, "expected a single GatherND");
    graph.node(nodes[0]).unwrap()
}

fn data_input_name(graph: &IrGraph, node: &IrNode) -> String {
    graph.tensor(node.inputs[0]).unwrap().name.clone()
}

/// x:[2,16,32] -> Gelu -> GatherND(batch_dims=1) -> out:[2,4,32]
fn gelu_then_select() -> IrGraph {
    let mut b = GraphBuilder::new();
    let x = b.input("x", &[2, 16, 32]);
    let pos = positions(&mut b);
    let g = b.op("Gelu", &[x], &[2, 16, 32]);
    let out = b.op_with("GatherND", &[g, pos], &[("batch_dims", int(1))], &[2, 4, 32]);
    b.output(out);
    b.build()
}

#[test]
fn test_gather_nd_moves_above_gelu() {
    let (graph, report) =
        assert_equivalent(gelu_then_select, &OptimizerConfig::default(), TOLERANCE);
    assert_eq!(report.changes("upstream_gather"), 1);

    let node = gather_nd(&graph);
    assert_eq!(data_input_name(&graph, node), "x");
    assert_eq!(consumer_ops(&graph, &node.name), vec!["Gelu"]);
}

/// x:[2,16,32] + y -> GatherND(batch_dims=1) -> out:[2,4,32]
fn add_then_select(y_dims: &'static [usize]) -> impl Fn() -> IrGraph {
    move || {
        let mut b = GraphBuilder::new();
        let x = b.input("x", &[2, 16, 32]);
        let y = b.input("y", y_dims);
        let pos = positions(&mut b);
        let s = b.op("Add", &[x, y], &[2, 16, 32]);
        let out = b.op_with("GatherND", &[s, pos], &[("batch_dims", int(1))], &[2, 4, 32]);
        b.output(out);
        b.build()
    }
}

#[test]
fn test_gather_nd_moves_onto_both_add_operands() {
    let (graph, _) =
        assert_equivalent(add_then_select(&[2, 16, 32]), &OptimizerConfig::default(), TOLERANCE);

    let mut read: Vec<String> = graph
        .nodes_by_op("GatherND")
        .into_iter()
        .map(|id| {
            let node = graph.node(id).unwrap();
            assert_eq!(consumer_ops(&graph, &node.name), vec!["Add"]);
            data_input_name(&graph, node)
        })
        .collect();
    read.sort();
    assert_eq!(read, vec!["x", "y"]);
}

#[test]
fn test_gather_nd_skips_per_feature_operand() {
    let (graph, _) =
        assert_equivalent(add_then_select(&[32]), &OptimizerConfig::default(), TOLERANCE);

    let node = gather_nd(&graph);
    assert_eq!(data_input_name(&graph, node), "x");
    assert_eq!(consumer_ops(&graph, &node.name), vec!["Add"]);
}

#[test]
fn test_gather_nd_blocked_by_batch_broadcast() {
    let (graph, report) =
        assert_equivalent(add_then_select(&[1, 16, 32]), &OptimizerConfig::default(), TOLERANCE);
    assert!(!report.changed);

    // The lookup still produces the graph output.
    let node = gather_nd(&graph);
    assert!(graph.is_graph_output(node.outputs[0]));
    assert_eq!(input_producer(&graph, &node.name, 0).unwrap().op_type, "Add");
}

#[test]
fn test_gather_nd_moves_above_layer_norm() {
    fn build() -> IrGraph {
        let mut b = GraphBuilder::new();
        let x = b.input("x", &[2, 16, 32]);
        let scale = b.weight("scale", &[32]);
        let bias = b.weight("bias", &[32]);
        let pos = positions(&mut b);
        let n = b.op("LayerNormalization", &[x, scale, bias], &[2, 16, 32]);
        let out = b.op_with("GatherND", &[n, pos], &[("batch_dims", int(1))], &[2, 4, 32]);
        b.output(out);
        b.build()
    }

    let (graph, _) = assert_equivalent(build, &OptimizerConfig::default(), TOLERANCE);
    let node = gather_nd(&graph);
    assert_eq!(data_input_name(&graph, node), "x");
    assert_eq!(consumer_ops(&graph, &node.name), vec!["LayerNormalization"]);
}

#[test]
fn test_gather_nd_moves_above_matmul() {
    fn build() -> IrGraph {
        let mut b = GraphBuilder::new();
        let x = b.input("x", &[2, 16, 32]);
        let w = b.weight("w", &[32, 8]);
        let pos = positions(&mut b);
        let m = b.op("MatMul", &[x, w], &[2, 16, 8]);
        let out = b.op_with("GatherND", &[m, pos], &[("batch_dims", int(1))], &[2, 4, 8]);
        b.output(out);
        b.build()
    }

    let (graph, _) = assert_equivalent(build, &OptimizerConfig::default(), MATMUL_TOLERANCE);
    let node = gather_nd(&graph);
    assert_eq!(data_input_name(&graph, node), "x");
    assert_eq!(consumer_ops(&graph, &node.name), vec!["MatMul"]);
    assert!(input_producer(&graph, "matmul", 1).is_none());
}

/// A masked-LM prediction head over a shared encoder output.
///
/// Graph structure:
/// ```text
/// x:[2,16,32] -> LayerNorm -> n -> MatMul(w:[32,64]) -> Add(b:[64]) -> Gelu -> LayerNorm
///             -> GatherND(positions, batch_dims=1) -> out:[2,4,64]
/// n -> Relu -> hidden:[2,16,32]
/// ```
fn prediction_head() -> IrGraph {
    let mut b = GraphBuilder::new();
    let x = b.input("x", &[2, 16, 32]);
    let scale = b.weight("ln_scale", &[32]);
    let beta = b.weight("ln_bias", &[32]);
    let w = b.weight("w", &[32, 64]);
    let bias = b.weight("bias", &[64]);
    let head_scale = b.weight("head_scale", &[64]);
    let head_beta = b.weight("head_bias", &[64]);
    let pos = positions(&mut b);

    let n = b.op("LayerNormalization", &[x, scale, beta], &[2, 16, 32]);
    let m = b.op("MatMul", &[n, w], &[2, 16, 64]);
    let s = b.op("Add", &[m, bias], &[2, 16, 64]);
    let g = b.op("Gelu", &[s], &[2, 16, 64]);
    let h = b.op("LayerNormalization", &[g, head_scale, head_beta], &[2, 16, 64]);
    let out = b.op_with("GatherND", &[h, pos], &[("batch_dims", int(1))], &[2, 4, 64]);
    b.output(out);

    let hidden = b.op("Relu", &[n], &[2, 16, 32]);
    b.output(hidden);
    b.build()
}

#[test]
fn test_gather_nd_stops_at_shared_encoder_output() {
    let (graph, report) =
        assert_equivalent(prediction_head, &OptimizerConfig::default(), MATMUL_TOLERANCE);
    assert!(report.converged);

    let node = gather_nd(&graph);
    assert_eq!(
        input_producer(&graph, &node.name, 0).unwrap().name,
        "layernormalization"
    );
    assert_eq!(consumer_ops(&graph, &node.name), vec!["MatMul"]);

    // The head now runs on the selected positions only.
    let head = graph
        .node(graph.find_node_by_name("layernormalization_1").unwrap())
        .unwrap();
    assert!(graph.is_graph_output(head.outputs[0]));
    assert_eq!(
        graph.tensor(head.outputs[0]).unwrap().shape,
        TensorShape::Static(vec![2, 4, 64])
    );
}
