//! Core graph representation and propagation abstractions for hoist.
//!
//! This crate provides the foundational pieces every other hoist crate depends on:
//! - Graph-based IR (`IrGraph`, `IrNode`, `IrEdge`) with producer/consumer indexes
//! - Slice and reshape descriptors describing a motion candidate
//! - The `PropagationRule` trait and `RuleRegistry` for per-operator semantics
//! - The `Pass` trait implemented by graph transformers

pub mod broadcast;
pub mod context;
pub mod descriptor;
pub mod ir;
pub mod pass;
pub mod registry;
pub mod rule;
pub mod types;

// Re-export commonly used types
pub use broadcast::broadcast_shape;
pub use context::RuleCtx;
pub use descriptor::{
    IndexSource, LeadingCollapse, OperandReshape, ReshapeDescriptor, ReshapeDim,
    SliceCardinality, SliceDescriptor,
};
pub use ir::{EdgeData, IrEdge, IrEdgeId, IrGraph, IrNode, IrNodeId};
pub use pass::Pass;
pub use registry::RuleRegistry;
pub use rule::{Branch, Propagation, PropagationPlan, PropagationRule};
pub use types::{AttributeValue, DataType, SymbolicDim, TensorData, TensorShape, TensorValue};

/// Result type using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for hoist operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid graph structure: {0}")]
    InvalidGraph(String),

    #[error("Attribute error: {0}")]
    Attribute(String),

    #[error("Shape error: {0}")]
    Shape(String),

    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    #[error("Registration error: {0}")]
    Registration(String),

    #[error("Pass '{pass}' failed: {source}")]
    Pass {
        pass: String,
        #[source]
        source: Box<Error>,
    },
}
