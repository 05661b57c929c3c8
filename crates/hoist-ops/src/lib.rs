//! Built-in propagation rules for hoist.
//!
//! Each rule describes how a slice (Gather) or a reshape of an operator's
//! output can be moved onto its inputs.
//!
//! # Operator Families
//!
//! - **Binary elementwise**: Add, Sub, Mul, Div, Pow, Max, Min
//! - **Unary elementwise**: Cast, Relu, Gelu, Tanh, Sqrt, Neg, Dropout, ...
//!
//! # Individual Operators
//!
//! - Matrix operations (MatMul)
//! - Normalization (LayerNormalization, SimplifiedLayerNormalization)
//! - Activation (Softmax)
//! - Shape manipulation (Transpose, Reshape)

pub mod families;
pub mod operators;

mod helpers;
mod registry;

// Re-export rule types
pub use families::{BinaryElementwiseRule, UNARY_ELEMENTWISE_OPS, UnaryElementwiseRule};
pub use operators::{LayerNormRule, MatMulRule, ReshapeRule, SoftmaxRule, TransposeRule};
pub use registry::default_rule_registry;
