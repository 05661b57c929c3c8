//! Operator families sharing one propagation rule.
//!
//! These families group operators whose propagation semantics are identical,
//! parameterizing only the operator name.

pub mod binary_elementwise;
pub mod unary_elementwise;

pub use binary_elementwise::BinaryElementwiseRule;
pub use unary_elementwise::{UNARY_ELEMENTWISE_OPS, UnaryElementwiseRule};
