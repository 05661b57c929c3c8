//! Per-operator propagation rules.

pub mod matmul;
pub mod normalization;
pub mod shape;
pub mod softmax;

pub use matmul::MatMulRule;
pub use normalization::LayerNormRule;
pub use shape::{ReshapeRule, TransposeRule};
pub use softmax::SoftmaxRule;
