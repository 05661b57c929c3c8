//! Propagation rule trait and the plans rules return.

use crate::context::RuleCtx;
use crate::descriptor::{ReshapeDescriptor, SliceDescriptor};
use crate::types::{AttributeValue, TensorValue};

/// One producer input that receives a remapped descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct Branch<D> {
    /// Producer input slot.
    pub input: usize,

    /// Descriptor in that input's axis space.
    pub descriptor: D,
}

/// A successful rule answer: how to rewrite the producer.
#[derive(Debug, Clone, PartialEq)]
pub struct PropagationPlan<D> {
    /// Inputs that get a new descriptor node. Inputs not listed stay wired as before.
    pub branches: Vec<Branch<D>>,

    /// Scalar slices only: keep the sliced axis as size 1 on every branch (via
    /// `Unsqueeze`) and squeeze it after the producer.
    pub keep_rank: bool,

    /// Constant inputs of the producer to replace (e.g. a reshape target).
    pub input_rewrites: Vec<(usize, TensorValue)>,

    /// Attributes of the producer to overwrite (e.g. a normalization axis).
    pub attribute_rewrites: Vec<(String, AttributeValue)>,
}

impl<D> PropagationPlan<D> {
    pub fn new() -> Self {
        Self {
            branches: Vec::new(),
            keep_rank: false,
            input_rewrites: Vec::new(),
            attribute_rewrites: Vec::new(),
        }
    }

    /// Add a branch on producer input `input`.
    pub fn branch(mut self, input: usize, descriptor: D) -> Self {
        self.branches.push(Branch { input, descriptor });
        self
    }

    /// Request rank-preserving slices.
    pub fn keep_rank(mut self, keep_rank: bool) -> Self {
        self.keep_rank = keep_rank;
        self
    }

    /// Replace constant input `input` with `value`.
    pub fn rewrite_input(mut self, input: usize, value: TensorValue) -> Self {
        self.input_rewrites.push((input, value));
        self
    }

    /// Overwrite attribute `key`.
    pub fn rewrite_attribute(mut self, key: impl Into<String>, value: AttributeValue) -> Self {
        self.attribute_rewrites.push((key.into(), value));
        self
    }
}

impl<D> Default for PropagationPlan<D> {
    fn default() -> Self {
        Self::new()
    }
}

/// The answer of a propagation rule.
#[derive(Debug, Clone, PartialEq)]
pub enum Propagation<D> {
    /// The descriptor cannot cross the producer.
    Blocked(String),

    /// The descriptor crosses the producer as described by the plan.
    Propagate(PropagationPlan<D>),
}

impl<D> Propagation<D> {
    pub fn blocked(reason: impl Into<String>) -> Self {
        Propagation::Blocked(reason.into())
    }

    pub fn is_blocked(&self) -> bool {
        matches!(self, Propagation::Blocked(_))
    }

    /// Wrap a plan, treating a plan without branches as blocked.
    pub fn from_plan(plan: PropagationPlan<D>, reason: impl Into<String>) -> Self {
        if plan.branches.is_empty() {
            Propagation::Blocked(reason.into())
        } else {
            Propagation::Propagate(plan)
        }
    }
}

/// Declarative propagation semantics for one operator type.
///
/// Rules are pure: they inspect the producer through `RuleCtx` and never touch
/// the graph. A rule that does not support a descriptor kind keeps the default
/// implementation, which blocks.
///
/// # Example
///
/// ```ignore
/// struct ReluRule;
///
/// impl PropagationRule for ReluRule {
///     fn name(&self) -> &str {
///         "Relu"
///     }
///
///     fn slice(&self, _ctx: &RuleCtx, slice: &SliceDescriptor) -> Propagation<SliceDescriptor> {
///         Propagation::Propagate(PropagationPlan::new().branch(0, slice.clone()))
///     }
/// }
/// ```
pub trait PropagationRule: Send + Sync {
    /// Operator name (used for logging).
    fn name(&self) -> &str;

    /// Move a slice of the producer's output onto its inputs.
    fn slice(&self, ctx: &RuleCtx, slice: &SliceDescriptor) -> Propagation<SliceDescriptor> {
        let _ = (ctx, slice);
        Propagation::blocked(format!("{} does not propagate slices", self.name()))
    }

    /// Move a reshape of the producer's output onto its inputs.
    fn reshape(
        &self,
        ctx: &RuleCtx,
        reshape: &ReshapeDescriptor,
    ) -> Propagation<ReshapeDescriptor> {
        let _ = (ctx, reshape);
        Propagation::blocked(format!("{} does not propagate reshapes", self.name()))
    }
}
