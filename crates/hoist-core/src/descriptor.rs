//! Typed descriptions of the operators that move upstream.
//!
//! A `SliceDescriptor` describes a Gather along one axis; a `ReshapeDescriptor`
//! describes a Reshape target. Descriptors carry no graph ownership and are
//! remapped into each producer input's axis space by the propagation rules.

use crate::ir::IrEdgeId;
use crate::types::{SymbolicDim, TensorShape, TensorValue};
use crate::{Error, Result};

// ──────────────────────────────── Slice ──────────────────────────────────

/// How many positions a slice selects along its axis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SliceCardinality {
    /// A single index; the axis is dropped.
    Scalar,

    /// A list of indices; the axis is kept with the given extent.
    Range(SymbolicDim),
}

/// Where the selected indices come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexSource {
    /// Indices are a constant initializer.
    Constant { tensor: IrEdgeId, indices: Vec<i64> },

    /// Indices are computed at runtime.
    Runtime(IrEdgeId),
}

impl IndexSource {
    /// The tensor holding the indices.
    pub fn tensor(&self) -> IrEdgeId {
        match self {
            IndexSource::Constant { tensor, .. } => *tensor,
            IndexSource::Runtime(tensor) => *tensor,
        }
    }
}

/// A gather along a single, non-negative axis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SliceDescriptor {
    pub axis: usize,
    pub cardinality: SliceCardinality,
    pub indices: IndexSource,

    /// Leading dims the indices are batched over (GatherND `batch_dims`).
    ///
    /// A batched slice only applies to tensors that start with exactly these
    /// dims and select along the axis right after them.
    pub batch: Vec<SymbolicDim>,
}

impl SliceDescriptor {
    pub fn new(axis: usize, cardinality: SliceCardinality, indices: IndexSource) -> Self {
        Self {
            axis,
            cardinality,
            indices,
            batch: Vec::new(),
        }
    }

    /// Batch the indices over `batch` leading dims.
    pub fn with_batch(mut self, batch: Vec<SymbolicDim>) -> Self {
        self.batch = batch;
        self
    }

    /// Whether the indices are batched over leading dims.
    pub fn is_batched(&self) -> bool {
        !self.batch.is_empty()
    }

    /// Whether the slice drops its axis.
    pub fn is_scalar(&self) -> bool {
        matches!(self.cardinality, SliceCardinality::Scalar)
    }

    /// The same selection applied along a different axis.
    pub fn at_axis(&self, axis: usize) -> Self {
        Self {
            axis,
            ..self.clone()
        }
    }

    /// Dimensions after slicing `dims`.
    ///
    /// With `keep_rank`, a scalar slice leaves a size-1 axis in place instead
    /// of dropping it. Returns `None` if the axis is out of range, or if a
    /// batched slice does not line up with the leading dims of `dims`.
    pub fn apply(&self, dims: &[SymbolicDim], keep_rank: bool) -> Option<Vec<SymbolicDim>> {
        if self.axis >= dims.len() {
            return None;
        }
        let batch_aligned = self.axis == self.batch.len() && dims[..self.axis] == self.batch[..];
        if self.is_batched() && !batch_aligned {
            return None;
        }
        let mut result = dims.to_vec();
        match (&self.cardinality, keep_rank) {
            (SliceCardinality::Scalar, false) => {
                result.remove(self.axis);
            }
            (SliceCardinality::Scalar, true) => result[self.axis] = SymbolicDim::Fixed(1),
            (SliceCardinality::Range(extent), _) => result[self.axis] = extent.clone(),
        }
        Some(result)
    }

    /// Shape after slicing a tensor of shape `shape`.
    pub fn sliced_shape(&self, shape: &TensorShape, keep_rank: bool) -> Option<TensorShape> {
        let dims = shape.dims()?;
        self.apply(&dims, keep_rank).map(TensorShape::from_dims)
    }
}

// ─────────────────────────────── Reshape ─────────────────────────────────

/// One entry of a reshape target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReshapeDim {
    /// A literal extent.
    Extent(usize),

    /// `0`: copy the input dimension at the same position.
    Copy,

    /// `-1`: inferred from the element count.
    Infer,
}

/// A reshape target as an ordered list of dimension specs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReshapeDescriptor {
    pub dims: Vec<ReshapeDim>,
}

impl ReshapeDescriptor {
    pub fn new(dims: Vec<ReshapeDim>) -> Self {
        Self { dims }
    }

    /// Decode the integer encoding used by shape tensors.
    pub fn from_i64(values: &[i64]) -> Result<Self> {
        let mut dims = Vec::with_capacity(values.len());
        for &value in values {
            dims.push(match value {
                -1 => ReshapeDim::Infer,
                0 => ReshapeDim::Copy,
                n if n > 0 => ReshapeDim::Extent(n as usize),
                n => {
                    return Err(Error::Shape(format!(
                        "Invalid reshape dimension {} in {:?}",
                        n, values
                    )));
                }
            });
        }
        if dims.iter().filter(|&&d| d == ReshapeDim::Infer).count() > 1 {
            return Err(Error::Shape(format!(
                "Reshape target {:?} has more than one -1",
                values
            )));
        }
        Ok(Self { dims })
    }

    /// Encode as shape-tensor integers.
    pub fn to_i64(&self) -> Vec<i64> {
        self.dims
            .iter()
            .map(|dim| match dim {
                ReshapeDim::Extent(n) => *n as i64,
                ReshapeDim::Copy => 0,
                ReshapeDim::Infer => -1,
            })
            .collect()
    }

    /// Encode as a 1-D i64 constant.
    pub fn to_value(&self) -> TensorValue {
        TensorValue::i64_vector(self.to_i64())
    }

    /// Rank of the reshaped tensor.
    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    /// Resolve the target against a concrete input shape.
    ///
    /// The product of the result always equals the input element count.
    pub fn resolve(&self, input: &[usize]) -> Result<Vec<usize>> {
        let numel: usize = input.iter().product();
        let mut resolved = Vec::with_capacity(self.dims.len());
        let mut inferred = None;

        for (i, dim) in self.dims.iter().enumerate() {
            match dim {
                ReshapeDim::Extent(n) => resolved.push(*n),
                ReshapeDim::Copy => resolved.push(*input.get(i).ok_or_else(|| {
                    Error::Shape(format!(
                        "Reshape copies dimension {} of rank-{} input",
                        i,
                        input.len()
                    ))
                })?),
                ReshapeDim::Infer => {
                    inferred = Some(i);
                    resolved.push(1);
                }
            }
        }

        let known: usize = resolved.iter().product();
        match inferred {
            Some(i) => {
                if known == 0 || numel % known != 0 {
                    return Err(Error::Shape(format!(
                        "Cannot infer reshape of {:?} to {:?}",
                        input,
                        self.to_i64()
                    )));
                }
                resolved[i] = numel / known;
            }
            None if known != numel => {
                return Err(Error::Shape(format!(
                    "Reshape of {:?} to {:?} changes the element count",
                    input,
                    self.to_i64()
                )));
            }
            None => {}
        }

        Ok(resolved)
    }
}

/// What a leading-dims reshape means for one operand of the producer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperandReshape {
    /// The operand only spans preserved trailing dims; leave it alone.
    Untouched,

    /// Reshape the operand with this target.
    Reshape(ReshapeDescriptor),

    /// The operand broadcasts across the merged dims.
    Blocked,
}

/// A reshape that merges or splits leading dims and keeps `trailing` dims.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeadingCollapse {
    /// Number of preserved trailing dims.
    pub trailing: usize,

    /// Leading dims of the reshape input.
    pub input_leading: Vec<usize>,

    /// Leading dims of the reshape output.
    pub output_leading: Vec<usize>,
}

impl LeadingCollapse {
    /// Classify `input -> output` as a leading-dims reshape.
    ///
    /// At least one trailing dim must be preserved and both sides must keep at
    /// least one leading dim. Identity reshapes are not collapses.
    pub fn analyze(input: &[usize], output: &[usize]) -> Option<Self> {
        if input == output || input.iter().product::<usize>() != output.iter().product::<usize>() {
            return None;
        }

        let max_trailing = input.len().min(output.len()).checked_sub(1)?;
        let trailing = input
            .iter()
            .rev()
            .zip(output.iter().rev())
            .take(max_trailing)
            .take_while(|(a, b)| a == b)
            .count();
        if trailing == 0 {
            return None;
        }

        Some(Self {
            trailing,
            input_leading: input[..input.len() - trailing].to_vec(),
            output_leading: output[..output.len() - trailing].to_vec(),
        })
    }

    /// Rank of the reshape input.
    pub fn input_rank(&self) -> usize {
        self.input_leading.len() + self.trailing
    }

    /// Rank of the reshape output.
    pub fn output_rank(&self) -> usize {
        self.output_leading.len() + self.trailing
    }

    /// Target dims for the leading part: `-1` followed by the remaining
    /// output leading extents.
    pub fn leading_target(&self) -> Vec<ReshapeDim> {
        std::iter::once(ReshapeDim::Infer)
            .chain(
                self.output_leading
                    .iter()
                    .skip(1)
                    .map(|&n| ReshapeDim::Extent(n)),
            )
            .collect()
    }

    /// Recompute the reshape for an operand aligned (right to left) with the
    /// reshape input, keeping the operand's own trailing dims.
    pub fn retarget(&self, operand: &[usize]) -> OperandReshape {
        if operand.len() <= self.trailing {
            return OperandReshape::Untouched;
        }
        let split = operand.len() - self.trailing;
        if operand.len() != self.input_rank() || operand[..split] != self.input_leading[..] {
            return OperandReshape::Blocked;
        }

        let mut dims = self.leading_target();
        dims.extend(operand[split..].iter().map(|&n| ReshapeDim::Extent(n)));
        OperandReshape::Reshape(ReshapeDescriptor::new(dims))
    }
}
