//! Core types for tensor shapes, values, and attributes.

use crate::{Error, Result};
use std::fmt;

/// Element types a tensor can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    F32,
    F16,
    I32,
    I64,
    U8,
    Bool,
}

impl DataType {
    /// Whether this type can hold gather indices.
    pub fn is_index(&self) -> bool {
        matches!(self, DataType::I32 | DataType::I64)
    }
}

/// Tensor shape with support for static, symbolic, and unknown shapes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TensorShape {
    /// All dimensions are known.
    Static(Vec<usize>),

    /// Mix of fixed and named dimensions (e.g., `[batch, 128, 768]`).
    Symbolic(Vec<SymbolicDim>),

    /// Rank and dimensions are unknown.
    Unknown,
}

impl TensorShape {
    /// Build a shape from dimensions, collapsing to `Static` when all are fixed.
    pub fn from_dims(dims: Vec<SymbolicDim>) -> Self {
        if dims.iter().all(SymbolicDim::is_fixed) {
            TensorShape::Static(dims.iter().filter_map(SymbolicDim::as_fixed).collect())
        } else {
            TensorShape::Symbolic(dims)
        }
    }

    /// Check if the shape is fully static.
    pub fn is_static(&self) -> bool {
        matches!(self, TensorShape::Static(_))
    }

    /// Get static dimensions if available.
    pub fn as_static(&self) -> Option<&[usize]> {
        match self {
            TensorShape::Static(dims) => Some(dims),
            _ => None,
        }
    }

    /// Number of dimensions, if known.
    pub fn ndim(&self) -> Option<usize> {
        match self {
            TensorShape::Static(dims) => Some(dims.len()),
            TensorShape::Symbolic(dims) => Some(dims.len()),
            TensorShape::Unknown => None,
        }
    }

    /// All dimensions as symbolic dims, if the rank is known.
    pub fn dims(&self) -> Option<Vec<SymbolicDim>> {
        match self {
            TensorShape::Static(dims) => Some(dims.iter().copied().map(SymbolicDim::Fixed).collect()),
            TensorShape::Symbolic(dims) => Some(dims.clone()),
            TensorShape::Unknown => None,
        }
    }

    /// A single dimension, if the rank is known and `axis` is in range.
    pub fn dim(&self, axis: usize) -> Option<SymbolicDim> {
        match self {
            TensorShape::Static(dims) => dims.get(axis).copied().map(SymbolicDim::Fixed),
            TensorShape::Symbolic(dims) => dims.get(axis).cloned(),
            TensorShape::Unknown => None,
        }
    }

    /// Total number of elements, if the shape is static.
    pub fn numel(&self) -> Option<usize> {
        self.as_static().map(|dims| dims.iter().product())
    }
}

impl fmt::Display for TensorShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TensorShape::Static(dims) => write!(f, "{:?}", dims),
            TensorShape::Symbolic(dims) => {
                write!(f, "[")?;
                for (i, dim) in dims.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", dim)?;
                }
                write!(f, "]")
            }
            TensorShape::Unknown => write!(f, "?"),
        }
    }
}

/// A single dimension in a symbolic tensor shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SymbolicDim {
    /// Compile-time constant dimension.
    Fixed(usize),

    /// Named dimension (e.g., `batch_size`), equal only to itself.
    Named(String),
}

impl SymbolicDim {
    /// Check if this dimension is fixed.
    pub fn is_fixed(&self) -> bool {
        matches!(self, SymbolicDim::Fixed(_))
    }

    /// Get the fixed value if available.
    pub fn as_fixed(&self) -> Option<usize> {
        match self {
            SymbolicDim::Fixed(n) => Some(*n),
            SymbolicDim::Named(_) => None,
        }
    }

    /// Check if this is a fixed size-1 (broadcastable) dimension.
    pub fn is_one(&self) -> bool {
        matches!(self, SymbolicDim::Fixed(1))
    }
}

impl fmt::Display for SymbolicDim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SymbolicDim::Fixed(n) => write!(f, "{}", n),
            SymbolicDim::Named(name) => write!(f, "{}", name),
        }
    }
}

/// Raw tensor data for compile-time constants.
#[derive(Debug, Clone, PartialEq)]
pub enum TensorData {
    I64(Vec<i64>),
    I32(Vec<i32>),
    F32(Vec<f32>),
    Bool(Vec<bool>),
    U8(Vec<u8>),
}

impl TensorData {
    /// Get the number of elements in this tensor data.
    pub fn len(&self) -> usize {
        match self {
            TensorData::I64(v) => v.len(),
            TensorData::I32(v) => v.len(),
            TensorData::F32(v) => v.len(),
            TensorData::Bool(v) => v.len(),
            TensorData::U8(v) => v.len(),
        }
    }

    /// Check if this tensor data is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the data type of this tensor data.
    pub fn dtype(&self) -> DataType {
        match self {
            TensorData::I64(_) => DataType::I64,
            TensorData::I32(_) => DataType::I32,
            TensorData::F32(_) => DataType::F32,
            TensorData::Bool(_) => DataType::Bool,
            TensorData::U8(_) => DataType::U8,
        }
    }
}

/// A tensor value known at optimization time (initializers, shape constants, indices).
#[derive(Debug, Clone, PartialEq)]
pub struct TensorValue {
    /// The raw tensor data.
    pub data: TensorData,

    /// The shape of the tensor (dimensions).
    pub shape: Vec<usize>,

    /// The data type of the tensor.
    pub dtype: DataType,
}

impl TensorValue {
    /// Create a new TensorValue, checking the data length against the shape.
    pub fn new(data: TensorData, shape: Vec<usize>) -> Result<Self> {
        let expected_len: usize = shape.iter().product();
        if data.len() != expected_len {
            return Err(Error::Shape(format!(
                "Data length {} doesn't match shape {:?} (product = {})",
                data.len(),
                shape,
                expected_len
            )));
        }
        let dtype = data.dtype();
        Ok(Self { data, shape, dtype })
    }

    /// 1-D i64 tensor (the usual encoding of shapes and index lists).
    pub fn i64_vector(values: Vec<i64>) -> Self {
        let shape = vec![values.len()];
        Self {
            data: TensorData::I64(values),
            shape,
            dtype: DataType::I64,
        }
    }

    /// 0-D i64 tensor.
    pub fn i64_scalar(value: i64) -> Self {
        Self {
            data: TensorData::I64(vec![value]),
            shape: vec![],
            dtype: DataType::I64,
        }
    }

    /// 1-D f32 tensor.
    pub fn f32_vector(values: Vec<f32>) -> Self {
        let shape = vec![values.len()];
        Self {
            data: TensorData::F32(values),
            shape,
            dtype: DataType::F32,
        }
    }

    /// Get the number of elements in this tensor value.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if this tensor value is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Get the number of dimensions.
    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// Try to get as i64 slice.
    pub fn as_i64(&self) -> Option<&[i64]> {
        match &self.data {
            TensorData::I64(v) => Some(v),
            _ => None,
        }
    }

    /// Integer contents widened to i64 (accepts i32 and i64 data).
    pub fn to_i64_vec(&self) -> Option<Vec<i64>> {
        match &self.data {
            TensorData::I64(v) => Some(v.clone()),
            TensorData::I32(v) => Some(v.iter().map(|&x| x as i64).collect()),
            _ => None,
        }
    }
}

/// Operator attribute values.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    Float(f32),
    Int(i64),
    String(String),
    Floats(Vec<f32>),
    Ints(Vec<i64>),
    Strings(Vec<String>),
}

impl AttributeValue {
    fn kind(&self) -> &'static str {
        match self {
            AttributeValue::Float(_) => "float",
            AttributeValue::Int(_) => "int",
            AttributeValue::String(_) => "string",
            AttributeValue::Floats(_) => "float array",
            AttributeValue::Ints(_) => "int array",
            AttributeValue::Strings(_) => "string array",
        }
    }

    fn mismatch(&self, expected: &str) -> Error {
        Error::Attribute(format!("expected {}, found {}", expected, self.kind()))
    }
}

impl TryFrom<AttributeValue> for f32 {
    type Error = Error;

    fn try_from(value: AttributeValue) -> Result<Self> {
        match value {
            AttributeValue::Float(v) => Ok(v),
            other => Err(other.mismatch("float")),
        }
    }
}

impl TryFrom<AttributeValue> for i64 {
    type Error = Error;

    fn try_from(value: AttributeValue) -> Result<Self> {
        match value {
            AttributeValue::Int(v) => Ok(v),
            other => Err(other.mismatch("int")),
        }
    }
}

impl TryFrom<AttributeValue> for String {
    type Error = Error;

    fn try_from(value: AttributeValue) -> Result<Self> {
        match value {
            AttributeValue::String(v) => Ok(v),
            other => Err(other.mismatch("string")),
        }
    }
}

impl TryFrom<AttributeValue> for Vec<i64> {
    type Error = Error;

    fn try_from(value: AttributeValue) -> Result<Self> {
        match value {
            AttributeValue::Ints(v) => Ok(v),
            other => Err(other.mismatch("int array")),
        }
    }
}

/// Normalize a possibly negative axis against `rank`.
///
/// Returns `None` if the axis is out of range.
pub fn normalize_axis(axis: i64, rank: usize) -> Option<usize> {
    let rank = rank as i64;
    let normalized = if axis < 0 { axis + rank } else { axis };
    (0..rank).contains(&normalized).then_some(normalized as usize)
}
