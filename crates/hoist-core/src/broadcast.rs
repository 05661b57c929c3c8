//! Broadcasting helpers shared by propagation rules and tests.

use crate::types::SymbolicDim;
use crate::{Error, Result};

/// Compute the NumPy-style broadcast of two static shapes.
///
/// ```text
/// broadcast_shape(&[4, 32, 256], &[256])    -> [4, 32, 256]
/// broadcast_shape(&[4, 1, 256], &[32, 256]) -> [4, 32, 256]
/// ```
pub fn broadcast_shape(a: &[usize], b: &[usize]) -> Result<Vec<usize>> {
    let rank = a.len().max(b.len());
    let mut result = Vec::with_capacity(rank);

    for i in 0..rank {
        let da = extent_at(a, i, rank).unwrap_or(1);
        let db = extent_at(b, i, rank).unwrap_or(1);

        match (da, db) {
            _ if da == db => result.push(da),
            (1, _) => result.push(db),
            (_, 1) => result.push(da),
            _ => {
                return Err(Error::Shape(format!(
                    "Cannot broadcast shapes {:?} and {:?} at dimension {i}",
                    a, b
                )));
            }
        }
    }

    Ok(result)
}

fn extent_at(shape: &[usize], axis: usize, rank: usize) -> Option<usize> {
    aligned_axis(axis, rank, shape.len()).map(|a| shape[a])
}

/// Map an axis of a rank-`out_rank` result onto an operand of rank `in_rank`
/// under right-aligned broadcasting.
///
/// Returns `None` when the operand has no dimension at that position.
pub fn aligned_axis(axis: usize, out_rank: usize, in_rank: usize) -> Option<usize> {
    let offset = out_rank.checked_sub(in_rank)?;
    axis.checked_sub(offset)
}

/// Whether an operand dimension is stretched by broadcasting against `out`.
///
/// A fixed extent of 1 broadcasts unless the result extent is also 1.
pub fn is_broadcast_dim(dim: &SymbolicDim, out: &SymbolicDim) -> bool {
    dim.is_one() && !out.is_one()
}
