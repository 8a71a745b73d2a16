use crate::error::{Result, ToychError};

/// Calculates the strides for a given shape.
///
/// Example:
/// shape = [2, 3] -> strides = [3, 1]
/// shape = [2, 2, 2] -> strides = [4, 2, 1]
pub fn calculate_strides(shape: &[usize]) -> Vec<usize> {
    let rank = shape.len();
    let mut strides = vec![1; rank];
    for i in (0..rank.saturating_sub(1)).rev() {
        strides[i] = strides[i + 1] * shape[i + 1];
    }
    strides
}

/// Determines the output shape resulting from broadcasting two input shapes.
///
/// Follows NumPy broadcasting rules: shapes are aligned on the right, missing
/// leading dimensions count as 1, and two dimensions are compatible when they are
/// equal or one of them is 1.
///
/// # Errors
/// Returns `BroadcastError` if the shapes are incompatible.
pub fn broadcast_shapes(shape_a: &[usize], shape_b: &[usize]) -> Result<Vec<usize>> {
    let rank = shape_a.len().max(shape_b.len());
    let mut result = vec![0; rank];
    for i in 0..rank {
        let dim_a = shape_a
            .len()
            .checked_sub(1 + i)
            .map_or(1, |k| shape_a[k]);
        let dim_b = shape_b
            .len()
            .checked_sub(1 + i)
            .map_or(1, |k| shape_b[k]);
        result[rank - 1 - i] = if dim_a == dim_b || dim_b == 1 {
            dim_a
        } else if dim_a == 1 {
            dim_b
        } else {
            return Err(ToychError::BroadcastError {
                shape1: shape_a.to_vec(),
                shape2: shape_b.to_vec(),
            });
        };
    }
    Ok(result)
}

/// Converts a linear index into coordinates for a contiguous tensor.
pub fn index_to_coord(index: usize, strides: &[usize], shape: &[usize]) -> Vec<usize> {
    let mut coord = vec![0; shape.len()];
    let mut rest = index;
    for (c, &stride) in coord.iter_mut().zip(strides) {
        if stride > 0 {
            *c = rest / stride;
            rest %= stride;
        }
    }
    coord
}

/// Maps coordinates in a broadcast result back to a linear index in one of its inputs.
///
/// Leading coordinates the input does not have are dropped; dimensions of size 1
/// always read coordinate 0.
pub fn coord_to_index_broadcasted(
    target_coord: &[usize],
    original_shape: &[usize],
    original_strides: &[usize],
) -> usize {
    let rank_diff = target_coord.len().saturating_sub(original_shape.len());
    original_shape
        .iter()
        .zip(original_strides)
        .enumerate()
        .map(|(i, (&dim, &stride))| {
            if dim == 1 {
                0
            } else {
                target_coord[rank_diff + i] * stride
            }
        })
        .sum()
}

#[cfg(test)]
#[path = "utils_test.rs"]
mod tests;
