// toych-core/src/tensor/create.rs

use super::Tensor;
use crate::error::{Result, ToychError};

/// Creates a rank-0 tensor.
pub fn scalar(value: f64) -> Tensor {
    Tensor {
        data: vec![value],
        shape: vec![],
    }
}

/// Creates a tensor of the given shape filled with `value`.
pub fn full(shape: &[usize], value: f64) -> Tensor {
    let numel = shape.iter().product();
    Tensor {
        data: vec![value; numel],
        shape: shape.to_vec(),
    }
}

pub fn zeros(shape: &[usize]) -> Tensor {
    full(shape, 0.0)
}

pub fn ones(shape: &[usize]) -> Tensor {
    full(shape, 1.0)
}

pub fn zeros_like(tensor: &Tensor) -> Tensor {
    zeros(tensor.shape())
}

impl Tensor {
    /// Builds a `[rows.len(), width]` matrix from equally sized rows.
    ///
    /// # Errors
    /// Returns `InvalidArgument` for an empty list and `ShapeMismatch` for ragged rows.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Tensor> {
        let Some(first) = rows.first() else {
            return Err(ToychError::InvalidArgument(
                "from_rows needs at least one row".to_string(),
            ));
        };
        let width = first.len();
        let mut data = Vec::with_capacity(rows.len() * width);
        for row in rows {
            if row.len() != width {
                return Err(ToychError::ShapeMismatch {
                    expected: vec![width],
                    actual: vec![row.len()],
                    operation: "from_rows".to_string(),
                });
            }
            data.extend_from_slice(row);
        }
        Tensor::new(data, vec![rows.len(), width])
    }

    /// Stacks equally shaped tensors along a new leading dimension.
    ///
    /// # Errors
    /// Returns `InvalidArgument` for an empty list and `ShapeMismatch` if shapes differ.
    pub fn stack(tensors: &[Tensor]) -> Result<Tensor> {
        let Some(first) = tensors.first() else {
            return Err(ToychError::InvalidArgument(
                "Cannot stack an empty list of tensors".to_string(),
            ));
        };
        let mut data = Vec::with_capacity(tensors.len() * first.numel());
        for t in tensors {
            if t.shape() != first.shape() {
                return Err(ToychError::ShapeMismatch {
                    expected: first.shape().to_vec(),
                    actual: t.shape().to_vec(),
                    operation: "stack".to_string(),
                });
            }
            data.extend_from_slice(t.data());
        }
        let mut shape = Vec::with_capacity(first.rank() + 1);
        shape.push(tensors.len());
        shape.extend_from_slice(first.shape());
        Tensor::new(data, shape)
    }
}

#[cfg(test)]
#[path = "create_test.rs"]
mod tests;
