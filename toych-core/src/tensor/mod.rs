//! Dense `f64` n-dimensional arrays.
//!
//! A [`Tensor`] is a plain value: contiguous row-major data plus a shape. It carries
//! no autograd metadata; provenance lives in [`Var`](crate::autograd::Var) and
//! trainable state in [`Parameter`](crate::nn::Parameter).

use crate::error::{Result, ToychError};
use serde::{Deserialize, Serialize};

pub mod broadcast_utils;
pub mod create;
mod math_methods;
pub mod utils;

pub use create::{full, ones, scalar, zeros, zeros_like};

/// Contiguous row-major `f64` tensor. Rank 0 (empty shape) is a scalar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tensor {
    data: Vec<f64>,
    shape: Vec<usize>,
}

impl Tensor {
    /// Creates a tensor from flat row-major data.
    ///
    /// # Errors
    /// Returns `TensorCreationError` if `data.len()` is not the product of `shape`.
    pub fn new(data: Vec<f64>, shape: Vec<usize>) -> Result<Self> {
        let numel: usize = shape.iter().product();
        if data.len() != numel {
            return Err(ToychError::TensorCreationError {
                data_len: data.len(),
                shape,
            });
        }
        Ok(Tensor { data, shape })
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    pub fn numel(&self) -> usize {
        self.data.len()
    }

    pub fn data(&self) -> &[f64] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [f64] {
        &mut self.data
    }

    pub fn into_data(self) -> Vec<f64> {
        self.data
    }

    /// Returns the single element of a one-element tensor.
    ///
    /// # Errors
    /// Returns `ShapeMismatch` if the tensor holds more than one element.
    pub fn item(&self) -> Result<f64> {
        if self.data.len() != 1 {
            return Err(ToychError::ShapeMismatch {
                expected: vec![],
                actual: self.shape.clone(),
                operation: "item".to_string(),
            });
        }
        Ok(self.data[0])
    }

    /// Reads the element at `index` (one coordinate per dimension).
    pub fn get(&self, index: &[usize]) -> Result<f64> {
        let out_of_bounds = || ToychError::IndexOutOfBounds {
            index: index.to_vec(),
            shape: self.shape.clone(),
        };
        if index.len() != self.shape.len() {
            return Err(out_of_bounds());
        }
        let strides = utils::calculate_strides(&self.shape);
        let mut offset = 0;
        for ((&i, &dim), &stride) in index.iter().zip(&self.shape).zip(&strides) {
            if i >= dim {
                return Err(out_of_bounds());
            }
            offset += i * stride;
        }
        Ok(self.data[offset])
    }

    /// Returns a tensor with the same data and a new shape.
    ///
    /// # Errors
    /// Returns `ShapeMismatch` if the element counts differ.
    pub fn reshape(&self, shape: &[usize]) -> Result<Tensor> {
        let numel: usize = shape.iter().product();
        if numel != self.numel() {
            return Err(ToychError::ShapeMismatch {
                expected: self.shape.clone(),
                actual: shape.to_vec(),
                operation: "reshape".to_string(),
            });
        }
        Ok(Tensor {
            data: self.data.clone(),
            shape: shape.to_vec(),
        })
    }

    /// Returns row `i` of the leading dimension, with that dimension removed.
    pub fn row(&self, i: usize) -> Result<Tensor> {
        let Some((&rows, rest)) = self.shape.split_first() else {
            return Err(ToychError::IndexOutOfBounds {
                index: vec![i],
                shape: self.shape.clone(),
            });
        };
        if i >= rows {
            return Err(ToychError::IndexOutOfBounds {
                index: vec![i],
                shape: self.shape.clone(),
            });
        }
        let width: usize = rest.iter().product();
        Ok(Tensor {
            data: self.data[i * width..(i + 1) * width].to_vec(),
            shape: rest.to_vec(),
        })
    }

    /// Returns rows `start..end` of the leading dimension.
    pub fn rows(&self, start: usize, end: usize) -> Result<Tensor> {
        let rows = self.shape.first().copied().unwrap_or(0);
        if start > end || end > rows {
            return Err(ToychError::IndexOutOfBounds {
                index: vec![start, end],
                shape: self.shape.clone(),
            });
        }
        let width: usize = self.shape[1..].iter().product();
        let mut shape = self.shape.clone();
        shape[0] = end - start;
        Ok(Tensor {
            data: self.data[start * width..end * width].to_vec(),
            shape,
        })
    }
}

#[cfg(test)]
#[path = "tensor_test.rs"]
mod tests;
