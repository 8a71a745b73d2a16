use super::utils::{broadcast_shapes, calculate_strides, coord_to_index_broadcasted, index_to_coord};
use super::Tensor;
use crate::error::{Result, ToychError};

impl Tensor {
    /// Applies `f` element-wise over `self` and `other`, broadcasting both to a common shape.
    ///
    /// # Errors
    /// Returns `BroadcastError` if the shapes are incompatible.
    pub fn zip_map<F>(&self, other: &Tensor, f: F) -> Result<Tensor>
    where
        F: Fn(f64, f64) -> f64,
    {
        if self.shape == other.shape {
            let data = self
                .data
                .iter()
                .zip(&other.data)
                .map(|(&a, &b)| f(a, b))
                .collect();
            return Ok(Tensor {
                data,
                shape: self.shape.clone(),
            });
        }

        let out_shape = broadcast_shapes(&self.shape, &other.shape)?;
        let out_strides = calculate_strides(&out_shape);
        let a_strides = calculate_strides(&self.shape);
        let b_strides = calculate_strides(&other.shape);
        let numel: usize = out_shape.iter().product();

        let mut data = Vec::with_capacity(numel);
        for i in 0..numel {
            let coord = index_to_coord(i, &out_strides, &out_shape);
            let a = self.data[coord_to_index_broadcasted(&coord, &self.shape, &a_strides)];
            let b = other.data[coord_to_index_broadcasted(&coord, &other.shape, &b_strides)];
            data.push(f(a, b));
        }
        Tensor::new(data, out_shape)
    }

    /// Expands the tensor to `shape` following broadcasting rules.
    ///
    /// # Errors
    /// Returns `BroadcastError` if `self` cannot be broadcast to `shape`.
    pub fn broadcast_to(&self, shape: &[usize]) -> Result<Tensor> {
        let target = broadcast_shapes(&self.shape, shape)?;
        if target != shape {
            return Err(ToychError::BroadcastError {
                shape1: self.shape.clone(),
                shape2: shape.to_vec(),
            });
        }
        self.zip_map(&super::zeros(shape), |a, _| a)
    }

    /// Reduces a (gradient) tensor to `target_shape` by summing along broadcast dimensions.
    ///
    /// This is the backward counterpart of broadcasting: leading dimensions the target
    /// lacks, and dimensions where the target has size 1, are summed away.
    ///
    /// # Errors
    /// Returns `ShapeMismatch` if `target_shape` does not broadcast to `self.shape()`.
    pub fn reduce_to_shape(&self, target_shape: &[usize]) -> Result<Tensor> {
        if self.shape == target_shape {
            return Ok(self.clone());
        }
        let compatible = broadcast_shapes(target_shape, &self.shape)
            .map(|s| s == self.shape)
            .unwrap_or(false);
        if !compatible {
            return Err(ToychError::ShapeMismatch {
                expected: target_shape.to_vec(),
                actual: self.shape.clone(),
                operation: "reduce_to_shape".to_string(),
            });
        }

        let src_strides = calculate_strides(&self.shape);
        let dst_strides = calculate_strides(target_shape);
        let mut data = vec![0.0; target_shape.iter().product()];
        for (i, &v) in self.data.iter().enumerate() {
            let coord = index_to_coord(i, &src_strides, &self.shape);
            data[coord_to_index_broadcasted(&coord, target_shape, &dst_strides)] += v;
        }
        Tensor::new(data, target_shape.to_vec())
    }
}

#[cfg(test)]
#[path = "broadcast_utils_test.rs"]
mod tests;
