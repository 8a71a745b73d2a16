use super::traits::Dataset;
use toych_core::{Tensor, ToychError};

/// Inputs and targets stored as two tensors whose leading dimension indexes samples.
///
/// Sample `i` is `(inputs.row(i), targets.row(i))`.
#[derive(Debug, Clone)]
pub struct TensorDataset {
    inputs: Tensor,
    targets: Tensor,
}

impl TensorDataset {
    /// # Errors
    /// `InvalidArgument` if either tensor is a scalar, `ShapeMismatch` if they hold a
    /// different number of samples.
    pub fn new(inputs: Tensor, targets: Tensor) -> Result<Self, ToychError> {
        let (Some(&n_inputs), Some(&n_targets)) = (inputs.shape().first(), targets.shape().first()) else {
            return Err(ToychError::InvalidArgument(
                "TensorDataset needs tensors of rank 1 or more".to_string(),
            ));
        };
        if n_inputs != n_targets {
            return Err(ToychError::ShapeMismatch {
                expected: vec![n_inputs],
                actual: vec![n_targets],
                operation: "TensorDataset::new".to_string(),
            });
        }
        Ok(TensorDataset { inputs, targets })
    }

    pub fn inputs(&self) -> &Tensor {
        &self.inputs
    }

    pub fn targets(&self) -> &Tensor {
        &self.targets
    }
}

impl Dataset for TensorDataset {
    type Item = (Tensor, Tensor);

    fn get(&self, index: usize) -> Result<Self::Item, ToychError> {
        if index >= self.len() {
            return Err(ToychError::IndexOutOfBounds {
                index: vec![index],
                shape: vec![self.len()],
            });
        }
        Ok((self.inputs.row(index)?, self.targets.row(index)?))
    }

    fn len(&self) -> usize {
        self.inputs.shape()[0]
    }
}

#[cfg(test)]
#[path = "tensor_dataset_test.rs"]
mod tests;
