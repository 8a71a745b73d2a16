//! Assertion helpers shared by unit and integration tests.

use crate::tensor::Tensor;

/// Checks that two tensors are approximately equal (shape and data within tolerance).
///
/// Panics if shapes differ or any element differs by more than `tolerance`.
pub fn check_tensor_near(actual: &Tensor, expected_shape: &[usize], expected_data: &[f64], tolerance: f64) {
    assert_eq!(actual.shape(), expected_shape, "Shape mismatch");
    assert_eq!(
        actual.numel(),
        expected_data.len(),
        "Data length mismatch"
    );
    for (i, (a, e)) in actual.data().iter().zip(expected_data).enumerate() {
        let diff = (a - e).abs();
        if diff > tolerance || diff.is_nan() {
            panic!(
                "Data mismatch at index {}: actual={:?}, expected={:?}, diff={:?}, tolerance={:?}",
                i, a, e, diff, tolerance
            );
        }
    }
}

/// Helper to create a tensor for testing purposes.
#[cfg(test)]
pub(crate) fn create_test_tensor(data: Vec<f64>, shape: Vec<usize>) -> Tensor {
    Tensor::new(data, shape).expect("Failed to create test tensor")
}

/// Helper to create a parameter for testing purposes.
#[cfg(test)]
pub(crate) fn create_test_param(data: Vec<f64>, shape: Vec<usize>) -> crate::nn::Parameter {
    crate::nn::Parameter::new(create_test_tensor(data, shape))
}
