use super::mode::not_training;
use super::var::Var;
use crate::error::ToychError;
use crate::nn::Parameter;
use thiserror::Error;

/// Error type specifically for gradient checking failures.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GradCheckError {
    #[error("Gradient check failed for parameter {param_index}, element {element_index}: analytical {analytical} vs numerical {numerical} (relative error {relative_error})")]
    GradientMismatch {
        param_index: usize,
        element_index: usize,
        analytical: f64,
        numerical: f64,
        relative_error: f64,
    },

    #[error("Numerical gradient is not finite for parameter {param_index}, element {element_index} (loss+ {loss_plus}, loss- {loss_minus})")]
    NumericalGradNotFinite {
        param_index: usize,
        element_index: usize,
        loss_plus: f64,
        loss_minus: f64,
    },

    #[error("Loss must be a scalar, got shape {0:?}")]
    NonScalarLoss(Vec<usize>),

    #[error("Tensor error during gradient check: {0}")]
    TensorError(ToychError),
}

impl From<ToychError> for GradCheckError {
    fn from(err: ToychError) -> Self {
        GradCheckError::TensorError(err)
    }
}

/// Compares analytic gradients with centered finite differences.
///
/// `loss_fn` builds a scalar loss from the current values of `params`. It is called once
/// with gradients recorded, then twice per parameter element inside a not-training scope
/// with that element shifted by `±epsilon`.
///
/// Gradients already accumulated in `params` are cleared first and left holding the
/// analytic gradient afterwards; parameter values are restored.
///
/// # Arguments
/// * `loss_fn`: Closure computing the loss.
/// * `params`: Parameters to check.
/// * `epsilon`: Finite-difference step.
/// * `tolerance`: Maximum accepted `|analytical - numerical| / max(1, |analytical|, |numerical|)`.
///
/// # Errors
/// The first mismatching element as `GradientMismatch`, or any error raised while
/// evaluating the loss.
pub fn check_grad<F>(
    loss_fn: F,
    params: &[Parameter],
    epsilon: f64,
    tolerance: f64,
) -> Result<(), GradCheckError>
where
    F: Fn() -> Result<Var, ToychError>,
{
    params.iter().for_each(Parameter::zero_grad);
    let loss = loss_fn()?;
    if loss.value().numel() != 1 {
        return Err(GradCheckError::NonScalarLoss(loss.shape().to_vec()));
    }
    loss.backward()?;
    let analytic: Vec<_> = params.iter().map(Parameter::grad).collect();

    let _guard = not_training();
    for (param_index, (param, grad)) in params.iter().zip(&analytic).enumerate() {
        let original = param.value();
        for element_index in 0..original.numel() {
            let shifted = |delta: f64| -> Result<f64, GradCheckError> {
                let mut value = (*original).clone();
                value.data_mut()[element_index] += delta;
                param.set_value(value)?;
                Ok(loss_fn()?.item()?)
            };
            let loss_plus = shifted(epsilon);
            let loss_minus = shifted(-epsilon);
            param.set_value((*original).clone())?;
            let (loss_plus, loss_minus) = (loss_plus?, loss_minus?);

            let numerical = (loss_plus - loss_minus) / (2.0 * epsilon);
            if !numerical.is_finite() {
                return Err(GradCheckError::NumericalGradNotFinite {
                    param_index,
                    element_index,
                    loss_plus,
                    loss_minus,
                });
            }
            let analytical = grad.data()[element_index];
            let scale = 1.0_f64.max(analytical.abs()).max(numerical.abs());
            let relative_error = (analytical - numerical).abs() / scale;
            if relative_error > tolerance {
                return Err(GradCheckError::GradientMismatch {
                    param_index,
                    element_index,
                    analytical,
                    numerical,
                    relative_error,
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "grad_check_test.rs"]
mod tests;
