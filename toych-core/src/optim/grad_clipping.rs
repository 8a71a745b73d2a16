use crate::error::{Result, ToychError};
use crate::tensor::Tensor;

/// Scales `grad` down so that its largest magnitude is at most `grad_lim`.
///
/// Gradients already within the limit are returned unchanged, direction is always kept.
///
/// # Errors
/// `ConfigurationError` if `grad_lim` is not positive.
pub fn shrink_grad(grad: &Tensor, grad_lim: f64) -> Result<Tensor> {
    if !(grad_lim > 0.0) {
        return Err(ToychError::ConfigurationError(format!(
            "gradient limit must be positive, got {}",
            grad_lim
        )));
    }
    let peak = grad.abs_max();
    if peak > grad_lim {
        Ok(grad.scale(grad_lim / peak))
    } else {
        Ok(grad.clone())
    }
}

#[cfg(test)]
#[path = "grad_clipping_test.rs"]
mod tests;
