use super::transform::{check_width, Transform};
use crate::autograd::BackwardContext;
use crate::error::{Result, ToychError};
use crate::nn::Parameter;
use crate::tensor::Tensor;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Fully connected transform `x · W[1:] + W[0]`.
///
/// The weights have shape `[input_dim + with_bias, size]`; with a bias, row 0 holds
/// it (an implicit constant-1 input column).
#[derive(Debug, Clone)]
pub struct Dense {
    size: usize,
    with_bias: bool,
    seed: Option<u64>,
    input_dim: Option<usize>,
    weights: Option<Parameter>,
}

impl Dense {
    pub fn new(size: usize) -> Self {
        Dense {
            size,
            with_bias: true,
            seed: None,
            input_dim: None,
            weights: None,
        }
    }

    pub fn with_bias(mut self, with_bias: bool) -> Self {
        self.with_bias = with_bias;
        self
    }

    /// Draws the weights from a generator seeded with `seed`.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// A built transform around explicit weights of shape `[input_dim + with_bias, size]`.
    ///
    /// # Errors
    /// `InvalidArgument` if the weights are not rank 2 or have no rows left for inputs.
    pub fn from_weights(weights: Tensor, with_bias: bool) -> Result<Self> {
        let (rows, size) = match weights.shape() {
            [r, s] => (*r, *s),
            other => {
                return Err(ToychError::InvalidArgument(format!(
                    "dense weights must be rank 2, got shape {:?}",
                    other
                )))
            }
        };
        let bias_rows = usize::from(with_bias);
        if rows <= bias_rows {
            return Err(ToychError::InvalidArgument(format!(
                "dense weights of shape {:?} leave no rows for inputs",
                weights.shape()
            )));
        }
        Ok(Dense {
            size,
            with_bias,
            seed: None,
            input_dim: Some(rows - bias_rows),
            weights: Some(Parameter::new(weights).with_name("dense.weights")),
        })
    }

    pub fn has_bias(&self) -> bool {
        self.with_bias
    }

    pub fn weights(&self) -> Option<&Parameter> {
        self.weights.as_ref()
    }

    fn built_weights(&self) -> Result<&Parameter> {
        self.weights
            .as_ref()
            .ok_or_else(|| ToychError::NotReady("dense layer used before setup".to_string()))
    }

    /// Splits the weights into (bias row, input rows).
    fn split(&self, weights: &Tensor) -> Result<(Option<Tensor>, Tensor)> {
        if self.with_bias {
            let rows = weights.shape()[0];
            Ok((Some(weights.row(0)?), weights.rows(1, rows)?))
        } else {
            Ok((None, weights.clone()))
        }
    }
}

impl Transform for Dense {
    fn name(&self) -> &str {
        "dense"
    }

    fn size(&self) -> usize {
        self.size
    }

    fn input_dim(&self) -> Option<usize> {
        self.input_dim
    }

    fn setup(&mut self, input_dim: usize) -> Result<()> {
        let shape = [input_dim + usize::from(self.with_bias), self.size];
        let weights = match self.seed {
            Some(seed) => Parameter::randn_with_rng(&shape, 0.0, None, &mut StdRng::seed_from_u64(seed))?,
            None => Parameter::randn(&shape, 0.0, None)?,
        };
        log::info!(
            "Setup Dense({}) with input dim {}, bias {}",
            self.size,
            input_dim,
            self.with_bias
        );
        self.weights = Some(weights.with_name("dense.weights"));
        self.input_dim = Some(input_dim);
        Ok(())
    }

    fn forward(&self, input: &Tensor) -> Result<Tensor> {
        check_width(self, input)?;
        let weights = self.built_weights()?.value();
        let (bias, w) = self.split(&weights)?;
        let out = input.matmul(&w)?;
        match bias {
            Some(b) => out.add(&b),
            None => Ok(out),
        }
    }

    fn backward(&self, ctx: &mut BackwardContext<'_>, error: &Tensor) -> Result<Option<Tensor>> {
        let param = self.built_weights()?.clone();
        let input = ctx.input(0)?;
        let mut grad = input.transpose()?.matmul(error)?;
        if self.with_bias {
            let grad_b = error.sum_axis(0, false)?;
            let mut data = grad_b.into_data();
            data.extend_from_slice(grad.data());
            grad = Tensor::new(data, param.shape())?;
        }
        let upstream = if ctx.needs_grad(0) {
            let (_, w) = self.split(&param.value())?;
            Some(error.matmul(&w.transpose()?)?)
        } else {
            None
        };
        ctx.accumulate(&param, grad)?;
        Ok(upstream)
    }

    fn parameters(&self) -> Vec<Parameter> {
        self.weights.iter().cloned().collect()
    }

    fn named_parameters(&self) -> Vec<(String, Parameter)> {
        self.weights
            .iter()
            .map(|w| ("weights".to_string(), w.clone()))
            .collect()
    }
}

#[cfg(test)]
#[path = "dense_test.rs"]
mod tests;
