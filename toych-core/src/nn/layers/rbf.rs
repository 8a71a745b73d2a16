use super::transform::{check_width, Transform};
use crate::autograd::BackwardContext;
use crate::error::{Result, ToychError};
use crate::nn::Parameter;
use crate::tensor::Tensor;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::BTreeSet;

/// Radial-basis transform: `exp(-d(x, c)² / 2σ²)` against each center `c`, with `d`
/// the L1 distance.
///
/// The centers are not trained by gradient. When `move_centers` is set, `backward`
/// runs a competitive-learning step instead: for every input row the winning center
/// (highest activation), plus its neighbours if enabled, moves `step_size` of the way
/// toward the row. Rows are processed in order, so later rows see earlier moves. No
/// error is passed upstream.
#[derive(Debug, Clone)]
pub struct Rbf {
    size: usize,
    sigma: f64,
    move_centers: bool,
    centers_mean: f64,
    centers_deviation: f64,
    step_size: f64,
    update_neighbors: bool,
    nb_radius: f64,
    seed: Option<u64>,
    input_dim: Option<usize>,
    centers: Option<Parameter>,
}

impl Rbf {
    pub fn new(size: usize) -> Self {
        Rbf {
            size,
            sigma: 0.1,
            move_centers: true,
            centers_mean: 0.0,
            centers_deviation: 1.0,
            step_size: 0.01,
            update_neighbors: false,
            nb_radius: 0.05,
            seed: None,
            input_dim: None,
            centers: None,
        }
    }

    /// A built transform around explicit centers of shape `[size, input_dim]`.
    pub fn from_centers(centers: Tensor) -> Result<Self> {
        let &[size, input_dim] = centers.shape() else {
            return Err(ToychError::InvalidArgument(format!(
                "rbf centers must be rank 2, got shape {:?}",
                centers.shape()
            )));
        };
        let mut rbf = Rbf::new(size);
        rbf.input_dim = Some(input_dim);
        rbf.centers = Some(Parameter::new(centers).with_name("rbf.centers"));
        Ok(rbf)
    }

    /// # Errors
    /// `InvalidArgument` unless `sigma` is positive and finite.
    pub fn with_sigma(mut self, sigma: f64) -> Result<Self> {
        if !(sigma.is_finite() && sigma > 0.0) {
            return Err(ToychError::InvalidArgument(format!(
                "rbf sigma must be positive, got {}",
                sigma
            )));
        }
        self.sigma = sigma;
        Ok(self)
    }

    pub fn with_move_centers(mut self, move_centers: bool) -> Self {
        self.move_centers = move_centers;
        self
    }

    /// Mean and standard deviation of the randomly drawn centers.
    pub fn with_centers_distribution(mut self, mean: f64, deviation: f64) -> Self {
        self.centers_mean = mean;
        self.centers_deviation = deviation;
        self
    }

    pub fn with_step_size(mut self, step_size: f64) -> Self {
        self.step_size = step_size;
        self
    }

    /// Also moves centers whose activation is within `nb_radius` of the winner's.
    pub fn with_neighbors(mut self, nb_radius: f64) -> Self {
        self.update_neighbors = true;
        self.nb_radius = nb_radius;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    pub fn centers(&self) -> Option<&Parameter> {
        self.centers.as_ref()
    }

    fn built_centers(&self) -> Result<&Parameter> {
        self.centers
            .as_ref()
            .ok_or_else(|| ToychError::NotReady("rbf layer used before setup".to_string()))
    }

    fn distance(x: &[f64], c: &[f64]) -> f64 {
        x.iter().zip(c).map(|(a, b)| (a - b).abs()).sum()
    }

    /// Centers to move for one row of activations.
    fn selected(&self, activations: &[f64]) -> BTreeSet<usize> {
        let mut nodes = BTreeSet::new();
        let Some(winner) = activations
            .iter()
            .enumerate()
            .fold(None, |best: Option<(usize, f64)>, (k, &a)| match best {
                Some((_, b)) if b >= a => best,
                _ => Some((k, a)),
            })
            .map(|(k, _)| k)
        else {
            return nodes;
        };
        nodes.insert(winner);
        if self.update_neighbors {
            let top = activations[winner];
            nodes.extend(
                activations
                    .iter()
                    .enumerate()
                    .filter(|(_, &a)| (top - a).abs() <= self.nb_radius)
                    .map(|(k, _)| k),
            );
        }
        nodes
    }
}

impl Transform for Rbf {
    fn name(&self) -> &str {
        "rbf"
    }

    fn size(&self) -> usize {
        self.size
    }

    fn input_dim(&self) -> Option<usize> {
        self.input_dim
    }

    fn setup(&mut self, input_dim: usize) -> Result<()> {
        let shape = [self.size, input_dim];
        let (mean, dev) = (self.centers_mean, Some(self.centers_deviation));
        let centers = match self.seed {
            Some(seed) => Parameter::randn_with_rng(&shape, mean, dev, &mut StdRng::seed_from_u64(seed))?,
            None => Parameter::randn(&shape, mean, dev)?,
        };
        log::info!(
            "Setup Rbf({}) with input dim {}, sigma {:.2}",
            self.size,
            input_dim,
            self.sigma
        );
        self.centers = Some(centers.with_name("rbf.centers"));
        self.input_dim = Some(input_dim);
        Ok(())
    }

    fn forward(&self, input: &Tensor) -> Result<Tensor> {
        let n = check_width(self, input)?;
        let centers = self.built_centers()?.value();
        let width = centers.shape()[1];
        let denom = 2.0 * self.sigma * self.sigma;
        let mut data = Vec::with_capacity(n * self.size);
        for x in input.data().chunks(width.max(1)).take(n) {
            for c in centers.data().chunks(width.max(1)).take(self.size) {
                let d = Rbf::distance(x, c);
                data.push((-d * d / denom).exp());
            }
        }
        Tensor::new(data, vec![n, self.size])
    }

    fn backward(&self, ctx: &mut BackwardContext<'_>, _error: &Tensor) -> Result<Option<Tensor>> {
        if !self.move_centers {
            return Ok(None);
        }
        let param = self.built_centers()?.clone();
        let original = param.value();
        let width = original.shape()[1].max(1);
        let mut moved = (*original).clone();
        let input = ctx.input(0)?;
        let activations = ctx.output();
        for (x, row) in input
            .data()
            .chunks(width)
            .zip(activations.data().chunks(self.size.max(1)))
        {
            for k in self.selected(row) {
                let center = &mut moved.data_mut()[k * width..(k + 1) * width];
                for (c, xi) in center.iter_mut().zip(x) {
                    *c += self.step_size * (xi - *c);
                }
            }
        }
        let delta = moved.sub(&original)?;
        ctx.update(&param, delta)?;
        Ok(None)
    }

    fn parameters(&self) -> Vec<Parameter> {
        self.centers.iter().cloned().collect()
    }

    fn named_parameters(&self) -> Vec<(String, Parameter)> {
        self.centers
            .iter()
            .map(|c| ("centers".to_string(), c.clone()))
            .collect()
    }
}

#[cfg(test)]
#[path = "rbf_test.rs"]
mod tests;
