//! # BatchLoader
//!
//! Groups the samples of a [`Dataset`] of `(input, target)` pairs into batches,
//! visiting indices in the order chosen by a [`Sampler`]. Each batch stacks its
//! samples along a new leading dimension, so samples of shape `[d]` give batches of
//! shape `[batch, d]`.
//!
//! ```rust
//! use toych_core::Tensor;
//! use toych_data::{BatchLoader, TensorDataset};
//!
//! let inputs = Tensor::new(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], vec![3, 2]).unwrap();
//! let targets = Tensor::new(vec![0.0, 1.0, 0.0], vec![3, 1]).unwrap();
//! let loader = BatchLoader::new(TensorDataset::new(inputs, targets).unwrap())
//!     .with_batch_size(2)
//!     .unwrap();
//!
//! let batches: Vec<_> = loader.iter().collect::<Result<_, _>>().unwrap();
//! assert_eq!(batches[0].0.shape(), &[2, 2]);
//! assert_eq!(batches[1].0.shape(), &[1, 2]);
//! ```

use crate::datasets::Dataset;
use crate::samplers::{Sampler, SequentialSampler};
use toych_core::model::BatchSource;
use toych_core::{Tensor, ToychError};

pub const DEFAULT_BATCH_SIZE: usize = 32;

/// Batches of stacked `(input, target)` samples.
///
/// Implements [`BatchSource`], so it can be handed to `toych_core::model::fit`
/// directly; with a [`RandomSampler`](crate::samplers::RandomSampler) every epoch
/// sees a new order.
#[derive(Debug)]
pub struct BatchLoader<D, S = SequentialSampler> {
    dataset: D,
    sampler: S,
    batch_size: usize,
    drop_last: bool,
}

impl<D> BatchLoader<D, SequentialSampler>
where
    D: Dataset<Item = (Tensor, Tensor)>,
{
    /// Sequential batches of [`DEFAULT_BATCH_SIZE`], keeping the last short batch.
    pub fn new(dataset: D) -> Self {
        BatchLoader {
            dataset,
            sampler: SequentialSampler,
            batch_size: DEFAULT_BATCH_SIZE,
            drop_last: false,
        }
    }
}

impl<D, S> BatchLoader<D, S>
where
    D: Dataset<Item = (Tensor, Tensor)>,
    S: Sampler,
{
    /// # Errors
    /// `ConfigurationError` if `batch_size` is zero.
    pub fn with_batch_size(mut self, batch_size: usize) -> Result<Self, ToychError> {
        if batch_size == 0 {
            return Err(ToychError::ConfigurationError(
                "batch size must be at least 1".to_string(),
            ));
        }
        self.batch_size = batch_size;
        Ok(self)
    }

    /// Whether an incomplete last batch is skipped.
    pub fn with_drop_last(mut self, drop_last: bool) -> Self {
        self.drop_last = drop_last;
        self
    }

    pub fn with_sampler<S2: Sampler>(self, sampler: S2) -> BatchLoader<D, S2> {
        BatchLoader {
            dataset: self.dataset,
            sampler,
            batch_size: self.batch_size,
            drop_last: self.drop_last,
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn drop_last(&self) -> bool {
        self.drop_last
    }

    pub fn dataset(&self) -> &D {
        &self.dataset
    }

    /// Number of batches in one epoch.
    pub fn len(&self) -> usize {
        let samples = self.sampler.len(self.dataset.len());
        if self.drop_last {
            samples / self.batch_size
        } else {
            samples.div_ceil(self.batch_size)
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// One epoch of batches. Each call asks the sampler for a new index order.
    pub fn iter(&self) -> Batches<'_, D> {
        Batches {
            dataset: &self.dataset,
            indices: self.sampler.iter(self.dataset.len()),
            batch_size: self.batch_size,
            drop_last: self.drop_last,
        }
    }
}

impl<D, S> BatchSource for BatchLoader<D, S>
where
    D: Dataset<Item = (Tensor, Tensor)>,
    S: Sampler,
{
    fn batches(&mut self) -> toych_core::Result<Vec<(Tensor, Tensor)>> {
        let batches = self.iter().collect::<Result<Vec<_>, _>>()?;
        log::debug!("BatchLoader yielded {} batch(es) of up to {}", batches.len(), self.batch_size);
        Ok(batches)
    }
}

/// Iterator over the batches of one epoch, see [`BatchLoader::iter`].
pub struct Batches<'a, D> {
    dataset: &'a D,
    indices: Box<dyn Iterator<Item = usize> + Send + Sync>,
    batch_size: usize,
    drop_last: bool,
}

impl<D> Iterator for Batches<'_, D>
where
    D: Dataset<Item = (Tensor, Tensor)>,
{
    type Item = Result<(Tensor, Tensor), ToychError>;

    /// - `Some(Ok(batch))`: the next stacked batch.
    /// - `Some(Err(e))`: a sample could not be fetched or stacked.
    /// - `None`: the epoch is over.
    fn next(&mut self) -> Option<Self::Item> {
        let mut inputs = Vec::with_capacity(self.batch_size);
        let mut targets = Vec::with_capacity(self.batch_size);
        for index in self.indices.by_ref().take(self.batch_size) {
            match self.dataset.get(index) {
                Ok((x, t)) => {
                    inputs.push(x);
                    targets.push(t);
                }
                Err(e) => return Some(Err(e)),
            }
        }
        if inputs.is_empty() || (self.drop_last && inputs.len() < self.batch_size) {
            return None;
        }
        Some(Tensor::stack(&inputs).and_then(|x| Ok((x, Tensor::stack(&targets)?))))
    }
}

#[cfg(test)]
#[path = "dataloader_test.rs"]
mod tests;
