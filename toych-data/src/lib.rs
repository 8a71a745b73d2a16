//! Datasets, index samplers and the batch loader feeding `toych_core::model::fit`.

pub mod dataloader;
pub mod datasets;
pub mod samplers;

pub use dataloader::BatchLoader;
pub use datasets::{Dataset, TensorDataset};
pub use samplers::{RandomSampler, Sampler, SequentialSampler};
