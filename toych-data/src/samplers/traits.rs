use std::fmt::Debug;

/// Decides the order in which a loader visits dataset indices.
///
/// [`iter`](Sampler::iter) is called once per epoch, so a sampler may yield a
/// different order every time.
pub trait Sampler: Debug + Send + Sync {
    /// Indices for one pass over a dataset of `dataset_len` samples.
    fn iter(&self, dataset_len: usize) -> Box<dyn Iterator<Item = usize> + Send + Sync>;

    /// Number of indices [`iter`](Sampler::iter) yields.
    fn len(&self, dataset_len: usize) -> usize;
}
