use super::traits::Sampler;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::fmt;
use std::sync::{Mutex, PoisonError};

/// Visits indices in random order.
///
/// Without replacement every epoch is a fresh permutation (truncated to `num_samples`
/// when set); with replacement `num_samples` indices are drawn independently. The
/// generator lives in the sampler, so a seeded sampler gives the same sequence of
/// epochs on every run.
pub struct RandomSampler {
    replacement: bool,
    num_samples: Option<usize>,
    rng: Mutex<StdRng>,
}

impl RandomSampler {
    /// # Arguments
    /// * `replacement`: If `true`, an index can be selected several times.
    /// * `num_samples`: Indices per epoch, the dataset size by default.
    pub fn new(replacement: bool, num_samples: Option<usize>) -> Self {
        RandomSampler::from_rng(replacement, num_samples, StdRng::from_entropy())
    }

    /// Same as [`new`](RandomSampler::new) with a reproducible generator.
    pub fn with_seed(replacement: bool, num_samples: Option<usize>, seed: u64) -> Self {
        RandomSampler::from_rng(replacement, num_samples, StdRng::seed_from_u64(seed))
    }

    fn from_rng(replacement: bool, num_samples: Option<usize>, rng: StdRng) -> Self {
        RandomSampler {
            replacement,
            num_samples,
            rng: Mutex::new(rng),
        }
    }

    pub fn replacement(&self) -> bool {
        self.replacement
    }
}

impl Sampler for RandomSampler {
    fn iter(&self, dataset_len: usize) -> Box<dyn Iterator<Item = usize> + Send + Sync> {
        if dataset_len == 0 {
            return Box::new(std::iter::empty());
        }
        let count = self.num_samples.unwrap_or(dataset_len);
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);

        if self.replacement {
            let indices: Vec<usize> = (0..count).map(|_| rng.gen_range(0..dataset_len)).collect();
            return Box::new(indices.into_iter());
        }
        if count > dataset_len {
            log::warn!(
                "RandomSampler: {} samples requested from {} without replacement, using {}",
                count,
                dataset_len,
                dataset_len
            );
        }
        let mut indices: Vec<usize> = (0..dataset_len).collect();
        indices.shuffle(&mut *rng);
        indices.truncate(count);
        Box::new(indices.into_iter())
    }

    fn len(&self, dataset_len: usize) -> usize {
        let count = self.num_samples.unwrap_or(dataset_len);
        if self.replacement {
            count
        } else {
            count.min(dataset_len)
        }
    }
}

impl fmt::Debug for RandomSampler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RandomSampler")
            .field("replacement", &self.replacement)
            .field("num_samples", &self.num_samples)
            .finish()
    }
}

#[cfg(test)]
#[path = "random_sampler_test.rs"]
mod tests;
