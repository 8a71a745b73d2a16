use super::*;
use crate::datasets::TensorDataset;
use crate::samplers::RandomSampler;
use toych_core::model::{fit, FitConfig};
use toych_core::nn::layers::{Dense, Layer};

/// Five samples: inputs `[i, 10 i]`, targets `[i]`.
fn dataset() -> TensorDataset {
    let inputs = (0..5).flat_map(|i| [i as f64, 10.0 * i as f64]).collect();
    let targets = (0..5).map(|i| i as f64).collect();
    TensorDataset::new(
        Tensor::new(inputs, vec![5, 2]).unwrap(),
        Tensor::new(targets, vec![5, 1]).unwrap(),
    )
    .unwrap()
}

fn targets_of(batch: &(Tensor, Tensor)) -> Vec<f64> {
    batch.1.data().to_vec()
}

#[test]
fn test_defaults() {
    let loader = BatchLoader::new(dataset());
    assert_eq!(loader.batch_size(), DEFAULT_BATCH_SIZE);
    assert!(!loader.drop_last());
    assert_eq!(loader.len(), 1);
    let batches: Vec<_> = loader.iter().collect::<Result<_, _>>().unwrap();
    assert_eq!(batches[0].0.shape(), &[5, 2]);
    assert_eq!(batches[0].1.shape(), &[5, 1]);
}

#[test]
fn test_sequential_batches_stack_samples() {
    let loader = BatchLoader::new(dataset()).with_batch_size(2).unwrap();
    assert_eq!(loader.len(), 3);
    let batches: Vec<_> = loader.iter().collect::<Result<_, _>>().unwrap();
    assert_eq!(batches.len(), 3);
    assert_eq!(batches[0].0.data(), &[0.0, 0.0, 1.0, 10.0]);
    assert_eq!(targets_of(&batches[1]), vec![2.0, 3.0]);
    assert_eq!(batches[2].0.shape(), &[1, 2]);
    assert_eq!(targets_of(&batches[2]), vec![4.0]);
}

#[test]
fn test_drop_last() {
    let loader = BatchLoader::new(dataset())
        .with_batch_size(2)
        .unwrap()
        .with_drop_last(true);
    assert_eq!(loader.len(), 2);
    assert_eq!(loader.iter().count(), 2);
}

#[test]
fn test_zero_batch_size_rejected() {
    assert!(matches!(
        BatchLoader::new(dataset()).with_batch_size(0),
        Err(ToychError::ConfigurationError(_))
    ));
}

#[test]
fn test_random_sampler_covers_every_sample() {
    let mut loader = BatchLoader::new(dataset())
        .with_batch_size(2)
        .unwrap()
        .with_sampler(RandomSampler::with_seed(false, None, 5));
    let mut seen: Vec<f64> = loader.batches().unwrap().iter().flat_map(targets_of).collect();
    seen.sort_by(|a, b| a.partial_cmp(b).unwrap());
    assert_eq!(seen, vec![0.0, 1.0, 2.0, 3.0, 4.0]);
}

#[test]
fn test_sampler_index_out_of_range_is_reported() {
    #[derive(Debug)]
    struct PastTheEnd;
    impl Sampler for PastTheEnd {
        fn iter(&self, dataset_len: usize) -> Box<dyn Iterator<Item = usize> + Send + Sync> {
            Box::new(std::iter::once(dataset_len))
        }
        fn len(&self, _: usize) -> usize {
            1
        }
    }
    let mut loader = BatchLoader::new(dataset()).with_sampler(PastTheEnd);
    assert!(matches!(
        loader.batches(),
        Err(ToychError::IndexOutOfBounds { .. })
    ));
}

#[test]
fn test_loader_feeds_fit() {
    let mut loader = BatchLoader::new(dataset()).with_batch_size(2).unwrap();
    let mut model = Layer::new(Dense::new(1).with_seed(2));
    let config = FitConfig::default().with_epochs(3).with_lr(0.01);
    let history = fit(&mut model, &mut loader, &config, None).unwrap();
    assert_eq!(history.epochs(), 3);
    assert!(history.loss.iter().all(|l| l.is_finite()));
}
