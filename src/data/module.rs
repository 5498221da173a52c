//! Data module: loaders and device placement

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::loader::BatchIterator;
use super::view::DatasetView;
use crate::error::{Error, Result};

/// Where staged batches are placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Device {
    /// General-purpose processor
    Cpu,
    /// Accelerator; this crate carries no accelerator backend, so a request
    /// for it resolves to [`Device::Cpu`] with a warning.
    Gpu,
}

impl Device {
    /// Resolve the requested placement against the compiled backends.
    pub fn resolve(requested: Device) -> Device {
        match requested {
            Device::Cpu => Device::Cpu,
            Device::Gpu => {
                warn!("no accelerator backend compiled in, falling back to cpu");
                Device::Cpu
            }
        }
    }
}

/// Owns the training and validation views and produces batch iterators.
///
/// Device placement is resolved once at construction and applies to every
/// produced batch. There is no public mutation after construction;
/// re-invoking a loader accessor restarts iteration from the beginning
/// (training order is reshuffled deterministically per restart).
pub struct DataModule {
    train: Arc<dyn DatasetView>,
    validation: Arc<dyn DatasetView>,
    batch_size: usize,
    device: Device,
    shuffle_seed: u64,
    restarts: AtomicU64,
}

impl DataModule {
    /// Create a data module over the two views
    pub fn new(
        train: Arc<dyn DatasetView>,
        validation: Arc<dyn DatasetView>,
        batch_size: usize,
        device: Device,
        shuffle_seed: u64,
    ) -> Result<Self> {
        if batch_size == 0 {
            return Err(Error::Config("batch size must be >= 1".into()));
        }
        Ok(Self {
            train,
            validation,
            batch_size,
            device: Device::resolve(device),
            shuffle_seed,
            restarts: AtomicU64::new(0),
        })
    }

    /// Batch size used by both loaders
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Resolved device placement
    pub fn device(&self) -> Device {
        self.device
    }

    /// Number of training batches per epoch
    pub fn training_len(&self) -> usize {
        self.train.len().div_ceil(self.batch_size)
    }

    /// Number of validation batches per epoch
    pub fn validation_len(&self) -> usize {
        self.validation.len().div_ceil(self.batch_size)
    }

    /// A fresh training loader with a deterministically reshuffled order.
    ///
    /// The order depends on the shuffle seed and on how many times a training
    /// loader has been taken, so successive epochs see different permutations
    /// while a fixed seed keeps the whole run reproducible.
    pub fn training_loader(&self) -> BatchIterator {
        let restart = self.restarts.fetch_add(1, Ordering::Relaxed);
        let mut order: Vec<usize> = (0..self.train.len()).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(self.shuffle_seed.wrapping_add(restart));
        order.shuffle(&mut rng);
        BatchIterator::new(Arc::clone(&self.train), order, self.batch_size)
    }

    /// A fresh sequential validation loader
    pub fn validation_loader(&self) -> BatchIterator {
        let order: Vec<usize> = (0..self.validation.len()).collect();
        BatchIterator::new(Arc::clone(&self.validation), order, self.batch_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CandidateKey, Cutout};
    use ndarray::Array3;

    struct StubView {
        len: usize,
    }

    impl DatasetView for StubView {
        fn len(&self) -> usize {
            self.len
        }

        fn get(&self, index: usize) -> Result<Cutout> {
            Ok(Cutout::new(
                CandidateKey::new("s", index as u32),
                Array3::zeros((2, 2, 2)),
                false,
            ))
        }
    }

    fn module(train_len: usize, validation_len: usize, batch_size: usize) -> DataModule {
        DataModule::new(
            Arc::new(StubView { len: train_len }),
            Arc::new(StubView {
                len: validation_len,
            }),
            batch_size,
            Device::Cpu,
            7,
        )
        .unwrap()
    }

    #[test]
    fn test_rejects_zero_batch_size() {
        let result = DataModule::new(
            Arc::new(StubView { len: 4 }),
            Arc::new(StubView { len: 4 }),
            0,
            Device::Cpu,
            0,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_batch_counts() {
        let module = module(10, 3, 4);
        assert_eq!(module.training_len(), 3);
        assert_eq!(module.validation_len(), 1);
    }

    #[test]
    fn test_gpu_request_falls_back_to_cpu() {
        let module = DataModule::new(
            Arc::new(StubView { len: 2 }),
            Arc::new(StubView { len: 2 }),
            1,
            Device::Gpu,
            0,
        )
        .unwrap();
        assert_eq!(module.device(), Device::Cpu);
    }

    #[test]
    fn test_validation_loader_is_sequential_and_restartable() {
        let module = module(4, 4, 2);
        for _ in 0..2 {
            let batches: Vec<_> = module
                .validation_loader()
                .map(|b| b.unwrap())
                .collect();
            assert_eq!(batches.len(), 2);
            assert_eq!(batches[0].keys[0].candidate_index, 0);
            assert_eq!(batches[1].keys[1].candidate_index, 3);
        }
    }

    #[test]
    fn test_training_loader_reshuffles_per_restart() {
        let module = module(64, 4, 64);
        let first: Vec<u32> = module
            .training_loader()
            .next()
            .unwrap()
            .unwrap()
            .keys
            .iter()
            .map(|k| k.candidate_index)
            .collect();
        let second: Vec<u32> = module
            .training_loader()
            .next()
            .unwrap()
            .unwrap()
            .keys
            .iter()
            .map(|k| k.candidate_index)
            .collect();
        assert_ne!(first, second);

        // Same seed, fresh module: the first epoch order is reproduced.
        let again = module_with_seed(7);
        let replay: Vec<u32> = again
            .training_loader()
            .next()
            .unwrap()
            .unwrap()
            .keys
            .iter()
            .map(|k| k.candidate_index)
            .collect();
        assert_eq!(first, replay);
    }

    fn module_with_seed(seed: u64) -> DataModule {
        DataModule::new(
            Arc::new(StubView { len: 64 }),
            Arc::new(StubView { len: 4 }),
            64,
            Device::Cpu,
            seed,
        )
        .unwrap()
    }
}
