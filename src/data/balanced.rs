//! Ratio-balanced dataset view

use serde::{Deserialize, Serialize};

use super::view::DatasetView;
use crate::augment::AugmentationPipeline;
use crate::catalog::{Cutout, SampleCatalog};
use crate::error::{Error, Result};

/// Desired relative frequency of positive vs. negative cutouts when
/// sampling. Both weights must be at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoduleRatio {
    positive: usize,
    negative: usize,
}

impl NoduleRatio {
    /// Create a ratio; both weights must be >= 1.
    pub fn new(positive: usize, negative: usize) -> Result<Self> {
        if positive == 0 || negative == 0 {
            return Err(Error::Config(format!(
                "nodule ratio weights must be >= 1, got {positive}:{negative}"
            )));
        }
        Ok(Self { positive, negative })
    }

    /// Positive weight
    pub fn positive(&self) -> usize {
        self.positive
    }

    /// Negative weight
    pub fn negative(&self) -> usize {
        self.negative
    }

    /// Length of one repeating window of samples
    pub fn window(&self) -> usize {
        self.positive + self.negative
    }
}

/// Re-sampled view in which every window of `p + n` consecutive indices
/// holds `p` positives followed by `n` negatives.
///
/// The pool that is exhausted slowest relative to its share of the window is
/// cycled through exactly once; the other pool wraps with modulo indexing so
/// it never runs out. Each retrieved cutout passes through the augmentation
/// pipeline (transformations first, then filters) before being returned.
pub struct BalancedDataset {
    catalog: SampleCatalog,
    positives: Vec<usize>,
    negatives: Vec<usize>,
    ratio: NoduleRatio,
    pipeline: Option<AugmentationPipeline>,
    length: usize,
}

impl std::fmt::Debug for BalancedDataset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BalancedDataset")
            .field("catalog", &self.catalog)
            .field("positives", &self.positives)
            .field("negatives", &self.negatives)
            .field("ratio", &self.ratio)
            .field("length", &self.length)
            .finish_non_exhaustive()
    }
}

impl BalancedDataset {
    /// Build a balanced view over `catalog`.
    ///
    /// Fails with a configuration error when either pool is empty, since the
    /// ratio requires at least one sample from each.
    pub fn new(
        catalog: SampleCatalog,
        ratio: NoduleRatio,
        pipeline: Option<AugmentationPipeline>,
    ) -> Result<Self> {
        let positives = catalog.positive_pool();
        let negatives = catalog.negative_pool();

        if positives.is_empty() {
            return Err(Error::Config(format!(
                "balanced dataset requires a non-empty positive pool for ratio {}:{}",
                ratio.positive(),
                ratio.negative()
            )));
        }
        if negatives.is_empty() {
            return Err(Error::Config(format!(
                "balanced dataset requires a non-empty negative pool for ratio {}:{}",
                ratio.positive(),
                ratio.negative()
            )));
        }

        let positive_windows = positives.len().div_ceil(ratio.positive());
        let negative_windows = negatives.len().div_ceil(ratio.negative());
        let windows = positive_windows.max(negative_windows);
        let length = windows * ratio.window();

        Ok(Self {
            catalog,
            positives,
            negatives,
            ratio,
            pipeline,
            length,
        })
    }

    /// Cap the logical length (keeps epoch cost bounded on huge catalogs)
    pub fn with_length(mut self, length: usize) -> Self {
        self.length = self.length.min(length);
        self
    }

    /// The configured ratio
    pub fn ratio(&self) -> NoduleRatio {
        self.ratio
    }

    /// Map a view index to a catalog index following the repeating window
    fn catalog_index(&self, index: usize) -> usize {
        let p = self.ratio.positive();
        let window = index / self.ratio.window();
        let offset = index % self.ratio.window();
        if offset < p {
            self.positives[(window * p + offset) % self.positives.len()]
        } else {
            let n = self.ratio.negative();
            self.negatives[(window * n + offset - p) % self.negatives.len()]
        }
    }
}

impl DatasetView for BalancedDataset {
    fn len(&self) -> usize {
        self.length
    }

    fn get(&self, index: usize) -> Result<Cutout> {
        if index >= self.length {
            return Err(Error::Index {
                index,
                len: self.length,
            });
        }
        let cutout = self.catalog.fetch(self.catalog_index(index))?;
        match &self.pipeline {
            Some(pipeline) => pipeline.apply(cutout, index),
            None => Ok(cutout),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Candidate, CandidateKey, InMemoryCutoutStore};
    use ndarray::Array3;
    use proptest::prelude::*;
    use std::sync::Arc;

    fn catalog(positives: usize, negatives: usize) -> SampleCatalog {
        let mut store = InMemoryCutoutStore::new();
        let mut candidates = Vec::new();
        for i in 0..positives + negatives {
            let key = CandidateKey::new("s", i as u32);
            store.insert(key.clone(), Array3::from_elem((2, 2, 2), i as f32));
            candidates.push(Candidate {
                key,
                is_nodule: i < positives,
            });
        }
        SampleCatalog::new(candidates, Arc::new(store))
    }

    #[test]
    fn test_ratio_validation() {
        assert!(NoduleRatio::new(0, 5).is_err());
        assert!(NoduleRatio::new(1, 0).is_err());
        let ratio = NoduleRatio::new(1, 5).unwrap();
        assert_eq!(ratio.window(), 6);
    }

    #[test]
    fn test_empty_positive_pool_is_config_error() {
        let err = BalancedDataset::new(catalog(0, 10), NoduleRatio::new(1, 5).unwrap(), None)
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_window_pattern() {
        let view =
            BalancedDataset::new(catalog(3, 30), NoduleRatio::new(1, 5).unwrap(), None).unwrap();
        // Index 0 positive, 1..=5 negative, 6 positive again.
        assert!(view.get(0).unwrap().is_nodule);
        for i in 1..=5 {
            assert!(!view.get(i).unwrap().is_nodule, "index {i}");
        }
        assert!(view.get(6).unwrap().is_nodule);
    }

    #[test]
    fn test_length_cycles_slowest_pool_once() {
        // Ratio (1,5) with pools 77/47422: the negative pool dominates, so
        // the view covers it fully while the positive pool wraps.
        let view = BalancedDataset::new(
            catalog(77, 47422),
            NoduleRatio::new(1, 5).unwrap(),
            None,
        )
        .unwrap();
        assert_eq!(view.len(), 47422usize.div_ceil(5) * 6);
        assert_eq!(view.len(), 56910);
    }

    #[test]
    fn test_small_positive_pool_wraps() {
        let view =
            BalancedDataset::new(catalog(2, 12), NoduleRatio::new(1, 3).unwrap(), None).unwrap();
        // Windows 0 and 1 take positives 0 and 1; window 2 wraps back to 0.
        let first = view.get(0).unwrap();
        let third_window = view.get(8).unwrap();
        assert_eq!(first.key, third_window.key);
    }

    #[test]
    fn test_out_of_bounds() {
        let view =
            BalancedDataset::new(catalog(1, 5), NoduleRatio::new(1, 5).unwrap(), None).unwrap();
        let len = view.len();
        assert!(matches!(
            view.get(len).unwrap_err(),
            Error::Index { .. }
        ));
    }

    #[test]
    fn test_with_length_caps() {
        let view = BalancedDataset::new(catalog(5, 50), NoduleRatio::new(1, 1).unwrap(), None)
            .unwrap()
            .with_length(10);
        assert_eq!(view.len(), 10);
    }

    proptest! {
        #[test]
        fn prop_first_k_windows_hold_exact_proportion(
            p in 1usize..4,
            n in 1usize..6,
            k in 1usize..8,
        ) {
            let view = BalancedDataset::new(
                catalog(7, 31),
                NoduleRatio::new(p, n).unwrap(),
                None,
            ).unwrap();
            let window = p + n;
            prop_assume!(k * window <= view.len());

            let positives = (0..k * window)
                .map(|i| view.get(i).unwrap().is_nodule as usize)
                .sum::<usize>();
            prop_assert_eq!(positives, k * p);
        }
    }
}
