//! Batch collation

use ndarray::{s, Array1, Array5};

use crate::catalog::{CandidateKey, Cutout};
use crate::error::{Error, Result};

/// A stacked group of cutouts: volumes of shape
/// (batch, channel, depth, height, width) plus the parallel label array.
#[derive(Debug, Clone)]
pub struct Batch {
    pub volumes: Array5<f32>,
    pub labels: Array1<usize>,
    pub keys: Vec<CandidateKey>,
}

impl Batch {
    /// Stack cutouts into a single-channel batch tensor.
    ///
    /// All cutouts must share one shape; a mismatch is a shape error.
    pub fn collate(cutouts: Vec<Cutout>) -> Result<Self> {
        let first = cutouts
            .first()
            .ok_or_else(|| Error::Config("cannot collate an empty batch".into()))?;
        let [d, h, w] = first.shape();

        let mut volumes = Array5::zeros((cutouts.len(), 1, d, h, w));
        let mut labels = Array1::zeros(cutouts.len());
        let mut keys = Vec::with_capacity(cutouts.len());

        for (i, cutout) in cutouts.iter().enumerate() {
            let shape = cutout.shape();
            if shape != [d, h, w] {
                return Err(Error::Shape {
                    expected: vec![d, h, w],
                    got: shape.to_vec(),
                });
            }
            volumes
                .slice_mut(s![i, 0, .., .., ..])
                .assign(&cutout.volume);
            labels[i] = cutout.label();
            keys.push(cutout.key.clone());
        }

        Ok(Self {
            volumes,
            labels,
            keys,
        })
    }

    /// Number of samples in the batch
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Whether the batch is empty (never true for collated batches)
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}
