//! Augmentation composition

use rand::SeedableRng;

use super::{AugmentRng, Augmentation, Flip, Noise, Offset, Rotate, Scale};
use crate::catalog::Cutout;
use crate::error::{Error, Result};

/// Ordered sequence of transformations followed by filters.
///
/// The pipeline performs no branching or retry; the first failing stage
/// aborts retrieval of that sample. The RNG stream for a sample is derived
/// from the pipeline seed and the sample index, so the same (seed, index)
/// pair always produces the same output tensor.
pub struct AugmentationPipeline {
    transformations: Vec<Box<dyn Augmentation>>,
    filters: Vec<Box<dyn Augmentation>>,
    seed: u64,
}

impl AugmentationPipeline {
    /// Create an empty pipeline with the given seed
    pub fn new(seed: u64) -> Self {
        Self {
            transformations: Vec::new(),
            filters: Vec::new(),
            seed,
        }
    }

    /// The standard training pipeline: flip, offset 0.1, scale 0.2, rotate,
    /// then 25 HU of Gaussian noise.
    pub fn standard(seed: u64) -> Result<Self> {
        Ok(Self::new(seed)
            .with_transformation(Flip::random())
            .with_transformation(Offset::new(0.1)?)
            .with_transformation(Scale::new(0.2)?)
            .with_transformation(Rotate::new())
            .with_filter(Noise::new(25.0)?))
    }

    /// Append a geometric transformation (runs before all filters)
    pub fn with_transformation<A: Augmentation + 'static>(mut self, stage: A) -> Self {
        self.transformations.push(Box::new(stage));
        self
    }

    /// Append a filter (runs after all transformations)
    pub fn with_filter<A: Augmentation + 'static>(mut self, stage: A) -> Self {
        self.filters.push(Box::new(stage));
        self
    }

    /// Number of stages
    pub fn len(&self) -> usize {
        self.transformations.len() + self.filters.len()
    }

    /// Whether the pipeline has no stages
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Run every stage over `cutout`, seeding the RNG stream from the sample
    /// index. The output must keep the input shape.
    pub fn apply(&self, cutout: Cutout, index: usize) -> Result<Cutout> {
        let mut rng = self.rng_for(index);
        let expected = cutout.shape();

        let mut current = cutout;
        for stage in self.transformations.iter().chain(self.filters.iter()) {
            current = stage.apply(current, &mut rng)?;
        }

        let got = current.shape();
        if got != expected {
            return Err(Error::Shape {
                expected: expected.to_vec(),
                got: got.to_vec(),
            });
        }
        Ok(current)
    }

    fn rng_for(&self, index: usize) -> AugmentRng {
        // Mix the index into the seed so neighbouring samples get
        // uncorrelated streams.
        let stream = self
            .seed
            .wrapping_add((index as u64).wrapping_mul(0x9e37_79b9_7f4a_7c15));
        AugmentRng::seed_from_u64(stream)
    }
}
