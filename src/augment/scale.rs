//! Scale transformation

use rand::Rng;

use super::{AugmentRng, Augmentation};
use crate::catalog::Cutout;
use crate::error::{Error, Result};

/// Rescales voxel intensity by a random factor in `1 ± factor`.
#[derive(Debug, Clone)]
pub struct Scale {
    factor: f32,
}

impl Scale {
    /// Create a scale transformation; `factor` must be in `[0, 1)`.
    pub fn new(factor: f32) -> Result<Self> {
        if !(0.0..1.0).contains(&factor) {
            return Err(Error::Config(format!(
                "scale factor must be in [0, 1), got {factor}"
            )));
        }
        Ok(Self { factor })
    }
}

impl Augmentation for Scale {
    fn apply(&self, mut cutout: Cutout, rng: &mut AugmentRng) -> Result<Cutout> {
        let scale = 1.0 + self.factor * (rng.random::<f32>() * 2.0 - 1.0);
        cutout.volume.mapv_inplace(|v| v * scale);
        Ok(cutout)
    }

    fn name(&self) -> &'static str {
        "scale"
    }
}
