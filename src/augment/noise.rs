//! Noise filter

use rand::Rng;
use std::f32::consts::PI;

use super::{AugmentRng, Augmentation};
use crate::catalog::Cutout;
use crate::error::{Error, Result};

/// Adds zero-mean Gaussian noise with the configured standard deviation
/// (in Hounsfield units) to every voxel.
#[derive(Debug, Clone)]
pub struct Noise {
    magnitude: f32,
}

impl Noise {
    /// Create a noise filter; `magnitude` must be non-negative.
    pub fn new(magnitude: f32) -> Result<Self> {
        if magnitude < 0.0 {
            return Err(Error::Config(format!(
                "noise magnitude must be >= 0, got {magnitude}"
            )));
        }
        Ok(Self { magnitude })
    }
}

impl Augmentation for Noise {
    fn apply(&self, mut cutout: Cutout, rng: &mut AugmentRng) -> Result<Cutout> {
        if self.magnitude == 0.0 {
            return Ok(cutout);
        }
        for v in cutout.volume.iter_mut() {
            // Box-Muller transform for Gaussian noise
            let u1: f32 = rng.random::<f32>().max(1e-10);
            let u2: f32 = rng.random::<f32>();
            *v += (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos() * self.magnitude;
        }
        Ok(cutout)
    }

    fn name(&self) -> &'static str {
        "noise"
    }
}
