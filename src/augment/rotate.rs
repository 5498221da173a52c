//! Rotate transformation

use ndarray::Axis;
use rand::Rng;

use super::{AugmentRng, Augmentation};
use crate::catalog::Cutout;
use crate::error::{Error, Result};

/// Rotates the volume by a random multiple of 90 degrees in the transverse
/// (height, width) plane. Quarter turns require a square transverse plane;
/// a non-square cutout is a shape error.
#[derive(Debug, Clone, Default)]
pub struct Rotate;

impl Rotate {
    /// Create a rotation transformation
    pub fn new() -> Self {
        Self
    }
}

impl Augmentation for Rotate {
    fn apply(&self, mut cutout: Cutout, rng: &mut AugmentRng) -> Result<Cutout> {
        let quarter_turns: u32 = rng.random_range(0..4);
        if quarter_turns == 0 {
            return Ok(cutout);
        }

        let (d, h, w) = cutout.volume.dim();
        if h != w {
            return Err(Error::Shape {
                expected: vec![d, h, h],
                got: vec![d, h, w],
            });
        }

        for _ in 0..quarter_turns {
            cutout.volume.swap_axes(1, 2);
            cutout.volume.invert_axis(Axis(1));
        }
        // Axis swapping leaves the array in a transposed memory layout;
        // restore standard layout so downstream slicing stays cheap.
        cutout.volume = cutout.volume.as_standard_layout().to_owned();
        Ok(cutout)
    }

    fn name(&self) -> &'static str {
        "rotate"
    }
}
