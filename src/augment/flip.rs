//! Flip transformation

use ndarray::Axis;
use rand::Rng;

use super::{AugmentRng, Augmentation};
use crate::catalog::Cutout;
use crate::error::Result;

/// Reverses the volume along a subset of its three spatial axes.
///
/// With [`Flip::random`] each axis is flipped independently with probability
/// one half; [`Flip::axes`] fixes the subset. Flipping twice along the same
/// axis restores the original volume.
#[derive(Debug, Clone)]
pub struct Flip {
    axes: Option<[bool; 3]>,
}

impl Flip {
    /// Flip a random subset of axes per sample
    pub fn random() -> Self {
        Self { axes: None }
    }

    /// Flip exactly the given axes
    pub fn axes(axes: [bool; 3]) -> Self {
        Self { axes: Some(axes) }
    }
}

impl Augmentation for Flip {
    fn apply(&self, mut cutout: Cutout, rng: &mut AugmentRng) -> Result<Cutout> {
        let axes = match self.axes {
            Some(axes) => axes,
            None => [rng.random(), rng.random(), rng.random()],
        };
        for (i, &flip) in axes.iter().enumerate() {
            if flip {
                cutout.volume.invert_axis(Axis(i));
            }
        }
        Ok(cutout)
    }

    fn name(&self) -> &'static str {
        "flip"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CandidateKey;
    use ndarray::Array3;
    use rand::SeedableRng;

    fn sample() -> Cutout {
        let volume = Array3::from_shape_fn((2, 3, 3), |(z, y, x)| (z * 9 + y * 3 + x) as f32);
        Cutout::new(CandidateKey::new("s", 0), volume, false)
    }

    #[test]
    fn test_flip_reverses_axis() {
        let mut rng = AugmentRng::seed_from_u64(0);
        let flip = Flip::axes([false, true, false]);
        let original = sample();
        let flipped = flip.apply(original.clone(), &mut rng).unwrap();
        assert_eq!(flipped.volume[[0, 0, 0]], original.volume[[0, 2, 0]]);
        assert_eq!(flipped.volume[[1, 2, 1]], original.volume[[1, 0, 1]]);
    }

    #[test]
    fn test_double_flip_is_identity() {
        let mut rng = AugmentRng::seed_from_u64(0);
        let flip = Flip::axes([true, false, true]);
        let original = sample();
        let once = flip.apply(original.clone(), &mut rng).unwrap();
        let twice = flip.apply(once, &mut rng).unwrap();
        assert_eq!(twice.volume, original.volume);
    }

    #[test]
    fn test_random_flip_is_deterministic_per_seed() {
        let a = Flip::random()
            .apply(sample(), &mut AugmentRng::seed_from_u64(7))
            .unwrap();
        let b = Flip::random()
            .apply(sample(), &mut AugmentRng::seed_from_u64(7))
            .unwrap();
        assert_eq!(a.volume, b.volume);
    }

    #[test]
    fn test_flip_preserves_shape_and_label() {
        let mut rng = AugmentRng::seed_from_u64(3);
        let flipped = Flip::random().apply(sample(), &mut rng).unwrap();
        assert_eq!(flipped.shape(), [2, 3, 3]);
        assert!(!flipped.is_nodule);
    }
}
