//! Offset transformation

use ndarray::{s, Array3};
use rand::Rng;

use super::{AugmentRng, Augmentation};
use crate::catalog::Cutout;
use crate::error::{Error, Result};

/// Translates volume content by a random integer number of voxels along each
/// axis, bounded by `fraction` of that axis' extent. Voxels shifted in from
/// outside the original extent are zero-filled.
#[derive(Debug, Clone)]
pub struct Offset {
    fraction: f32,
}

impl Offset {
    /// Create an offset transformation; `fraction` must be in `[0, 1)`.
    pub fn new(fraction: f32) -> Result<Self> {
        if !(0.0..1.0).contains(&fraction) {
            return Err(Error::Config(format!(
                "offset fraction must be in [0, 1), got {fraction}"
            )));
        }
        Ok(Self { fraction })
    }

    /// Maximum shift in voxels for an axis of the given extent
    pub fn max_shift(&self, extent: usize) -> isize {
        (self.fraction * extent as f32).floor() as isize
    }
}

impl Augmentation for Offset {
    fn apply(&self, mut cutout: Cutout, rng: &mut AugmentRng) -> Result<Cutout> {
        let (d, h, w) = cutout.volume.dim();
        let extents = [d, h, w];

        let mut shifts = [0isize; 3];
        for (shift, &extent) in shifts.iter_mut().zip(extents.iter()) {
            let max = self.max_shift(extent);
            if max > 0 {
                *shift = rng.random_range(-(max as i64)..=max as i64) as isize;
            }
        }

        if shifts == [0, 0, 0] {
            return Ok(cutout);
        }

        // Per axis: destination start, source start, overlap length.
        let mut dst = [0usize; 3];
        let mut src = [0usize; 3];
        let mut len = [0usize; 3];
        for i in 0..3 {
            if shifts[i] >= 0 {
                dst[i] = shifts[i] as usize;
                src[i] = 0;
            } else {
                dst[i] = 0;
                src[i] = (-shifts[i]) as usize;
            }
            len[i] = extents[i] - shifts[i].unsigned_abs();
        }

        let mut shifted = Array3::zeros((d, h, w));
        shifted
            .slice_mut(s![
                dst[0]..dst[0] + len[0],
                dst[1]..dst[1] + len[1],
                dst[2]..dst[2] + len[2]
            ])
            .assign(&cutout.volume.slice(s![
                src[0]..src[0] + len[0],
                src[1]..src[1] + len[1],
                src[2]..src[2] + len[2]
            ]));

        cutout.volume = shifted;
        Ok(cutout)
    }

    fn name(&self) -> &'static str {
        "offset"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CandidateKey;
    use rand::SeedableRng;

    fn sample(shape: (usize, usize, usize)) -> Cutout {
        let volume = Array3::from_shape_fn(shape, |(z, y, x)| (z * 100 + y * 10 + x) as f32);
        Cutout::new(CandidateKey::new("s", 0), volume, true)
    }

    #[test]
    fn test_rejects_bad_fraction() {
        assert!(Offset::new(1.0).is_err());
        assert!(Offset::new(-0.1).is_err());
        assert!(Offset::new(0.0).is_ok());
    }

    #[test]
    fn test_max_shift_bound() {
        // Fraction 0.1 on a 48-voxel axis allows at most 4 voxels of shift.
        let offset = Offset::new(0.1).unwrap();
        assert_eq!(offset.max_shift(48), 4);
        assert_eq!(offset.max_shift(32), 3);
    }

    #[test]
    fn test_zero_fraction_is_identity() {
        let offset = Offset::new(0.0).unwrap();
        let original = sample((4, 6, 6));
        let shifted = offset
            .apply(original.clone(), &mut AugmentRng::seed_from_u64(1))
            .unwrap();
        assert_eq!(shifted.volume, original.volume);
    }

    #[test]
    fn test_shift_moves_content_and_zero_fills() {
        // Force a deterministic +1 shift along every axis by choosing a
        // fraction that bounds the shift to exactly one voxel on a tiny cube.
        let offset = Offset::new(0.4).unwrap();
        let original = sample((3, 3, 3));
        let mut rng = AugmentRng::seed_from_u64(0);
        let shifted = offset.apply(original.clone(), &mut rng).unwrap();

        assert_eq!(shifted.shape(), [3, 3, 3]);
        // Mass is conserved or lost to the boundary, never created.
        assert!(shifted.volume.sum() <= original.volume.sum());
    }

    #[test]
    fn test_shift_is_deterministic_per_seed() {
        let offset = Offset::new(0.25).unwrap();
        let a = offset
            .apply(sample((4, 8, 8)), &mut AugmentRng::seed_from_u64(9))
            .unwrap();
        let b = offset
            .apply(sample((4, 8, 8)), &mut AugmentRng::seed_from_u64(9))
            .unwrap();
        assert_eq!(a.volume, b.volume);
    }
}
