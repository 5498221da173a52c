//! Fixed-size 3-D sub-volume around a candidate location

use ndarray::Array3;

use super::CandidateKey;

/// A cutout: the voxel volume (Hounsfield units), its label, and its identity.
///
/// Immutable once produced by the catalog; augmentations consume a cutout and
/// produce a new one of the same shape.
#[derive(Debug, Clone)]
pub struct Cutout {
    pub key: CandidateKey,
    /// Intensity volume, (depth, height, width)
    pub volume: Array3<f32>,
    pub is_nodule: bool,
}

impl Cutout {
    /// Create a cutout
    pub fn new(key: CandidateKey, volume: Array3<f32>, is_nodule: bool) -> Self {
        Self {
            key,
            volume,
            is_nodule,
        }
    }

    /// Spatial shape as (depth, height, width)
    pub fn shape(&self) -> [usize; 3] {
        let d = self.volume.dim();
        [d.0, d.1, d.2]
    }

    /// Class index: 1 for nodule, 0 otherwise
    pub fn label(&self) -> usize {
        usize::from(self.is_nodule)
    }
}
