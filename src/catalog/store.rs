//! Cutout volume storage
//!
//! The catalog resolves a candidate to a volume through the [`CutoutStore`]
//! trait, so that training code never cares whether cutouts come from a
//! directory of `.npy` files or from memory.

use std::collections::HashMap;
use std::path::PathBuf;

use ndarray::Array3;
use ndarray_npy::read_npy;

use super::CandidateKey;
use crate::error::{Error, Result};

/// Pluggable source of cutout volumes
pub trait CutoutStore: Send + Sync {
    /// Fetch the volume for `key`
    fn fetch(&self, key: &CandidateKey) -> Result<Array3<f32>>;
}

/// Reads cutouts from a directory of `.npy` files named
/// `<series_uid>_<candidate_index>.npy`.
pub struct NpyCutoutStore {
    dir: PathBuf,
    expected_shape: Option<[usize; 3]>,
}

impl NpyCutoutStore {
    /// Create a store rooted at `dir`
    pub fn new(dir: PathBuf) -> Self {
        Self {
            dir,
            expected_shape: None,
        }
    }

    /// Reject volumes whose shape differs from `shape`
    pub fn with_expected_shape(mut self, shape: [usize; 3]) -> Self {
        self.expected_shape = Some(shape);
        self
    }

    fn path_for(&self, key: &CandidateKey) -> PathBuf {
        self.dir
            .join(format!("{}_{}.npy", key.series_uid, key.candidate_index))
    }
}

impl CutoutStore for NpyCutoutStore {
    fn fetch(&self, key: &CandidateKey) -> Result<Array3<f32>> {
        let path = self.path_for(key);
        let volume: Array3<f32> = read_npy(&path)
            .map_err(|e| Error::CutoutRead(format!("{}: {e}", path.display())))?;

        if let Some(expected) = self.expected_shape {
            let got = volume.dim();
            let got = [got.0, got.1, got.2];
            if got != expected {
                return Err(Error::Shape {
                    expected: expected.to_vec(),
                    got: got.to_vec(),
                });
            }
        }
        Ok(volume)
    }
}

/// In-memory store, used by tests and synthetic-data runs
#[derive(Default)]
pub struct InMemoryCutoutStore {
    volumes: HashMap<CandidateKey, Array3<f32>>,
}

impl InMemoryCutoutStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a volume for `key`
    pub fn insert(&mut self, key: CandidateKey, volume: Array3<f32>) {
        self.volumes.insert(key, volume);
    }
}

impl CutoutStore for InMemoryCutoutStore {
    fn fetch(&self, key: &CandidateKey) -> Result<Array3<f32>> {
        self.volumes
            .get(key)
            .cloned()
            .ok_or_else(|| Error::CutoutRead(format!("no volume for candidate {key}")))
    }
}
