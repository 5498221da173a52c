//! Sample catalog
//!
//! Enumerates the CT-scan-derived cutout candidates and their nodule labels,
//! and partitions them into training and validation subsets by a fixed stride
//! rule. The catalog is built once per run and is immutable afterwards; every
//! fetch is a pure function of the candidate index.

mod candidate;
mod cutout;
mod store;

pub use candidate::{Candidate, CandidateKey};
pub use cutout::Cutout;
pub use store::{CutoutStore, InMemoryCutoutStore, NpyCutoutStore};

use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;

use crate::error::{Error, Result};

/// One row of the on-disk candidate index file
#[derive(Debug, Deserialize)]
struct IndexRecord {
    series_uid: String,
    candidate_index: u32,
    is_nodule: u8,
}

/// Immutable list of candidates plus the store their volumes live in
#[derive(Clone)]
pub struct SampleCatalog {
    candidates: Vec<Candidate>,
    store: Arc<dyn CutoutStore>,
}

impl std::fmt::Debug for SampleCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SampleCatalog")
            .field("candidates", &self.candidates)
            .finish_non_exhaustive()
    }
}

impl SampleCatalog {
    /// Build a catalog from an in-memory candidate list
    pub fn new(candidates: Vec<Candidate>, store: Arc<dyn CutoutStore>) -> Self {
        Self { candidates, store }
    }

    /// Build a catalog from a CSV index file and a directory of `.npy` cutouts
    ///
    /// The index has one row per candidate: `series_uid,candidate_index,is_nodule`.
    pub fn from_index_file(index_file: &Path, cutout_dir: &Path) -> Result<Self> {
        let mut reader = csv::Reader::from_path(index_file).map_err(|e| {
            Error::CatalogIndex(format!("failed to open {}: {e}", index_file.display()))
        })?;

        let mut candidates = Vec::new();
        for (line, record) in reader.deserialize::<IndexRecord>().enumerate() {
            let record = record
                .map_err(|e| Error::CatalogIndex(format!("row {}: {e}", line + 1)))?;
            candidates.push(Candidate {
                key: CandidateKey::new(record.series_uid, record.candidate_index),
                is_nodule: record.is_nodule != 0,
            });
        }

        let store = Arc::new(NpyCutoutStore::new(cutout_dir.to_path_buf()));
        Ok(Self::new(candidates, store))
    }

    /// Number of candidates in the catalog
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    /// Whether the catalog holds no candidates
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// The candidate list, in catalog order
    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    /// Fetch the cutout for the candidate at `index`
    pub fn fetch(&self, index: usize) -> Result<Cutout> {
        let candidate = self.candidates.get(index).ok_or(Error::Index {
            index,
            len: self.candidates.len(),
        })?;
        let volume = self.store.fetch(&candidate.key)?;
        Ok(Cutout::new(candidate.key.clone(), volume, candidate.is_nodule))
    }

    /// Partition into (training, validation) catalogs
    ///
    /// Every `stride`-th candidate lands in the validation subset, the rest in
    /// training. Both catalogs share the underlying store.
    pub fn split_by_stride(&self, stride: usize) -> Result<(SampleCatalog, SampleCatalog)> {
        if stride < 2 {
            return Err(Error::Config(format!(
                "validation stride must be >= 2, got {stride}"
            )));
        }

        let mut training = Vec::new();
        let mut validation = Vec::new();
        for (i, candidate) in self.candidates.iter().enumerate() {
            if i % stride == 0 {
                validation.push(candidate.clone());
            } else {
                training.push(candidate.clone());
            }
        }

        Ok((
            SampleCatalog::new(training, Arc::clone(&self.store)),
            SampleCatalog::new(validation, Arc::clone(&self.store)),
        ))
    }

    /// Indices of positive (nodule) candidates, in catalog order
    pub fn positive_pool(&self) -> Vec<usize> {
        self.candidates
            .iter()
            .enumerate()
            .filter(|(_, c)| c.is_nodule)
            .map(|(i, _)| i)
            .collect()
    }

    /// Indices of negative (non-nodule) candidates, in catalog order
    pub fn negative_pool(&self) -> Vec<usize> {
        self.candidates
            .iter()
            .enumerate()
            .filter(|(_, c)| !c.is_nodule)
            .map(|(i, _)| i)
            .collect()
    }
}
