//! Candidate identity and label

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifies a cutout: the CT series it came from plus the candidate index
/// within that series.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CandidateKey {
    pub series_uid: String,
    pub candidate_index: u32,
}

impl CandidateKey {
    /// Create a new key
    pub fn new(series_uid: impl Into<String>, candidate_index: u32) -> Self {
        Self {
            series_uid: series_uid.into(),
            candidate_index,
        }
    }
}

impl fmt::Display for CandidateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.series_uid, self.candidate_index)
    }
}

/// A catalog entry: where the cutout lives and whether it is a nodule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    pub key: CandidateKey,
    pub is_nodule: bool,
}
