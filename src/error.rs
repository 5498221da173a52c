//! Crate-level error type
//!
//! All fallible operations in the library surface one of these variants.
//! Nothing is retried internally: an error during a sample fetch or a
//! training step aborts the current run.

/// Convenience result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by the catalog, dataset, and training layers
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid configuration (bad ratio, empty pool, zero batch size, ...)
    #[error("configuration error: {0}")]
    Config(String),

    /// Index outside the declared logical length of a dataset view
    #[error("index {index} out of bounds for dataset of length {len}")]
    Index { index: usize, len: usize },

    /// A tensor had an unexpected shape (augmentation output, collation, ...)
    #[error("shape mismatch: expected {expected:?}, got {got:?}")]
    Shape {
        expected: Vec<usize>,
        got: Vec<usize>,
    },

    /// Malformed catalog index file
    #[error("catalog index error: {0}")]
    CatalogIndex(String),

    /// A cutout volume could not be read from disk
    #[error("cutout read error: {0}")]
    CutoutRead(String),

    /// Experiment tracking failure (unknown run, persistence error)
    #[error("tracking error: {0}")]
    Tracking(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
