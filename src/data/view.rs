//! Dataset view trait and the unbalanced catalog view

use crate::catalog::{Cutout, SampleCatalog};
use crate::error::{Error, Result};

/// An indexable, ordered sequence of cutouts with a fixed logical length.
///
/// `get` must be a pure function of `index`: no shared mutable state, so a
/// view can be read from multiple workers concurrently.
pub trait DatasetView: Send + Sync {
    /// Logical length of the view
    fn len(&self) -> usize;

    /// Whether the view is empty
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Retrieve the sample at `index`
    fn get(&self, index: usize) -> Result<Cutout>;
}

/// Catalog-order view without rebalancing or augmentation; used for
/// validation, where prevalence should match the data.
pub struct PlainDataset {
    catalog: SampleCatalog,
}

impl PlainDataset {
    /// Wrap a catalog
    pub fn new(catalog: SampleCatalog) -> Self {
        Self { catalog }
    }
}

impl DatasetView for PlainDataset {
    fn len(&self) -> usize {
        self.catalog.len()
    }

    fn get(&self, index: usize) -> Result<Cutout> {
        if index >= self.catalog.len() {
            return Err(Error::Index {
                index,
                len: self.catalog.len(),
            });
        }
        self.catalog.fetch(index)
    }
}
