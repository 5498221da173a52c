//! Lazy batch iteration over a dataset view

use std::sync::Arc;

use super::batch::Batch;
use super::view::DatasetView;
use crate::error::Result;

/// Lazy, restartable sequence of batches over a dataset view.
///
/// The iteration order is fixed at construction (sequential, or a shuffled
/// permutation supplied by the data module). A fetch error is yielded once
/// and ends the iteration; no batch-level retry exists.
pub struct BatchIterator {
    view: Arc<dyn DatasetView>,
    order: Vec<usize>,
    batch_size: usize,
    cursor: usize,
    failed: bool,
}

impl BatchIterator {
    pub(crate) fn new(view: Arc<dyn DatasetView>, order: Vec<usize>, batch_size: usize) -> Self {
        Self {
            view,
            order,
            batch_size,
            cursor: 0,
            failed: false,
        }
    }

    /// Total number of batches this iterator will yield
    pub fn num_batches(&self) -> usize {
        self.order.len().div_ceil(self.batch_size)
    }
}

impl Iterator for BatchIterator {
    type Item = Result<Batch>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.cursor >= self.order.len() {
            return None;
        }

        let end = (self.cursor + self.batch_size).min(self.order.len());
        let indices = &self.order[self.cursor..end];
        self.cursor = end;

        let mut cutouts = Vec::with_capacity(indices.len());
        for &index in indices {
            match self.view.get(index) {
                Ok(cutout) => cutouts.push(cutout),
                Err(e) => {
                    self.failed = true;
                    return Some(Err(e));
                }
            }
        }

        match Batch::collate(cutouts) {
            Ok(batch) => Some(Ok(batch)),
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}
