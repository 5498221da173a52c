//! Dataset views, balancing, and batching
//!
//! A [`DatasetView`] is an indexable, ordered sequence of cutouts with a
//! fixed logical length; every access is a pure function of the index and the
//! immutable catalog, so views are safe to share across loader workers
//! without locking. [`BalancedDataset`] re-samples the catalog so positives
//! and negatives appear at a configured ratio; [`DataModule`] owns the train
//! and validation views and hands out restartable batch iterators.

mod balanced;
mod batch;
mod loader;
mod module;
mod view;

pub use balanced::{BalancedDataset, NoduleRatio};
pub use batch::Batch;
pub use loader::BatchIterator;
pub use module::{DataModule, Device};
pub use view::{DatasetView, PlainDataset};
