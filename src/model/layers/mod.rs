//! Network layers with explicit forward/backward passes.
//!
//! Each layer caches whatever its backward pass needs during a training
//! forward pass (`train = true`) and releases the cache when backward runs.
//! Evaluation passes cache nothing.

mod batchnorm;
mod conv3d;
mod dropout;
mod linear;
mod maxpool;
mod relu;

pub use batchnorm::BatchNorm3d;
pub use conv3d::Conv3d;
pub use dropout::Dropout;
pub use linear::Linear;
pub use maxpool::MaxPool3d;
pub use relu::Relu;
