//! Classifier network
//!
//! A fixed-topology 3-D convolutional network: normalization tail, repeated
//! convolution/pool blocks forming the backbone, and a fully-connected
//! softmax head. Every layer carries an explicit `forward`/`backward` pair
//! over `ndarray` buffers; gradients accumulate into [`Param`] storage that
//! the optimizers consume.

pub mod layers;

mod classifier;
mod param;

pub use classifier::{softmax, ClassifierConfig, ConvBlock, NoduleClassifier};
pub use param::Param;
