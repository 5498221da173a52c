//! Augmentation pipeline
//!
//! Geometric transformations (flip, offset, scale, rotate) and filters
//! (noise) applied to a single cutout before it reaches the batcher. Every
//! element is polymorphic over one capability, [`Augmentation::apply`], so the
//! pipeline treats them uniformly: each stage feeds its output to the next,
//! and a failure in any stage aborts retrieval of that sample.
//!
//! Order is fixed and documented: all transformations run first, then all
//! filters, so additive noise is never geometrically distorted.

mod flip;
mod noise;
mod offset;
mod pipeline;
mod rotate;
mod scale;

pub use flip::Flip;
pub use noise::Noise;
pub use offset::Offset;
pub use pipeline::AugmentationPipeline;
pub use rotate::Rotate;
pub use scale::Scale;

use rand_chacha::ChaCha8Rng;

use crate::catalog::Cutout;
use crate::error::Result;

/// RNG used for augmentation streams; seeded per sample index so that
/// retrieval stays a pure function of the index.
pub type AugmentRng = ChaCha8Rng;

/// A single augmentation stage: (cutout, rng) -> cutout of the same shape.
///
/// Stateless aside from configured parameters; all randomness comes from the
/// caller-provided stream.
pub trait Augmentation: Send + Sync {
    /// Apply the stage to a cutout, consuming it
    fn apply(&self, cutout: Cutout, rng: &mut AugmentRng) -> Result<Cutout>;

    /// Stage name, for logs and errors
    fn name(&self) -> &'static str;
}
