//! Optimizers and learning-rate schedules.
//!
//! Optimizers operate on the flat [`Param`](crate::model::Param) buffers the
//! network exposes. State (momentum, moment estimates) is allocated lazily
//! on the first step so construction never needs to know parameter shapes.

mod adam;
mod scheduler;
mod sgd;

pub use adam::Adam;
pub use scheduler::{LrScheduler, StepDecayLr};
pub use sgd::Sgd;

use crate::model::Param;

/// A gradient-descent update rule.
///
/// `step` consumes the gradients accumulated in each parameter since the
/// last `zero_grad`. Parameters must be passed in a stable order across
/// steps; per-parameter state is keyed by position.
pub trait Optimizer {
    /// Apply one update using the accumulated gradients.
    fn step(&mut self, params: &mut [&mut Param]);

    /// Clear every gradient buffer.
    fn zero_grad(&self, params: &mut [&mut Param]) {
        for param in params.iter_mut() {
            param.zero_grad();
        }
    }

    /// Current learning rate
    fn lr(&self) -> f32;

    /// Replace the learning rate (used by schedulers between epochs)
    fn set_lr(&mut self, lr: f32);
}
