//! Learning-rate schedules

use super::Optimizer;

/// Epoch-indexed learning-rate schedule.
pub trait LrScheduler {
    /// Learning rate for the current epoch
    fn get_lr(&self) -> f32;

    /// Advance to the next epoch
    fn step(&mut self);

    /// Push the current rate into an optimizer
    fn apply(&self, optimizer: &mut dyn Optimizer) {
        optimizer.set_lr(self.get_lr());
    }
}

/// Multiplies the learning rate by `gamma` every `step_size` epochs:
/// `lr = lr_initial * gamma^(epoch / step_size)`.
pub struct StepDecayLr {
    lr_initial: f32,
    gamma: f32,
    step_size: usize,
    current_epoch: usize,
}

impl StepDecayLr {
    pub fn new(lr_initial: f32, gamma: f32, step_size: usize) -> Self {
        Self {
            lr_initial,
            gamma,
            step_size: step_size.max(1),
            current_epoch: 0,
        }
    }
}

impl LrScheduler for StepDecayLr {
    fn get_lr(&self) -> f32 {
        let decays = (self.current_epoch / self.step_size) as i32;
        self.lr_initial * self.gamma.powi(decays)
    }

    fn step(&mut self) {
        self.current_epoch += 1;
    }
}
