//! Stochastic gradient descent with momentum

use ndarray::Array1;

use super::Optimizer;
use crate::model::Param;

/// SGD with classical momentum:
///
/// ```text
/// v = momentum * v - lr * g
/// p = p + v
/// ```
///
/// With `momentum = 0` this reduces to plain gradient descent. Velocity
/// buffers are allocated on the first step.
///
/// # Example
///
/// ```
/// use luna16::model::Param;
/// use luna16::optim::{Optimizer, Sgd};
///
/// let mut param = Param::ones(&[2]);
/// param.grad_mut().fill(1.0);
/// let mut sgd = Sgd::new(0.1, 0.0);
/// sgd.step(&mut [&mut param]);
/// assert_eq!(param.data()[0], 0.9);
/// ```
pub struct Sgd {
    lr: f32,
    momentum: f32,
    velocities: Vec<Option<Array1<f32>>>,
}

impl Sgd {
    pub fn new(lr: f32, momentum: f32) -> Self {
        Self {
            lr,
            momentum,
            velocities: Vec::new(),
        }
    }

    pub fn momentum(&self) -> f32 {
        self.momentum
    }
}

impl Optimizer for Sgd {
    fn step(&mut self, params: &mut [&mut Param]) {
        if self.velocities.len() < params.len() {
            self.velocities.resize(params.len(), None);
        }

        for (param, velocity) in params.iter_mut().zip(self.velocities.iter_mut()) {
            let v = velocity.get_or_insert_with(|| Array1::zeros(param.len()));
            let grad = param.grad();
            for (vi, gi) in v.iter_mut().zip(grad.iter()) {
                *vi = self.momentum * *vi - self.lr * gi;
            }
            *param.data_mut() += &*v;
        }
    }

    fn lr(&self) -> f32 {
        self.lr
    }

    fn set_lr(&mut self, lr: f32) {
        self.lr = lr;
    }
}
