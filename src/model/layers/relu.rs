//! Rectified linear activation

use ndarray::{Array, Dimension};

/// ReLU over arrays of any dimensionality.
///
/// The training forward pass caches a 0/1 mask of active units for the
/// backward pass.
pub struct Relu<D: Dimension> {
    mask: Option<Array<f32, D>>,
}

impl<D: Dimension> Relu<D> {
    pub fn new() -> Self {
        Self { mask: None }
    }

    pub fn forward(&mut self, input: &Array<f32, D>, train: bool) -> Array<f32, D> {
        if train {
            self.mask = Some(input.mapv(|v| if v > 0.0 { 1.0 } else { 0.0 }));
        }
        input.mapv(|v| v.max(0.0))
    }

    pub fn backward(&mut self, grad_out: &Array<f32, D>) -> Array<f32, D> {
        let mask = self
            .mask
            .take()
            .expect("backward requires a training forward pass");
        grad_out * &mask
    }
}

impl<D: Dimension> Default for Relu<D> {
    fn default() -> Self {
        Self::new()
    }
}
