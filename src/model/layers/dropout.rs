//! Inverted dropout

use ndarray::Array2;
use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::error::{Error, Result};

/// Inverted dropout over flattened activations.
///
/// Active only during training: surviving units are scaled by `1 / (1 - p)`
/// so evaluation needs no compensation and is a plain pass-through.
pub struct Dropout {
    p: f32,
    mask: Option<Array2<f32>>,
}

impl Dropout {
    /// Create a dropout layer; `p` must lie in `[0, 1)`.
    pub fn new(p: f32) -> Result<Self> {
        if !(0.0..1.0).contains(&p) {
            return Err(Error::Config(format!(
                "dropout probability must be in [0, 1), got {p}"
            )));
        }
        Ok(Self { p, mask: None })
    }

    pub fn forward(&mut self, input: &Array2<f32>, train: bool, rng: &mut ChaCha8Rng) -> Array2<f32> {
        if !train || self.p == 0.0 {
            if train {
                self.mask = Some(Array2::ones(input.raw_dim()));
            }
            return input.clone();
        }

        let keep = 1.0 - self.p;
        let mut mask = Array2::zeros(input.raw_dim());
        for m in mask.iter_mut() {
            *m = if rng.random::<f32>() < keep {
                1.0 / keep
            } else {
                0.0
            };
        }
        let out = input * &mask;
        self.mask = Some(mask);
        out
    }

    pub fn backward(&mut self, grad_out: &Array2<f32>) -> Array2<f32> {
        let mask = self
            .mask
            .take()
            .expect("backward requires a training forward pass");
        grad_out * &mask
    }
}
