//! 3-D batch normalization

use ndarray::{Array1, Array5, Axis};

use crate::model::Param;

/// Per-channel batch normalization over (batch, depth, height, width).
///
/// Training passes normalize with batch statistics and fold them into the
/// running estimates; evaluation passes use the running estimates only, so
/// a single sample normalizes the same way regardless of its batch peers.
pub struct BatchNorm3d {
    channels: usize,
    gamma: Param,
    beta: Param,
    running_mean: Array1<f32>,
    running_var: Array1<f32>,
    momentum: f32,
    eps: f32,
    cache: Option<BnCache>,
}

struct BnCache {
    x_hat: Array5<f32>,
    inv_std: Array1<f32>,
    count: usize,
}

impl BatchNorm3d {
    pub fn new(channels: usize) -> Self {
        Self {
            channels,
            gamma: Param::ones(&[channels]),
            beta: Param::zeros(&[channels]),
            running_mean: Array1::zeros(channels),
            running_var: Array1::ones(channels),
            momentum: 0.1,
            eps: 1e-5,
            cache: None,
        }
    }

    pub fn forward(&mut self, input: &Array5<f32>, train: bool) -> Array5<f32> {
        let (b, c, d, h, w) = input.dim();
        assert_eq!(c, self.channels, "channel mismatch");
        let count = b * d * h * w;

        let mut out = Array5::zeros((b, c, d, h, w));
        let mut x_hat = Array5::zeros((b, c, d, h, w));
        let mut inv_std = Array1::zeros(c);

        for ci in 0..c {
            let xc = input.index_axis(Axis(1), ci);
            let (mean, var) = if train {
                let mean = xc.mean().unwrap_or(0.0);
                let var = xc.mapv(|v| (v - mean) * (v - mean)).mean().unwrap_or(0.0);
                self.running_mean[ci] =
                    (1.0 - self.momentum) * self.running_mean[ci] + self.momentum * mean;
                self.running_var[ci] =
                    (1.0 - self.momentum) * self.running_var[ci] + self.momentum * var;
                (mean, var)
            } else {
                (self.running_mean[ci], self.running_var[ci])
            };

            let istd = 1.0 / (var + self.eps).sqrt();
            inv_std[ci] = istd;

            let normalized = xc.mapv(|v| (v - mean) * istd);
            let gamma = self.gamma.data()[ci];
            let beta = self.beta.data()[ci];
            out.index_axis_mut(Axis(1), ci)
                .assign(&normalized.mapv(|v| gamma * v + beta));
            if train {
                x_hat.index_axis_mut(Axis(1), ci).assign(&normalized);
            }
        }

        if train {
            self.cache = Some(BnCache {
                x_hat,
                inv_std,
                count,
            });
        }
        out
    }

    /// Accumulates gamma/beta gradients and returns the input gradient.
    pub fn backward(&mut self, grad_out: &Array5<f32>) -> Array5<f32> {
        let cache = self
            .cache
            .take()
            .expect("backward requires a training forward pass");
        let n = cache.count as f32;

        let mut grad_in = Array5::zeros(grad_out.raw_dim());
        for ci in 0..self.channels {
            let go = grad_out.index_axis(Axis(1), ci);
            let xh = cache.x_hat.index_axis(Axis(1), ci);

            let sum_go = go.sum();
            let sum_go_xhat = (&go * &xh).sum();
            self.gamma.grad_mut()[ci] += sum_go_xhat;
            self.beta.grad_mut()[ci] += sum_go;

            let scale = self.gamma.data()[ci] * cache.inv_std[ci] / n;
            let gx = (&go * n - sum_go - &xh * sum_go_xhat).mapv(|v| v * scale);
            grad_in.index_axis_mut(Axis(1), ci).assign(&gx);
        }
        grad_in
    }

    pub fn params_mut(&mut self) -> Vec<&mut Param> {
        vec![&mut self.gamma, &mut self.beta]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_training_forward_normalizes_per_channel() {
        let mut bn = BatchNorm3d::new(2);
        let x = Array5::from_shape_fn((2, 2, 2, 2, 2), |(b, c, z, y, xx)| {
            (b + 2 * c + z + y + xx) as f32
        });
        let y = bn.forward(&x, true);

        for ci in 0..2 {
            let yc = y.index_axis(Axis(1), ci);
            assert_relative_eq!(yc.mean().unwrap(), 0.0, epsilon = 1e-5);
            let var = yc.mapv(|v| v * v).mean().unwrap();
            assert_relative_eq!(var, 1.0, epsilon = 1e-3);
        }
    }

    #[test]
    fn test_eval_uses_running_statistics() {
        let mut bn = BatchNorm3d::new(1);
        // Fresh running stats are mean 0, var 1: eval is near-identity.
        let x = Array5::from_elem((1, 1, 2, 2, 2), 3.0);
        let y = bn.forward(&x, false);
        assert_relative_eq!(y[[0, 0, 0, 0, 0]], 3.0, epsilon = 1e-4);
    }

    #[test]
    fn test_running_statistics_move_toward_batch() {
        let mut bn = BatchNorm3d::new(1);
        let x = Array5::from_elem((4, 1, 2, 2, 2), 10.0);
        bn.forward(&x, true);
        // One step with momentum 0.1 from mean 0 toward 10.
        assert_relative_eq!(bn.running_mean[0], 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_backward_gradient_sums() {
        let mut bn = BatchNorm3d::new(1);
        let x = Array5::from_shape_fn((2, 1, 2, 2, 2), |(b, _, z, y, xx)| {
            (b * 7 + z * 3 + y * 2 + xx) as f32
        });
        bn.forward(&x, true);

        let go = Array5::ones((2, 1, 2, 2, 2));
        let gx = bn.backward(&go);

        // Beta gradient is the plain sum of the upstream gradient.
        assert_relative_eq!(bn.beta.grad()[0], 16.0);
        // Normalized activations are zero-mean, so uniform upstream gradient
        // cancels out through the mean and variance paths.
        assert_relative_eq!(gx.sum(), 0.0, epsilon = 1e-3);
    }
}
