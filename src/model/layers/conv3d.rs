//! 3-D convolution

use ndarray::{s, Array5};
use rand_chacha::ChaCha8Rng;

use crate::model::Param;

const KERNEL: usize = 3;
const PAD: usize = 1;

/// 3x3x3 convolution with stride 1 and padding 1, no bias.
///
/// Spatial extents are preserved; only the channel count changes. The weight
/// is stored flat in `(out, in, kz, ky, kx)` order and initialized with
/// Kaiming-normal draws scaled by the fan-out (`out * 27`). Bias is omitted
/// since every convolution here is followed by batch normalization.
pub struct Conv3d {
    in_channels: usize,
    out_channels: usize,
    weight: Param,
    padded: Option<Array5<f32>>,
}

impl Conv3d {
    pub fn new(in_channels: usize, out_channels: usize, rng: &mut ChaCha8Rng) -> Self {
        let fan_out = out_channels * KERNEL * KERNEL * KERNEL;
        let weight = Param::kaiming_normal(
            &[out_channels, in_channels, KERNEL, KERNEL, KERNEL],
            fan_out,
            rng,
        );
        Self {
            in_channels,
            out_channels,
            weight,
            padded: None,
        }
    }

    pub fn out_channels(&self) -> usize {
        self.out_channels
    }

    /// Flat index into the weight for `(co, ci, kz, ky, kx)`
    fn widx(&self, co: usize, ci: usize, kz: usize, ky: usize, kx: usize) -> usize {
        (((co * self.in_channels + ci) * KERNEL + kz) * KERNEL + ky) * KERNEL + kx
    }

    pub fn forward(&mut self, input: &Array5<f32>, train: bool) -> Array5<f32> {
        let (b, ci, d, h, w) = input.dim();
        assert_eq!(ci, self.in_channels, "channel mismatch");

        let mut padded = Array5::zeros((b, ci, d + 2 * PAD, h + 2 * PAD, w + 2 * PAD));
        padded
            .slice_mut(s![.., .., PAD..d + PAD, PAD..h + PAD, PAD..w + PAD])
            .assign(input);

        let weight = self.weight.data();
        let mut out = Array5::zeros((b, self.out_channels, d, h, w));
        for bi in 0..b {
            for co in 0..self.out_channels {
                for z in 0..d {
                    for y in 0..h {
                        for x in 0..w {
                            let mut acc = 0.0;
                            for c in 0..ci {
                                for kz in 0..KERNEL {
                                    for ky in 0..KERNEL {
                                        for kx in 0..KERNEL {
                                            acc += weight[self.widx(co, c, kz, ky, kx)]
                                                * padded[[bi, c, z + kz, y + ky, x + kx]];
                                        }
                                    }
                                }
                            }
                            out[[bi, co, z, y, x]] = acc;
                        }
                    }
                }
            }
        }

        if train {
            self.padded = Some(padded);
        }
        out
    }

    /// Accumulates the weight gradient and returns the input gradient.
    pub fn backward(&mut self, grad_out: &Array5<f32>) -> Array5<f32> {
        let padded = self
            .padded
            .take()
            .expect("backward requires a training forward pass");
        let (b, ci, pd, ph, pw) = padded.dim();
        let (d, h, w) = (pd - 2 * PAD, ph - 2 * PAD, pw - 2 * PAD);

        let mut grad_padded = Array5::zeros((b, ci, pd, ph, pw));
        {
            let (weight, grad_weight) = self.weight.parts_mut();
            for bi in 0..b {
                for co in 0..self.out_channels {
                    for z in 0..d {
                        for y in 0..h {
                            for x in 0..w {
                                let g = grad_out[[bi, co, z, y, x]];
                                if g == 0.0 {
                                    continue;
                                }
                                for c in 0..ci {
                                    for kz in 0..KERNEL {
                                        for ky in 0..KERNEL {
                                            for kx in 0..KERNEL {
                                                let wi = (((co * ci + c) * KERNEL + kz) * KERNEL
                                                    + ky)
                                                    * KERNEL
                                                    + kx;
                                                grad_weight[wi] +=
                                                    g * padded[[bi, c, z + kz, y + ky, x + kx]];
                                                grad_padded[[bi, c, z + kz, y + ky, x + kx]] +=
                                                    g * weight[wi];
                                            }
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }

        grad_padded
            .slice(s![.., .., PAD..d + PAD, PAD..h + PAD, PAD..w + PAD])
            .to_owned()
    }

    pub fn params_mut(&mut self) -> Vec<&mut Param> {
        vec![&mut self.weight]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::SeedableRng;

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(0)
    }

    #[test]
    fn test_forward_preserves_spatial_extents() {
        let mut conv = Conv3d::new(1, 4, &mut rng());
        let x = Array5::ones((2, 1, 4, 6, 6));
        let y = conv.forward(&x, false);
        assert_eq!(y.dim(), (2, 4, 4, 6, 6));
    }

    #[test]
    fn test_identity_kernel() {
        let mut conv = Conv3d::new(1, 1, &mut rng());
        let center = conv.widx(0, 0, 1, 1, 1);
        conv.weight.data_mut().fill(0.0);
        // Center tap only: output equals input.
        conv.weight.data_mut()[center] = 1.0;

        let x = Array5::from_shape_fn((1, 1, 3, 3, 3), |(_, _, z, y, xx)| {
            (z * 9 + y * 3 + xx) as f32
        });
        let y = conv.forward(&x, false);
        for (a, b) in x.iter().zip(y.iter()) {
            assert_relative_eq!(a, b);
        }
    }

    #[test]
    fn test_backward_matches_finite_difference() {
        let mut conv = Conv3d::new(1, 2, &mut rng());
        let x = Array5::from_shape_fn((1, 1, 2, 3, 3), |(_, _, z, y, xx)| {
            ((z + y + xx) as f32).sin()
        });

        // Analytic gradient of sum(output) wrt one weight element.
        let grad_out = Array5::ones((1, 2, 2, 3, 3));
        conv.forward(&x, true);
        let gx = conv.backward(&grad_out);

        let wi = conv.widx(1, 0, 0, 1, 2);
        let eps = 1e-3;
        let base: f32 = conv.forward(&x, false).sum();
        conv.weight.data_mut()[wi] += eps;
        let bumped: f32 = conv.forward(&x, false).sum();
        let numeric = (bumped - base) / eps;
        assert_relative_eq!(conv.weight.grad()[wi], numeric, epsilon = 1e-2);

        // Input gradient, same check for one voxel.
        conv.weight.data_mut()[wi] -= eps;
        let mut x2 = x.clone();
        x2[[0, 0, 1, 1, 1]] += eps;
        let bumped_in: f32 = conv.forward(&x2, false).sum();
        let numeric_in = (bumped_in - base) / eps;
        assert_relative_eq!(gx[[0, 0, 1, 1, 1]], numeric_in, epsilon = 1e-2);
    }
}
