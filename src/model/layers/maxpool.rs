//! 3-D max pooling

use ndarray::Array5;

/// 2x2x2 max pooling with stride 2.
///
/// Spatial extents are halved with floor semantics; trailing odd voxels are
/// dropped. The training forward pass records, per output cell, the packed
/// spatial index of the winning input voxel so backward can scatter the
/// gradient back to it.
pub struct MaxPool3d {
    cache: Option<PoolCache>,
}

struct PoolCache {
    input_dim: (usize, usize, usize, usize, usize),
    argmax: Array5<usize>,
}

const WINDOW: usize = 2;

impl MaxPool3d {
    pub fn new() -> Self {
        Self { cache: None }
    }

    pub fn forward(&mut self, input: &Array5<f32>, train: bool) -> Array5<f32> {
        let (b, c, d, h, w) = input.dim();
        let (od, oh, ow) = (d / WINDOW, h / WINDOW, w / WINDOW);

        let mut out = Array5::zeros((b, c, od, oh, ow));
        let mut argmax = Array5::zeros((b, c, od, oh, ow));
        for bi in 0..b {
            for ci in 0..c {
                for oz in 0..od {
                    for oy in 0..oh {
                        for ox in 0..ow {
                            let mut best = f32::NEG_INFINITY;
                            let mut best_idx = 0;
                            for kz in 0..WINDOW {
                                for ky in 0..WINDOW {
                                    for kx in 0..WINDOW {
                                        let (z, y, x) =
                                            (oz * WINDOW + kz, oy * WINDOW + ky, ox * WINDOW + kx);
                                        let v = input[[bi, ci, z, y, x]];
                                        if v > best {
                                            best = v;
                                            best_idx = (z * h + y) * w + x;
                                        }
                                    }
                                }
                            }
                            out[[bi, ci, oz, oy, ox]] = best;
                            argmax[[bi, ci, oz, oy, ox]] = best_idx;
                        }
                    }
                }
            }
        }

        if train {
            self.cache = Some(PoolCache {
                input_dim: input.dim(),
                argmax,
            });
        }
        out
    }

    pub fn backward(&mut self, grad_out: &Array5<f32>) -> Array5<f32> {
        let cache = self
            .cache
            .take()
            .expect("backward requires a training forward pass");
        let (b, c, _, h, w) = cache.input_dim;
        let (_, _, od, oh, ow) = grad_out.dim();

        let mut grad_in = Array5::zeros(cache.input_dim);
        for bi in 0..b {
            for ci in 0..c {
                for oz in 0..od {
                    for oy in 0..oh {
                        for ox in 0..ow {
                            let packed = cache.argmax[[bi, ci, oz, oy, ox]];
                            let z = packed / (h * w);
                            let y = (packed / w) % h;
                            let x = packed % w;
                            grad_in[[bi, ci, z, y, x]] += grad_out[[bi, ci, oz, oy, ox]];
                        }
                    }
                }
            }
        }
        grad_in
    }
}

impl Default for MaxPool3d {
    fn default() -> Self {
        Self::new()
    }
}
