//! Fully-connected layer

use ndarray::{Array1, Array2, ArrayView2, Axis};
use rand_chacha::ChaCha8Rng;

use crate::model::Param;

/// Dense layer computing `y = x W^T + b` over row-major batches.
///
/// The weight is `(out, in)` with Kaiming-normal initialization scaled by
/// the fan-out; the bias starts at zero.
pub struct Linear {
    in_features: usize,
    out_features: usize,
    weight: Param,
    bias: Param,
    input: Option<Array2<f32>>,
}

impl Linear {
    pub fn new(in_features: usize, out_features: usize, rng: &mut ChaCha8Rng) -> Self {
        Self {
            in_features,
            out_features,
            weight: Param::kaiming_normal(&[out_features, in_features], out_features, rng),
            bias: Param::zeros(&[out_features]),
            input: None,
        }
    }

    pub fn in_features(&self) -> usize {
        self.in_features
    }

    fn weight_view(&self) -> ArrayView2<'_, f32> {
        // Flat storage is contiguous, so the reshape cannot fail.
        self.weight
            .data()
            .view()
            .into_shape((self.out_features, self.in_features))
            .expect("weight storage matches its shape")
    }

    pub fn forward(&mut self, input: &Array2<f32>, train: bool) -> Array2<f32> {
        assert_eq!(input.ncols(), self.in_features, "feature mismatch");
        let out = input.dot(&self.weight_view().t()) + self.bias.data();
        if train {
            self.input = Some(input.clone());
        }
        out
    }

    /// Accumulates weight and bias gradients and returns the input gradient.
    pub fn backward(&mut self, grad_out: &Array2<f32>) -> Array2<f32> {
        let input = self
            .input
            .take()
            .expect("backward requires a training forward pass");

        let grad_in = grad_out.dot(&self.weight_view());

        let grad_weight = grad_out.t().dot(&input);
        {
            let gw = self.weight.grad_mut();
            for (dst, src) in gw.iter_mut().zip(grad_weight.iter()) {
                *dst += src;
            }
        }
        let grad_bias: Array1<f32> = grad_out.sum_axis(Axis(0));
        *self.bias.grad_mut() += &grad_bias;

        grad_in
    }

    pub fn params_mut(&mut self) -> Vec<&mut Param> {
        vec![&mut self.weight, &mut self.bias]
    }
}
