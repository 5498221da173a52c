//! Loss functions

use ndarray::{Array1, Array2};

use crate::model::softmax;

/// Differentiable batch loss over logits.
///
/// `forward` returns the scalar loss together with its gradient with
/// respect to the logits, ready to feed into the network's backward pass.
pub trait LossFn {
    fn forward(&self, logits: &Array2<f32>, labels: &Array1<usize>) -> (f32, Array2<f32>);

    fn name(&self) -> &'static str;
}

/// Mean cross-entropy over softmax probabilities.
///
/// The gradient has the closed form `(probs - onehot) / batch`.
pub struct CrossEntropyLoss;

impl LossFn for CrossEntropyLoss {
    fn forward(&self, logits: &Array2<f32>, labels: &Array1<usize>) -> (f32, Array2<f32>) {
        assert_eq!(logits.nrows(), labels.len(), "batch size mismatch");
        let batch = logits.nrows() as f32;

        let probs = softmax(logits);
        let mut loss = 0.0;
        let mut grad = probs.clone();
        for (i, &label) in labels.iter().enumerate() {
            loss -= (probs[[i, label]] + 1e-10).ln();
            grad[[i, label]] -= 1.0;
        }
        (loss / batch, grad / batch)
    }

    fn name(&self) -> &'static str {
        "cross_entropy"
    }
}
