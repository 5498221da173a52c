//! Classification model: network + optimizer + loss

use ndarray::{Array1, Array2, Axis};

use super::loss::LossFn;
use super::metrics::EpochScores;
use crate::data::BatchIterator;
use crate::error::Result;
use crate::model::NoduleClassifier;
use crate::optim::{LrScheduler, Optimizer};

/// Binds a network to its update rule and loss, and runs whole epochs.
///
/// One `train_epoch` call drains a batch iterator: forward pass, loss,
/// backward pass, and optimizer step per batch, pooling predictions for
/// the epoch scores. `validate_epoch` runs the same loop without any
/// parameter updates.
pub struct ClassificationModel {
    network: NoduleClassifier,
    optimizer: Box<dyn Optimizer>,
    loss: Box<dyn LossFn>,
    scheduler: Option<Box<dyn LrScheduler>>,
}

impl ClassificationModel {
    pub fn new(
        network: NoduleClassifier,
        optimizer: Box<dyn Optimizer>,
        loss: Box<dyn LossFn>,
        scheduler: Option<Box<dyn LrScheduler>>,
    ) -> Self {
        Self {
            network,
            optimizer,
            loss,
            scheduler,
        }
    }

    pub fn network(&self) -> &NoduleClassifier {
        &self.network
    }

    pub fn network_mut(&mut self) -> &mut NoduleClassifier {
        &mut self.network
    }

    /// Current learning rate
    pub fn lr(&self) -> f32 {
        self.optimizer.lr()
    }

    /// Train over every batch the loader yields.
    pub fn train_epoch(&mut self, loader: BatchIterator) -> Result<EpochScores> {
        let mut losses = Vec::new();
        let mut preds = Vec::new();
        let mut labels = Vec::new();

        for batch in loader {
            let batch = batch?;
            let (logits, probs) = self.network.forward(&batch.volumes, true)?;
            let (loss, grad) = self.loss.forward(&logits, &batch.labels);

            {
                let mut params = self.network.params_mut();
                self.optimizer.zero_grad(&mut params);
            }
            self.network.backward(&grad);
            {
                let mut params = self.network.params_mut();
                self.optimizer.step(&mut params);
            }

            losses.push(loss);
            collect_predictions(&probs, &batch.labels, &mut preds, &mut labels);
        }

        Ok(epoch_scores(&losses, preds, labels))
    }

    /// Evaluate over every batch without updating any parameter.
    pub fn validate_epoch(&mut self, loader: BatchIterator) -> Result<EpochScores> {
        let mut losses = Vec::new();
        let mut preds = Vec::new();
        let mut labels = Vec::new();

        for batch in loader {
            let batch = batch?;
            let (logits, probs) = self.network.forward(&batch.volumes, false)?;
            let (loss, _) = self.loss.forward(&logits, &batch.labels);
            losses.push(loss);
            collect_predictions(&probs, &batch.labels, &mut preds, &mut labels);
        }

        Ok(epoch_scores(&losses, preds, labels))
    }

    /// Advance the schedule at the end of an epoch.
    pub fn end_epoch(&mut self) {
        if let Some(scheduler) = &mut self.scheduler {
            scheduler.step();
            scheduler.apply(self.optimizer.as_mut());
        }
    }
}

fn collect_predictions(
    probs: &Array2<f32>,
    batch_labels: &Array1<usize>,
    preds: &mut Vec<usize>,
    labels: &mut Vec<usize>,
) {
    for (row, &label) in probs.axis_iter(Axis(0)).zip(batch_labels.iter()) {
        let pred = if row[1] > row[0] { 1 } else { 0 };
        preds.push(pred);
        labels.push(label);
    }
}

fn epoch_scores(losses: &[f32], preds: Vec<usize>, labels: Vec<usize>) -> EpochScores {
    let mean_loss = if losses.is_empty() {
        0.0
    } else {
        losses.iter().sum::<f32>() / losses.len() as f32
    };
    EpochScores::from_epoch(mean_loss, &Array1::from_vec(preds), &Array1::from_vec(labels))
}
