//! Classification metrics and per-run bookkeeping

use ndarray::Array1;

/// A scalar metric over predicted and true labels.
pub trait Metric {
    fn compute(&self, preds: &Array1<usize>, labels: &Array1<usize>) -> f32;

    fn name(&self) -> &'static str;

    fn higher_is_better(&self) -> bool {
        true
    }
}

/// Confusion counts with label 1 as the positive (nodule) class.
#[derive(Debug, Default, Clone, Copy)]
struct Confusion {
    tp: usize,
    fp: usize,
    tn: usize,
    fneg: usize,
}

impl Confusion {
    fn from_labels(preds: &Array1<usize>, labels: &Array1<usize>) -> Self {
        let mut c = Self::default();
        for (&p, &l) in preds.iter().zip(labels.iter()) {
            match (p, l) {
                (1, 1) => c.tp += 1,
                (1, 0) => c.fp += 1,
                (0, 0) => c.tn += 1,
                _ => c.fneg += 1,
            }
        }
        c
    }

    fn precision(&self) -> f32 {
        ratio(self.tp, self.tp + self.fp)
    }

    fn recall(&self) -> f32 {
        ratio(self.tp, self.tp + self.fneg)
    }
}

fn ratio(num: usize, den: usize) -> f32 {
    if den == 0 {
        0.0
    } else {
        num as f32 / den as f32
    }
}

/// Fraction of samples classified correctly
pub struct Accuracy;

impl Metric for Accuracy {
    fn compute(&self, preds: &Array1<usize>, labels: &Array1<usize>) -> f32 {
        let c = Confusion::from_labels(preds, labels);
        ratio(c.tp + c.tn, preds.len())
    }

    fn name(&self) -> &'static str {
        "accuracy"
    }
}

/// Of all predicted nodules, the fraction that are real
pub struct Precision;

impl Metric for Precision {
    fn compute(&self, preds: &Array1<usize>, labels: &Array1<usize>) -> f32 {
        Confusion::from_labels(preds, labels).precision()
    }

    fn name(&self) -> &'static str {
        "precision"
    }
}

/// Of all real nodules, the fraction that were found
pub struct Recall;

impl Metric for Recall {
    fn compute(&self, preds: &Array1<usize>, labels: &Array1<usize>) -> f32 {
        Confusion::from_labels(preds, labels).recall()
    }

    fn name(&self) -> &'static str {
        "recall"
    }
}

/// Harmonic mean of precision and recall
pub struct F1;

impl Metric for F1 {
    fn compute(&self, preds: &Array1<usize>, labels: &Array1<usize>) -> f32 {
        let c = Confusion::from_labels(preds, labels);
        let p = c.precision();
        let r = c.recall();
        if p + r == 0.0 {
            0.0
        } else {
            2.0 * p * r / (p + r)
        }
    }

    fn name(&self) -> &'static str {
        "f1"
    }
}

/// Aggregate scores for one epoch
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpochScores {
    pub loss: f32,
    pub accuracy: f32,
    pub precision: f32,
    pub recall: f32,
    pub f1: f32,
}

impl EpochScores {
    /// Compute every score from pooled epoch predictions.
    pub fn from_epoch(loss: f32, preds: &Array1<usize>, labels: &Array1<usize>) -> Self {
        Self {
            loss,
            accuracy: Accuracy.compute(preds, labels),
            precision: Precision.compute(preds, labels),
            recall: Recall.compute(preds, labels),
            f1: F1.compute(preds, labels),
        }
    }
}

/// Tracks loss history across an entire training run.
#[derive(Debug, Default, Clone)]
pub struct MetricsTracker {
    losses: Vec<f32>,
    val_losses: Vec<f32>,
    epoch: usize,
}

impl MetricsTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the mean training loss of a finished epoch.
    pub fn record_epoch(&mut self, loss: f32) {
        self.losses.push(loss);
        self.epoch += 1;
    }

    /// Record a validation loss.
    pub fn record_val_loss(&mut self, loss: f32) {
        self.val_losses.push(loss);
    }

    pub fn epoch(&self) -> usize {
        self.epoch
    }

    pub fn last_loss(&self) -> Option<f32> {
        self.losses.last().copied()
    }

    /// Lowest training loss seen so far
    pub fn best_loss(&self) -> Option<f32> {
        self.losses
            .iter()
            .copied()
            .fold(None, |best: Option<f32>, l| {
                Some(best.map_or(l, |b| b.min(l)))
            })
    }

    /// Lowest validation loss seen so far
    pub fn best_val_loss(&self) -> Option<f32> {
        self.val_losses
            .iter()
            .copied()
            .fold(None, |best: Option<f32>, l| {
                Some(best.map_or(l, |b| b.min(l)))
            })
    }
}
