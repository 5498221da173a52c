//! Training loop, losses, and metrics.
//!
//! [`ClassificationModel`] ties a network to its optimizer and loss and runs
//! single epochs; [`Trainer`] sequences numbered epochs with periodic
//! validation and logs everything to an experiment tracker.

mod loss;
mod metrics;
mod model;
mod trainer;

pub use loss::{CrossEntropyLoss, LossFn};
pub use metrics::{Accuracy, EpochScores, F1, Metric, MetricsTracker, Precision, Recall};
pub use model::ClassificationModel;
pub use trainer::{TrainResult, Trainer};
