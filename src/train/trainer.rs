//! Epoch-level training loop

use std::time::Instant;

use tracing::{error, info};

use super::metrics::{EpochScores, MetricsTracker};
use super::model::ClassificationModel;
use crate::data::DataModule;
use crate::error::Result;
use crate::tracking::{ExperimentTracker, RunStatus};

/// Summary of a finished run
#[derive(Debug, Clone)]
pub struct TrainResult {
    pub run_id: String,
    pub final_epoch: usize,
    pub final_loss: f32,
    pub best_loss: f32,
    pub best_val_loss: Option<f32>,
    pub elapsed_secs: f64,
}

/// Drives a model through numbered epochs with periodic validation.
///
/// Validation runs on the first epoch and then every `validation_cadence`
/// epochs. Every epoch's scores are logged to the experiment tracker; a
/// failing epoch marks the run as failed before the error propagates.
pub struct Trainer {
    name: String,
    validation_cadence: usize,
}

impl Trainer {
    pub fn new(name: impl Into<String>, validation_cadence: usize) -> Self {
        Self {
            name: name.into(),
            validation_cadence: validation_cadence.max(1),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn should_validate(&self, epoch: usize) -> bool {
        epoch == 1 || epoch % self.validation_cadence == 0
    }

    /// Run `epochs` training epochs.
    pub fn fit(
        &self,
        model: &mut ClassificationModel,
        data: &DataModule,
        epochs: usize,
        tracker: &mut ExperimentTracker,
    ) -> Result<TrainResult> {
        let started = Instant::now();
        let run_id = tracker.start_run(Some(&self.name))?;
        tracker.log_param(&run_id, "epochs", epochs)?;
        tracker.log_param(&run_id, "batch_size", data.batch_size())?;
        tracker.log_param(&run_id, "lr", model.lr())?;
        tracker.log_param(&run_id, "train_batches", data.training_len())?;

        info!(
            run = %run_id,
            epochs,
            train_batches = data.training_len(),
            "starting training"
        );

        let mut metrics = MetricsTracker::new();
        for epoch in 1..=epochs {
            let scores = match model.train_epoch(data.training_loader()) {
                Ok(scores) => scores,
                Err(e) => {
                    error!(run = %run_id, epoch, "epoch failed: {e}");
                    tracker.end_run(&run_id, RunStatus::Failed)?;
                    return Err(e);
                }
            };
            metrics.record_epoch(scores.loss);
            self.log_scores(tracker, &run_id, "train", epoch, &scores)?;
            info!(
                epoch,
                loss = scores.loss,
                accuracy = scores.accuracy,
                f1 = scores.f1,
                lr = model.lr(),
                "train epoch done"
            );

            if self.should_validate(epoch) {
                let val = match model.validate_epoch(data.validation_loader()) {
                    Ok(val) => val,
                    Err(e) => {
                        error!(run = %run_id, epoch, "validation failed: {e}");
                        tracker.end_run(&run_id, RunStatus::Failed)?;
                        return Err(e);
                    }
                };
                metrics.record_val_loss(val.loss);
                self.log_scores(tracker, &run_id, "val", epoch, &val)?;
                info!(
                    epoch,
                    loss = val.loss,
                    accuracy = val.accuracy,
                    recall = val.recall,
                    "validation done"
                );
            }

            model.end_epoch();
        }

        tracker.end_run(&run_id, RunStatus::Completed)?;
        let elapsed = started.elapsed().as_secs_f64();
        info!(run = %run_id, elapsed_secs = elapsed, "training complete");

        Ok(TrainResult {
            run_id,
            final_epoch: metrics.epoch(),
            final_loss: metrics.last_loss().unwrap_or(f32::NAN),
            best_loss: metrics.best_loss().unwrap_or(f32::NAN),
            best_val_loss: metrics.best_val_loss(),
            elapsed_secs: elapsed,
        })
    }

    fn log_scores(
        &self,
        tracker: &mut ExperimentTracker,
        run_id: &str,
        prefix: &str,
        epoch: usize,
        scores: &EpochScores,
    ) -> Result<()> {
        let step = epoch as u64;
        tracker.log_metric(run_id, &format!("{prefix}/loss"), scores.loss as f64, step)?;
        tracker.log_metric(
            run_id,
            &format!("{prefix}/accuracy"),
            scores.accuracy as f64,
            step,
        )?;
        tracker.log_metric(
            run_id,
            &format!("{prefix}/precision"),
            scores.precision as f64,
            step,
        )?;
        tracker.log_metric(
            run_id,
            &format!("{prefix}/recall"),
            scores.recall as f64,
            step,
        )?;
        tracker.log_metric(run_id, &format!("{prefix}/f1"), scores.f1 as f64, step)?;
        Ok(())
    }
}
