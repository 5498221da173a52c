//! Experiment tracking.
//!
//! Records training runs: hyperparameters, scalar metrics per step, and the
//! lifecycle status. Runs persist through a pluggable [`TrackingBackend`];
//! the in-memory backend serves tests, the JSON backend writes one file per
//! run for later inspection.

mod storage;

pub use storage::{InMemoryBackend, JsonFileBackend, TrackingBackend};

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Lifecycle state of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Active,
    Completed,
    Failed,
}

/// One recorded scalar value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricPoint {
    pub name: String,
    pub value: f64,
    pub step: u64,
}

/// A single training run within an experiment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Run {
    pub id: String,
    pub name: Option<String>,
    pub status: RunStatus,
    pub params: HashMap<String, String>,
    pub metrics: Vec<MetricPoint>,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl Run {
    fn new(id: String, name: Option<String>) -> Self {
        Self {
            id,
            name,
            status: RunStatus::Active,
            params: HashMap::new(),
            metrics: Vec::new(),
            started_at: Utc::now(),
            ended_at: None,
        }
    }

    /// Latest recorded value for a metric, if any
    pub fn latest_metric(&self, name: &str) -> Option<f64> {
        self.metrics
            .iter()
            .rev()
            .find(|m| m.name == name)
            .map(|m| m.value)
    }
}

/// Groups runs under an experiment name and persists them on completion.
///
/// # Example
///
/// ```
/// use luna16::tracking::{ExperimentTracker, InMemoryBackend, RunStatus};
///
/// let mut tracker = ExperimentTracker::new("demo", Box::new(InMemoryBackend::new()));
/// let id = tracker.start_run(Some("first")).unwrap();
/// tracker.log_param(&id, "lr", "0.001").unwrap();
/// tracker.log_metric(&id, "loss", 0.7, 1).unwrap();
/// tracker.end_run(&id, RunStatus::Completed).unwrap();
/// assert_eq!(tracker.get_run(&id).unwrap().status, RunStatus::Completed);
/// ```
pub struct ExperimentTracker {
    experiment: String,
    backend: Box<dyn TrackingBackend>,
    runs: Vec<Run>,
    counter: u64,
}

impl ExperimentTracker {
    pub fn new(experiment: impl Into<String>, backend: Box<dyn TrackingBackend>) -> Self {
        Self {
            experiment: experiment.into(),
            backend,
            runs: Vec::new(),
            counter: 0,
        }
    }

    pub fn experiment(&self) -> &str {
        &self.experiment
    }

    /// Begin a new active run and return its id.
    pub fn start_run(&mut self, name: Option<&str>) -> Result<String> {
        self.counter += 1;
        let id = format!(
            "{}-{:04}-{}",
            self.experiment,
            self.counter,
            Utc::now().timestamp()
        );
        self.runs.push(Run::new(id.clone(), name.map(String::from)));
        Ok(id)
    }

    /// Record a hyperparameter on an active run.
    pub fn log_param(&mut self, run_id: &str, key: &str, value: impl ToString) -> Result<()> {
        let run = self.active_run_mut(run_id)?;
        run.params.insert(key.to_string(), value.to_string());
        Ok(())
    }

    /// Record a scalar metric at a step on an active run.
    pub fn log_metric(&mut self, run_id: &str, name: &str, value: f64, step: u64) -> Result<()> {
        let run = self.active_run_mut(run_id)?;
        run.metrics.push(MetricPoint {
            name: name.to_string(),
            value,
            step,
        });
        Ok(())
    }

    /// Close a run and persist it through the backend.
    pub fn end_run(&mut self, run_id: &str, status: RunStatus) -> Result<()> {
        let run = self.active_run_mut(run_id)?;
        run.status = status;
        run.ended_at = Some(Utc::now());
        let snapshot = run.clone();
        self.backend.save_run(&snapshot)?;
        Ok(())
    }

    /// Look up a run by id
    pub fn get_run(&self, run_id: &str) -> Option<&Run> {
        self.runs.iter().find(|r| r.id == run_id)
    }

    /// All runs started by this tracker, oldest first
    pub fn list_runs(&self) -> &[Run] {
        &self.runs
    }

    fn active_run_mut(&mut self, run_id: &str) -> Result<&mut Run> {
        let run = self
            .runs
            .iter_mut()
            .find(|r| r.id == run_id)
            .ok_or_else(|| Error::Tracking(format!("unknown run id: {run_id}")))?;
        if run.status != RunStatus::Active {
            return Err(Error::Tracking(format!("run {run_id} is not active")));
        }
        Ok(run)
    }
}
