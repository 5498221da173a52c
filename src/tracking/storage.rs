//! Tracking persistence backends

use std::fs;
use std::path::PathBuf;

use crate::error::{Error, Result};

use super::Run;

/// Where completed runs are persisted.
pub trait TrackingBackend: Send {
    /// Persist a run snapshot (called when a run ends).
    fn save_run(&mut self, run: &Run) -> Result<()>;

    /// Load every persisted run.
    fn load_runs(&self) -> Result<Vec<Run>>;
}

/// Keeps runs in memory; nothing survives the process.
#[derive(Default)]
pub struct InMemoryBackend {
    runs: Vec<Run>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TrackingBackend for InMemoryBackend {
    fn save_run(&mut self, run: &Run) -> Result<()> {
        // A re-save of the same id replaces the earlier snapshot.
        self.runs.retain(|r| r.id != run.id);
        self.runs.push(run.clone());
        Ok(())
    }

    fn load_runs(&self) -> Result<Vec<Run>> {
        Ok(self.runs.clone())
    }
}

/// Writes each run as `<id>.json` under a directory.
pub struct JsonFileBackend {
    dir: PathBuf,
}

impl JsonFileBackend {
    /// Create the backend, creating the directory if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }
}

impl TrackingBackend for JsonFileBackend {
    fn save_run(&mut self, run: &Run) -> Result<()> {
        let path = self.dir.join(format!("{}.json", run.id));
        let json = serde_json::to_string_pretty(run)
            .map_err(|e| Error::Tracking(format!("serialize run {}: {e}", run.id)))?;
        fs::write(path, json)?;
        Ok(())
    }

    fn load_runs(&self) -> Result<Vec<Run>> {
        let mut runs = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().is_some_and(|e| e == "json") {
                let json = fs::read_to_string(&path)?;
                let run = serde_json::from_str(&json)
                    .map_err(|e| Error::Tracking(format!("parse {}: {e}", path.display())))?;
                runs.push(run);
            }
        }
        runs.sort_by(|a: &Run, b: &Run| a.started_at.cmp(&b.started_at));
        Ok(runs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracking::{ExperimentTracker, RunStatus};
    use tempfile::TempDir;

    #[test]
    fn test_json_backend_round_trip() {
        let dir = TempDir::new().unwrap();
        let backend = JsonFileBackend::new(dir.path()).unwrap();
        let mut tracker = ExperimentTracker::new("persist", Box::new(backend));

        let id = tracker.start_run(Some("saved")).unwrap();
        tracker.log_metric(&id, "loss", 0.25, 3).unwrap();
        tracker.end_run(&id, RunStatus::Completed).unwrap();

        let reloaded = JsonFileBackend::new(dir.path()).unwrap();
        let runs = reloaded.load_runs().unwrap();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].id, id);
        assert_eq!(runs[0].latest_metric("loss"), Some(0.25));
        assert_eq!(runs[0].status, RunStatus::Completed);
    }

    #[test]
    fn test_in_memory_replaces_on_resave() {
        let mut backend = InMemoryBackend::new();
        let mut tracker = ExperimentTracker::new("mem", Box::new(InMemoryBackend::new()));
        let id = tracker.start_run(None).unwrap();
        tracker.end_run(&id, RunStatus::Completed).unwrap();

        let run = tracker.get_run(&id).unwrap().clone();
        backend.save_run(&run).unwrap();
        backend.save_run(&run).unwrap();
        assert_eq!(backend.load_runs().unwrap().len(), 1);
    }
}
