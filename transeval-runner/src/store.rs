use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use transeval_core::model::{Experiment, ExperimentStatus, RunRecord, Scene, SceneFilter};

use crate::error::{Result, RunnerError};

/// Adapter onto the external persistent store (§6.7). The engine only ever
/// calls through this trait; it never knows whether scenes, experiments, and
/// runs live in a SQL table, a document store, or memory. `RunRecord` itself
/// only carries `runId`, not `experimentId`, so `begin_run` registers the
/// association once per experiment invocation, before any `append_run` call
/// for that run arrives; `list_runs`/`delete_runs_for_experiment` then key
/// off `experimentId` per the store contract.
#[async_trait]
pub trait StoreSink: Send + Sync {
    async fn list_scenes(&self, filter: &SceneFilter) -> Result<Vec<Scene>>;

    /// Registers that `run_id` belongs to `experiment_id`. Called once by the
    /// experiment driver right after it generates `run_id`, before any pair
    /// is dispatched.
    async fn begin_run(&self, experiment_id: &str, run_id: &str) -> Result<()>;

    /// Idempotent by `(runId, sampleId, condition)`: re-delivering the same
    /// record (e.g. after a retried append) must not duplicate a row.
    async fn append_run(&self, record: RunRecord) -> Result<()>;

    async fn set_experiment_status(&self, id: &str, status: ExperimentStatus) -> Result<()>;

    async fn get_experiment(&self, id: &str) -> Result<Experiment>;

    async fn list_runs(&self, experiment_id: &str) -> Result<Vec<RunRecord>>;

    async fn delete_runs_for_experiment(&self, experiment_id: &str) -> Result<()>;
}

/// In-memory reference implementation: every collection lives behind an
/// `RwLock`, nothing touches disk. Used by the test suite and by `run`/`run-one` when
/// no store is configured.
#[derive(Default)]
pub struct InMemoryStore {
    scenes: RwLock<Vec<Scene>>,
    experiments: RwLock<HashMap<String, Experiment>>,
    run_experiment: RwLock<HashMap<String, String>>,
    runs: RwLock<HashMap<String, Vec<RunRecord>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        InMemoryStore::default()
    }

    pub fn seed_scenes(&self, scenes: Vec<Scene>) {
        *self.scenes.write().expect("lock poisoned") = scenes;
    }

    pub fn seed_experiment(&self, experiment: Experiment) {
        self.experiments.write().expect("lock poisoned").insert(experiment.id.clone(), experiment);
    }
}

fn scene_matches(scene: &Scene, filter: &SceneFilter) -> bool {
    if let Some(split) = &filter.split {
        if scene.split.as_deref() != Some(split.as_str()) {
            return false;
        }
    }
    if let Some(scene_ids) = &filter.scene_ids {
        if !scene_ids.contains(&scene.scene_id) {
            return false;
        }
    }
    if let Some(tags) = &filter.tags {
        if !tags.iter().any(|t| scene.tags.contains(t)) {
            return false;
        }
    }
    true
}

#[async_trait]
impl StoreSink for InMemoryStore {
    async fn list_scenes(&self, filter: &SceneFilter) -> Result<Vec<Scene>> {
        Ok(self
            .scenes
            .read()
            .expect("lock poisoned")
            .iter()
            .filter(|s| scene_matches(s, filter))
            .cloned()
            .collect())
    }

    async fn begin_run(&self, experiment_id: &str, run_id: &str) -> Result<()> {
        self.run_experiment.write().expect("lock poisoned").insert(run_id.to_string(), experiment_id.to_string());
        Ok(())
    }

    async fn append_run(&self, record: RunRecord) -> Result<()> {
        let experiment_id = self
            .run_experiment
            .read()
            .expect("lock poisoned")
            .get(&record.run_id)
            .cloned()
            .unwrap_or_else(|| record.run_id.clone());

        let mut runs = self.runs.write().expect("lock poisoned");
        let bucket = runs.entry(experiment_id).or_default();
        let already_present = bucket
            .iter()
            .any(|r| r.run_id == record.run_id && r.sample_id == record.sample_id && r.condition == record.condition);
        if !already_present {
            bucket.push(record);
        }
        Ok(())
    }

    async fn set_experiment_status(&self, id: &str, status: ExperimentStatus) -> Result<()> {
        let mut experiments = self.experiments.write().expect("lock poisoned");
        let experiment = experiments
            .get_mut(id)
            .ok_or_else(|| RunnerError::Config(format!("unknown experiment {id:?}")))?;
        experiment.status = status;
        Ok(())
    }

    async fn get_experiment(&self, id: &str) -> Result<Experiment> {
        self.experiments
            .read()
            .expect("lock poisoned")
            .get(id)
            .cloned()
            .ok_or_else(|| RunnerError::Config(format!("unknown experiment {id:?}")))
    }

    async fn list_runs(&self, experiment_id: &str) -> Result<Vec<RunRecord>> {
        Ok(self.runs.read().expect("lock poisoned").get(experiment_id).cloned().unwrap_or_default())
    }

    async fn delete_runs_for_experiment(&self, experiment_id: &str) -> Result<()> {
        self.runs.write().expect("lock poisoned").remove(experiment_id);
        Ok(())
    }
}
