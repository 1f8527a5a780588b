use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use transeval_core::model::{Condition, Experiment, ExperimentStatus, Sample};

use crate::error::{Result, RunnerError};
use crate::orchestrator::Orchestrator;
use crate::sample::expand_scene;
use crate::sink::spawn_jsonl_writer;
use crate::store::StoreSink;

/// Drives one [`Experiment`] end to end (§4.11): validates preconditions
/// without mutating anything, transitions `draft -> running`, fans every
/// `(sample, condition)` pair out through the [`Orchestrator`], and
/// transitions to `completed` or `failed` once the JSONL writer finishes.
pub struct ExperimentDriver {
    orchestrator: Orchestrator,
    store: Arc<dyn StoreSink>,
}

impl ExperimentDriver {
    pub fn new(orchestrator: Orchestrator, store: Arc<dyn StoreSink>) -> Self {
        ExperimentDriver { orchestrator, store }
    }

    /// Checks every precondition in §4.11 and, if all pass, returns the full
    /// expanded `(sample, condition)` pair list. Never mutates experiment or
    /// store state — a failed validation leaves everything untouched.
    async fn validate(&self, experiment: &Experiment) -> Result<Vec<(Sample, Condition)>> {
        if experiment.status != ExperimentStatus::Draft {
            return Err(RunnerError::Validation {
                status_hint: 409,
                message: format!("experiment {} is not in draft status", experiment.id),
            });
        }
        if experiment.conditions.is_empty() {
            return Err(RunnerError::Validation {
                status_hint: 422,
                message: "experiment must select at least one condition".to_string(),
            });
        }

        let scenes = self.store.list_scenes(&experiment.scene_filter).await.map_err(|e| RunnerError::Validation {
            status_hint: 400,
            message: format!("failed to list scenes: {e}"),
        })?;
        if scenes.is_empty() {
            return Err(RunnerError::Validation {
                status_hint: 422,
                message: "scene filter matched zero scenes".to_string(),
            });
        }

        let samples: Vec<Sample> = scenes.iter().flat_map(expand_scene).collect();
        if samples.is_empty() {
            return Err(RunnerError::Validation {
                status_hint: 422,
                message: "scene filter matched scenes with zero segments".to_string(),
            });
        }

        let mut pairs = Vec::with_capacity(samples.len() * experiment.conditions.len());
        for sample in &samples {
            for condition in &experiment.conditions {
                pairs.push((sample.clone(), *condition));
            }
        }
        Ok(pairs)
    }

    /// Runs the experiment. `output_path` is the JSONL file this invocation's
    /// `runId` writes to; appends rather than truncates, matching the
    /// on-disk layout of one file per experiment (§6.6).
    pub async fn run(&self, experiment: Experiment, output_path: PathBuf, cancel: CancellationToken) -> Result<usize> {
        let pairs = self.validate(&experiment).await?;

        self.store.set_experiment_status(&experiment.id, ExperimentStatus::Running).await?;

        let run_id = Uuid::new_v4().to_string();
        self.store.begin_run(&experiment.id, &run_id).await?;

        let (tx, rx) = mpsc::channel(256);
        let writer = spawn_jsonl_writer(output_path, false, rx);

        let admitted = self.orchestrator.run(run_id, pairs, tx, Some(self.store.clone()), cancel).await;
        tracing::info!(experiment_id = %experiment.id, admitted, "experiment pairs admitted");

        match writer.await {
            Ok(Ok(written)) => {
                self.store.set_experiment_status(&experiment.id, ExperimentStatus::Completed).await?;
                Ok(written)
            }
            Ok(Err(e)) => {
                let _ = self.store.set_experiment_status(&experiment.id, ExperimentStatus::Failed).await;
                Err(e)
            }
            Err(join_err) => {
                let _ = self.store.set_experiment_status(&experiment.id, ExperimentStatus::Failed).await;
                Err(RunnerError::Sink(format!("JSONL writer task panicked: {join_err}")))
            }
        }
    }
}
