use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use transeval_core::condition::capability_flags;
use transeval_core::constraints;
use transeval_core::model::{
    Condition, ConstraintPartial, ConstraintRecord, FormatSettings, Issue, IssueType, RunRecord, RunStatus, Sample, Severity, State,
    Timings, UsageTotals,
};
use transeval_pipeline::hashing::stable_issue_id;

use crate::build::Pipeline;
use crate::store::StoreSink;

fn placeholder_constraints(target_lang: &str) -> ConstraintRecord {
    ConstraintRecord {
        target_lang: target_lang.to_string(),
        tone: None,
        register: None,
        reading_level: None,
        format: FormatSettings::default(),
        glossary: vec![],
        banned_patterns: vec![],
        allow_japanese_tokens: vec![],
    }
}

fn error_record(
    run_id: String,
    condition: Condition,
    sample_id: String,
    constraints: ConstraintRecord,
    state: Option<State>,
    usage: UsageTotals,
    timings: Timings,
    message: String,
) -> RunRecord {
    tracing::error!(sample_id = %sample_id, condition = %condition, error = %message, "pair failed with an unhandled stage error");
    let issue = Issue {
        id: stable_issue_id(IssueType::Other, &message),
        issue_type: IssueType::Other,
        severity: Severity::Critical,
        rationale: message,
        fix_suggestion: "investigate the stage error and rerun this sample".to_string(),
        confidence: 1.0,
    };
    RunRecord {
        run_id,
        condition,
        sample_id,
        draft: String::new(),
        final_translation: String::new(),
        issues: vec![issue],
        hard_checks: Vec::new(),
        scores: Default::default(),
        usage,
        timings,
        state,
        normalized_constraints: constraints,
        trace: None,
        status: RunStatus::Error,
    }
}

/// Runs one `(sample, condition)` pair through the ten steps of §4.10:
/// normalize constraints, optionally build state, translate with the
/// capability-appropriate translator variant, verify, bounded repair loop,
/// judge, and assemble the record. A Translator/Repairer LLM failure (the
/// two stages that surface errors rather than recovering locally, §7)
/// short-circuits into an `error` status record instead of panicking the
/// worker — every pair always produces exactly one record.
async fn run_pair(
    pipeline: Arc<Pipeline>,
    default_constraints: ConstraintPartial,
    max_repairs: u32,
    run_id: String,
    sample: Sample,
    condition: Condition,
) -> RunRecord {
    let started = Instant::now();
    let mut stage_ms: HashMap<String, u64> = HashMap::new();
    let mut usage = UsageTotals::default();

    let constraints = match constraints::normalize(&default_constraints, &sample.constraints) {
        Ok(c) => c,
        Err(e) => {
            let target_lang = sample.constraints.target_lang.clone().unwrap_or_else(|| "en".to_string());
            return error_record(
                run_id,
                condition,
                sample.sample_id,
                placeholder_constraints(&target_lang),
                None,
                usage,
                Timings { stages: stage_ms, total_ms: started.elapsed().as_millis() as u64 },
                format!("constraint normalization failed: {e}"),
            );
        }
    };

    let flags = capability_flags(condition);

    let stage_start = Instant::now();
    let state = if flags.has_state {
        let (state, state_usage) = pipeline.state_builder.build(&sample).await;
        usage.add(state_usage);
        Some(state)
    } else {
        None
    };
    stage_ms.insert("state".to_string(), stage_start.elapsed().as_millis() as u64);

    let translator = if flags.has_state {
        pipeline.translator_with_state.as_ref().unwrap_or(&pipeline.translator)
    } else {
        &pipeline.translator
    };

    let stage_start = Instant::now();
    let draft = match translator.translate(&sample, &constraints, state.as_ref()).await {
        Ok((draft, translate_usage)) => {
            usage.add(translate_usage);
            draft
        }
        Err(e) => {
            stage_ms.insert("translate".to_string(), stage_start.elapsed().as_millis() as u64);
            return error_record(
                run_id,
                condition,
                sample.sample_id,
                constraints,
                state,
                usage,
                Timings { stages: stage_ms, total_ms: started.elapsed().as_millis() as u64 },
                format!("translator LLM call failed: {e}"),
            );
        }
    };
    stage_ms.insert("translate".to_string(), stage_start.elapsed().as_millis() as u64);

    let mut current = draft.clone();

    let stage_start = Instant::now();
    let (mut issues, mut hard_checks, verify_usage) = pipeline.verifier.verify(&sample, &constraints, &current).await;
    usage.add(verify_usage);
    *stage_ms.entry("verify".to_string()).or_insert(0) += stage_start.elapsed().as_millis() as u64;

    if flags.has_verify_repair {
        for _ in 0..max_repairs {
            let has_critical = issues.iter().any(|i| i.severity == Severity::Critical);
            let all_hard_checks_passed = hard_checks.iter().all(|hc| hc.passed);
            if !has_critical && all_hard_checks_passed {
                break;
            }

            let stage_start = Instant::now();
            let repaired = match pipeline.repairer.repair(&sample, &constraints, state.as_ref(), &current, &issues).await {
                Ok((repaired, repair_usage)) => {
                    usage.add(repair_usage);
                    repaired
                }
                Err(e) => {
                    *stage_ms.entry("repair".to_string()).or_insert(0) += stage_start.elapsed().as_millis() as u64;
                    return error_record(
                        run_id,
                        condition,
                        sample.sample_id,
                        constraints,
                        state,
                        usage,
                        Timings { stages: stage_ms, total_ms: started.elapsed().as_millis() as u64 },
                        format!("repairer LLM call failed: {e}"),
                    );
                }
            };
            *stage_ms.entry("repair".to_string()).or_insert(0) += stage_start.elapsed().as_millis() as u64;
            current = repaired;

            let stage_start = Instant::now();
            let (new_issues, new_hard_checks, verify_usage) = pipeline.verifier.verify(&sample, &constraints, &current).await;
            usage.add(verify_usage);
            *stage_ms.entry("verify".to_string()).or_insert(0) += stage_start.elapsed().as_millis() as u64;
            issues = new_issues;
            hard_checks = new_hard_checks;
        }
    }

    let stage_start = Instant::now();
    let (scores, judge_usage) = pipeline.judge.score(&sample, &hard_checks, &current).await;
    usage.add(judge_usage);
    stage_ms.insert("judge".to_string(), stage_start.elapsed().as_millis() as u64);

    let needs_review = issues.iter().any(|i| i.severity == Severity::Critical) || hard_checks.iter().any(|hc| !hc.passed);
    let status = if needs_review { RunStatus::NeedsReview } else { RunStatus::Ok };

    RunRecord {
        run_id,
        condition,
        sample_id: sample.sample_id,
        draft,
        final_translation: current,
        issues,
        hard_checks,
        scores,
        usage,
        timings: Timings { stages: stage_ms, total_ms: started.elapsed().as_millis() as u64 },
        state,
        normalized_constraints: constraints,
        trace: None,
        status,
    }
}

async fn notify_store(store: &dyn StoreSink, record: &RunRecord) {
    if store.append_run(record.clone()).await.is_ok() {
        return;
    }
    tracing::warn!(sample_id = %record.sample_id, condition = %record.condition, "store sink append failed, retrying once");
    if store.append_run(record.clone()).await.is_err() {
        tracing::warn!(
            sample_id = %record.sample_id,
            condition = %record.condition,
            "store sink append failed twice, downgrading to a logged warning"
        );
    }
}

/// Bounded-concurrency worker pool over `(sample, condition)` pairs (§5),
/// grounded on the `Semaphore` + `JoinSet` shape of a bounded task runner:
/// an owned permit is acquired before each pair is admitted, every pair runs
/// as its own task, and results drain back through `join_next()`. Admission
/// stops as soon as `cancel` fires; pairs already admitted run to completion.
pub struct Orchestrator {
    pipeline: Arc<Pipeline>,
    default_constraints: ConstraintPartial,
    max_repairs: u32,
    concurrency: usize,
}

impl Orchestrator {
    pub fn new(pipeline: Arc<Pipeline>, default_constraints: ConstraintPartial, max_repairs: u32, concurrency: usize) -> Self {
        Orchestrator {
            pipeline,
            default_constraints,
            max_repairs,
            concurrency: concurrency.max(1),
        }
    }

    /// Runs every pair, emitting each completed [`RunRecord`] on `sink` (the
    /// JSONL writer's channel) and, when `store` is set, through the store
    /// adapter too. Returns the number of pairs admitted before `cancel` was
    /// observed (or all of them, if it never fires).
    pub async fn run(
        &self,
        run_id: String,
        pairs: Vec<(Sample, Condition)>,
        sink: mpsc::Sender<RunRecord>,
        store: Option<Arc<dyn StoreSink>>,
        cancel: CancellationToken,
    ) -> usize {
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut join_set = JoinSet::new();
        let mut admitted = 0usize;

        for (sample, condition) in pairs {
            if cancel.is_cancelled() {
                break;
            }

            let permit = semaphore.clone().acquire_owned().await.expect("semaphore is never closed");
            admitted += 1;

            let pipeline = self.pipeline.clone();
            let default_constraints = self.default_constraints.clone();
            let max_repairs = self.max_repairs;
            let run_id = run_id.clone();
            let sink = sink.clone();
            let store = store.clone();

            join_set.spawn(async move {
                let _permit = permit;
                let record = run_pair(pipeline, default_constraints, max_repairs, run_id, sample, condition).await;

                if let Some(store) = &store {
                    notify_store(store.as_ref(), &record).await;
                }

                if sink.send(record).await.is_err() {
                    tracing::error!("JSONL sink channel closed before all pairs were flushed");
                }
            });
        }

        while let Some(result) = join_set.join_next().await {
            if let Err(e) = result {
                tracing::error!(error = %e, "orchestrator worker task panicked");
            }
        }

        admitted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    use transeval_core::config::{ComponentSpec, EngineConfig, ModelSpec, ProviderKind};
    use transeval_model::{Gateway, MockProvider};

    use crate::build::build_pipeline;

    fn mock_pipeline() -> Arc<Pipeline> {
        let mut config = EngineConfig::default();
        config.components.translator = Some(ComponentSpec {
            model: ModelSpec {
                provider: ProviderKind::Mock,
                name: "mock-1".to_string(),
                temperature: 0.7,
                top_p: None,
                max_output_tokens: None,
                json_mode: false,
            },
            prompt: None,
            params: serde_json::Value::Null,
        });
        let gateway = Arc::new(Gateway::new().with_provider("mock", Arc::new(MockProvider::new("mock"))));
        Arc::new(build_pipeline(&config, gateway, Path::new(".")).unwrap())
    }

    fn sample(id: &str, text: &str) -> Sample {
        Sample {
            sample_id: id.to_string(),
            source_text: text.to_string(),
            context: String::new(),
            constraints: ConstraintPartial::default(),
            reference_en: None,
        }
    }

    #[tokio::test]
    async fn a0_pair_produces_one_ok_record_with_no_state() {
        let pipeline = mock_pipeline();
        let orchestrator = Orchestrator::new(pipeline, ConstraintPartial::default(), 1, 2);
        let (tx, mut rx) = mpsc::channel(4);

        let admitted = orchestrator
            .run(
                "r1".to_string(),
                vec![(sample("s1:0", "こんにちは。"), Condition::A0)],
                tx,
                None,
                CancellationToken::new(),
            )
            .await;

        assert_eq!(admitted, 1);
        let record = rx.recv().await.unwrap();
        assert_eq!(record.sample_id, "s1:0");
        assert!(record.state.is_none());
        assert_eq!(record.status, RunStatus::Ok);
    }

    #[tokio::test]
    async fn a1_pair_builds_state() {
        let pipeline = mock_pipeline();
        let orchestrator = Orchestrator::new(pipeline, ConstraintPartial::default(), 1, 2);
        let (tx, mut rx) = mpsc::channel(4);

        orchestrator
            .run(
                "r1".to_string(),
                vec![(sample("s1:0", "こんにちは。"), Condition::A1)],
                tx,
                None,
                CancellationToken::new(),
            )
            .await;

        let record = rx.recv().await.unwrap();
        assert!(record.state.is_some());
    }

    #[tokio::test]
    async fn cancellation_stops_admitting_new_pairs() {
        let pipeline = mock_pipeline();
        let orchestrator = Orchestrator::new(pipeline, ConstraintPartial::default(), 1, 2);
        let (tx, _rx) = mpsc::channel(4);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let admitted = orchestrator
            .run(
                "r1".to_string(),
                vec![(sample("s1:0", "a"), Condition::A0), (sample("s1:1", "b"), Condition::A0)],
                tx,
                None,
                cancel,
            )
            .await;

        assert_eq!(admitted, 0);
    }
}
