use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use transeval_core::model::Condition;
use transeval_runner::{build_gateway, build_pipeline, spawn_jsonl_writer, Orchestrator};

use crate::config::load_engine_config;
use crate::dataset::{load_samples, parse_conditions};

pub struct RunArgs {
    pub config: PathBuf,
    pub input: PathBuf,
    pub output: PathBuf,
    pub conditions: Option<String>,
    pub run_id: Option<String>,
    pub overwrite: bool,
}

/// `run` (§6.4): expands the dataset × conditions cross product and drives
/// it through the orchestrator, one JSONL line per pair.
pub async fn execute(args: RunArgs) -> anyhow::Result<()> {
    let config = load_engine_config(&args.config)?;
    let base_dir = args.config.parent().unwrap_or_else(|| Path::new(".")).to_path_buf();
    let cache_dir = base_dir.join(&config.run_settings.cache_dir);

    let gateway = Arc::new(build_gateway(&config, &cache_dir)?);
    let pipeline = Arc::new(build_pipeline(&config, gateway, &base_dir)?);

    let conditions: Vec<Condition> = parse_conditions(args.conditions.as_deref())?;
    let samples = load_samples(&args.input)?;

    let mut pairs = Vec::with_capacity(samples.len() * conditions.len());
    for sample in &samples {
        for condition in &conditions {
            pairs.push((sample.clone(), *condition));
        }
    }

    let run_id = args.run_id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let (tx, rx) = mpsc::channel(256);
    let writer = spawn_jsonl_writer(args.output.clone(), args.overwrite, rx);

    let orchestrator = Orchestrator::new(
        pipeline,
        config.defaults.constraints.clone(),
        config.run_settings.max_repairs,
        config.run_settings.concurrency,
    );
    let admitted = orchestrator.run(run_id, pairs, tx, None, CancellationToken::new()).await;
    tracing::info!(admitted, output = %args.output.display(), "experiment pairs admitted");

    let written = writer.await.map_err(|e| anyhow::anyhow!("JSONL writer task panicked: {e}"))??;
    println!("wrote {written} records to {}", args.output.display());
    Ok(())
}
