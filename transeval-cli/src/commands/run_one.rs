use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use transeval_core::model::Condition;
use transeval_runner::{build_gateway, build_pipeline, Orchestrator};

use crate::cli::OutputFormatArg;
use crate::config::load_engine_config;
use crate::dataset::parse_sample;

pub struct RunOneArgs {
    pub config: PathBuf,
    pub sample: Option<PathBuf>,
    pub condition: Condition,
    pub output_format: OutputFormatArg,
}

/// `run-one` (§6.4): runs a single sample through the pipeline and prints the
/// result to stdout, reading the sample from a file or stdin.
pub async fn execute(args: RunOneArgs) -> anyhow::Result<()> {
    let config = load_engine_config(&args.config)?;
    let base_dir = args.config.parent().unwrap_or_else(|| Path::new(".")).to_path_buf();
    let cache_dir = base_dir.join(&config.run_settings.cache_dir);

    let gateway = Arc::new(build_gateway(&config, &cache_dir)?);
    let pipeline = Arc::new(build_pipeline(&config, gateway, &base_dir)?);

    let sample_text = match &args.sample {
        Some(path) => std::fs::read_to_string(path).map_err(|e| anyhow::anyhow!("failed to read sample {}: {e}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };
    let sample = parse_sample(&sample_text)?;

    let orchestrator = Orchestrator::new(pipeline, config.defaults.constraints.clone(), config.run_settings.max_repairs, 1);
    let (tx, mut rx) = mpsc::channel(1);
    orchestrator
        .run(uuid::Uuid::new_v4().to_string(), vec![(sample, args.condition)], tx, None, CancellationToken::new())
        .await;
    let record = rx.recv().await.expect("the orchestrator emits exactly one record for one admitted pair");

    match args.output_format {
        OutputFormatArg::Text => println!("{}", record.final_translation),
        OutputFormatArg::Json => println!("{}", serde_json::to_string_pretty(&record)?),
    }
    Ok(())
}
