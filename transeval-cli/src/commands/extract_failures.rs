use std::path::PathBuf;

use transeval_core::model::RunStatus;

use crate::glob_files::read_run_records;

pub struct ExtractFailuresArgs {
    pub runs: Vec<String>,
    pub output: PathBuf,
    pub threshold: f64,
}

/// `extract-failures` (§6.4): copies every record that needs review, or
/// scores below `threshold`, into a single JSONL file.
pub async fn execute(args: ExtractFailuresArgs) -> anyhow::Result<()> {
    let records = read_run_records(&args.runs)?;
    let failures: Vec<_> = records
        .into_iter()
        .filter(|r| r.status == RunStatus::NeedsReview || r.scores.overall < args.threshold)
        .collect();

    let mut out = String::new();
    for record in &failures {
        out.push_str(&serde_json::to_string(record)?);
        out.push('\n');
    }
    std::fs::write(&args.output, out)?;
    println!("wrote {} failing records to {}", failures.len(), args.output.display());
    Ok(())
}
