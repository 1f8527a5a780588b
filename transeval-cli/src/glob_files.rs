use std::path::PathBuf;

use transeval_core::model::RunRecord;

/// Expands a list of glob patterns (§6.4's `--runs GLOB...`) into a
/// deduplicated, sorted list of matching file paths.
fn expand_globs(patterns: &[String]) -> anyhow::Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for pattern in patterns {
        for entry in glob::glob(pattern).map_err(|e| anyhow::anyhow!("invalid glob pattern {pattern:?}: {e}"))? {
            paths.push(entry.map_err(|e| anyhow::anyhow!("glob read error: {e}"))?);
        }
    }
    paths.sort();
    paths.dedup();
    Ok(paths)
}

/// Reads every `RunRecord` line out of every file matched by `patterns`,
/// skipping blank lines. Malformed lines are reported with file and line
/// number context rather than silently dropped.
pub fn read_run_records(patterns: &[String]) -> anyhow::Result<Vec<RunRecord>> {
    let mut records = Vec::new();
    for path in expand_globs(patterns)? {
        let text = std::fs::read_to_string(&path).map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
        for (lineno, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let record: RunRecord =
                serde_json::from_str(line).map_err(|e| anyhow::anyhow!("{}:{}: {e}", path.display(), lineno + 1))?;
            records.push(record);
        }
    }
    Ok(records)
}
