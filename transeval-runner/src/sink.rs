use std::path::PathBuf;

use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use transeval_core::model::RunRecord;

use crate::error::{Result, RunnerError};

/// Spawns the single task that owns the output JSONL file handle and drains
/// every [`RunRecord`] pushed to it by orchestrator workers (§9: "a single
/// writer thread fed by a buffered channel"). A write failure is fatal to the
/// run: the task stops draining and returns the error to whoever awaits its
/// handle, but every record already flushed stays on disk (§7).
pub fn spawn_jsonl_writer(path: PathBuf, overwrite: bool, mut records: mpsc::Receiver<RunRecord>) -> JoinHandle<Result<usize>> {
    tokio::spawn(async move {
        let mut options = OpenOptions::new();
        options.write(true).create(true);
        if overwrite {
            options.truncate(true);
        } else {
            options.append(true);
        }

        let mut file = options
            .open(&path)
            .await
            .map_err(|e| RunnerError::Sink(format!("failed to open {}: {e}", path.display())))?;

        let mut written = 0usize;
        while let Some(record) = records.recv().await {
            let mut line = serde_json::to_vec(&record).map_err(|e| RunnerError::Sink(e.to_string()))?;
            line.push(b'\n');
            file.write_all(&line).await.map_err(|e| RunnerError::Sink(e.to_string()))?;
            written += 1;
        }

        file.flush().await.map_err(|e| RunnerError::Sink(e.to_string()))?;
        Ok(written)
    })
}
