use std::path::Path;

use transeval_core::model::{DatasetRecord, Sample};

/// Reads the dataset JSONL input (§6.1), one [`DatasetRecord`] per line,
/// blank lines skipped, and maps each row straight into a [`Sample`].
pub fn load_samples(path: &Path) -> anyhow::Result<Vec<Sample>> {
    let text = std::fs::read_to_string(path).map_err(|e| anyhow::anyhow!("failed to read dataset {}: {e}", path.display()))?;
    let mut samples = Vec::new();
    for (lineno, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let record: DatasetRecord =
            serde_json::from_str(line).map_err(|e| anyhow::anyhow!("dataset {}:{}: {e}", path.display(), lineno + 1))?;
        samples.push(transeval_runner::from_dataset_record(&record));
    }
    Ok(samples)
}

/// Parses one dataset row from a string, used by `run-one` for both file and
/// stdin input.
pub fn parse_sample(text: &str) -> anyhow::Result<Sample> {
    let record: DatasetRecord = serde_json::from_str(text.trim())?;
    Ok(transeval_runner::from_dataset_record(&record))
}

/// Parses the `--conditions` CSV flag (§6.4), defaulting to all four
/// conditions when the flag is omitted.
pub fn parse_conditions(csv: Option<&str>) -> anyhow::Result<Vec<transeval_core::model::Condition>> {
    use transeval_core::model::Condition;

    match csv {
        None => Ok(vec![Condition::A0, Condition::A1, Condition::A2, Condition::A3]),
        Some(csv) => csv
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| match s.to_ascii_uppercase().as_str() {
                "A0" => Ok(Condition::A0),
                "A1" => Ok(Condition::A1),
                "A2" => Ok(Condition::A2),
                "A3" => Ok(Condition::A3),
                other => anyhow::bail!("unknown condition {other:?} (expected one of A0, A1, A2, A3)"),
            })
            .collect(),
    }
}
