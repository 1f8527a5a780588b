use std::collections::HashMap;
use std::path::PathBuf;

use serde::Serialize;
use transeval_core::model::{Condition, RunRecord, RunStatus, Severity};

use crate::cli::AggregateFormatArg;
use crate::glob_files::read_run_records;

pub struct AggregateArgs {
    pub runs: Vec<String>,
    pub output: PathBuf,
    pub format: AggregateFormatArg,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AggregateRow {
    run_id: String,
    condition: Condition,
    samples: usize,
    avg_overall: f64,
    min_overall: f64,
    max_overall: f64,
    failure_rate: f64,
    critical_issues: usize,
}

fn summarize(records: Vec<RunRecord>) -> Vec<AggregateRow> {
    let mut groups: HashMap<(String, Condition), Vec<RunRecord>> = HashMap::new();
    for record in records {
        groups.entry((record.run_id.clone(), record.condition)).or_default().push(record);
    }

    let mut rows: Vec<AggregateRow> = groups
        .into_iter()
        .map(|((run_id, condition), records)| {
            let samples = records.len();
            let overalls: Vec<f64> = records.iter().map(|r| r.scores.overall).collect();
            let avg_overall = overalls.iter().sum::<f64>() / samples as f64;
            let min_overall = overalls.iter().cloned().fold(f64::INFINITY, f64::min);
            let max_overall = overalls.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            let failures = records.iter().filter(|r| r.status != RunStatus::Ok).count();
            let critical_issues = records.iter().flat_map(|r| &r.issues).filter(|i| i.severity == Severity::Critical).count();

            AggregateRow {
                run_id,
                condition,
                samples,
                avg_overall,
                min_overall,
                max_overall,
                failure_rate: failures as f64 / samples as f64,
                critical_issues,
            }
        })
        .collect();

    rows.sort_by(|a, b| (a.run_id.as_str(), a.condition.to_string()).cmp(&(b.run_id.as_str(), b.condition.to_string())));
    rows
}

fn write_csv(rows: &[AggregateRow]) -> String {
    let mut out = String::from("runId,condition,samples,avgOverall,minOverall,maxOverall,failureRate,criticalIssues\n");
    for row in rows {
        out.push_str(&format!(
            "{},{},{},{},{},{},{},{}\n",
            row.run_id, row.condition, row.samples, row.avg_overall, row.min_overall, row.max_overall, row.failure_rate, row.critical_issues
        ));
    }
    out
}

/// `aggregate` (§6.4): summarizes one or more run JSONL files (glob
/// patterns) into one row per `(runId, condition)`.
pub async fn execute(args: AggregateArgs) -> anyhow::Result<()> {
    let records = read_run_records(&args.runs)?;
    if records.is_empty() {
        anyhow::bail!("no run records matched {:?}", args.runs);
    }
    let rows = summarize(records);

    let rendered = match args.format {
        AggregateFormatArg::Json => serde_json::to_string_pretty(&rows)?,
        AggregateFormatArg::Csv => write_csv(&rows),
    };
    std::fs::write(&args.output, rendered)?;
    println!("wrote {} rows to {}", rows.len(), args.output.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use transeval_core::model::{ConstraintRecord, FormatSettings, ScoreBreakdown, Timings, UsageTotals};

    fn record(run_id: &str, condition: Condition, overall: f64, status: RunStatus) -> RunRecord {
        RunRecord {
            run_id: run_id.to_string(),
            condition,
            sample_id: "s1:0".to_string(),
            draft: "d".to_string(),
            final_translation: "f".to_string(),
            issues: vec![],
            hard_checks: vec![],
            scores: ScoreBreakdown { overall, ..Default::default() },
            usage: UsageTotals::default(),
            timings: Timings::default(),
            state: None,
            normalized_constraints: ConstraintRecord {
                target_lang: "en".to_string(),
                tone: None,
                register: None,
                reading_level: None,
                format: FormatSettings::default(),
                glossary: vec![],
                banned_patterns: vec![],
                allow_japanese_tokens: vec![],
            },
            trace: None,
            status,
        }
    }

    #[test]
    fn summarize_computes_avg_min_max_and_failure_rate() {
        let rows = summarize(vec![
            record("r1", Condition::A0, 0.8, RunStatus::Ok),
            record("r1", Condition::A0, 0.6, RunStatus::NeedsReview),
        ]);
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.samples, 2);
        assert!((row.avg_overall - 0.7).abs() < 1e-9);
        assert_eq!(row.min_overall, 0.6);
        assert_eq!(row.max_overall, 0.8);
        assert_eq!(row.failure_rate, 0.5);
    }

    #[test]
    fn summarize_groups_separately_per_condition() {
        let rows = summarize(vec![
            record("r1", Condition::A0, 0.8, RunStatus::Ok),
            record("r1", Condition::A1, 0.9, RunStatus::Ok),
        ]);
        assert_eq!(rows.len(), 2);
    }
}
