use std::collections::{HashMap, HashSet};

use serde::Deserialize;
use transeval_core::model::{HardCheckResult, Sample, ScoreBreakdown, UsageTotals};
use transeval_model::mock::transliterate;

use crate::component::LlmComponent;

fn clamp01(v: f64) -> f64 {
    v.clamp(0.0, 1.0)
}

fn heuristic_adequacy(final_translation: &str, source: &str) -> f64 {
    let transliterated = transliterate(source).to_lowercase();
    let source_tokens: HashSet<&str> = transliterated.split_whitespace().collect();
    let final_tokens: Vec<String> = final_translation.to_lowercase().split_whitespace().map(String::from).collect();
    if final_tokens.is_empty() {
        return 0.0;
    }
    let overlap = final_tokens.iter().filter(|t| source_tokens.contains(t.as_str())).count();
    clamp01(overlap as f64 / final_tokens.len() as f64)
}

fn heuristic_fluency(final_translation: &str, source: &str) -> f64 {
    let final_len = final_translation.chars().count() as f64;
    let source_len = source.chars().count() as f64;
    clamp01(1.0 - (final_len - source_len).abs() / source_len.max(1.0))
}

fn heuristic_constraint_compliance(hard_checks: &[HardCheckResult]) -> f64 {
    if hard_checks.is_empty() {
        return 1.0;
    }
    let passed = hard_checks.iter().filter(|hc| hc.passed).count();
    clamp01(passed as f64 / hard_checks.len() as f64)
}

const HEURISTIC_STYLE_FIT: f64 = 0.5;

/// Heuristic fallback score, used when no LLM is configured or when an LLM
/// judge call fails to parse (§4.9).
fn heuristic_score(sample: &Sample, hard_checks: &[HardCheckResult], final_translation: &str) -> ScoreBreakdown {
    let adequacy = heuristic_adequacy(final_translation, &sample.source_text);
    let fluency = heuristic_fluency(final_translation, &sample.source_text);
    let constraint_compliance = heuristic_constraint_compliance(hard_checks);
    let style_fit = HEURISTIC_STYLE_FIT;
    let overall = clamp01(0.40 * adequacy + 0.20 * fluency + 0.25 * constraint_compliance + 0.15 * style_fit);
    ScoreBreakdown {
        adequacy,
        fluency,
        constraint_compliance,
        style_fit,
        overall,
    }
}

#[derive(Debug, Deserialize)]
struct WireScore {
    #[serde(default)]
    adequacy: Option<f64>,
    #[serde(default)]
    fluency: Option<f64>,
    #[serde(default, rename = "constraintCompliance")]
    constraint_compliance: Option<f64>,
    #[serde(default, rename = "styleFit")]
    style_fit: Option<f64>,
    #[serde(default)]
    overall: Option<f64>,
}

fn parse_judge_output(text: &str, fallback: &ScoreBreakdown) -> Option<ScoreBreakdown> {
    let wire: WireScore = serde_json::from_str(text).ok()?;
    Some(ScoreBreakdown {
        adequacy: clamp01(wire.adequacy.unwrap_or(fallback.adequacy)),
        fluency: clamp01(wire.fluency.unwrap_or(fallback.fluency)),
        constraint_compliance: clamp01(wire.constraint_compliance.unwrap_or(fallback.constraint_compliance)),
        style_fit: clamp01(wire.style_fit.unwrap_or(fallback.style_fit)),
        overall: clamp01(wire.overall.unwrap_or(fallback.overall)),
    })
}

fn median(mut values: Vec<f64>) -> f64 {
    values.sort_by(|a, b| a.partial_cmp(b).expect("scores are never NaN"));
    let len = values.len();
    if len == 0 {
        return 0.0;
    }
    if len % 2 == 1 {
        values[len / 2]
    } else {
        (values[len / 2 - 1] + values[len / 2]) / 2.0
    }
}

fn median_reduce(scores: &[ScoreBreakdown]) -> ScoreBreakdown {
    ScoreBreakdown {
        adequacy: median(scores.iter().map(|s| s.adequacy).collect()),
        fluency: median(scores.iter().map(|s| s.fluency).collect()),
        constraint_compliance: median(scores.iter().map(|s| s.constraint_compliance).collect()),
        style_fit: median(scores.iter().map(|s| s.style_fit).collect()),
        overall: median(scores.iter().map(|s| s.overall).collect()),
    }
}

/// Scores a final translation on the five-dimensional rubric (§4.9). With an
/// LLM configured, runs `judge_runs` independent calls and reduces each
/// dimension by median; without one, returns a single heuristic score.
pub struct Judge {
    llm: Option<LlmComponent>,
    judge_runs: u32,
}

impl Judge {
    pub fn new(llm: Option<LlmComponent>, judge_runs: u32) -> Self {
        Judge {
            llm,
            judge_runs: judge_runs.max(1),
        }
    }

    pub async fn score(
        &self,
        sample: &Sample,
        hard_checks: &[HardCheckResult],
        final_translation: &str,
    ) -> (ScoreBreakdown, UsageTotals) {
        let fallback = heuristic_score(sample, hard_checks, final_translation);
        let Some(llm) = &self.llm else {
            return (fallback, UsageTotals::default());
        };

        let mut vars = HashMap::new();
        vars.insert("text".to_string(), serde_json::json!(sample.source_text));
        vars.insert("translation".to_string(), serde_json::json!(final_translation));
        vars.insert(
            "reference".to_string(),
            serde_json::json!(sample.reference_en.clone().unwrap_or_default()),
        );

        let mut usage = UsageTotals::default();
        let mut runs = Vec::with_capacity(self.judge_runs as usize);
        for _ in 0..self.judge_runs {
            match llm.call(&vars).await {
                Ok((output, call_usage)) => {
                    usage.add(call_usage);
                    runs.push(parse_judge_output(&output, &fallback).unwrap_or_else(|| fallback.clone()));
                }
                Err(e) => {
                    tracing::warn!(error = %e, "judge LLM call failed, using heuristic score for this run");
                    runs.push(fallback.clone());
                }
            }
        }

        (median_reduce(&runs), usage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use transeval_core::model::HardCheckResult;

    fn sample() -> Sample {
        Sample {
            sample_id: "s1:0".to_string(),
            source_text: "こんにちは、世界。".to_string(),
            context: String::new(),
            constraints: Default::default(),
            reference_en: None,
        }
    }

    #[test]
    fn heuristic_overall_uses_pinned_weights() {
        let hc = vec![HardCheckResult {
            id: "maxLength".to_string(),
            passed: true,
            description: "d".to_string(),
            details: None,
        }];
        let score = heuristic_score(&sample(), &hc, "こんにちは, 世界.");
        let expected = clamp01(
            0.40 * score.adequacy + 0.20 * score.fluency + 0.25 * score.constraint_compliance + 0.15 * 0.5,
        );
        assert!((score.overall - expected).abs() < 1e-9);
    }

    #[test]
    fn median_of_odd_count_is_middle_value() {
        assert_eq!(median(vec![0.2, 0.8, 0.5]), 0.5);
    }

    #[test]
    fn median_of_even_count_averages_middles() {
        assert_eq!(median(vec![0.2, 0.4, 0.6, 0.8]), 0.5);
    }

    #[tokio::test]
    async fn without_llm_returns_heuristic_once() {
        let judge = Judge::new(None, 3);
        let (score, usage) = judge.score(&sample(), &[], "こんにちは, 世界.").await;
        assert!(score.overall >= 0.0 && score.overall <= 1.0);
        assert_eq!(usage.total, 0);
    }
}
