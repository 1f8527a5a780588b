use std::collections::HashMap;

use serde::Deserialize;
use transeval_core::hardcheck::{self, HardCheckSettings};
use transeval_core::model::{ConstraintRecord, HardCheckResult, Issue, IssueType, Sample, Severity, UsageTotals};

use crate::component::LlmComponent;
use crate::hashing::stable_issue_id;
use crate::markdown::constraints_markdown;

#[derive(Debug, Deserialize)]
struct WireIssue {
    #[serde(default)]
    id: Option<String>,
    #[serde(rename = "type")]
    issue_type: IssueType,
    severity: Severity,
    rationale: String,
    #[serde(default)]
    fix_suggestion: Option<String>,
    #[serde(default)]
    confidence: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct WireIssues {
    issues: Vec<WireIssue>,
}

fn parse_llm_issues(text: &str) -> Vec<Issue> {
    match serde_json::from_str::<WireIssues>(text) {
        Ok(wire) => wire
            .issues
            .into_iter()
            .map(|wi| Issue {
                id: wi.id.unwrap_or_else(|| stable_issue_id(wi.issue_type, &wi.rationale)),
                issue_type: wi.issue_type,
                severity: wi.severity,
                rationale: wi.rationale,
                fix_suggestion: wi.fix_suggestion.unwrap_or_default(),
                confidence: wi.confidence.unwrap_or(0.5).clamp(0.0, 1.0),
            })
            .collect(),
        Err(e) => {
            tracing::debug!(error = %e, "verifier LLM output did not parse as issues JSON");
            Vec::new()
        }
    }
}

/// Runs the hard-check engine and, when an LLM is configured, the LLM
/// reviewer (§4.7). A verifier LLM failure yields zero LLM-sourced issues but
/// never raises — hard-check-derived issues are always returned.
pub struct Verifier {
    settings: HardCheckSettings,
    llm: Option<LlmComponent>,
}

impl Verifier {
    pub fn new(settings: HardCheckSettings, llm: Option<LlmComponent>) -> Self {
        Verifier { settings, llm }
    }

    pub async fn verify(
        &self,
        sample: &Sample,
        constraints: &ConstraintRecord,
        translation: &str,
    ) -> (Vec<Issue>, Vec<HardCheckResult>, UsageTotals) {
        let hard_checks = hardcheck::run_checks(constraints, &self.settings, translation, &sample.source_text);
        let mut issues = hardcheck::issues_from_hard_checks(&hard_checks);
        let mut usage = UsageTotals::default();

        if let Some(llm) = &self.llm {
            let mut vars = HashMap::new();
            vars.insert("text".to_string(), serde_json::json!(sample.source_text));
            vars.insert("translation".to_string(), serde_json::json!(translation));
            vars.insert(
                "constraints".to_string(),
                serde_json::json!(constraints_markdown(constraints)),
            );

            match llm.call(&vars).await {
                Ok((output, call_usage)) => {
                    usage.add(call_usage);
                    issues.extend(parse_llm_issues(&output));
                }
                Err(e) => {
                    tracing::warn!(error = %e, "verifier LLM call failed, continuing with hard-check issues only");
                }
            }
        }

        (issues, hard_checks, usage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_id_is_synthesized_stably() {
        let text = r#"{"issues":[{"type":"OMISSION","severity":"major","rationale":"dropped a clause"}]}"#;
        let issues = parse_llm_issues(text);
        assert_eq!(issues.len(), 1);
        assert!(issues[0].id.starts_with("llm:"));
        assert_eq!(issues[0].issue_type, IssueType::Omission);
    }

    #[test]
    fn explicit_id_is_preserved() {
        let text = r#"{"issues":[{"id":"custom-1","type":"OTHER","severity":"minor","rationale":"r"}]}"#;
        let issues = parse_llm_issues(text);
        assert_eq!(issues[0].id, "custom-1");
    }

    #[test]
    fn invalid_json_yields_zero_issues() {
        assert!(parse_llm_issues("not json").is_empty());
    }
}
