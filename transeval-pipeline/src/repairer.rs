use std::collections::HashMap;

use regex::Regex;
use transeval_core::model::{ConstraintRecord, Issue, Sample, State, UsageTotals};

use crate::component::LlmComponent;
use crate::error::Result;
use crate::markdown::{constraints_markdown, state_or_not_provided};

fn heuristic_repair(constraints: &ConstraintRecord, current: &str) -> String {
    let mut repaired = current.to_string();
    for pattern in &constraints.banned_patterns {
        if let Ok(re) = Regex::new(&format!("(?i){pattern}")) {
            repaired = re.replace_all(&repaired, "").into_owned();
        }
    }
    if let Some(max_chars) = constraints.format.max_chars {
        let max_chars = max_chars.max(0) as usize;
        if repaired.chars().count() > max_chars && max_chars > 0 {
            let truncated: String = repaired.chars().take(max_chars - 1).collect();
            repaired = format!("{truncated}…");
        }
    }
    repaired
}

/// Without an LLM, strips banned patterns and truncates to `maxChars` (§4.8).
/// With one, renders the repair template and returns the trimmed output. The
/// repairer never inspects issue severities — that policy lives in the
/// orchestrator. An LLM failure here is surfaced, not recovered (§7).
pub struct Repairer {
    llm: Option<LlmComponent>,
}

impl Repairer {
    pub fn new(llm: Option<LlmComponent>) -> Self {
        Repairer { llm }
    }

    pub async fn repair(
        &self,
        sample: &Sample,
        constraints: &ConstraintRecord,
        state: Option<&State>,
        current: &str,
        issues: &[Issue],
    ) -> Result<(String, UsageTotals)> {
        if issues.is_empty() {
            return Ok((current.to_string(), UsageTotals::default()));
        }

        let Some(llm) = &self.llm else {
            return Ok((heuristic_repair(constraints, current), UsageTotals::default()));
        };

        let mut vars = HashMap::new();
        vars.insert("text".to_string(), serde_json::json!(sample.source_text));
        vars.insert("context".to_string(), serde_json::json!(sample.context));
        vars.insert("translation".to_string(), serde_json::json!(current));
        vars.insert("issues".to_string(), serde_json::to_value(issues).unwrap_or_default());
        vars.insert(
            "constraints".to_string(),
            serde_json::json!(constraints_markdown(constraints)),
        );
        vars.insert("state".to_string(), serde_json::json!(state_or_not_provided(state)));

        let (output, usage) = llm.call(&vars).await?;
        Ok((output.trim_end().to_string(), usage))
    }
}
