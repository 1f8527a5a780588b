use std::collections::HashMap;

use transeval_core::model::{ConstraintRecord, Sample, State, UsageTotals};

use crate::component::LlmComponent;
use crate::error::Result;
use crate::markdown::{constraints_markdown, state_or_not_provided};

/// Default system persona when no component-level override is configured
/// (§4.6).
pub const DEFAULT_SYSTEM_PROMPT: &str =
    "You are a professional translator working on narrative fiction. Produce a faithful, \
     natural-sounding translation that honors every constraint provided.";

/// Renders a single prompt exposing `{{text}} {{context}} {{state}} {{constraints}}`
/// and calls the LLM (§4.6). A translator always has an LLM configured — even
/// the mock provider counts — so an LLM failure here is surfaced, never
/// recovered locally (§7).
pub struct Translator {
    llm: LlmComponent,
}

impl Translator {
    pub fn new(llm: LlmComponent) -> Self {
        Translator { llm }
    }

    pub async fn translate(
        &self,
        sample: &Sample,
        constraints: &ConstraintRecord,
        state: Option<&State>,
    ) -> Result<(String, UsageTotals)> {
        let mut vars = HashMap::new();
        vars.insert("text".to_string(), serde_json::json!(sample.source_text));
        vars.insert("context".to_string(), serde_json::json!(sample.context));
        vars.insert("state".to_string(), serde_json::json!(state_or_not_provided(state)));
        vars.insert(
            "constraints".to_string(),
            serde_json::json!(constraints_markdown(constraints)),
        );

        let (output, usage) = self.llm.call(&vars).await?;
        Ok((output.trim_end().to_string(), usage))
    }
}
