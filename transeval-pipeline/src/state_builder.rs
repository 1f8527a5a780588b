use std::collections::HashMap;

use transeval_core::model::{Entity, Sample, State, UsageTotals};

use crate::component::LlmComponent;

fn heuristic(sample: &Sample) -> State {
    let utterance: String = sample.source_text.chars().take(120).collect();
    State {
        utterance,
        speaker: "unknown".to_string(),
        addressee: "unknown".to_string(),
        entities: Vec::new(),
        core_meaning: sample.source_text.clone(),
        implicature: sample.context.clone(),
    }
}

/// Parses a (possibly partial) JSON state object, falling back field-by-field
/// to the heuristic defaults (§4.5). Returns `None` only when the text isn't
/// valid JSON at all, in which case the caller falls back entirely.
fn parse_partial(text: &str, fallback: &State) -> Option<State> {
    let value: serde_json::Value = serde_json::from_str(text).ok()?;
    let str_field = |key: &str, default: &str| -> String {
        value
            .get(key)
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| default.to_string())
    };
    let entities = value
        .get("entities")
        .and_then(|v| serde_json::from_value::<Vec<Entity>>(v.clone()).ok())
        .unwrap_or_else(|| fallback.entities.clone());

    Some(State {
        utterance: str_field("utterance", &fallback.utterance),
        speaker: str_field("speaker", &fallback.speaker),
        addressee: str_field("addressee", &fallback.addressee),
        entities,
        core_meaning: str_field("coreMeaning", &fallback.core_meaning),
        implicature: str_field("implicature", &fallback.implicature),
    })
}

/// Builds the [`State`] fed to the stateful translator (§4.5). Without an
/// LLM, returns a fixed heuristic extraction; with one, a JSON parse error
/// (partial or total) always falls back to the heuristic rather than failing
/// the pipeline.
pub struct StateBuilder {
    llm: Option<LlmComponent>,
}

impl StateBuilder {
    pub fn new(llm: Option<LlmComponent>) -> Self {
        StateBuilder { llm }
    }

    pub async fn build(&self, sample: &Sample) -> (State, UsageTotals) {
        let fallback = heuristic(sample);
        let Some(llm) = &self.llm else {
            return (fallback, UsageTotals::default());
        };

        let mut vars = HashMap::new();
        vars.insert("text".to_string(), serde_json::json!(sample.source_text));
        vars.insert("context".to_string(), serde_json::json!(sample.context));

        match llm.call(&vars).await {
            Ok((output, usage)) => {
                let state = parse_partial(&output, &fallback).unwrap_or(fallback);
                (state, usage)
            }
            Err(e) => {
                tracing::warn!(error = %e, "state builder LLM call failed, falling back to heuristic");
                (fallback, UsageTotals::default())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Sample {
        Sample {
            sample_id: "s1:0".to_string(),
            source_text: "こんにちは、世界。これはとても長い文章です。".to_string(),
            context: "previous line".to_string(),
            constraints: Default::default(),
            reference_en: None,
        }
    }

    #[tokio::test]
    async fn without_llm_returns_fixed_heuristic() {
        let builder = StateBuilder::new(None);
        let (state, usage) = builder.build(&sample()).await;
        assert_eq!(state.speaker, "unknown");
        assert_eq!(state.addressee, "unknown");
        assert_eq!(state.core_meaning, sample().source_text);
        assert_eq!(state.implicature, "previous line");
        assert_eq!(usage.total, 0);
    }

    #[test]
    fn parse_partial_fills_missing_fields_from_heuristic() {
        let fallback = heuristic(&sample());
        let state = parse_partial(r#"{"speaker":"Aiko"}"#, &fallback).unwrap();
        assert_eq!(state.speaker, "Aiko");
        assert_eq!(state.addressee, "unknown");
        assert_eq!(state.core_meaning, fallback.core_meaning);
    }

    #[test]
    fn invalid_json_returns_none() {
        let fallback = heuristic(&sample());
        assert!(parse_partial("not json", &fallback).is_none());
    }
}
