use async_trait::async_trait;
use transeval_core::model::UsageTotals;

use crate::error::Result;
use crate::provider::{LlmRequest, LlmResponse, Provider};

/// Deterministic, network-free provider (§4.3). Performs a
/// Japanese-punctuation-to-ASCII substitution over the last user message and
/// nothing else — used throughout the test suite and by `run-one` when no
/// provider credentials are configured.
pub struct MockProvider {
    name: String,
}

impl MockProvider {
    pub fn new(name: impl Into<String>) -> Self {
        MockProvider { name: name.into() }
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        MockProvider::new("mock")
    }
}

/// `。→.  、→,  ！→!  ？→?`, trimmed and whitespace-collapsed.
pub fn transliterate(text: &str) -> String {
    let substituted: String = text
        .chars()
        .map(|c| match c {
            '。' => '.',
            '、' => ',',
            '！' => '!',
            '？' => '?',
            other => other,
        })
        .collect();
    let collapsed = substituted.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.trim().to_string()
}

#[async_trait]
impl Provider for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(&self, request: &LlmRequest) -> Result<LlmResponse> {
        let input = request.last_user_message().unwrap_or_default();
        let output = transliterate(input);
        let tokens = output.split_whitespace().count() as u64;
        Ok(LlmResponse {
            output,
            usage: UsageTotals {
                prompt: input.split_whitespace().count() as u64,
                completion: tokens,
                total: input.split_whitespace().count() as u64 + tokens,
            },
            raw: serde_json::Value::Null,
        })
    }
}
