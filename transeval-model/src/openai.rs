use async_trait::async_trait;
use transeval_core::model::UsageTotals;

use crate::error::{GatewayError, Result};
use crate::provider::{LlmRequest, LlmResponse, Provider, ResponseFormat, Role};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// OpenAI-compatible chat-completions client (§4.3), trimmed to the single
/// non-streaming call the gateway needs — no function calling, no vision
/// parts, no response-stream handling.
pub struct OpenAiProvider {
    name: String,
    api_key: String,
    base_url: String,
    http: reqwest::Client,
}

impl OpenAiProvider {
    pub fn new(name: impl Into<String>, api_key: impl Into<String>) -> Self {
        OpenAiProvider {
            name: name.into(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            http: reqwest::Client::new(),
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

fn role_str(role: Role) -> &'static str {
    match role {
        Role::System => "system",
        Role::User => "user",
        Role::Assistant => "assistant",
    }
}

#[async_trait]
impl Provider for OpenAiProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(&self, request: &LlmRequest) -> Result<LlmResponse> {
        let messages: Vec<serde_json::Value> = request
            .messages
            .iter()
            .map(|m| {
                serde_json::json!({
                    "role": role_str(m.role),
                    "content": m.content,
                })
            })
            .collect();

        let mut body = serde_json::json!({
            "model": request.model,
            "messages": messages,
            "temperature": request.options.temperature,
        });
        if let Some(max_tokens) = request.options.max_output_tokens {
            body["max_tokens"] = serde_json::json!(max_tokens);
        }
        if request.options.response_format == ResponseFormat::Json {
            body["response_format"] = serde_json::json!({ "type": "json_object" });
        }

        let resp = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| GatewayError::Provider {
                status: e.status().map(|s| s.as_u16()).unwrap_or(0),
                body: e.to_string(),
            })?;

        let status = resp.status();
        let raw: serde_json::Value = resp.json().await.map_err(|e| GatewayError::Provider {
            status: status.as_u16(),
            body: format!("failed to decode response body: {e}"),
        })?;

        if !status.is_success() {
            return Err(GatewayError::Provider {
                status: status.as_u16(),
                body: raw.to_string(),
            });
        }

        let output = raw["choices"][0]["message"]["content"]
            .as_str()
            .unwrap_or_default()
            .to_string();
        let usage = UsageTotals {
            prompt: raw["usage"]["prompt_tokens"].as_u64().unwrap_or(0),
            completion: raw["usage"]["completion_tokens"].as_u64().unwrap_or(0),
            total: raw["usage"]["total_tokens"].as_u64().unwrap_or(0),
        };

        Ok(LlmResponse { output, usage, raw })
    }
}
