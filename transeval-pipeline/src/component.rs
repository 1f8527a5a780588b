use std::collections::HashMap;
use std::sync::Arc;

use transeval_core::model::UsageTotals;
use transeval_model::{Gateway, GenerateOptions, LlmRequest, Message, ResponseFormat};

use crate::error::Result;

/// A configured LLM-backed component: a gateway handle plus the sampling
/// parameters and rendered template for one pipeline stage. Every stage that
/// can be LLM-backed (translator, state builder, verifier, repairer, judge)
/// wraps one of these — the gateway is the engine's sole doorway to a
/// provider, so stages never hold a bare provider handle.
#[derive(Clone)]
pub struct LlmComponent {
    gateway: Arc<Gateway>,
    provider_id: String,
    model_name: String,
    temperature: f32,
    max_output_tokens: Option<u32>,
    json_mode: bool,
    system: Option<String>,
    template: String,
}

impl LlmComponent {
    pub fn new(
        gateway: Arc<Gateway>,
        provider_id: impl Into<String>,
        model_name: impl Into<String>,
        template: impl Into<String>,
    ) -> Self {
        LlmComponent {
            gateway,
            provider_id: provider_id.into(),
            model_name: model_name.into(),
            temperature: 0.7,
            max_output_tokens: None,
            json_mode: false,
            system: None,
            template: template.into(),
        }
    }

    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    #[must_use]
    pub fn with_max_output_tokens(mut self, max_output_tokens: Option<u32>) -> Self {
        self.max_output_tokens = max_output_tokens;
        self
    }

    #[must_use]
    pub fn with_json_mode(mut self, json_mode: bool) -> Self {
        self.json_mode = json_mode;
        self
    }

    #[must_use]
    pub fn with_system(mut self, system: Option<String>) -> Self {
        self.system = system;
        self
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    /// Renders `self.template()` against `vars`, calls the gateway, and
    /// returns the raw output text plus the usage charged for the call.
    pub async fn call(&self, vars: &HashMap<String, serde_json::Value>) -> Result<(String, UsageTotals)> {
        let rendered = transeval_prompt::render(&self.template, vars);
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &self.system {
            messages.push(Message::system(system.clone()));
        }
        messages.push(Message::user(rendered));

        let request = LlmRequest {
            provider_id: self.provider_id.clone(),
            model: self.model_name.clone(),
            messages,
            options: GenerateOptions {
                temperature: self.temperature,
                max_output_tokens: self.max_output_tokens,
                response_format: if self.json_mode {
                    ResponseFormat::Json
                } else {
                    ResponseFormat::Text
                },
            },
        };

        let response = self.gateway.call(&request).await?;
        Ok((response.output, response.usage))
    }
}
