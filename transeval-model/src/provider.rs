use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use transeval_core::model::UsageTotals;

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Message {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Message {
            role: Role::User,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseFormat {
    Text,
    Json,
}

impl Default for ResponseFormat {
    fn default() -> Self {
        ResponseFormat::Text
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateOptions {
    #[serde(default)]
    pub temperature: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
    #[serde(default)]
    pub response_format: ResponseFormat,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        GenerateOptions {
            temperature: 0.7,
            max_output_tokens: None,
            response_format: ResponseFormat::Text,
        }
    }
}

/// The common request shape every provider variant accepts (§4.3). `provider_id`
/// is folded into the cache key so two providers never collide on the same hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmRequest {
    pub provider_id: String,
    pub model: String,
    pub messages: Vec<Message>,
    #[serde(default)]
    pub options: GenerateOptions,
}

impl LlmRequest {
    pub fn last_user_message(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
    }

    /// Upper-bound token cost the rate limiter charges for this call (§4.3).
    pub fn token_cost(&self) -> u32 {
        self.options.max_output_tokens.unwrap_or(512)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmResponse {
    pub output: String,
    pub usage: UsageTotals,
    #[serde(default)]
    pub raw: serde_json::Value,
}

/// Provider abstraction (§4.3). Adding a provider only means adding a new
/// implementation of this trait plus a `ProviderKind` variant; nothing else
/// in the gateway changes.
#[async_trait]
pub trait Provider: Send + Sync {
    fn name(&self) -> &str;
    async fn generate(&self, request: &LlmRequest) -> Result<LlmResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_user_message_finds_most_recent_user_turn() {
        let req = LlmRequest {
            provider_id: "mock".to_string(),
            model: "mock-1".to_string(),
            messages: vec![
                Message::system("persona"),
                Message::user("first"),
                Message::user("second"),
            ],
            options: GenerateOptions::default(),
        };
        assert_eq!(req.last_user_message(), Some("second"));
    }

    #[test]
    fn token_cost_defaults_to_512() {
        let req = LlmRequest {
            provider_id: "mock".to_string(),
            model: "mock-1".to_string(),
            messages: vec![],
            options: GenerateOptions::default(),
        };
        assert_eq!(req.token_cost(), 512);
    }
}
