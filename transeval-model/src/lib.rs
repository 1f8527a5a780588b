//! The LLM gateway (§4.3): a provider abstraction, an on-disk response cache,
//! and a shared sliding-window rate limiter sitting in front of pluggable
//! model providers. Nothing outside this crate talks to a provider directly.

pub mod cache;
pub mod error;
pub mod gateway;
pub mod mock;
pub mod openai;
pub mod provider;
pub mod rate_limit;

pub use cache::ResponseCache;
pub use error::{GatewayError, Result};
pub use gateway::Gateway;
pub use mock::MockProvider;
pub use openai::OpenAiProvider;
pub use provider::{GenerateOptions, LlmRequest, LlmResponse, Message, Provider, ResponseFormat, Role};
pub use rate_limit::RateLimiter;
