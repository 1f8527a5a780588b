use std::collections::HashMap;
use std::sync::Arc;

use crate::cache::ResponseCache;
use crate::error::{GatewayError, Result};
use crate::provider::{LlmRequest, LlmResponse, Provider};
use crate::rate_limit::RateLimiter;

/// The sole doorway to any model provider (§4.3): wraps provider dispatch with
/// an optional on-disk cache and an optional shared rate limiter. One
/// `Gateway` is shared across every worker of a single experiment run so the
/// rate limiter arbitrates total outbound volume (§5).
pub struct Gateway {
    providers: HashMap<String, Arc<dyn Provider>>,
    cache: Option<ResponseCache>,
    rate_limiter: Option<Arc<RateLimiter>>,
}

impl Gateway {
    pub fn new() -> Self {
        Gateway {
            providers: HashMap::new(),
            cache: None,
            rate_limiter: None,
        }
    }

    #[must_use]
    pub fn with_provider(mut self, id: impl Into<String>, provider: Arc<dyn Provider>) -> Self {
        self.providers.insert(id.into(), provider);
        self
    }

    #[must_use]
    pub fn with_cache(mut self, cache: ResponseCache) -> Self {
        self.cache = Some(cache);
        self
    }

    #[must_use]
    pub fn with_rate_limiter(mut self, rate_limiter: Arc<RateLimiter>) -> Self {
        self.rate_limiter = Some(rate_limiter);
        self
    }

    /// Routes `request` to the provider named by `request.provider_id`,
    /// serving a cache hit without charging the rate limiter, and admitting
    /// through the rate limiter before any network call (§4.3, §5).
    pub async fn call(&self, request: &LlmRequest) -> Result<LlmResponse> {
        let key = ResponseCache::key_for(request);

        if let Some(cache) = &self.cache {
            if let Some(hit) = cache.get(&request.model, &key).await {
                tracing::debug!(model = %request.model, "gateway cache hit");
                return Ok(hit);
            }
        }

        if let Some(limiter) = &self.rate_limiter {
            limiter.admit(request.token_cost()).await;
        }

        let provider = self
            .providers
            .get(&request.provider_id)
            .ok_or_else(|| GatewayError::UnknownProvider(request.provider_id.clone()))?;

        let response = provider.generate(request).await?;

        if let Some(cache) = &self.cache {
            if let Err(e) = cache.put(&request.model, &key, &response).await {
                tracing::warn!(error = %e, "failed to write gateway cache entry");
            }
        }

        Ok(response)
    }
}

impl Default for Gateway {
    fn default() -> Self {
        Gateway::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockProvider;
    use crate::provider::{GenerateOptions, Message};

    fn request() -> LlmRequest {
        LlmRequest {
            provider_id: "mock".to_string(),
            model: "mock-1".to_string(),
            messages: vec![Message::user("こんにちは。")],
            options: GenerateOptions::default(),
        }
    }

    #[tokio::test]
    async fn routes_to_the_named_provider() {
        let gateway = Gateway::new().with_provider("mock", Arc::new(MockProvider::new("mock")));
        let resp = gateway.call(&request()).await.unwrap();
        assert_eq!(resp.output, "こんにちは.");
    }

    #[tokio::test]
    async fn unknown_provider_id_errors() {
        let gateway = Gateway::new();
        let err = gateway.call(&request()).await.unwrap_err();
        assert!(matches!(err, GatewayError::UnknownProvider(_)));
    }

    #[tokio::test]
    async fn cache_hit_skips_the_provider() {
        let dir = tempfile::tempdir().unwrap();
        let gateway = Gateway::new()
            .with_provider("mock", Arc::new(MockProvider::new("mock")))
            .with_cache(ResponseCache::new(dir.path()));

        let first = gateway.call(&request()).await.unwrap();
        // Swap in a provider that would panic if invoked, to prove the second
        // call is served entirely from cache.
        let gateway_no_provider = Gateway::new().with_cache(ResponseCache::new(dir.path()));
        let second = gateway_no_provider.call(&request()).await.unwrap();
        assert_eq!(first.output, second.output);
    }
}
