use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

use crate::provider::{LlmRequest, LlmResponse};

/// One on-disk cache entry (§6.6): `<cacheDir>/<sanitized model-name>/<hash>.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheEntry {
    key: String,
    value: LlmResponse,
    created_at: DateTime<Utc>,
}

/// Content-addressed response cache. A cache hit never touches the network or
/// the rate limiter; a corrupt or unreadable entry is always treated as a
/// miss (§4.3) — the cache must never propagate a parse error to callers.
pub struct ResponseCache {
    root: PathBuf,
}

impl ResponseCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        ResponseCache { root: root.into() }
    }

    /// Stable hash of the canonicalized request, including the provider id so
    /// two providers never collide on the same cache entry.
    pub fn key_for(request: &LlmRequest) -> String {
        let canonical = serde_json::to_string(request).expect("LlmRequest always serializes");
        let mut hasher = Sha256::new();
        hasher.update(canonical.as_bytes());
        hex::encode(hasher.finalize())
    }

    fn sanitize_model_name(model: &str) -> String {
        model
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect()
    }

    fn entry_path(&self, model: &str, key: &str) -> PathBuf {
        self.root.join(Self::sanitize_model_name(model)).join(format!("{key}.json"))
    }

    pub async fn get(&self, model: &str, key: &str) -> Option<LlmResponse> {
        let path = self.entry_path(model, key);
        let bytes = tokio::fs::read(&path).await.ok()?;
        match serde_json::from_slice::<CacheEntry>(&bytes) {
            Ok(entry) if entry.key == key => Some(entry.value),
            _ => {
                tracing::debug!(path = %path.display(), "cache entry unreadable or mismatched, treating as miss");
                None
            }
        }
    }

    pub async fn put(&self, model: &str, key: &str, value: &LlmResponse) -> std::io::Result<()> {
        let path = self.entry_path(model, key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let entry = CacheEntry {
            key: key.to_string(),
            value: value.clone(),
            created_at: Utc::now(),
        };
        let bytes = serde_json::to_vec_pretty(&entry)?;
        let tmp_path = tmp_path_for(&path);
        tokio::fs::write(&tmp_path, &bytes).await?;
        tokio::fs::rename(&tmp_path, &path).await?;
        Ok(())
    }
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    PathBuf::from(tmp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{GenerateOptions, Message};
    use transeval_core::model::UsageTotals;

    fn request() -> LlmRequest {
        LlmRequest {
            provider_id: "mock".to_string(),
            model: "mock-1".to_string(),
            messages: vec![Message::user("hello")],
            options: GenerateOptions::default(),
        }
    }

    fn response() -> LlmResponse {
        LlmResponse {
            output: "hi".to_string(),
            usage: UsageTotals::default(),
            raw: serde_json::Value::Null,
        }
    }

    #[test]
    fn key_is_stable_for_identical_requests() {
        assert_eq!(ResponseCache::key_for(&request()), ResponseCache::key_for(&request()));
    }

    #[test]
    fn key_differs_by_provider_id() {
        let mut other = request();
        other.provider_id = "openai".to_string();
        assert_ne!(ResponseCache::key_for(&request()), ResponseCache::key_for(&other));
    }

    #[test]
    fn sanitizes_model_names_with_path_separators() {
        assert_eq!(ResponseCache::sanitize_model_name("gpt-4o/mini"), "gpt-4o_mini");
    }

    #[tokio::test]
    async fn miss_then_hit_round_trips_response() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ResponseCache::new(dir.path());
        let req = request();
        let key = ResponseCache::key_for(&req);

        assert!(cache.get(&req.model, &key).await.is_none());

        cache.put(&req.model, &key, &response()).await.unwrap();
        let hit = cache.get(&req.model, &key).await.unwrap();
        assert_eq!(hit.output, "hi");
    }

    #[tokio::test]
    async fn corrupt_entry_is_treated_as_miss() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ResponseCache::new(dir.path());
        let path = cache.entry_path("mock-1", "deadbeef");
        tokio::fs::create_dir_all(path.parent().unwrap()).await.unwrap();
        tokio::fs::write(&path, b"not json").await.unwrap();

        assert!(cache.get("mock-1", "deadbeef").await.is_none());
    }
}
