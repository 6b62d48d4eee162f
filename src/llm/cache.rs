//! Caller-owned cache of chat model clients

use super::ChatModel;
use crate::error::Result;
use moka::sync::Cache;
use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha256};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Identity of a model client: provider, model and credential
pub struct ModelKey {
    pub provider: String,
    pub model: String,
    api_key: SecretString,
}

impl ModelKey {
    pub fn new(
        provider: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            provider: provider.into(),
            model: model.into(),
            api_key: SecretString::new(api_key.into()),
        }
    }

    pub fn api_key(&self) -> &SecretString {
        &self.api_key
    }

    /// Cache key; the credential only contributes a truncated digest
    pub fn cache_key(&self) -> String {
        let digest = Sha256::digest(self.api_key.expose_secret().as_bytes());
        format!(
            "{}:{}:{}",
            self.provider,
            self.model,
            &hex::encode(digest)[..16]
        )
    }
}

impl fmt::Debug for ModelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelKey")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

/// Bounded cache of constructed models, passed explicitly to whoever builds clients
#[derive(Clone)]
pub struct ModelCache {
    models: Cache<String, Arc<dyn ChatModel>>,
}

impl ModelCache {
    pub fn new(capacity: u64) -> Self {
        Self {
            models: Cache::new(capacity),
        }
    }

    /// Return the cached model for `key`, building it with `factory` on a miss
    pub fn get_or_create<F>(&self, key: &ModelKey, factory: F) -> Result<Arc<dyn ChatModel>>
    where
        F: FnOnce(&ModelKey) -> Result<Arc<dyn ChatModel>>,
    {
        let cache_key = key.cache_key();
        if let Some(model) = self.models.get(&cache_key) {
            return Ok(model);
        }

        debug!("Model cache miss for {}:{}", key.provider, key.model);
        let model = factory(key)?;
        self.models.insert(cache_key, model.clone());
        Ok(model)
    }

    pub fn contains(&self, key: &ModelKey) -> bool {
        self.models.contains_key(&key.cache_key())
    }

    pub fn invalidate(&self, key: &ModelKey) {
        self.models.invalidate(&key.cache_key());
    }

    /// Drop every cached model
    pub fn clear(&self) {
        self.models.invalidate_all();
    }

    pub fn len(&self) -> u64 {
        self.models.run_pending_tasks();
        self.models.entry_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
