//! Provider signing-key discovery and caching.
//!
//! The key set is located through the OIDC discovery document and cached per
//! normalized authority. The cache is shared across concurrent requests; a
//! cold-cache race may cause a few redundant fetches, all of which converge
//! on equivalent key material. A key-id miss (key rotation) invalidates the
//! entry and refetches exactly once before failing.

use crate::auth::client::authority_base;
use crate::cache::KeySetCache;
use crate::error::AuthError;
use jsonwebtoken::jwk::{Jwk, JwkSet};
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
struct DiscoveryDocument {
    jwks_uri: String,
}

pub struct KeyStore {
    http: reqwest::Client,
    /// Authority with the `/v2.0` suffix stripped; doubles as the cache key.
    discovery_base: String,
    cache: KeySetCache,
}

impl KeyStore {
    pub fn new(authority: &str, http: reqwest::Client) -> Self {
        Self {
            http,
            discovery_base: authority_base(authority),
            cache: KeySetCache::default(),
        }
    }

    fn discovery_url(&self) -> String {
        format!(
            "{}/v2.0/.well-known/openid-configuration",
            self.discovery_base
        )
    }

    #[tracing::instrument(skip(self), fields(authority = %self.discovery_base))]
    async fn fetch_key_set(&self) -> Result<Arc<JwkSet>, AuthError> {
        let discovery: DiscoveryDocument = self
            .http
            .get(self.discovery_url())
            .send()
            .await
            .map_err(|e| AuthError::KeyFetch(format!("discovery request failed: {e}")))?
            .error_for_status()
            .map_err(|e| AuthError::KeyFetch(format!("discovery request failed: {e}")))?
            .json()
            .await
            .map_err(|e| AuthError::KeyFetch(format!("invalid discovery document: {e}")))?;

        let jwks: JwkSet = self
            .http
            .get(&discovery.jwks_uri)
            .send()
            .await
            .map_err(|e| AuthError::KeyFetch(format!("key set request failed: {e}")))?
            .error_for_status()
            .map_err(|e| AuthError::KeyFetch(format!("key set request failed: {e}")))?
            .json()
            .await
            .map_err(|e| AuthError::KeyFetch(format!("invalid key set: {e}")))?;

        let jwks = Arc::new(jwks);
        self.cache.insert(self.discovery_base.clone(), jwks.clone());
        Ok(jwks)
    }

    async fn key_set(&self) -> Result<Arc<JwkSet>, AuthError> {
        if let Some(cached) = self.cache.get(&self.discovery_base) {
            return Ok(cached);
        }
        self.fetch_key_set().await
    }

    /// Look up a signing key by key id, refetching the set once on a miss to
    /// pick up rotated keys.
    pub async fn key_for(&self, kid: &str) -> Result<Jwk, AuthError> {
        let keys = self.key_set().await?;
        if let Some(key) = keys.find(kid) {
            return Ok(key.clone());
        }

        tracing::debug!(kid, "key id not in cached set, refetching");
        self.cache.invalidate(&self.discovery_base);
        let keys = self.fetch_key_set().await?;
        keys.find(kid)
            .cloned()
            .ok_or_else(|| AuthError::KeyFetch(format!("no signing key with kid '{kid}'")))
    }
}

impl std::fmt::Debug for KeyStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyStore")
            .field("discovery_base", &self.discovery_base)
            .finish()
    }
}
