//! Authentication and session-verification gateway for the Upkeep
//! maintenance management platform.
//!
//! Implements the OAuth2/OIDC Authorization Code flow against the tenant
//! identity provider, stateless cookie-held sessions verified on every
//! request, and the request gate that keeps unauthenticated traffic away
//! from protected pages. Domain data, UI, and localization live elsewhere;
//! this service only answers "is this request authenticated, and as whom".

use std::sync::Arc;

use crate::auth::client::ProviderClient;
use crate::auth::verify::TokenVerifier;
use crate::config::{AuthConfig, ConfigError};

pub mod api;
pub mod auth;
pub mod cache;
pub mod config;
pub mod error;
pub mod gate;

/// Shared per-process resources: the resolved configuration, the provider
/// client, and the token verifier with its signing-key cache. Constructed
/// exactly once at startup and injected into every handler through axum
/// state; there is no implicit module-level mutable state.
#[derive(Clone, Debug)]
pub struct AuthResources {
    pub config: Arc<AuthConfig>,
    pub provider: Arc<ProviderClient>,
    pub verifier: Arc<TokenVerifier>,
}

impl AuthResources {
    /// Build all shared resources from a resolved configuration. One HTTP
    /// client backs both the token exchange and the key fetches.
    pub fn from_config(config: AuthConfig) -> Result<Self, ConfigError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .map_err(|e| ConfigError::Validation(format!("failed to build HTTP client: {e}")))?;

        let provider = ProviderClient::new(&config, http.clone())?;
        let verifier = TokenVerifier::new(&config, http);

        Ok(Self {
            config: Arc::new(config),
            provider: Arc::new(provider),
            verifier: Arc::new(verifier),
        })
    }
}
