//! Identity-token verification.
//!
//! A [`Session`] exists only as the result of successful cryptographic
//! verification of an identity token; the struct has no constructor outside
//! this module and no `Default`. Every verification failure collapses into
//! [`AuthError::InvalidToken`] so callers cannot leak a signature-vs-expiry
//! oracle to unauthenticated users.

use crate::auth::keys::KeyStore;
use crate::config::AuthConfig;
use crate::error::AuthError;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, decode_header};
use serde::Deserialize;

/// Tolerated clock skew for the expiry check, in seconds. Fixed and small:
/// enough for ordinary drift between us and the provider, nowhere near long
/// enough to keep a revoked login alive meaningfully.
const CLOCK_SKEW_LEEWAY_SECS: u64 = 60;

/// A verified identity. Recomputed from the cookie on every request; there
/// is no server-side session store.
#[derive(Debug, Clone)]
pub struct Session {
    pub(crate) subject: String,
    pub(crate) display_name: Option<String>,
    pub(crate) preferred_username: Option<String>,
    pub(crate) email: Option<String>,
}

impl Session {
    /// Stable user id from the provider (`sub` claim).
    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    pub fn preferred_username(&self) -> Option<&str> {
        self.preferred_username.as_deref()
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }
}

#[derive(Debug, Deserialize)]
struct IdentityClaims {
    sub: String,
    name: Option<String>,
    preferred_username: Option<String>,
    email: Option<String>,
}

pub struct TokenVerifier {
    client_id: String,
    /// Tenant-specific, version-qualified expected issuer.
    issuer: String,
    keys: KeyStore,
}

impl TokenVerifier {
    pub fn new(config: &AuthConfig, http: reqwest::Client) -> Self {
        Self {
            client_id: config.client_id.clone(),
            issuer: config.authority.clone(),
            keys: KeyStore::new(&config.authority, http),
        }
    }

    /// Verify signature, audience, issuer, and expiry, in that order, all of
    /// which must pass. Returns the decoded [`Session`] on success and
    /// [`AuthError::InvalidToken`] on any failure.
    #[tracing::instrument(skip_all)]
    pub async fn verify(&self, identity_token: &str) -> Result<Session, AuthError> {
        let header = decode_header(identity_token).map_err(|e| {
            tracing::debug!(error = %e, "unparseable token header");
            AuthError::InvalidToken
        })?;
        let kid = header.kid.ok_or_else(|| {
            tracing::debug!("token header has no key id");
            AuthError::InvalidToken
        })?;

        let jwk = self.keys.key_for(&kid).await.map_err(|e| {
            tracing::debug!(error = %e, "signing key lookup failed");
            AuthError::InvalidToken
        })?;
        let key = DecodingKey::from_jwk(&jwk).map_err(|e| {
            tracing::debug!(error = %e, "unusable signing key");
            AuthError::InvalidToken
        })?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[&self.client_id]);
        validation.set_issuer(&[&self.issuer]);
        validation.leeway = CLOCK_SKEW_LEEWAY_SECS;

        let data = decode::<IdentityClaims>(identity_token, &key, &validation).map_err(|e| {
            tracing::debug!(error = %e, "token validation failed");
            AuthError::InvalidToken
        })?;

        Ok(Session {
            subject: data.claims.sub,
            display_name: data.claims.name,
            preferred_username: data.claims.preferred_username,
            email: data.claims.email,
        })
    }
}

impl std::fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenVerifier")
            .field("client_id", &self.client_id)
            .field("issuer", &self.issuer)
            .finish()
    }
}
