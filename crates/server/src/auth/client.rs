//! Authorization-Code client for the identity provider.
//!
//! Wraps the two provider interactions of the code flow: building the
//! `/authorize` redirect URL and exchanging an authorization code for tokens
//! at the token endpoint. The client secret only ever travels in the token
//! exchange form body; the authorization URL never embeds it.

use crate::auth::state::AuthRequestState;
use crate::config::{AuthConfig, ConfigError};
use crate::error::AuthError;
use serde::Deserialize;
use time::{Duration, OffsetDateTime};
use url::Url;

/// Provider endpoints derived from the tenant authority.
#[derive(Debug, Clone)]
pub struct ProviderEndpoints {
    pub authorize: Url,
    pub token: Url,
}

impl ProviderEndpoints {
    /// `{base}/oauth2/v2.0/{authorize,token}`, where `{base}` is the
    /// authority with its trailing `/v2.0` stripped.
    pub fn from_authority(authority: &str) -> Result<Self, ConfigError> {
        let base = authority_base(authority);
        let parse = |s: String| {
            Url::parse(&s)
                .map_err(|e| ConfigError::Validation(format!("invalid provider endpoint {s}: {e}")))
        };
        Ok(Self {
            authorize: parse(format!("{base}/oauth2/v2.0/authorize"))?,
            token: parse(format!("{base}/oauth2/v2.0/token"))?,
        })
    }
}

/// Authority with the trailing `/v2.0` stripped; the base the provider hangs
/// its OAuth2 and discovery endpoints off.
pub fn authority_base(authority: &str) -> String {
    let trimmed = authority.trim_end_matches('/');
    trimmed
        .strip_suffix("/v2.0")
        .unwrap_or(trimmed)
        .to_string()
}

/// Tokens issued by the provider for one login. Held only long enough to be
/// written into cookies; never persisted server-side.
#[derive(Clone)]
pub struct TokenSet {
    pub identity_token: String,
    pub access_token: String,
    pub expires_at: OffsetDateTime,
}

#[derive(Debug, Deserialize)]
struct TokenEndpointResponse {
    id_token: Option<String>,
    access_token: Option<String>,
    expires_in: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
struct ProviderErrorBody {
    error: Option<String>,
    error_description: Option<String>,
}

pub struct ProviderClient {
    http: reqwest::Client,
    endpoints: ProviderEndpoints,
    client_id: String,
    client_secret: String,
    scopes: Vec<String>,
}

impl ProviderClient {
    pub fn new(config: &AuthConfig, http: reqwest::Client) -> Result<Self, ConfigError> {
        Ok(Self {
            http,
            endpoints: ProviderEndpoints::from_authority(&config.authority)?,
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            scopes: config.scopes.clone(),
        })
    }

    /// Build the provider `/authorize` URL for a login round-trip. Following
    /// it leads the provider to redirect back to `redirect_uri` with either
    /// an authorization code or an error.
    pub fn authorization_url(&self, redirect_uri: &str, state: &AuthRequestState) -> Url {
        let mut url = self.endpoints.authorize.clone();
        url.query_pairs_mut()
            .append_pair("client_id", &self.client_id)
            .append_pair("response_type", "code")
            .append_pair("redirect_uri", redirect_uri)
            .append_pair("scope", &self.scopes.join(" "))
            .append_pair("prompt", "select_account")
            .append_pair("state", &state.encode());
        url
    }

    /// Exchange an authorization code for tokens. `redirect_uri` must be the
    /// one used to obtain the code; a mismatch is rejected provider-side.
    #[tracing::instrument(skip_all)]
    pub async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> Result<TokenSet, AuthError> {
        let form = [
            ("grant_type", "authorization_code"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("code", code),
            ("redirect_uri", redirect_uri),
        ];
        let response = self
            .http
            .post(self.endpoints.token.clone())
            .form(&form)
            .send()
            .await
            .map_err(|e| AuthError::Http(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body: ProviderErrorBody = response.json().await.unwrap_or_default();
            let reason = body
                .error_description
                .or(body.error)
                .unwrap_or_else(|| format!("HTTP {status}"));
            tracing::warn!(%status, "provider rejected code exchange");
            return Err(AuthError::ProviderRejected(reason));
        }

        let body: TokenEndpointResponse = response
            .json()
            .await
            .map_err(|e| AuthError::Http(format!("invalid token response: {e}")))?;

        let identity_token = body.id_token.ok_or(AuthError::IncompleteToken("id_token"))?;
        let access_token = body
            .access_token
            .ok_or(AuthError::IncompleteToken("access_token"))?;
        let expires_in = body
            .expires_in
            .ok_or(AuthError::IncompleteToken("expires_in"))?;

        Ok(TokenSet {
            identity_token,
            access_token,
            expires_at: OffsetDateTime::now_utc() + Duration::seconds(expires_in),
        })
    }
}

impl std::fmt::Debug for ProviderClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderClient")
            .field("endpoints", &self.endpoints)
            .field("client_id", &self.client_id)
            .field("scopes", &self.scopes)
            .finish()
    }
}
