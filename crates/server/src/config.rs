use serde::Deserialize;
use std::fmt;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration build error: {0}")]
    Build(#[from] config::ConfigError),
    #[error("Missing required configuration value: {0}")]
    MissingKey(&'static str),
    #[error("Invalid configuration: {0}")]
    Validation(String),
}

/// Scopes requested on every login, before operator extras are unioned in.
pub const BASE_SCOPES: [&str; 4] = ["openid", "profile", "offline_access", "User.ReadBasic.All"];

/// Callback path used when no explicit redirect URI is configured; resolved
/// against the origin of the request that starts the flow.
pub const DEFAULT_CALLBACK_PATH: &str = "/api/auth/callback";

const DEFAULT_AUTHORITY_HOST: &str = "https://login.microsoftonline.com";

/// Configuration exactly as deserialized from the file/environment layers.
/// Every field is optional here; `resolve` turns this into the checked
/// [`AuthConfig`] and is where missing required values are reported.
#[derive(Default, Deserialize)]
pub struct RawAuthConfig {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub tenant_id: Option<String>,
    /// Tenant authority URL; may or may not carry the `/v2.0` suffix.
    pub authority: Option<String>,
    /// Space-separated scopes unioned with [`BASE_SCOPES`].
    pub extra_scopes: Option<String>,
    pub redirect_uri: Option<String>,
    pub post_logout_redirect_uri: Option<String>,
    #[serde(default)]
    pub production: bool,
}

/// Resolved provider configuration. Constructed once at startup and shared
/// via `Arc` in [`crate::AuthResources`]; nothing re-reads the environment
/// after that.
#[derive(Clone)]
pub struct AuthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub tenant_id: String,
    /// Version-qualified authority, e.g.
    /// `https://login.microsoftonline.com/<tenant>/v2.0`. Also the expected
    /// `iss` value of identity tokens.
    pub authority: String,
    pub scopes: Vec<String>,
    pub redirect_uri: Option<String>,
    pub post_logout_redirect_uri: Option<String>,
    pub production: bool,
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("tenant_id", &self.tenant_id)
            .field("authority", &self.authority)
            .field("scopes", &self.scopes)
            .field("redirect_uri", &self.redirect_uri)
            .field("post_logout_redirect_uri", &self.post_logout_redirect_uri)
            .field("production", &self.production)
            .finish()
    }
}

impl RawAuthConfig {
    /// Validate and fill in defaults. Fails with the name of the first
    /// missing required value so misconfiguration surfaces at startup, not
    /// as an opaque 500 mid-flow.
    pub fn resolve(self) -> Result<AuthConfig, ConfigError> {
        let client_id = self.client_id.ok_or(ConfigError::MissingKey("client_id"))?;
        let client_secret = self
            .client_secret
            .ok_or(ConfigError::MissingKey("client_secret"))?;

        let (tenant_id, authority) = match (self.tenant_id, self.authority) {
            (Some(tenant), None) => {
                let authority = format!("{DEFAULT_AUTHORITY_HOST}/{tenant}/v2.0");
                (tenant, authority)
            }
            (Some(tenant), Some(authority)) => (tenant, normalize_authority(&authority)?),
            (None, Some(authority)) => {
                let normalized = normalize_authority(&authority)?;
                let derived = tenant_from_authority(&normalized).ok_or_else(|| {
                    ConfigError::Validation(format!(
                        "authority '{authority}' does not contain a tenant segment"
                    ))
                })?;
                (derived, normalized)
            }
            (None, None) => return Err(ConfigError::MissingKey("tenant_id or authority")),
        };

        let mut scopes: Vec<String> = BASE_SCOPES.iter().map(|s| s.to_string()).collect();
        if let Some(extra) = &self.extra_scopes {
            for scope in extra.split_whitespace() {
                if !scopes.iter().any(|s| s == scope) {
                    scopes.push(scope.to_string());
                }
            }
        }

        Ok(AuthConfig {
            client_id,
            client_secret,
            tenant_id,
            authority,
            scopes,
            redirect_uri: self.redirect_uri,
            post_logout_redirect_uri: self.post_logout_redirect_uri,
            production: self.production,
        })
    }
}

/// Trim trailing slashes and make sure the authority ends in `/v2.0`.
fn normalize_authority(authority: &str) -> Result<String, ConfigError> {
    let trimmed = authority.trim_end_matches('/');
    Url::parse(trimmed)
        .map_err(|e| ConfigError::Validation(format!("invalid authority URL '{authority}': {e}")))?;
    if trimmed.ends_with("/v2.0") {
        Ok(trimmed.to_string())
    } else {
        Ok(format!("{trimmed}/v2.0"))
    }
}

/// First path segment of the authority is the tenant (id or domain).
fn tenant_from_authority(authority: &str) -> Option<String> {
    let url = Url::parse(authority).ok()?;
    let segment = url.path_segments()?.find(|s| !s.is_empty())?;
    if segment == "v2.0" {
        return None;
    }
    Some(segment.to_string())
}

/// Load gateway configuration from an optional `config.yaml` plus
/// `AUTH`-prefixed environment overrides (e.g. `AUTH_CLIENT_ID`,
/// `AUTH_CLIENT_SECRET`, `AUTH_TENANT_ID`).
///
/// Returns a `ConfigError` instead of panicking so the caller can decide how
/// to fail.
pub fn load_config() -> Result<AuthConfig, ConfigError> {
    use config::{Config, Environment, File};
    let cfg = Config::builder()
        .add_source(File::with_name("config.yaml").required(false))
        .add_source(Environment::with_prefix("AUTH"))
        .build()?;

    let raw: RawAuthConfig = cfg.try_deserialize()?;
    raw.resolve()
}

/// Convenience helper for binaries wanting panic-on-error behaviour.
pub fn load_config_or_panic() -> AuthConfig {
    match load_config() {
        Ok(c) => c,
        Err(e) => panic!("Failed to load configuration: {e}"),
    }
}
