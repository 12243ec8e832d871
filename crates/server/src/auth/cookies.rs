//! Credential cookie construction.
//!
//! Both credential cookies share the same attributes: HTTP-only,
//! `SameSite=Lax`, `Path=/`, `Secure` in production, expiry equal to the
//! provider-issued token expiry. Removal cookies mirror those attributes so
//! browsers match (and therefore drop) the original cookie.

use axum_extra::extract::cookie::{Cookie, SameSite};
use time::{Duration, OffsetDateTime};

/// Identity-token cookie; what the gate and session reader verify.
pub const ID_TOKEN_COOKIE: &str = "id_token";
/// Provider access token for downstream directory lookups.
pub const ACCESS_TOKEN_COOKIE: &str = "access_token";

pub fn credential_cookie(
    name: &'static str,
    value: String,
    expires_at: OffsetDateTime,
    secure: bool,
) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .expires(expires_at)
        .build()
}

/// Empty value and zero max-age: the browser discards the cookie at once.
pub fn removal_cookie(name: &'static str, secure: bool) -> Cookie<'static> {
    Cookie::build((name, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(Duration::ZERO)
        .build()
}
