//! Session reading and axum extractors.
//!
//! "No cookie" and "cookie that fails verification" are the same thing to
//! every caller: no session. Nothing past this boundary can tell the two
//! apart, and nothing here ever turns a bad token into an error response.

use crate::AuthResources;
use crate::auth::cookies::ID_TOKEN_COOKIE;
use crate::auth::verify::Session;
use axum::{
    extract::{FromRef, FromRequestParts},
    http::{Uri, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;

/// Extract a verified session from a stored credential, if any. Absent
/// credential or failed verification both yield `None`.
pub async fn read_session(resources: &AuthResources, credential: Option<&str>) -> Option<Session> {
    let token = credential?;
    match resources.verifier.verify(token).await {
        Ok(session) => Some(session),
        Err(_) => None,
    }
}

/// Login URL that brings the user back to `uri` after authenticating.
pub fn login_redirect_target(uri: &Uri) -> String {
    let next = match uri.query() {
        Some(query) => format!("{}?{}", uri.path(), query),
        None => uri.path().to_string(),
    };
    let encoded: String = url::form_urlencoded::byte_serialize(next.as_bytes()).collect();
    format!("/api/auth/login?next={encoded}")
}

/// Extractor for handlers that must only run with a verified session.
///
/// Rejection is a redirect to the login route carrying the original
/// destination, mirroring the request gate.
pub struct RequireSession(pub Session);

/// Rejection for [`RequireSession`]: redirect to login, preserving the
/// original destination.
#[derive(Debug)]
pub struct SessionRejection {
    login_target: String,
}

impl IntoResponse for SessionRejection {
    fn into_response(self) -> Response {
        Redirect::to(&self.login_target).into_response()
    }
}

impl<S> FromRequestParts<S> for RequireSession
where
    AuthResources: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = SessionRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let resources = AuthResources::from_ref(state);
        let jar = CookieJar::from_headers(&parts.headers);
        let credential = jar.get(ID_TOKEN_COOKIE).map(|c| c.value().to_string());

        match read_session(&resources, credential.as_deref()).await {
            Some(session) => Ok(RequireSession(session)),
            None => Err(SessionRejection {
                login_target: login_redirect_target(&parts.uri),
            }),
        }
    }
}

/// Extractor for handlers that behave differently with and without a
/// session but never reject.
pub struct OptionalSession(pub Option<Session>);

impl<S> FromRequestParts<S> for OptionalSession
where
    AuthResources: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let resources = AuthResources::from_ref(state);
        let jar = CookieJar::from_headers(&parts.headers);
        let credential = jar.get(ID_TOKEN_COOKIE).map(|c| c.value().to_string());
        Ok(OptionalSession(
            read_session(&resources, credential.as_deref()).await,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_redirect_preserves_path_and_query() {
        let uri: Uri = "/work-orders?id=5".parse().unwrap();
        assert_eq!(
            login_redirect_target(&uri),
            "/api/auth/login?next=%2Fwork-orders%3Fid%3D5"
        );
    }

    #[test]
    fn login_redirect_without_query() {
        let uri: Uri = "/work-orders".parse().unwrap();
        assert_eq!(
            login_redirect_target(&uri),
            "/api/auth/login?next=%2Fwork-orders"
        );
    }
}
