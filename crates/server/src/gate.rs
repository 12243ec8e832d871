//! Request gate: the single enforcement point for protected pages.
//!
//! Layered over the whole router (including the fallback), so it runs on
//! every inbound request. Public paths pass through unconditionally; every
//! other path requires an identity-token cookie that verifies, otherwise the
//! browser is redirected to the login route with the original destination in
//! `next`. The gate never renders an error itself.

use crate::AuthResources;
use crate::auth::cookies::ID_TOKEN_COOKIE;
use crate::auth::session::{login_redirect_target, read_session};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;

/// Paths that are always reachable without a session.
const PUBLIC_PATHS: [&str; 4] = ["/", "/login", "/healthz", "/favicon.ico"];

/// Prefixes that are always reachable without a session. API routes guard
/// themselves (the auth endpoints must be reachable to log in at all), and
/// static assets carry no data worth gating.
const PUBLIC_PREFIXES: [&str; 4] = ["/api/", "/api-docs", "/assets/", "/static/"];

pub fn is_public_path(path: &str) -> bool {
    if PUBLIC_PATHS.contains(&path) {
        return true;
    }
    if PUBLIC_PREFIXES.iter().any(|p| path.starts_with(p)) {
        return true;
    }
    // Anything with a file extension is an asset, not a page.
    path.rsplit('/').next().is_some_and(|seg| seg.contains('.'))
}

#[tracing::instrument(skip_all, fields(path = %request.uri().path()))]
pub async fn require_session_gate(
    State(resources): State<AuthResources>,
    request: Request,
    next: Next,
) -> Response {
    if is_public_path(request.uri().path()) {
        return next.run(request).await;
    }

    let jar = CookieJar::from_headers(request.headers());
    let credential = jar.get(ID_TOKEN_COOKIE).map(|c| c.value().to_string());
    if read_session(&resources, credential.as_deref())
        .await
        .is_some()
    {
        return next.run(request).await;
    }

    let target = login_redirect_target(request.uri());
    tracing::debug!(%target, "unauthenticated request to protected path");
    Redirect::to(&target).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_and_login_are_public() {
        assert!(is_public_path("/"));
        assert!(is_public_path("/login"));
        assert!(is_public_path("/healthz"));
    }

    #[test]
    fn api_routes_are_public() {
        assert!(is_public_path("/api/auth/login"));
        assert!(is_public_path("/api/work-orders"));
        assert!(is_public_path("/api-docs"));
    }

    #[test]
    fn asset_paths_are_public() {
        assert!(is_public_path("/assets/app.css"));
        assert!(is_public_path("/static/logo.svg"));
        assert!(is_public_path("/favicon.ico"));
        assert!(is_public_path("/app.bundle.js"));
    }

    #[test]
    fn page_paths_are_protected() {
        assert!(!is_public_path("/work-orders"));
        assert!(!is_public_path("/assets-overview"));
        assert!(!is_public_path("/settings/profile"));
    }
}
