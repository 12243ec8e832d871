//! Authentication HTTP endpoints.
//!
//! Implements the relying-party side of the Authorization Code flow:
//! - Login endpoint (redirect to the provider)
//! - Callback endpoint (code exchange, verification, cookie issuance)
//! - Logout endpoint (cookie clearing)
//! - Current-session endpoint (`/me`)

use crate::AuthResources;
use crate::auth::AUTH_TAG;
use crate::auth::cookies::{
    ACCESS_TOKEN_COOKIE, ID_TOKEN_COOKIE, credential_cookie, removal_cookie,
};
use crate::auth::session::read_session;
use crate::auth::state::{AuthRequestState, request_origin};
use crate::config::DEFAULT_CALLBACK_PATH;
use crate::error::{ApiError, AuthError};
use axum::{
    Json,
    extract::{Query, State},
    http::HeaderMap,
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use utoipa_axum::{router::OpenApiRouter, routes};

/// Creates the authentication router, nested under `/api/auth`.
pub fn router(resources: AuthResources) -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(login))
        .routes(routes!(callback))
        .routes(routes!(logout))
        .routes(routes!(me))
        .with_state(resources)
}

/// Minimal page served to popup logins: notify the opener, close the window.
/// The window keeps no content of its own; the cookies set on this response
/// are all that matters.
const POPUP_COMPLETE_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head><title>Signing in…</title></head>
<body>
<script>
  if (window.opener) {
    window.opener.postMessage({ type: "msal-auth-complete" }, window.location.origin);
  }
  window.close();
</script>
</body>
</html>
"#;

#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    /// Path to return to after login
    pub next: Option<String>,
    /// "1" or "true" when the login runs in a popup window
    pub popup: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    /// Authorization code from the provider
    pub code: Option<String>,
    /// Round-tripped state (JSON or legacy bare path)
    pub state: Option<String>,
    /// Error code from the provider, if the user cancelled or consent failed
    pub error: Option<String>,
    pub error_description: Option<String>,
}

/// Identity claims of the current session.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MeResponse {
    /// Stable user id from the provider
    pub sub: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred_username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

fn resolve_redirect_uri(resources: &AuthResources, origin: &str) -> String {
    resources
        .config
        .redirect_uri
        .clone()
        .unwrap_or_else(|| format!("{origin}{DEFAULT_CALLBACK_PATH}"))
}

fn popup_flag(raw: Option<&str>) -> bool {
    matches!(raw, Some("1") | Some("true"))
}

/// Start a login round-trip.
#[tracing::instrument(skip(resources, headers))]
#[utoipa::path(
    get,
    path = "/login",
    tag = AUTH_TAG,
    operation_id = "Login",
    summary = "Redirect to the identity provider",
    description = "Builds the provider authorization URL for the Authorization Code flow and \
                   redirects the browser to it. The `next` path and `popup` flag are carried \
                   through the provider in the `state` parameter and honoured by the callback. \
                   No cookies are touched here.",
    params(
        ("next" = Option<String>, Query, description = "Relative path to return to after login. Defaults to `/`."),
        ("popup" = Option<String>, Query, description = "Set to `1` when the login runs in a popup window."),
    ),
    responses(
        (status = 303, description = "Redirect to the provider authorization endpoint"),
    )
)]
pub async fn login(
    State(resources): State<AuthResources>,
    headers: HeaderMap,
    Query(query): Query<LoginQuery>,
) -> Response {
    let origin = request_origin(&headers);
    let redirect_uri = resolve_redirect_uri(&resources, &origin);
    let state = AuthRequestState::structured(
        query.next.unwrap_or_else(|| "/".to_string()),
        popup_flag(query.popup.as_deref()),
    );
    let url = resources.provider.authorization_url(&redirect_uri, &state);
    Redirect::to(url.as_str()).into_response()
}

/// Complete a login round-trip.
#[tracing::instrument(skip_all)]
#[utoipa::path(
    get,
    path = "/callback",
    tag = AUTH_TAG,
    operation_id = "Login Callback",
    summary = "Handle the provider redirect",
    description = "Exchanges the authorization code for tokens, verifies the identity token, \
                   and stores both tokens in HTTP-only cookies. Regular logins are redirected \
                   to the path carried in `state`; popup logins get a small page that notifies \
                   the opener window and closes itself. Return targets that are not \
                   same-origin relative paths fall back to the site root.",
    params(
        ("code" = Option<String>, Query, description = "Authorization code issued by the provider."),
        ("state" = Option<String>, Query, description = "Round-tripped state parameter (JSON object or legacy bare path)."),
        ("error" = Option<String>, Query, description = "Error code when the provider declined the login."),
    ),
    responses(
        (status = 303, description = "Login complete; redirect to the resolved return path"),
        (status = 200, description = "Popup login complete; HTML page that closes itself", content_type = "text/html"),
        (status = 400, description = "Missing authorization code", body = ApiError),
        (status = 401, description = "Provider rejected the exchange or the tokens are unusable", body = ApiError),
    )
)]
pub async fn callback(
    State(resources): State<AuthResources>,
    headers: HeaderMap,
    jar: CookieJar,
    Query(query): Query<CallbackQuery>,
) -> Response {
    if let Some(error) = query.error {
        tracing::warn!(%error, "provider returned an error on callback");
        let description = query
            .error_description
            .unwrap_or_else(|| "Identity provider declined the login".to_string());
        return ApiError::provider_rejected(description).into_response();
    }

    let Some(code) = query.code else {
        return ApiError::invalid_request("Missing 'code' query parameter").into_response();
    };

    let origin = request_origin(&headers);
    let redirect_uri = resolve_redirect_uri(&resources, &origin);

    let tokens = match resources.provider.exchange_code(&code, &redirect_uri).await {
        Ok(tokens) => tokens,
        Err(err @ (AuthError::ProviderRejected(_) | AuthError::IncompleteToken(_))) => {
            return ApiError::from(err).into_response();
        }
        Err(err) => {
            tracing::error!(error = %err, "code exchange failed");
            return ApiError::server_error().into_response();
        }
    };

    // Never issue cookies for a token we could not verify ourselves.
    let session = match resources.verifier.verify(&tokens.identity_token).await {
        Ok(session) => session,
        Err(_) => {
            return ApiError::invalid_token("Identity token failed verification").into_response();
        }
    };
    tracing::info!(subject = %session.subject(), "login complete");

    let secure = resources.config.production;
    let jar = jar
        .add(credential_cookie(
            ID_TOKEN_COOKIE,
            tokens.identity_token.clone(),
            tokens.expires_at,
            secure,
        ))
        .add(credential_cookie(
            ACCESS_TOKEN_COOKIE,
            tokens.access_token.clone(),
            tokens.expires_at,
            secure,
        ));

    let state = AuthRequestState::decode(query.state.as_deref());
    if state.is_popup() {
        (jar, Html(POPUP_COMPLETE_PAGE)).into_response()
    } else {
        let return_to = state.resolve_return_path(&origin);
        (jar, Redirect::to(&return_to)).into_response()
    }
}

/// End the session.
#[tracing::instrument(skip_all)]
#[utoipa::path(
    get,
    path = "/logout",
    tag = AUTH_TAG,
    operation_id = "Logout",
    summary = "Clear the session cookies",
    description = "Clears both credential cookies and redirects to the configured post-logout \
                   destination (the request origin when none is configured). The session is \
                   stateless, so clearing the cookies is the whole logout.",
    responses(
        (status = 303, description = "Cookies cleared; redirect to the post-logout destination"),
    )
)]
pub async fn logout(
    State(resources): State<AuthResources>,
    headers: HeaderMap,
    jar: CookieJar,
) -> Response {
    let destination = resources
        .config
        .post_logout_redirect_uri
        .clone()
        .unwrap_or_else(|| request_origin(&headers));

    let secure = resources.config.production;
    let jar = jar
        .add(removal_cookie(ID_TOKEN_COOKIE, secure))
        .add(removal_cookie(ACCESS_TOKEN_COOKIE, secure));

    (jar, Redirect::to(&destination)).into_response()
}

/// Identity of the current session.
#[tracing::instrument(skip_all)]
#[utoipa::path(
    get,
    path = "/me",
    tag = AUTH_TAG,
    operation_id = "Current Session",
    summary = "Return the verified identity of the caller",
    responses(
        (status = 200, description = "Verified session claims", body = MeResponse),
        (status = 401, description = "No valid session cookie", body = ApiError),
    )
)]
pub async fn me(State(resources): State<AuthResources>, jar: CookieJar) -> Response {
    let credential = jar.get(ID_TOKEN_COOKIE).map(|c| c.value().to_string());
    match read_session(&resources, credential.as_deref()).await {
        Some(session) => Json(MeResponse {
            sub: session.subject().to_string(),
            name: session.display_name().map(str::to_string),
            preferred_username: session.preferred_username().map(str::to_string),
            email: session.email().map(str::to_string),
        })
        .into_response(),
        None => ApiError::invalid_token("No valid session").into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn popup_flag_parsing() {
        assert!(popup_flag(Some("1")));
        assert!(popup_flag(Some("true")));
        assert!(!popup_flag(Some("0")));
        assert!(!popup_flag(Some("yes")));
        assert!(!popup_flag(None));
    }

    #[test]
    fn popup_page_notifies_opener() {
        assert!(POPUP_COMPLETE_PAGE.contains("msal-auth-complete"));
        assert!(POPUP_COMPLETE_PAGE.contains("window.close()"));
    }
}
