//! Round-tripping of the OAuth2 `state` parameter.
//!
//! The state carries the post-login return path and the popup flag through
//! the provider. Historically the parameter was a bare path string; the
//! current shape is a JSON object. Decoding keeps that ambiguity explicit as
//! a tagged variant instead of a try/catch-and-hope, and the return target is
//! never trusted as a redirect destination without re-validating that it is a
//! same-origin relative path.

use axum::http::{HeaderMap, header};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
struct StructuredState {
    #[serde(default)]
    return_to: Option<String>,
    #[serde(default)]
    popup: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthRequestState {
    /// Current JSON shape carrying the return path and popup flag.
    Structured { return_to: String, popup: bool },
    /// Legacy bare-string state: the whole value is the return path.
    LegacyPath(String),
}

impl AuthRequestState {
    pub fn structured(return_to: impl Into<String>, popup: bool) -> Self {
        Self::Structured {
            return_to: return_to.into(),
            popup,
        }
    }

    /// Serialize for the provider `state` query parameter.
    pub fn encode(&self) -> String {
        match self {
            Self::Structured { return_to, popup } => {
                serde_json::json!({ "return_to": return_to, "popup": popup }).to_string()
            }
            Self::LegacyPath(path) => path.clone(),
        }
    }

    /// Decode a round-tripped `state` value: JSON first, bare string second.
    /// An absent value behaves like a return to the site root.
    pub fn decode(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return Self::structured("/", false);
        };
        match serde_json::from_str::<StructuredState>(raw) {
            Ok(state) => Self::Structured {
                return_to: state.return_to.unwrap_or_else(|| "/".to_string()),
                popup: state.popup,
            },
            Err(_) => Self::LegacyPath(raw.to_string()),
        }
    }

    pub fn is_popup(&self) -> bool {
        matches!(self, Self::Structured { popup: true, .. })
    }

    fn return_target(&self) -> &str {
        match self {
            Self::Structured { return_to, .. } => return_to,
            Self::LegacyPath(path) => path,
        }
    }

    /// Resolve the carried return target against the request's own origin.
    /// Anything that is not a same-origin relative path falls back to `/`.
    pub fn resolve_return_path(&self, origin: &str) -> String {
        let target = self.return_target();
        let relative = target.strip_prefix(origin).unwrap_or(target);
        sanitize_relative(relative)
    }
}

fn sanitize_relative(path: &str) -> String {
    if path.is_empty() {
        return "/".to_string();
    }
    // "//host" is protocol-relative, anything not starting with "/" is a
    // foreign URL or garbage; both collapse to the site root.
    if path.starts_with("//") || !path.starts_with('/') {
        return "/".to_string();
    }
    path.to_string()
}

/// Origin of the incoming request, from the proxy-forwarded scheme and the
/// `Host` header. Used to resolve the default callback URI and to validate
/// return targets.
pub fn request_origin(headers: &HeaderMap) -> String {
    let proto = headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("http");
    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("localhost");
    format!("{proto}://{host}")
}
