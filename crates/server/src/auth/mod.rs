//! OIDC relying-party authentication module.
//!
//! Implements the Authorization Code flow against the tenant identity
//! provider and the stateless cookie sessions derived from it.
//!
//! ## Endpoints
//!
//! - `GET /api/auth/login` - Redirect to the provider
//! - `GET /api/auth/callback` - Code exchange, verification, cookie issuance
//! - `GET /api/auth/logout` - Clear the session cookies
//! - `GET /api/auth/me` - Verified identity of the caller

pub mod client;
pub mod cookies;
pub mod endpoints;
pub mod keys;
pub mod session;
pub mod state;
pub mod verify;

pub use endpoints::router;
pub use session::{OptionalSession, RequireSession, read_session};
pub use verify::Session;

/// OpenAPI tag for authentication endpoints
pub const AUTH_TAG: &str = "Authentication";
