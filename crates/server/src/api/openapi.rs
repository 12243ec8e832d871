//! OpenAPI/Utoipa configuration.

use crate::api::health::MISC_TAG;
use crate::auth::AUTH_TAG;
use utoipa::{
    Modify, OpenApi,
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
};

/// Security addon for OpenAPI documentation.
pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            // Sessions are carried in the HTTP-only identity-token cookie.
            let cookie = ApiKey::Cookie(ApiKeyValue::with_description(
                "id_token",
                "Identity token issued at login and verified on every request.",
            ));
            components.add_security_scheme("SessionCookie", SecurityScheme::ApiKey(cookie));
        }
    }
}

/// OpenAPI documentation configuration.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Upkeep Auth Gateway API",
        version = "1.0.0",
        description = "Authentication and session-verification gateway for the Upkeep \
                       maintenance management platform."
    ),
    tags(
        (name = MISC_TAG, description = "Miscellaneous endpoints"),
        (name = AUTH_TAG, description = "Authentication endpoints")
    )
)]
pub struct ApiDoc;
