//! API module wiring the HTTP surface of the gateway.
//!
//! This module is organized into submodules:
//! - `health` - Health check endpoint (/healthz)
//! - `openapi` - OpenAPI/Utoipa configuration
//!
//! The authentication endpoints live in [`crate::auth::endpoints`] and are
//! nested here under `/api/auth`. The request gate is layered outermost so
//! it sees every request, including ones no route matches.

pub mod health;
pub mod openapi;

pub use health::MISC_TAG;

use crate::AuthResources;
use crate::gate::require_session_gate;
use axum::{Router, middleware};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_axum::{router::OpenApiRouter, routes};
use utoipa_redoc::{Redoc, Servable};

/// Assemble the full router: auth endpoints, health check, API docs, and the
/// request gate wrapped around all of it. Domain page routes served by the
/// wider application merge in front of the gate layer in their own
/// deployment; everything still passes through the gate.
pub fn build_router(resources: AuthResources) -> Router {
    let (router, api) = OpenApiRouter::with_openapi(openapi::ApiDoc::openapi())
        .nest("/api/auth", crate::auth::router(resources.clone()))
        .routes(routes!(health::health))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .split_for_parts();

    router
        .merge(Redoc::with_url("/api-docs", api))
        .layer(middleware::from_fn_with_state(
            resources,
            require_session_gate,
        ))
}

/// Starts the web server with all configured routes.
#[tracing::instrument(skip(resources))]
pub async fn start_webserver(resources: AuthResources) -> color_eyre::Result<()> {
    let router = build_router(resources);

    let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
    tracing::info!(addr = "0.0.0.0:8080", "auth gateway listening");
    axum::serve(listener, router)
        .await
        .map_err(|e| color_eyre::Report::msg(format!("Failed to start server: {e}")))?;

    Ok(())
}
