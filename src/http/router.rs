//! Shared application state and the axum [`Router`].

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use policy_core::{BaseUris, Fetcher, RulesDocument};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;

use super::health::health_handler;
use super::policies::{policies_get, policies_post};
use super::repositories::{repositories_get, repositories_post};

/// Shared application state handed to every handler.
pub struct AppState {
    /// The resolved rules document, loaded once at startup.
    pub rules: Arc<RulesDocument>,
    /// The live fetcher used to dereference PASS/Fedora entities.
    pub fetcher: Arc<dyn Fetcher>,
    /// Public/private base URI translation.
    pub baseuris: BaseUris,
}

/// Build the router: `/policies`, `/repositories`, `/health`, wrapped in the
/// same tracing/compression/panic-catching layers applied elsewhere in this
/// service.
#[must_use]
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/policies", get(policies_get).post(policies_post))
        .route("/repositories", get(repositories_get).post(repositories_post))
        .route("/health", get(health_handler))
        .layer(CatchPanicLayer::new())
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
