//! Application setup and router.

use std::sync::Arc;

use axum::{
    extract::Extension,
    http::StatusCode,
    routing::{get, MethodRouter},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::kernel::ServerDeps;
use crate::server::routes::{crawl_listing_handler, health_handler, seed_fetches_handler};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub deps: Arc<ServerDeps>,
}

/// Build the Axum application router
///
/// Every path except `/health` answers GET (listing crawl) and POST (fetch
/// seeding); any other method gets 405 Method Not Allowed.
pub fn build_app(deps: Arc<ServerDeps>) -> Router {
    let state = AppState { deps };

    Router::new()
        .route("/health", get(health_handler))
        .route("/", control_surface())
        .fallback_service(control_surface())
        .layer(Extension(state))
        .layer(TraceLayer::new_for_http())
}

/// GET crawls, POST seeds.
///
/// A GET route also answers HEAD unless HEAD has its own handler, and HEAD
/// must not start a crawl.
fn control_surface() -> MethodRouter {
    get(crawl_listing_handler)
        .post(seed_fetches_handler)
        .head(method_not_allowed)
}

async fn method_not_allowed() -> StatusCode {
    StatusCode::METHOD_NOT_ALLOWED
}
