//! Top-level router assembly.

use axum::Router;
use std::time::Duration;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use super::debug::debug_routes;
use super::health::health_routes;
use super::webhook::webhook_routes;
use super::AppState;

/// Options that shape the router.
#[derive(Debug, Clone, Copy)]
pub struct RouterOptions {
    pub debug_routes: bool,
    pub request_timeout: Duration,
}

impl Default for RouterOptions {
    fn default() -> Self {
        Self {
            debug_routes: false,
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Builds the full HTTP surface.
pub fn app_router(state: AppState, options: RouterOptions) -> Router {
    let mut router = Router::new()
        .merge(health_routes())
        .nest("/webhooks", webhook_routes());

    if options.debug_routes {
        router = router.nest("/debug", debug_routes());
    }

    router
        .layer(TimeoutLayer::new(options.request_timeout))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
