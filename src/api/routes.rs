//! HTTP API route definitions.

use axum::extract::Request;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use super::handlers::{self, AppState};

/// Count every handled request, labeled by path and status.
async fn track_requests(req: Request, next: Next) -> Response {
    let path = req.uri().path().to_owned();
    let response = next.run(req).await;
    crate::metrics::inc_requests(&path, response.status().as_u16());
    response
}

/// Create the API router for the configured service profile.
pub fn create_router(state: AppState) -> Router {
    let mut router = Router::new()
        // Info routes
        .route("/", get(handlers::info))
        .route("/build-info", get(handlers::build_info))
        .route("/api/v1/status", get(handlers::api_status))
        // Health endpoints
        .route("/health", get(handlers::health))
        .route("/ready", get(handlers::ready))
        // Observability
        .route("/metrics", get(handlers::prometheus_metrics))
        .route("/env", get(handlers::env_vars))
        // Echo
        .route("/echo", post(handlers::echo))
        .route("/api/v1/echo", post(handlers::echo));

    // Volume-demo routes, mounted only for the storage profile
    if state.config.service_profile.storage_enabled() {
        router = router
            .route("/counter", get(handlers::counter))
            .route("/write", post(handlers::write))
            .route("/read", get(handlers::read));
    }

    router
        .fallback(handlers::not_found)
        .layer(middleware::from_fn(track_requests))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
