use axum::Router;
use tower_http::trace::TraceLayer;

/// Liveness router. Every path and method answers 200 so upstream
/// probes need no route coordination with this service.
pub fn build_router() -> Router {
    Router::new()
        .fallback(health_handler)
        .layer(TraceLayer::new_for_http())
}

async fn health_handler() -> &'static str {
    "Health check OK"
}
