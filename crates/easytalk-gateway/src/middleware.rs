use axum::http::{HeaderValue, Method};
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

/// Build the CORS layer for the helper web UI.
///
/// An empty origin list allows any origin. Unparseable origins are skipped.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    if origins.is_empty() {
        return base.allow_origin(Any);
    }

    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| {
            origin.parse::<HeaderValue>().ok().or_else(|| {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            })
        })
        .collect();

    if parsed.is_empty() {
        warn!("No valid CORS origins configured, allowing any origin");
        return base.allow_origin(Any);
    }

    info!(count = parsed.len(), "CORS origins configured");
    base.allow_origin(parsed)
}
