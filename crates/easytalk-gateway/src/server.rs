use crate::handlers;
use crate::middleware::cors_layer;
use axum::{
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use easytalk_orchestrator::SessionOrchestrator;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};
use tracing::info;

/// Shared application state.
pub struct AppState {
    pub orchestrator: Arc<SessionOrchestrator>,
}

/// HTTP-level settings.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Requests exceeding this deadline get `408 Request Timeout`.
    pub request_timeout: Duration,
    /// Allowed CORS origins; empty allows any.
    pub cors_origins: Vec<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            cors_origins: vec![],
        }
    }
}

/// The main gateway server.
pub struct GatewayServer;

impl GatewayServer {
    /// Build the router with default HTTP settings.
    pub fn build(orchestrator: Arc<SessionOrchestrator>) -> Router {
        Self::build_with_config(orchestrator, &GatewayConfig::default())
    }

    pub fn build_with_config(
        orchestrator: Arc<SessionOrchestrator>,
        config: &GatewayConfig,
    ) -> Router {
        info!(
            timeout_secs = config.request_timeout.as_secs_f64(),
            policy = ?orchestrator.policy(),
            "Building gateway router"
        );
        let state = Arc::new(AppState { orchestrator });

        let api = Router::new()
            .route("/process-input", post(handlers::process_input))
            .route("/choose-suggestion", post(handlers::choose_suggestion))
            .route("/end-call", post(handlers::end_call))
            .route(
                "/user-profile",
                get(handlers::get_profile).post(handlers::put_profile),
            );

        Router::new()
            .nest("/api/chat", api)
            .route("/health", get(health_handler))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(TraceLayer::new_for_http())
                    .layer(cors_layer(&config.cors_origins))
                    .layer(TimeoutLayer::new(config.request_timeout)),
            )
    }
}

async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({"status": "ok", "service": "easytalk"}))
}
