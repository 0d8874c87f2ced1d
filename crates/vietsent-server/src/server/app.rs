use crate::config::ServerConfig;
use crate::server::{routes, static_files};
use crate::service::ClassificationService;
use axum::{
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

/// Shared state for the HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ClassificationService>,
    pub metrics: PrometheusHandle,
    pub history_default_limit: usize,
    pub history_max_limit: usize,
}

impl AppState {
    pub fn new(
        service: Arc<ClassificationService>,
        metrics: PrometheusHandle,
        config: &ServerConfig,
    ) -> Self {
        Self {
            service,
            metrics,
            history_default_limit: config.history_default_limit,
            history_max_limit: config.history_max_limit,
        }
    }
}

/// CORS for the configured origins; an empty list allows any origin
pub fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if allowed_origins.is_empty() {
        return cors.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    cors.allow_origin(AllowOrigin::list(origins))
}

/// Build the Axum application
pub fn build_router(state: AppState, allowed_origins: &[String]) -> Router {
    let api_routes = Router::new()
        .route("/health", get(routes::health))
        .route("/sentiment", post(routes::classify))
        .route(
            "/history",
            get(routes::list_history).delete(routes::clear_history),
        );

    Router::new()
        .nest("/api", api_routes)
        .route("/metrics", get(routes::metrics))
        .fallback(static_files::serve_static)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(allowed_origins))
        .with_state(state)
}

/// Run the server until SIGINT/SIGTERM
pub async fn run_server(state: AppState, config: &ServerConfig) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.listen, config.port).parse()?;
    let app = build_router(state, &config.allowed_origins);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            shutdown_signal().await;
            warn!("Shutdown signal received, stopping server...");
        })
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Listen for shutdown signals (SIGTERM, SIGINT)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
