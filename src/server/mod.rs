use std::{net::SocketAddr, sync::Arc};

use axum::{Router, http::HeaderValue};
use compact_str::CompactString;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, info, warn};

use crate::{result::Result, service::GithubService};

mod error;
mod extract;
mod routes;

pub const DEFAULT_BIND: &str = "0.0.0.0:8000";

/// HTTP listener configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    /// Allowed CORS origins; empty allows any origin
    pub cors_origins: Vec<CompactString>,
}

/// Server application state
#[derive(Debug)]
pub struct AppState {
    pub service: GithubService,
}

impl AppState {
    pub fn new(service: GithubService) -> Self {
        Self { service }
    }
}

pub fn create_router(state: Arc<AppState>, config: &ServerConfig) -> Router {
    routes::router(state)
        .layer(cors_layer(&config.cors_origins))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}

fn cors_layer(origins: &[CompactString]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            },
        })
        .collect();

    layer.allow_origin(AllowOrigin::list(allowed))
}

/// Serve until `shutdown` is cancelled, then drain in-flight requests
pub async fn start(
    config: ServerConfig,
    service: GithubService,
    shutdown: CancellationToken,
) -> Result<()> {
    let app = create_router(Arc::new(AppState::new(service)), &config);
    let listener = TcpListener::bind(config.bind).await?;

    info!(addr = %listener.local_addr()?, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    info!("HTTP server stopped");
    Ok(())
}
