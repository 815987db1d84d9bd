use tokio_util::sync::CancellationToken;
use tracing_appender::non_blocking::WorkerGuard;

use crate::{
    config::{Cli, RepoVistaConfig},
    logging::{LoggingConfig, init_logging},
    result::Result,
    server::ServerConfig,
    service::GithubService,
};

pub struct AppComponents {
    pub server_config: ServerConfig,
    pub service: GithubService,
    pub shutdown: CancellationToken,
    pub _log_guard: Option<WorkerGuard>,
}

pub fn initialize_app(cli: Cli) -> Result<AppComponents> {
    let config = RepoVistaConfig::resolve(cli)?;

    let log_guard = init_logging(&LoggingConfig::from(&config))?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "RepoVista backend starting up");

    let client_config = config.client_config();
    if client_config.token.is_none() {
        tracing::warn!("GITHUB_TOKEN not set, using unauthenticated GitHub access");
    }
    tracing::info!(
        api = %client_config.base_url,
        timeout = ?client_config.request.timeout,
        poll_attempts = client_config.polling.max_attempts,
        "GitHub client configured"
    );

    let shutdown = CancellationToken::new();
    let service = GithubService::new(client_config, shutdown.clone())?;
    let server_config = config.server_config()?;

    Ok(AppComponents {
        server_config,
        service,
        shutdown,
        _log_guard: log_guard,
    })
}

/// Cancel `shutdown` on Ctrl-C or SIGTERM
pub fn spawn_signal_handler(shutdown: CancellationToken) {
    tokio::spawn(async move {
        wait_for_signal().await;
        tracing::info!("Shutdown signal received");
        shutdown.cancel();
    });
}

async fn wait_for_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
