use std::path::PathBuf;

use compact_str::CompactString;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    config::RepoVistaConfig,
    result::{AppError, Result},
};

const LOG_FILE_PREFIX: &str = "repovista.log";

#[derive(Debug, Clone, PartialEq)]
pub struct LoggingConfig {
    /// Default filter directive, used when `RUST_LOG` is unset
    pub level: CompactString,
    pub json: bool,
    /// Directory for daily rolling log files
    pub log_dir: Option<PathBuf>,
}

impl From<&RepoVistaConfig> for LoggingConfig {
    fn from(config: &RepoVistaConfig) -> Self {
        Self {
            level: config.log_level.clone(),
            json: config.log_json,
            log_dir: config.log_dir.clone(),
        }
    }
}

fn env_filter(level: &str) -> Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(level)
            .map_err(|e| AppError::Logging(format!("invalid log level {level:?}: {e}"))),
    }
}

/// Install the global subscriber.
///
/// The returned guard flushes the file writer on drop and must outlive the server.
pub fn init_logging(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let filter = env_filter(&config.level)?;

    let stdout_layer = if config.json {
        fmt::layer().json().with_current_span(true).boxed()
    } else {
        fmt::layer().with_target(true).boxed()
    };

    let (file_layer, guard) = match &config.log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir).map_err(|e| {
                AppError::Logging(format!("cannot create log directory {}: {e}", dir.display()))
            })?;
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().json().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        },
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| AppError::Logging(e.to_string()))?;

    Ok(guard)
}
