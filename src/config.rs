//! Process configuration: defaults, optional TOML file, then CLI/environment.

use std::{path::PathBuf, time::Duration};

use clap::Parser;
use compact_str::CompactString;
use directories::BaseDirs;
use serde::{Deserialize, Serialize};

use crate::{
    client::{ClientConfig, PollingConfig, config::DEFAULT_BASE_URL},
    result::{AppError, Result},
    server::{DEFAULT_BIND, ServerConfig},
};

#[derive(Debug, Parser)]
#[command(name = "repovista", version, about = "HTTP facade over the GitHub REST API")]
pub struct Cli {
    /// Path to a TOML configuration file
    #[arg(long, env = "REPOVISTA_CONFIG")]
    pub config: Option<PathBuf>,

    /// Address to listen on
    #[arg(long, env = "REPOVISTA_BIND")]
    pub bind: Option<CompactString>,

    /// GitHub API base URL
    #[arg(long, env = "GITHUB_API_URL")]
    pub github_api_url: Option<CompactString>,

    /// GitHub token forwarded upstream; unauthenticated when absent
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: Option<CompactString>,

    /// Per-request upstream timeout in seconds
    #[arg(long)]
    pub request_timeout_secs: Option<u64>,

    /// Attempts before a statistics poll gives up
    #[arg(long)]
    pub poll_attempts: Option<u32>,

    /// Allowed CORS origin, repeatable; any origin when omitted
    #[arg(long = "cors-origin")]
    pub cors_origins: Vec<CompactString>,

    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(long, env = "REPOVISTA_LOG_LEVEL")]
    pub log_level: Option<CompactString>,

    /// Emit logs as JSON
    #[arg(long)]
    pub log_json: bool,

    /// Also write daily rolling log files into this directory
    #[arg(long, env = "REPOVISTA_LOG_DIR")]
    pub log_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepoVistaConfig {
    pub bind: CompactString,
    pub github_api_url: CompactString,
    pub github_token: Option<CompactString>,
    pub request_timeout_secs: u64,
    pub poll_attempts: u32,
    pub commit_activity_delay_ms: u64,
    pub contributor_stats_delay_ms: u64,
    pub cors_origins: Vec<CompactString>,
    pub log_level: CompactString,
    pub log_json: bool,
    pub log_dir: Option<PathBuf>,
}

impl Default for RepoVistaConfig {
    fn default() -> Self {
        let polling = PollingConfig::default();
        Self {
            bind: DEFAULT_BIND.into(),
            github_api_url: DEFAULT_BASE_URL.into(),
            github_token: None,
            request_timeout_secs: 15,
            poll_attempts: polling.max_attempts,
            commit_activity_delay_ms: polling.commit_activity_delay.as_millis() as u64,
            contributor_stats_delay_ms: polling.contributor_stats_delay.as_millis() as u64,
            cors_origins: Vec::new(),
            log_level: "info".into(),
            log_json: false,
            log_dir: None,
        }
    }
}

pub fn default_config_path() -> PathBuf {
    if let Some(dirs) = BaseDirs::new() {
        dirs.config_dir().join("repovista.toml")
    } else {
        PathBuf::from("repovista.toml")
    }
}

/// Load the file layer. An explicit path must exist; the default path is optional.
pub fn load_config(explicit: Option<&PathBuf>) -> Result<RepoVistaConfig> {
    let (path, required) = match explicit {
        Some(path) => (path.clone(), true),
        None => (default_config_path(), false),
    };

    if !path.exists() {
        if required {
            return Err(AppError::config_load_error(path, "file does not exist"));
        }
        return Ok(RepoVistaConfig::default());
    }

    confy::load_path(&path).map_err(|e| AppError::config_load_error(path, e))
}

impl RepoVistaConfig {
    /// Resolve the final configuration from file and command line
    pub fn resolve(cli: Cli) -> Result<Self> {
        Ok(load_config(cli.config.as_ref())?.merge_cli(cli))
    }

    /// CLI and environment values override the file
    pub fn merge_cli(mut self, cli: Cli) -> Self {
        if let Some(bind) = cli.bind {
            self.bind = bind;
        }
        if let Some(url) = cli.github_api_url {
            self.github_api_url = url;
        }
        if cli.github_token.is_some() {
            self.github_token = cli.github_token;
        }
        if let Some(secs) = cli.request_timeout_secs {
            self.request_timeout_secs = secs;
        }
        if let Some(attempts) = cli.poll_attempts {
            self.poll_attempts = attempts;
        }
        if !cli.cors_origins.is_empty() {
            self.cors_origins = cli.cors_origins;
        }
        if let Some(level) = cli.log_level {
            self.log_level = level;
        }
        self.log_json |= cli.log_json;
        if cli.log_dir.is_some() {
            self.log_dir = cli.log_dir;
        }
        self
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::new(self.github_api_url.clone(), self.github_token.clone())
            .with_timeout(Duration::from_secs(self.request_timeout_secs))
            .with_polling(PollingConfig {
                max_attempts: self.poll_attempts,
                commit_activity_delay: Duration::from_millis(self.commit_activity_delay_ms),
                contributor_stats_delay: Duration::from_millis(self.contributor_stats_delay_ms),
            })
    }

    pub fn server_config(&self) -> Result<ServerConfig> {
        let bind = self
            .bind
            .parse()
            .map_err(|_| AppError::InvalidBindAddress(self.bind.clone()))?;

        Ok(ServerConfig { bind, cors_origins: self.cors_origins.clone() })
    }
}
