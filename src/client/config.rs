//! Configuration management for GitHub client

use std::time::Duration;

use compact_str::CompactString;

use super::error::{ClientError, Result};

pub const DEFAULT_BASE_URL: &str = "https://api.github.com";

/// Main configuration for GitHub client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// GitHub API base URL
    pub base_url: CompactString,
    /// Personal access token, forwarded as a bearer token when present
    pub token: Option<CompactString>,
    /// Request configuration
    pub request: RequestConfig,
    /// Polling configuration for asynchronous statistics resources
    pub polling: PollingConfig,
}

/// HTTP request configuration
#[derive(Debug, Clone)]
pub struct RequestConfig {
    /// Per-call timeout
    pub timeout: Duration,
    /// Value sent in the `User-Agent` header
    pub user_agent: CompactString,
}

/// Polling budget for statistics endpoints
#[derive(Debug, Clone)]
pub struct PollingConfig {
    /// Maximum number of attempts before reporting a timeout
    pub max_attempts: u32,
    /// Delay between commit activity attempts
    pub commit_activity_delay: Duration,
    /// Delay between contributor statistics attempts
    pub contributor_stats_delay: Duration,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(15),
            user_agent: CompactString::from("RepoVista"),
        }
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            max_attempts: 6,
            commit_activity_delay: Duration::from_secs(1),
            contributor_stats_delay: Duration::from_secs(2),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL, None)
    }
}

impl ClientConfig {
    /// Create a new client configuration
    pub fn new(base_url: impl Into<CompactString>, token: Option<CompactString>) -> Self {
        Self {
            base_url: base_url.into(),
            token: token.filter(|t| !t.trim().is_empty()),
            request: RequestConfig::default(),
            polling: PollingConfig::default(),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.base_url.is_empty() {
            return Err(ClientError::config_validation(
                "github_api_url",
                "Base URL cannot be empty",
            ));
        }

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ClientError::config_validation(
                "github_api_url",
                "Base URL must start with http:// or https://",
            ));
        }

        if url::Url::parse(&self.base_url).is_err() {
            return Err(ClientError::invalid_url(self.base_url.clone()));
        }

        if self.request.timeout.is_zero() {
            return Err(ClientError::config_validation(
                "request_timeout",
                "Timeout must be greater than zero",
            ));
        }

        if self.polling.max_attempts == 0 {
            return Err(ClientError::config_validation(
                "poll_attempts",
                "At least one polling attempt is required",
            ));
        }

        Ok(())
    }

    pub fn with_polling(mut self, polling: PollingConfig) -> Self {
        self.polling = polling;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request.timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = ClientConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.polling.max_attempts, 6);
        assert!(config.token.is_none());
    }

    #[test]
    fn blank_token_is_treated_as_absent() {
        let config = ClientConfig::new(DEFAULT_BASE_URL, Some("   ".into()));
        assert!(config.token.is_none());
    }

    #[test]
    fn rejects_non_http_base_url() {
        let config = ClientConfig::new("ftp://api.github.com", None);
        assert!(matches!(
            config.validate(),
            Err(ClientError::ConfigValidation { .. })
        ));
    }

    #[test]
    fn rejects_zero_timeout_and_zero_attempts() {
        let config = ClientConfig::default().with_timeout(Duration::ZERO);
        assert!(config.validate().is_err());

        let config = ClientConfig::default().with_polling(PollingConfig {
            max_attempts: 0,
            ..PollingConfig::default()
        });
        assert!(config.validate().is_err());
    }
}
