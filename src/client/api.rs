//! Core HTTP client for GitHub API

use reqwest::{
    Client, StatusCode,
    header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT},
};
use serde_json::Value;
use tracing::{debug, instrument, warn};
use url::Url;

use super::{
    config::ClientConfig,
    error::{ClientError, Result},
    outcome::{UpstreamOutcome, UpstreamRequest},
};

const GITHUB_MEDIA_TYPE: &str = "application/vnd.github+json";

/// Pure HTTP client for GitHub API
#[derive(Debug, Clone)]
pub struct GithubApi {
    client: Client,
    base: Url,
    config: ClientConfig,
}

impl GithubApi {
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;

        let base = Url::parse(&config.base_url)
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| ClientError::invalid_url(config.base_url.clone()))?;

        let client = Client::builder()
            .default_headers(Self::default_headers(&config)?)
            .timeout(config.request.timeout)
            .build()
            .map_err(ClientError::Http)?;

        Ok(Self { client, base, config })
    }

    /// Get current configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Perform one GET and classify the response
    #[instrument(skip(self, request), fields(path = %request.path()))]
    pub async fn request(&self, request: &UpstreamRequest) -> UpstreamOutcome {
        let url = self.url_for(request);

        let response = match self.client.get(url).query(&request.params).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "Upstream request failed");
                return UpstreamOutcome::TransportError(e.to_string());
            },
        };

        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                warn!(status = %status, error = %e, "Failed to read upstream body");
                return UpstreamOutcome::TransportError(e.to_string());
            },
        };

        if status != StatusCode::OK {
            debug!(status = %status, body_len = body.len(), "Non-200 upstream response");
            return UpstreamOutcome::from_status(status, body);
        }

        Self::decode(&request.path(), &body)
    }

    /// Append the request segments to the base path, each one percent-encoded
    fn url_for(&self, request: &UpstreamRequest) -> Url {
        let mut url = self.base.clone();
        // Infallible: `new` rejects cannot-be-a-base URLs
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(&request.segments);
        }
        url
    }

    fn decode(path: &str, body: &str) -> UpstreamOutcome {
        if body.trim().is_empty() {
            return UpstreamOutcome::Ready(Value::Null);
        }

        match serde_json::from_str(body) {
            Ok(value) => UpstreamOutcome::Ready(value),
            Err(e) => {
                warn!(path, error = %e, "Upstream returned invalid JSON");
                UpstreamOutcome::TransportError(format!("invalid JSON from {path}: {e}"))
            },
        }
    }

    fn default_headers(config: &ClientConfig) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(GITHUB_MEDIA_TYPE));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.request.user_agent)
                .map_err(|_| ClientError::InvalidHeader { header: "User-Agent" })?,
        );

        if let Some(token) = &config.token {
            let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|_| ClientError::InvalidHeader { header: "Authorization" })?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        Ok(headers)
    }
}
