//! High-level GitHub service operations
//!
//! Each operation maps one facade endpoint onto one upstream call and owns
//! that resource's empty-default policy. Repository info surfaces absence as
//! a failure; contributors, languages, issues and alerts collapse it into an
//! empty value.

use std::sync::Arc;

use chrono::Utc;
use compact_str::{CompactString, ToCompactString};
use serde_json::{Map, Value};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::{
    client::{
        ClientConfig, GithubApi, GithubPoller, PollPolicy, PollingConfig, UpstreamOutcome,
        UpstreamRequest,
    },
    domain::{
        ContributorStat, SecurityAlertList, contributor_stats_from_payload, popular_repos_query,
        search_items,
    },
    id::RepoId,
    result::AppError,
};

const COMMIT_ACTIVITY_PENDING: &str =
    "GitHub is still processing commit activity. Try again in a moment.";
const REPO_NOT_FOUND: &str = "Repo not found";
const REPO_INFO_PENDING: &str =
    "GitHub is still preparing repository data. Try again in a moment.";
pub const DEFAULT_ISSUE_STATE: &str = "open";
pub const DEFAULT_POPULAR_PER_PAGE: u32 = 10;
pub const MAX_POPULAR_PER_PAGE: u32 = 50;

pub type Result<T> = std::result::Result<T, FacadeError>;

/// Failure surfaced to the facade caller
#[derive(Debug, Error, PartialEq)]
pub enum FacadeError {
    #[error("{0}")]
    NotFound(CompactString),

    #[error("{0}")]
    StillProcessing(CompactString),

    #[error("GitHub API returned HTTP {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("GitHub API unreachable: {0}")]
    Transport(String),

    #[error("Request cancelled: server is shutting down")]
    Cancelled,

    #[error("Invalid parameter {field}: {message}")]
    InvalidParameter { field: CompactString, message: CompactString },
}

impl FacadeError {
    /// Translate a non-ready outcome with the generic mapping
    fn from_outcome(outcome: UpstreamOutcome, pending_detail: &str) -> Self {
        match outcome {
            UpstreamOutcome::NotFound => Self::NotFound("Not found".into()),
            UpstreamOutcome::ClientError { status, body } => Self::Upstream { status, body },
            UpstreamOutcome::TransportError(cause) => Self::Transport(cause),
            UpstreamOutcome::Pending | UpstreamOutcome::TimedOut => {
                Self::StillProcessing(pending_detail.into())
            },
            UpstreamOutcome::Cancelled => Self::Cancelled,
            UpstreamOutcome::Ready(_) => {
                Self::Transport("unexpected ready outcome treated as failure".into())
            },
        }
    }
}

impl From<AppError> for FacadeError {
    fn from(e: AppError) -> Self {
        match e {
            AppError::InvalidParameter { field, message } => {
                Self::InvalidParameter { field, message }
            },
            other => Self::Transport(other.to_string()),
        }
    }
}

/// High-level service for GitHub operations
///
/// Cheap to clone; all clones share one connection pool and shutdown token.
#[derive(Debug, Clone)]
pub struct GithubService {
    api: Arc<GithubApi>,
    poller: GithubPoller,
    polling: PollingConfig,
}

impl GithubService {
    pub fn new(config: ClientConfig, shutdown: CancellationToken) -> crate::result::Result<Self> {
        let api = Arc::new(GithubApi::new(config)?);
        Ok(Self::from_api(api, shutdown))
    }

    /// Create service from existing API client
    pub fn from_api(api: Arc<GithubApi>, shutdown: CancellationToken) -> Self {
        let polling = api.config().polling.clone();
        let poller = GithubPoller::new(Arc::clone(&api), shutdown);
        Self { api, poller, polling }
    }

    /// Repository metadata; absence is a hard failure
    #[instrument(skip(self, repo), fields(repo = %repo))]
    pub async fn repo_info(&self, repo: &RepoId) -> Result<Value> {
        match self.api.request(&repo.request(&[])).await {
            UpstreamOutcome::Ready(value) if !is_empty_payload(&value) => Ok(value),
            UpstreamOutcome::Ready(_) | UpstreamOutcome::NotFound => {
                info!("Repository not found");
                Err(FacadeError::NotFound(REPO_NOT_FOUND.into()))
            },
            outcome => Err(FacadeError::from_outcome(outcome, REPO_INFO_PENDING)),
        }
    }

    #[instrument(skip(self, repo), fields(repo = %repo))]
    pub async fn contributors(&self, repo: &RepoId) -> Result<Value> {
        let outcome = self.api.request(&repo.request(&["contributors"])).await;
        or_empty(outcome, Value::Array(Vec::new()))
    }

    #[instrument(skip(self, repo), fields(repo = %repo))]
    pub async fn languages(&self, repo: &RepoId) -> Result<Value> {
        let outcome = self.api.request(&repo.request(&["languages"])).await;
        or_empty(outcome, Value::Object(Map::new()))
    }

    #[instrument(skip(self, repo), fields(repo = %repo))]
    pub async fn issues(&self, repo: &RepoId, state: Option<&str>) -> Result<Value> {
        let state = state
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_ISSUE_STATE);
        let request = repo.request(&["issues"]).param("state", state);
        or_empty(self.api.request(&request).await, Value::Array(Vec::new()))
    }

    /// Weekly commit counts for the last year, polled until GitHub has them
    #[instrument(skip(self, repo), fields(repo = %repo))]
    pub async fn commit_activity(&self, repo: &RepoId) -> Result<Value> {
        let policy = PollPolicy::non_empty_array(
            self.polling.max_attempts,
            self.polling.commit_activity_delay,
        );
        let request = repo.request(&["stats", "commit_activity"]);

        match self.poller.poll(&request, &policy).await {
            UpstreamOutcome::Ready(value) => Ok(value),
            outcome => {
                warn!(outcome = ?outcome, "Commit activity unavailable");
                Err(FacadeError::from_outcome(outcome, COMMIT_ACTIVITY_PENDING))
            },
        }
    }

    /// Active contributors with weekly breakdown; empty when GitHub cannot answer
    #[instrument(skip(self, repo), fields(repo = %repo))]
    pub async fn contributor_stats(&self, repo: &RepoId) -> Result<Vec<ContributorStat>> {
        let policy = PollPolicy::any_ready(
            self.polling.max_attempts,
            self.polling.contributor_stats_delay,
        );
        let request = repo.request(&["stats", "contributors"]);

        match self.poller.poll(&request, &policy).await {
            UpstreamOutcome::Ready(payload) => Ok(contributor_stats_from_payload(payload)),
            UpstreamOutcome::Cancelled => Err(FacadeError::Cancelled),
            outcome => {
                warn!(outcome = ?outcome, "Contributor stats unavailable, returning empty list");
                Ok(Vec::new())
            },
        }
    }

    /// Dependabot alerts; never fails
    #[instrument(skip(self, repo), fields(repo = %repo))]
    pub async fn security_alerts(&self, repo: &RepoId) -> SecurityAlertList {
        let outcome = self.api.request(&repo.request(&["dependabot", "alerts"])).await;

        match outcome {
            UpstreamOutcome::Ready(payload) => SecurityAlertList::from_payload(payload),
            outcome => {
                debug!(outcome = ?outcome, "No security alerts available");
                SecurityAlertList::default()
            },
        }
    }

    /// Most starred repositories created during the last 365 days
    #[instrument(skip(self))]
    pub async fn popular_repos(&self, language: Option<&str>, per_page: u32) -> Result<Value> {
        if !(1..=MAX_POPULAR_PER_PAGE).contains(&per_page) {
            return Err(FacadeError::InvalidParameter {
                field: "per_page".into(),
                message: compact_str::format_compact!(
                    "must be between 1 and {MAX_POPULAR_PER_PAGE}"
                ),
            });
        }

        let query = popular_repos_query(Utc::now().date_naive(), language);
        let request = UpstreamRequest::new("/search/repositories")
            .param("q", query)
            .param("sort", "stars")
            .param("order", "desc")
            .param("per_page", per_page.to_compact_string());

        match self.api.request(&request).await {
            UpstreamOutcome::Ready(payload) => Ok(search_items(payload)),
            outcome => Err(FacadeError::from_outcome(outcome, "Search results not ready")),
        }
    }
}

/// Null, `[]` and `{}` all count as "nothing there"
fn is_empty_payload(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

/// Collapse absence and upstream rejections into `default`.
///
/// Transport failures still surface: an unreachable upstream is not the same
/// as an absent resource.
fn or_empty(outcome: UpstreamOutcome, default: Value) -> Result<Value> {
    match outcome {
        UpstreamOutcome::Ready(value) if !is_empty_payload(&value) => Ok(value),
        UpstreamOutcome::Ready(_) => Ok(default),
        UpstreamOutcome::NotFound
        | UpstreamOutcome::ClientError { .. }
        | UpstreamOutcome::Pending
        | UpstreamOutcome::TimedOut => {
            debug!(outcome = ?outcome, "Normalizing upstream outcome to empty default");
            Ok(default)
        },
        UpstreamOutcome::TransportError(cause) => Err(FacadeError::Transport(cause)),
        UpstreamOutcome::Cancelled => Err(FacadeError::Cancelled),
    }
}
