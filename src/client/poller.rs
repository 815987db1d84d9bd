//! Bounded polling for GitHub resources computed asynchronously upstream
//!
//! GitHub answers statistics requests with 202 (or, for some resources, an
//! empty 200) until the aggregate has been computed. The poller retries those
//! answers with a fixed delay and stops on the first definitive one.

use std::{sync::Arc, time::Duration};

use serde_json::Value;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use super::{
    api::GithubApi,
    outcome::{UpstreamOutcome, UpstreamRequest},
};

/// Decides whether a 200 payload is final or still being computed
pub type DefinitivePredicate = fn(&Value) -> bool;

/// Retry budget and readiness rule for one resource
#[derive(Debug, Clone, Copy)]
pub struct PollPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
    pub is_definitive: DefinitivePredicate,
}

impl PollPolicy {
    /// Ready only once upstream returns a non-empty array
    pub fn non_empty_array(max_attempts: u32, delay: Duration) -> Self {
        Self { max_attempts, delay, is_definitive: is_non_empty_array }
    }

    /// Any 200 response is final, including an empty one
    pub fn any_ready(max_attempts: u32, delay: Duration) -> Self {
        Self { max_attempts, delay, is_definitive: |_| true }
    }
}

fn is_non_empty_array(value: &Value) -> bool {
    value.as_array().is_some_and(|items| !items.is_empty())
}

/// Polls the GitHub API on behalf of a single caller.
///
/// Holds no per-poll state; concurrent polls share nothing but the HTTP
/// connection pool and the shutdown token.
#[derive(Debug, Clone)]
pub struct GithubPoller {
    api: Arc<GithubApi>,
    shutdown: CancellationToken,
}

impl GithubPoller {
    pub fn new(api: Arc<GithubApi>, shutdown: CancellationToken) -> Self {
        Self { api, shutdown }
    }

    /// Request `request` until it is definitive, fails, or the budget runs out
    #[instrument(skip(self, request, policy), fields(path = %request.path(), max_attempts = policy.max_attempts))]
    pub async fn poll(&self, request: &UpstreamRequest, policy: &PollPolicy) -> UpstreamOutcome {
        for attempt in 1..=policy.max_attempts {
            if self.shutdown.is_cancelled() {
                info!(attempt, "Poll cancelled before attempt");
                return UpstreamOutcome::Cancelled;
            }

            match self.api.request(request).await {
                UpstreamOutcome::Ready(payload) if (policy.is_definitive)(&payload) => {
                    debug!(attempt, "Upstream data ready");
                    return UpstreamOutcome::Ready(payload);
                },
                UpstreamOutcome::Ready(_) | UpstreamOutcome::Pending => {
                    debug!(attempt, "Upstream still computing");
                },
                definitive => {
                    debug!(attempt, outcome = ?definitive, "Stopping poll on definitive failure");
                    return definitive;
                },
            }

            if attempt == policy.max_attempts {
                break;
            }

            tokio::select! {
                _ = sleep(policy.delay) => {}
                _ = self.shutdown.cancelled() => {
                    info!(attempt, "Poll cancelled while waiting");
                    return UpstreamOutcome::Cancelled;
                }
            }
        }

        warn!(attempts = policy.max_attempts, "Poll budget exhausted");
        UpstreamOutcome::TimedOut
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path},
    };

    use super::*;
    use crate::client::ClientConfig;

    const STATS_PATH: &str = "/repos/octocat/Hello-World/stats/commit_activity";

    fn poller_for(server: &MockServer) -> GithubPoller {
        let api = GithubApi::new(ClientConfig::new(server.uri(), None)).unwrap();
        GithubPoller::new(Arc::new(api), CancellationToken::new())
    }

    fn fast_policy() -> PollPolicy {
        PollPolicy::non_empty_array(6, Duration::from_millis(5))
    }

    async fn request_count(server: &MockServer) -> usize {
        server.received_requests().await.unwrap().len()
    }

    #[tokio::test]
    async fn returns_data_after_k_pending_responses() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(STATS_PATH))
            .respond_with(ResponseTemplate::new(202))
            .up_to_n_times(3)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(STATS_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"total": 4}])))
            .mount(&server)
            .await;

        let outcome = poller_for(&server)
            .poll(&UpstreamRequest::new(STATS_PATH), &fast_policy())
            .await;

        assert_eq!(outcome, UpstreamOutcome::Ready(json!([{"total": 4}])));
        assert_eq!(request_count(&server).await, 4);
    }

    #[tokio::test]
    async fn empty_array_is_retried_for_non_empty_policy() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"total": 1}])))
            .mount(&server)
            .await;

        let outcome = poller_for(&server)
            .poll(&UpstreamRequest::new(STATS_PATH), &fast_policy())
            .await;

        assert!(matches!(outcome, UpstreamOutcome::Ready(_)));
        assert_eq!(request_count(&server).await, 3);
    }

    #[tokio::test]
    async fn empty_array_is_final_for_any_ready_policy() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let policy = PollPolicy::any_ready(6, Duration::from_millis(5));
        let outcome = poller_for(&server)
            .poll(&UpstreamRequest::new("/repos/a/b/stats/contributors"), &policy)
            .await;

        assert_eq!(outcome, UpstreamOutcome::Ready(json!([])));
        assert_eq!(request_count(&server).await, 1);
    }

    #[tokio::test]
    async fn client_error_short_circuits_on_first_attempt() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403).set_body_string("Bad credentials"))
            .mount(&server)
            .await;

        let outcome = poller_for(&server)
            .poll(&UpstreamRequest::new(STATS_PATH), &fast_policy())
            .await;

        assert_eq!(
            outcome,
            UpstreamOutcome::ClientError { status: 403, body: "Bad credentials".into() }
        );
        assert_eq!(request_count(&server).await, 1);
    }

    #[tokio::test]
    async fn not_found_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let outcome = poller_for(&server)
            .poll(&UpstreamRequest::new(STATS_PATH), &fast_policy())
            .await;

        assert_eq!(outcome, UpstreamOutcome::NotFound);
        assert_eq!(request_count(&server).await, 1);
    }

    #[tokio::test]
    async fn transport_error_short_circuits() {
        let api = GithubApi::new(ClientConfig::new("http://127.0.0.1:1", None)).unwrap();
        let poller = GithubPoller::new(Arc::new(api), CancellationToken::new());

        // A retried transport error would cost at least five delays.
        let policy = PollPolicy::non_empty_array(6, Duration::from_secs(60));
        let outcome = tokio::time::timeout(
            Duration::from_secs(30),
            poller.poll(&UpstreamRequest::new(STATS_PATH), &policy),
        )
        .await
        .expect("poll should not wait between attempts");

        assert!(matches!(outcome, UpstreamOutcome::TransportError(_)));
    }

    #[tokio::test]
    async fn times_out_after_max_attempts() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(202))
            .mount(&server)
            .await;

        let outcome = poller_for(&server)
            .poll(&UpstreamRequest::new(STATS_PATH), &fast_policy())
            .await;

        assert_eq!(outcome, UpstreamOutcome::TimedOut);
        assert_eq!(request_count(&server).await, 6);
    }

    #[tokio::test]
    async fn cancellation_stops_further_attempts() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(202))
            .mount(&server)
            .await;

        let api = GithubApi::new(ClientConfig::new(server.uri(), None)).unwrap();
        let shutdown = CancellationToken::new();
        let poller = GithubPoller::new(Arc::new(api), shutdown.clone());
        let policy = PollPolicy::non_empty_array(6, Duration::from_secs(60));

        let handle = tokio::spawn(async move {
            poller.poll(&UpstreamRequest::new(STATS_PATH), &policy).await
        });
        tokio::time::sleep(Duration::from_millis(200)).await;
        shutdown.cancel();

        let outcome = handle.await.unwrap();
        assert_eq!(outcome, UpstreamOutcome::Cancelled);
        assert_eq!(request_count(&server).await, 1);
    }
}
