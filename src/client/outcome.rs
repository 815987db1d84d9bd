//! Request and outcome model for upstream calls

use compact_str::CompactString;
use reqwest::StatusCode;
use serde_json::Value;

/// A single GET against the upstream API, relative to the configured base URL.
///
/// The path is kept as raw segments and percent-encoded one by one when the
/// URL is built, so no segment can introduce a separator, query or fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamRequest {
    pub segments: Vec<CompactString>,
    pub params: Vec<(CompactString, CompactString)>,
}

impl UpstreamRequest {
    /// Fixed API path such as `/search/repositories`
    pub fn new(path: &str) -> Self {
        Self::from_segments(path.split('/').filter(|segment| !segment.is_empty()))
    }

    pub fn from_segments<I>(segments: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<CompactString>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
            params: Vec::new(),
        }
    }

    pub fn param(mut self, key: impl Into<CompactString>, value: impl Into<CompactString>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    /// Unencoded path, for logs
    pub fn path(&self) -> CompactString {
        let mut path = CompactString::default();
        for segment in &self.segments {
            path.push('/');
            path.push_str(segment);
        }
        path
    }
}

/// Classified result of an upstream call.
///
/// `request` only ever yields the first five variants. `TimedOut` and
/// `Cancelled` are produced by the poll loop.
#[derive(Debug, Clone, PartialEq)]
pub enum UpstreamOutcome {
    /// 200 with a JSON body (other 2xx carry `Value::Null`)
    Ready(Value),
    /// 202, upstream is still computing the resource
    Pending,
    /// 404
    NotFound,
    /// Any other non-2xx status, with the raw response body
    ClientError { status: u16, body: String },
    /// Network, timeout, or body decoding failure
    TransportError(String),
    /// Poll budget exhausted without definitive data
    TimedOut,
    /// Poll interrupted by shutdown
    Cancelled,
}

impl UpstreamOutcome {
    /// Classify a response that did not carry a usable JSON payload.
    ///
    /// 200 is intentionally absent: callers decode the body themselves.
    pub fn from_status(status: StatusCode, body: String) -> Self {
        match status {
            StatusCode::ACCEPTED => Self::Pending,
            StatusCode::NOT_FOUND => Self::NotFound,
            s if s.is_success() => Self::Ready(Value::Null),
            s => Self::ClientError { status: s.as_u16(), body },
        }
    }
}
