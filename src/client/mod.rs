//! GitHub client modules
//!
//! `api` performs and classifies single requests, `poller` layers the
//! bounded retry protocol for asynchronous statistics on top of it.

pub mod api;
pub mod config;
pub mod error;
pub mod outcome;
pub mod poller;

// Re-export main types for convenience
pub use api::GithubApi;
pub use config::{ClientConfig, PollingConfig};
pub use error::ClientError;
pub use outcome::{UpstreamOutcome, UpstreamRequest};
pub use poller::{GithubPoller, PollPolicy};
