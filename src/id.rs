use compact_str::CompactString;

use crate::{
    client::UpstreamRequest,
    result::{AppError, Result},
};

/// owner/repo pair addressing a GitHub repository.
///
/// Both parts are restricted to GitHub's name alphabet (ASCII letters,
/// digits, `.`, `-`, `_`) and can never be `.` or `..`.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct RepoId {
    owner: CompactString,
    repo: CompactString,
}

impl RepoId {
    pub fn new<S: Into<CompactString>>(owner: S, repo: S) -> Result<Self> {
        let owner: CompactString = owner.into();
        let repo: CompactString = repo.into();
        let owner: CompactString = owner.trim().into();
        let repo: CompactString = repo.trim().into();

        Self::validate_segment("owner", &owner)?;
        Self::validate_segment("repo", &repo)?;

        Ok(Self { owner, repo })
    }

    /// Upstream request for `/repos/{owner}/{repo}/{resource...}`
    pub fn request(&self, resource: &[&str]) -> UpstreamRequest {
        let base = ["repos", self.owner.as_str(), self.repo.as_str()];
        UpstreamRequest::from_segments(base.into_iter().chain(resource.iter().copied()))
    }

    fn validate_segment(field: &str, value: &str) -> Result<()> {
        if value.is_empty() {
            return Err(AppError::invalid_parameter(field, "must not be empty"));
        }
        if value == "." || value == ".." {
            return Err(AppError::invalid_parameter(field, "must be a single path segment"));
        }
        if !value.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_')) {
            return Err(AppError::invalid_parameter(
                field,
                "may only contain ASCII letters, digits, '.', '-' and '_'",
            ));
        }
        Ok(())
    }
}

impl std::fmt::Display for RepoId {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}
