//! Facade endpoints
//!
//! Repository resources are reachable both with `owner`/`repo` query
//! parameters and as path segments, matching what existing frontends call.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    routing::get,
};
use compact_str::CompactString;
use serde::Deserialize;
use serde_json::{Value, json};

use super::{
    AppState,
    extract::{ApiPath, ApiQuery},
};
use crate::{
    domain::{ContributorStat, SecurityAlertList},
    id::RepoId,
    service::{DEFAULT_POPULAR_PER_PAGE, FacadeError},
};

type ApiResult<T> = Result<Json<T>, FacadeError>;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/repo/info", get(repo_info_handler))
        .route("/repo/contributors", get(contributors_handler))
        .route("/repo/languages", get(languages_handler))
        .route("/repo/issues", get(issues_handler))
        .route("/repo/:owner/:repo", get(repo_info_path_handler))
        .route("/repo/:owner/:repo/contributors", get(contributors_path_handler))
        .route("/repo/:owner/:repo/languages", get(languages_path_handler))
        .route("/repo/:owner/:repo/issues", get(issues_path_handler))
        .route("/api/commit-activity", get(commit_activity_handler))
        .route("/contributors/stats", get(contributor_stats_handler))
        .route("/security/dependabot", get(security_alerts_handler))
        .route("/popular", get(popular_repos_handler))
        .with_state(state)
}

#[derive(Debug, Default, Deserialize)]
struct RepoQuery {
    owner: Option<CompactString>,
    #[serde(alias = "repo_name")]
    repo: Option<CompactString>,
    state: Option<CompactString>,
}

impl RepoQuery {
    fn repo_id(&self) -> Result<RepoId, FacadeError> {
        Ok(RepoId::new(
            self.owner.clone().unwrap_or_default(),
            self.repo.clone().unwrap_or_default(),
        )?)
    }
}

#[derive(Debug, Default, Deserialize)]
struct IssueStateQuery {
    state: Option<CompactString>,
}

#[derive(Debug, Default, Deserialize)]
struct PopularQuery {
    language: Option<CompactString>,
    per_page: Option<u32>,
}

fn path_repo_id((owner, repo): (CompactString, CompactString)) -> Result<RepoId, FacadeError> {
    Ok(RepoId::new(owner, repo)?)
}

/// GET /
async fn root_handler() -> Json<Value> {
    Json(json!({ "message": "RepoVista backend is running!" }))
}

/// GET /health
async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "repovista",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// GET /repo/info?owner=&repo=
async fn repo_info_handler(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<RepoQuery>,
) -> ApiResult<Value> {
    Ok(Json(state.service.repo_info(&query.repo_id()?).await?))
}

/// GET /repo/{owner}/{repo}
async fn repo_info_path_handler(
    State(state): State<Arc<AppState>>,
    ApiPath(segments): ApiPath<(CompactString, CompactString)>,
) -> ApiResult<Value> {
    Ok(Json(state.service.repo_info(&path_repo_id(segments)?).await?))
}

/// GET /repo/contributors?owner=&repo=
async fn contributors_handler(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<RepoQuery>,
) -> ApiResult<Value> {
    Ok(Json(state.service.contributors(&query.repo_id()?).await?))
}

/// GET /repo/{owner}/{repo}/contributors
async fn contributors_path_handler(
    State(state): State<Arc<AppState>>,
    ApiPath(segments): ApiPath<(CompactString, CompactString)>,
) -> ApiResult<Value> {
    Ok(Json(state.service.contributors(&path_repo_id(segments)?).await?))
}

/// GET /repo/languages?owner=&repo=
async fn languages_handler(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<RepoQuery>,
) -> ApiResult<Value> {
    Ok(Json(state.service.languages(&query.repo_id()?).await?))
}

/// GET /repo/{owner}/{repo}/languages
async fn languages_path_handler(
    State(state): State<Arc<AppState>>,
    ApiPath(segments): ApiPath<(CompactString, CompactString)>,
) -> ApiResult<Value> {
    Ok(Json(state.service.languages(&path_repo_id(segments)?).await?))
}

/// GET /repo/issues?owner=&repo=&state=
async fn issues_handler(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<RepoQuery>,
) -> ApiResult<Value> {
    let repo = query.repo_id()?;
    Ok(Json(state.service.issues(&repo, query.state.as_deref()).await?))
}

/// GET /repo/{owner}/{repo}/issues?state=
async fn issues_path_handler(
    State(state): State<Arc<AppState>>,
    ApiPath(segments): ApiPath<(CompactString, CompactString)>,
    ApiQuery(query): ApiQuery<IssueStateQuery>,
) -> ApiResult<Value> {
    let repo = path_repo_id(segments)?;
    Ok(Json(state.service.issues(&repo, query.state.as_deref()).await?))
}

/// GET /api/commit-activity?owner=&repo=
///
/// Answers 202 with a detail message while GitHub is still computing.
async fn commit_activity_handler(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<RepoQuery>,
) -> ApiResult<Value> {
    Ok(Json(state.service.commit_activity(&query.repo_id()?).await?))
}

/// GET /contributors/stats?owner=&repo=
async fn contributor_stats_handler(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<RepoQuery>,
) -> ApiResult<Vec<ContributorStat>> {
    Ok(Json(state.service.contributor_stats(&query.repo_id()?).await?))
}

/// GET /security/dependabot?owner=&repo=
async fn security_alerts_handler(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<RepoQuery>,
) -> ApiResult<SecurityAlertList> {
    Ok(Json(state.service.security_alerts(&query.repo_id()?).await))
}

/// GET /popular?language=&per_page=
async fn popular_repos_handler(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<PopularQuery>,
) -> ApiResult<Value> {
    let per_page = query.per_page.unwrap_or(DEFAULT_POPULAR_PER_PAGE);
    Ok(Json(
        state
            .service
            .popular_repos(query.language.as_deref(), per_page)
            .await?,
    ))
}
