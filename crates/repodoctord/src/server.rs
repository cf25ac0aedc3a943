//! Router and handlers for the RepoDoctor HTTP surface.
//!
//! Thin plumbing only: requests are decoded, handed to the core library,
//! and the outcome is mapped onto a status code. All business rules live
//! in `repodoctor-core`.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use repodoctor_core::{
    publish_top_issues, AnalyzeError, Analyzer, GitHubIssues, IssueTracker, RepoRef, ReviewIssue,
};

/// Shared daemon state.
pub struct AppState {
    pub analyzer: Analyzer,
    pub tracker: Arc<dyn IssueTracker>,
}

impl AppState {
    pub fn new(analyzer: Analyzer) -> Self {
        AppState {
            analyzer,
            tracker: Arc::new(GitHubIssues::new()),
        }
    }
}

/// Build the Axum router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(handle_health))
        .route("/api/analyze", post(handle_analyze))
        .route("/api/create-issues", post(handle_create_issues))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub repo_url: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateIssuesRequest {
    pub repo_url: String,
    /// Caller-supplied token; used for this batch and dropped.
    pub github_token: String,
    pub issues: Vec<ReviewIssue>,
}

#[derive(Debug, Serialize)]
pub struct CreatedResponse {
    pub created: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    /// Issues created before a publish batch aborted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<Vec<String>>,
}

impl ErrorResponse {
    fn new(error: impl Into<String>) -> Self {
        ErrorResponse {
            error: error.into(),
            created: None,
        }
    }
}

async fn handle_health() -> impl IntoResponse {
    Json(serde_json::json!({
        "name": "repodoctord",
        "version": repodoctor_core::VERSION,
    }))
}

/// Map an analysis error onto the HTTP surface.
fn analyze_error_status(err: &AnalyzeError) -> StatusCode {
    match err {
        AnalyzeError::InvalidUrl(_) => StatusCode::BAD_REQUEST,
        AnalyzeError::Acquisition(_) => StatusCode::BAD_GATEWAY,
        AnalyzeError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

async fn handle_analyze(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AnalyzeRequest>,
) -> Response {
    let request_id = Uuid::new_v4();
    tracing::info!(%request_id, repo_url = %request.repo_url, "analyze request");

    match state.analyzer.analyze(&request.repo_url).await {
        Ok(result) => {
            tracing::info!(
                %request_id,
                files = result.summary.file_count_sampled,
                review = result.ai_review.is_some(),
                "analyze finished"
            );
            Json(result).into_response()
        }
        Err(err) => {
            tracing::warn!(%request_id, error = %err, "analyze failed");
            let status = analyze_error_status(&err);
            (status, Json(ErrorResponse::new(err.to_string()))).into_response()
        }
    }
}

async fn handle_create_issues(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateIssuesRequest>,
) -> Response {
    let request_id = Uuid::new_v4();

    let repo = match RepoRef::parse(&request.repo_url) {
        Ok(repo) => repo,
        Err(err) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::new(err.to_string())),
            )
                .into_response();
        }
    };

    tracing::info!(%request_id, %repo, count = request.issues.len(), "create-issues request");

    match publish_top_issues(
        state.tracker.as_ref(),
        &repo,
        &request.github_token,
        &request.issues,
    )
    .await
    {
        Ok(created) => Json(CreatedResponse { created }).into_response(),
        Err(err) => {
            tracing::warn!(%request_id, error = %err, "create-issues failed");
            let body = ErrorResponse {
                error: err.to_string(),
                created: Some(err.created().to_vec()),
            };
            (StatusCode::BAD_GATEWAY, Json(body)).into_response()
        }
    }
}
