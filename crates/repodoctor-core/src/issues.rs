//! Publishing accepted review issues to the origin tracker.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::error::{PublishError, TrackerError};
use crate::evidence::truncate_chars;
use crate::repo::RepoRef;
use crate::review::ReviewIssue;

/// At most this many issues are submitted per publish batch.
pub const MAX_PUBLISHED_ISSUES: usize = 5;

/// Ceiling on a single tracker write.
pub const TRACKER_TIMEOUT_SECS: u64 = 30;

/// Characters of an upstream error body kept in the error message.
const ERROR_BODY_CHARS: usize = 300;

/// Creates tracking issues on the origin host.
#[async_trait]
pub trait IssueTracker: Send + Sync {
    /// Create one issue and return its canonical URL.
    async fn create_issue(
        &self,
        repo: &RepoRef,
        token: &str,
        title: &str,
        body: &str,
    ) -> Result<String, TrackerError>;
}

/// Production tracker backed by the GitHub REST API.
#[derive(Debug, Clone)]
pub struct GitHubIssues {
    client: reqwest::Client,
}

impl Default for GitHubIssues {
    fn default() -> Self {
        let client = reqwest::Client::builder()
            .user_agent(concat!("repodoctor/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(TRACKER_TIMEOUT_SECS))
            .build()
            .expect("failed to create HTTP client");
        GitHubIssues { client }
    }
}

impl GitHubIssues {
    pub fn new() -> Self {
        Self::default()
    }
}

#[derive(Debug, Deserialize)]
struct CreatedIssue {
    html_url: String,
}

#[async_trait]
impl IssueTracker for GitHubIssues {
    async fn create_issue(
        &self,
        repo: &RepoRef,
        token: &str,
        title: &str,
        body: &str,
    ) -> Result<String, TrackerError> {
        let response = self
            .client
            .post(repo.issues_api_url())
            .bearer_auth(token.trim())
            .header("Accept", "application/vnd.github+json")
            .json(&json!({ "title": title, "body": body }))
            .send()
            .await
            .map_err(|e| TrackerError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TrackerError::Api {
                status: status.as_u16(),
                body: truncate_chars(&body, ERROR_BODY_CHARS),
            });
        }

        let created: CreatedIssue = response
            .json()
            .await
            .map_err(|e| TrackerError::Http(format!("undecodable issue response: {e}")))?;
        Ok(created.html_url)
    }
}

/// Render the fixed Markdown body for one issue.
pub fn render_issue_body(issue: &ReviewIssue) -> String {
    format!(
        "**Severity:** {}\n\n**Evidence:**\n{}\n\n**Suggested fix:**\n{}\n\n_Created by RepoDoctor_",
        issue.severity, issue.evidence, issue.fix
    )
}

/// Publish at most the first [`MAX_PUBLISHED_ISSUES`] issues.
///
/// Stops at the first tracker failure; issues created earlier in the batch
/// are not rolled back and their URLs ride along on the error.
pub async fn publish_top_issues(
    tracker: &dyn IssueTracker,
    repo: &RepoRef,
    token: &str,
    issues: &[ReviewIssue],
) -> Result<Vec<String>, PublishError> {
    let mut created = Vec::new();

    for issue in issues.iter().take(MAX_PUBLISHED_ISSUES) {
        let body = render_issue_body(issue);
        match tracker.create_issue(repo, token, &issue.title, &body).await {
            Ok(url) => {
                tracing::info!(repo = %repo, issue = %issue.title, %url, "created issue");
                created.push(url);
            }
            Err(source) => {
                tracing::warn!(repo = %repo, error = %source, "issue creation failed, aborting batch");
                return Err(PublishError::Tracker { source, created });
            }
        }
    }

    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::RecordingTracker;
    use crate::review::Severity;

    fn issue(n: usize) -> ReviewIssue {
        ReviewIssue {
            title: format!("issue {n}"),
            severity: Severity::High,
            evidence: format!("evidence {n}"),
            fix: format!("fix {n}"),
        }
    }

    #[test]
    fn body_template_interpolates_all_fields() {
        let body = render_issue_body(&issue(1));
        assert!(body.contains("**Severity:** high"));
        assert!(body.contains("**Evidence:**\nevidence 1"));
        assert!(body.contains("**Suggested fix:**\nfix 1"));
        assert!(body.contains("_Created by RepoDoctor_"));
    }

    #[tokio::test]
    async fn publishes_at_most_five_issues() {
        let tracker = RecordingTracker::default();
        let repo = RepoRef {
            owner: "o".to_string(),
            name: "r".to_string(),
        };
        let issues: Vec<ReviewIssue> = (0..7).map(issue).collect();

        let created = publish_top_issues(&tracker, &repo, "tok", &issues)
            .await
            .unwrap();

        assert_eq!(created.len(), 5);
        let seen = tracker.created.lock().unwrap();
        assert_eq!(seen.len(), 5);
        // The 6th and 7th never reach the tracker.
        assert!(seen.iter().all(|(title, _)| title != "issue 5"));
        assert!(seen.iter().all(|(title, _)| title != "issue 6"));
    }

    #[tokio::test]
    async fn first_failure_aborts_and_reports_partial_success() {
        let tracker = RecordingTracker::failing_after(2);
        let repo = RepoRef {
            owner: "o".to_string(),
            name: "r".to_string(),
        };
        let issues: Vec<ReviewIssue> = (0..5).map(issue).collect();

        let err = publish_top_issues(&tracker, &repo, "tok", &issues)
            .await
            .unwrap_err();

        assert_eq!(err.created().len(), 2);
        assert_eq!(tracker.created.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn empty_batch_creates_nothing() {
        let tracker = RecordingTracker::default();
        let repo = RepoRef {
            owner: "o".to_string(),
            name: "r".to_string(),
        };
        let created = publish_top_issues(&tracker, &repo, "tok", &[]).await.unwrap();
        assert!(created.is_empty());
        assert!(tracker.created.lock().unwrap().is_empty());
    }
}
