//! Analysis orchestration: acquire, extract, scan, review, assemble.
//!
//! The scratch checkout lives in a uniquely named temporary directory whose
//! guard removes the whole tree on every exit path, so concurrent requests
//! never collide and nothing is left behind on failure.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::RepoDoctorConfig;
use crate::error::{AnalyzeError, Result};
use crate::evidence::{extract_evidence, ExtractLimits};
use crate::fetch::{GitCloneFetcher, RepoFetcher};
use crate::heuristics::scan;
use crate::repo::RepoRef;
use crate::review::{ReviewProvider, ReviewReport};

/// Generic follow-ups appended to every result.
pub const NEXT_STEPS: [&str; 4] = [
    "Add CI + basic tests",
    "Document env vars and run steps",
    "Add Docker",
    "Run a dependency security audit",
];

/// What was sampled from the checkout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceSummary {
    pub file_count_sampled: usize,
    pub key_files_found: Vec<String>,
}

/// Diagnostic block exposing review health without failing the request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostics {
    /// Whether a model API key was configured at startup.
    pub model_key_present: bool,
    /// Message of the last review failure, if any.
    pub review_error: Option<String>,
}

/// The assembled result of one analysis request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub repo_url: String,
    pub repo: RepoRef,
    pub summary: EvidenceSummary,
    pub findings: Vec<String>,
    pub quick_wins: Vec<String>,
    pub risks: Vec<String>,
    pub next_steps: Vec<String>,
    pub debug: Diagnostics,
    /// Absent when the model call failed; see `debug.review_error`.
    pub ai_review: Option<ReviewReport>,
    pub analyzed_at: DateTime<Utc>,
}

/// The sole entry point to the analysis pipeline.
pub struct Analyzer {
    limits: ExtractLimits,
    model_key_present: bool,
    fetcher: Arc<dyn RepoFetcher>,
    reviewer: Arc<dyn ReviewProvider>,
}

impl Analyzer {
    /// Production wiring: git CLI fetcher plus the configured review client.
    pub fn new(config: &RepoDoctorConfig) -> Self {
        Analyzer {
            limits: ExtractLimits::default(),
            model_key_present: config.openai_api_key.is_some(),
            fetcher: Arc::new(GitCloneFetcher::new()),
            reviewer: Arc::new(config.review_client()),
        }
    }

    /// Wire explicit collaborators (tests inject fakes here).
    pub fn with_collaborators(
        fetcher: Arc<dyn RepoFetcher>,
        reviewer: Arc<dyn ReviewProvider>,
        model_key_present: bool,
    ) -> Self {
        Analyzer {
            limits: ExtractLimits::default(),
            model_key_present,
            fetcher,
            reviewer,
        }
    }

    /// Override the extraction bounds.
    pub fn with_limits(mut self, limits: ExtractLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Analyze one repository URL.
    ///
    /// Only URL validation and acquisition can fail. A review failure is
    /// captured in the diagnostics block and the heuristic portion of the
    /// result is returned regardless.
    pub async fn analyze(&self, url: &str) -> Result<AnalysisResult> {
        let repo = RepoRef::parse(url)?;
        let repo_url = url.trim().to_string();

        let scratch = tempfile::Builder::new()
            .prefix("repodoctor-")
            .tempdir()
            .map_err(AnalyzeError::Io)?;
        let dest = scratch.path().join(repo.dir_name());

        tracing::info!(%repo, "acquiring shallow checkout");
        self.fetcher.fetch(&repo_url, &dest).await?;

        let evidence = extract_evidence(&dest, &self.limits);
        let heuristics = scan(&evidence);
        tracing::debug!(
            files = evidence.files.len(),
            key_files = evidence.key_files.len(),
            "evidence extracted"
        );

        let (ai_review, review_error) = match self.reviewer.review(&repo_url, &evidence).await {
            Ok(report) => (Some(report), None),
            Err(err) => {
                tracing::warn!(error = %err, "AI review failed; returning heuristics only");
                (None, Some(err.to_string()))
            }
        };

        Ok(AnalysisResult {
            repo_url,
            summary: EvidenceSummary {
                file_count_sampled: evidence.files.len(),
                key_files_found: evidence.key_files_found(),
            },
            findings: heuristics.findings,
            quick_wins: heuristics.quick_wins,
            risks: heuristics.risks,
            next_steps: NEXT_STEPS.iter().map(|s| s.to_string()).collect(),
            debug: Diagnostics {
                model_key_present: self.model_key_present,
                review_error,
            },
            ai_review,
            analyzed_at: Utc::now(),
            repo,
        })
        // `scratch` drops here: the checkout is gone before the caller
        // sees the result.
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::{canned_report, FakeFetcher, FakeReviewer};

    #[tokio::test]
    async fn invalid_url_fails_before_any_fetch() {
        let fetcher = Arc::new(FakeFetcher::default());
        let analyzer = Analyzer::with_collaborators(
            fetcher.clone(),
            Arc::new(FakeReviewer::returning(canned_report())),
            true,
        );

        let err = analyzer.analyze("https://gitlab.com/o/r").await.unwrap_err();
        assert!(matches!(err, AnalyzeError::InvalidUrl(_)));
        assert!(fetcher.seen_dests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn checkout_lands_under_a_repodoctor_scratch_dir() {
        let fetcher = Arc::new(FakeFetcher::with_files(&[("README.md", "# x")]));
        let analyzer = Analyzer::with_collaborators(
            fetcher.clone(),
            Arc::new(FakeReviewer::returning(canned_report())),
            true,
        );

        analyzer
            .analyze("https://github.com/owner/repo")
            .await
            .unwrap();

        let dests = fetcher.seen_dests.lock().unwrap();
        assert_eq!(dests.len(), 1);
        assert!(dests[0].ends_with("owner__repo"));
        let scratch = dests[0].parent().unwrap();
        assert!(scratch
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("repodoctor-"));
    }

    #[test]
    fn next_steps_are_fixed() {
        assert_eq!(NEXT_STEPS.len(), 4);
        assert!(NEXT_STEPS[0].contains("CI"));
    }
}
