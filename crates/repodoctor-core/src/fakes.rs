//! In-memory fakes for the collaborator traits (testing only)
//!
//! Provides `FakeFetcher`, `FakeReviewer`, and `RecordingTracker` that
//! satisfy the trait contracts without touching the network or the `git`
//! binary.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{AcquisitionError, ModelError, TrackerError};
use crate::evidence::EvidenceSet;
use crate::fetch::RepoFetcher;
use crate::issues::IssueTracker;
use crate::repo::RepoRef;
use crate::review::{ReviewIssue, ReviewProvider, ReviewReport, Severity};

/// A syntactically valid five-issue report for tests.
pub fn canned_report() -> ReviewReport {
    ReviewReport {
        one_liner: "Works, but the basics are missing.".to_string(),
        top_5: (1..=5)
            .map(|n| ReviewIssue {
                title: format!("Canned issue {n}"),
                severity: Severity::Medium,
                evidence: format!("file{n}.rs: concrete clue {n}"),
                fix: format!("Apply fix {n}."),
            })
            .collect(),
        next_7_days_plan: vec!["Add CI".to_string(), "Write tests".to_string()],
    }
}

// ---------------------------------------------------------------------------
// FakeFetcher
// ---------------------------------------------------------------------------

/// Fetcher that materializes a fixed file set instead of cloning.
#[derive(Debug, Default)]
pub struct FakeFetcher {
    /// Relative path → content written into the destination on fetch.
    files: Vec<(String, String)>,
    /// When set, every fetch fails with this message as git stderr.
    fail_with: Option<String>,
    /// Destination paths this fetcher was asked to populate.
    pub seen_dests: Mutex<Vec<PathBuf>>,
}

impl FakeFetcher {
    pub fn with_files(files: &[(&str, &str)]) -> Self {
        FakeFetcher {
            files: files
                .iter()
                .map(|(p, c)| (p.to_string(), c.to_string()))
                .collect(),
            ..Default::default()
        }
    }

    pub fn failing(stderr: &str) -> Self {
        FakeFetcher {
            fail_with: Some(stderr.to_string()),
            ..Default::default()
        }
    }
}

#[async_trait]
impl RepoFetcher for FakeFetcher {
    async fn fetch(&self, _url: &str, dest: &Path) -> Result<(), AcquisitionError> {
        self.seen_dests.lock().unwrap().push(dest.to_path_buf());

        if let Some(stderr) = &self.fail_with {
            return Err(AcquisitionError::CloneFailed {
                stderr: stderr.clone(),
            });
        }

        for (rel, content) in &self.files {
            let path = dest.join(rel);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, content)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// FakeReviewer
// ---------------------------------------------------------------------------

#[derive(Debug)]
enum ReviewOutcome {
    Report(ReviewReport),
    Fail(String),
}

/// Reviewer with a scripted outcome.
#[derive(Debug)]
pub struct FakeReviewer {
    outcome: ReviewOutcome,
    /// Evidence sets this reviewer was shown.
    pub seen_evidence: Mutex<Vec<EvidenceSet>>,
}

impl FakeReviewer {
    pub fn returning(report: ReviewReport) -> Self {
        FakeReviewer {
            outcome: ReviewOutcome::Report(report),
            seen_evidence: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        FakeReviewer {
            outcome: ReviewOutcome::Fail(message.to_string()),
            seen_evidence: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl ReviewProvider for FakeReviewer {
    async fn review(
        &self,
        _repo_url: &str,
        evidence: &EvidenceSet,
    ) -> Result<ReviewReport, ModelError> {
        self.seen_evidence.lock().unwrap().push(evidence.clone());
        match &self.outcome {
            ReviewOutcome::Report(report) => Ok(report.clone()),
            ReviewOutcome::Fail(message) => Err(ModelError::Http(message.clone())),
        }
    }
}

// ---------------------------------------------------------------------------
// RecordingTracker
// ---------------------------------------------------------------------------

/// Tracker that records submissions and can fail on demand.
#[derive(Debug, Default)]
pub struct RecordingTracker {
    /// (title, body) pairs in submission order.
    pub created: Mutex<Vec<(String, String)>>,
    fail_after: Option<usize>,
}

impl RecordingTracker {
    /// Succeed for the first `n` creations, then fail with a 403.
    pub fn failing_after(n: usize) -> Self {
        RecordingTracker {
            created: Mutex::new(Vec::new()),
            fail_after: Some(n),
        }
    }
}

#[async_trait]
impl IssueTracker for RecordingTracker {
    async fn create_issue(
        &self,
        repo: &RepoRef,
        _token: &str,
        title: &str,
        body: &str,
    ) -> Result<String, TrackerError> {
        let mut created = self.created.lock().unwrap();
        if let Some(limit) = self.fail_after {
            if created.len() >= limit {
                return Err(TrackerError::Api {
                    status: 403,
                    body: "forbidden".to_string(),
                });
            }
        }
        created.push((title.to_string(), body.to_string()));
        Ok(format!(
            "https://github.com/{}/{}/issues/{}",
            repo.owner,
            repo.name,
            created.len()
        ))
    }
}
