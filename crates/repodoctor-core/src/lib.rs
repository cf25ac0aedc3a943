//! RepoDoctor Core Library
//!
//! Evidence-based repository review: clone a repo, sample a bounded
//! evidence set, run cheap heuristics and a schema-constrained AI review,
//! and optionally file the top findings as tracking issues.

pub mod analyzer;
pub mod config;
pub mod error;
pub mod evidence;
pub mod fakes;
pub mod fetch;
pub mod heuristics;
pub mod issues;
pub mod repo;
pub mod review;
pub mod telemetry;

pub use analyzer::{AnalysisResult, Analyzer, Diagnostics, EvidenceSummary, NEXT_STEPS};
pub use config::RepoDoctorConfig;
pub use error::{
    AcquisitionError, AnalyzeError, ModelError, PublishError, RepoUrlError, Result, TrackerError,
};
pub use evidence::{
    extract_evidence, EvidenceSet, ExtractLimits, KeyFile, DIRECTORY_SENTINEL,
    KEY_FILE_ALLOW_LIST, MAX_FILES, MAX_KEY_FILE_CHARS,
};
pub use fetch::{GitCloneFetcher, RepoFetcher, CLONE_TIMEOUT_SECS};
pub use heuristics::{scan, HeuristicFindings, LARGE_REPO_THRESHOLD};
pub use issues::{
    publish_top_issues, render_issue_body, GitHubIssues, IssueTracker, MAX_PUBLISHED_ISSUES,
};
pub use repo::{RepoRef, TRUSTED_HOST};
pub use review::{
    ReviewClient, ReviewIssue, ReviewProvider, ReviewReport, Severity, DEFAULT_REVIEW_MODEL,
    REQUIRED_ISSUE_COUNT,
};
pub use telemetry::init_tracing;

/// RepoDoctor version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
