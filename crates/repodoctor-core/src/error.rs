//! Error taxonomy for the RepoDoctor pipeline.
//!
//! Each pipeline stage owns a dedicated error enum so that callers can tell
//! which failures abort a request (`AnalyzeError`) and which are contained
//! to a single stage (`ModelError`, which never escapes the analyzer).

/// Errors produced by repository URL validation.
#[derive(Debug, thiserror::Error)]
pub enum RepoUrlError {
    #[error("repo URL must be a github.com URL, got host: {host}")]
    UntrustedHost { host: String },

    #[error("repo URL must look like https://github.com/owner/repo, got path: {path}")]
    MalformedPath { path: String },
}

/// Errors produced while acquiring a repository checkout.
#[derive(Debug, thiserror::Error)]
pub enum AcquisitionError {
    #[error("failed to run git: {0}")]
    GitUnavailable(String),

    #[error("git clone failed: {stderr}")]
    CloneFailed { stderr: String },

    #[error("git clone timed out after {0}s")]
    Timeout(u64),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors produced by the schema-constrained model call.
///
/// These are always contained to the review step: the analyzer records the
/// message in its diagnostics block instead of failing the request.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("OPENAI_API_KEY missing; set it in the environment or .env")]
    MissingApiKey,

    #[error("model request failed: {0}")]
    Http(String),

    #[error("model API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("model output violated the review schema: {0}")]
    SchemaViolation(String),
}

/// Errors produced by a single issue-tracker write.
#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    #[error("issue tracker request failed: {0}")]
    Http(String),

    #[error("issue tracker error {status}: {body}")]
    Api { status: u16, body: String },
}

/// Errors produced by a publish batch.
///
/// The batch stops at the first tracker failure. Issues created before the
/// failure are not rolled back; their URLs are carried on the error so the
/// caller can report partial success.
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("{source} (created {} issue(s) before the failure)", .created.len())]
    Tracker {
        #[source]
        source: TrackerError,
        created: Vec<String>,
    },
}

impl PublishError {
    /// Issue URLs created before the batch aborted.
    pub fn created(&self) -> &[String] {
        match self {
            PublishError::Tracker { created, .. } => created,
        }
    }
}

/// The only errors the analyze entry point can return.
///
/// Review failures are deliberately absent: they degrade the result instead
/// of aborting it.
#[derive(Debug, thiserror::Error)]
pub enum AnalyzeError {
    #[error("invalid repo URL: {0}")]
    InvalidUrl(#[from] RepoUrlError),

    #[error("repository acquisition failed: {0}")]
    Acquisition(#[from] AcquisitionError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for analyzer operations.
pub type Result<T> = std::result::Result<T, AnalyzeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repo_url_error_display() {
        let err = RepoUrlError::UntrustedHost {
            host: "gitlab.com".to_string(),
        };
        assert!(err.to_string().contains("github.com"));
        assert!(err.to_string().contains("gitlab.com"));

        let err = RepoUrlError::MalformedPath {
            path: "/onlyowner".to_string(),
        };
        assert!(err.to_string().contains("owner/repo"));
    }

    #[test]
    fn test_model_error_display() {
        let err = ModelError::Api {
            status: 429,
            body: "rate limited".to_string(),
        };
        assert!(err.to_string().contains("429"));
        assert!(err.to_string().contains("rate limited"));

        let err = ModelError::SchemaViolation("expected 5 issues, got 3".to_string());
        assert!(err.to_string().contains("expected 5 issues"));
    }

    #[test]
    fn test_publish_error_carries_partial_success() {
        let err = PublishError::Tracker {
            source: TrackerError::Api {
                status: 403,
                body: "forbidden".to_string(),
            },
            created: vec!["https://github.com/o/r/issues/1".to_string()],
        };
        assert_eq!(err.created().len(), 1);
        assert!(err.to_string().contains("created 1 issue(s)"));
    }

    #[test]
    fn test_analyze_error_from_acquisition() {
        let err: AnalyzeError = AcquisitionError::Timeout(60).into();
        assert!(err.to_string().contains("acquisition failed"));
        assert!(err.to_string().contains("60s"));
    }
}
