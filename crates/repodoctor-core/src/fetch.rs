//! Repository acquisition via shallow git clone.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use crate::error::AcquisitionError;

/// Ceiling on a single checkout, so a stalled remote cannot hang a request.
pub const CLONE_TIMEOUT_SECS: u64 = 60;

/// Produces a local checkout of a remote repository.
#[async_trait]
pub trait RepoFetcher: Send + Sync {
    /// Populate `dest` with a shallow (depth-1) checkout of `url`.
    async fn fetch(&self, url: &str, dest: &Path) -> Result<(), AcquisitionError>;
}

/// Fetcher that shells out to the `git` binary.
#[derive(Debug, Clone)]
pub struct GitCloneFetcher {
    timeout_secs: u64,
}

impl Default for GitCloneFetcher {
    fn default() -> Self {
        GitCloneFetcher {
            timeout_secs: CLONE_TIMEOUT_SECS,
        }
    }
}

impl GitCloneFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the clone timeout (mainly for tests).
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

#[async_trait]
impl RepoFetcher for GitCloneFetcher {
    async fn fetch(&self, url: &str, dest: &Path) -> Result<(), AcquisitionError> {
        let clone = Command::new("git")
            .args(["clone", "--depth", "1"])
            .arg(url)
            .arg(dest)
            // Fail fast instead of prompting for credentials.
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output();

        let output = tokio::time::timeout(Duration::from_secs(self.timeout_secs), clone)
            .await
            .map_err(|_| AcquisitionError::Timeout(self.timeout_secs))?
            .map_err(|e| AcquisitionError::GitUnavailable(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(AcquisitionError::CloneFailed { stderr });
        }

        Ok(())
    }
}
