//! Repository reference parsing.
//!
//! A [`RepoRef`] is a validated (owner, name) pair derived from a GitHub
//! URL. Validation happens once, at the boundary; every later stage can
//! rely on the pair being well formed.

use serde::{Deserialize, Serialize};

use crate::error::RepoUrlError;

/// Host this service trusts as the repository origin.
pub const TRUSTED_HOST: &str = "github.com";

/// A host-qualified repository reference.
///
/// Accepts the forms:
/// - `https://github.com/owner/repo`
/// - `https://github.com/owner/repo/`
/// - `https://github.com/owner/repo.git`
///
/// All three parse to the same (owner, name) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoRef {
    pub owner: String,
    pub name: String,
}

impl RepoRef {
    /// Parse and validate a repository URL.
    pub fn parse(url: &str) -> Result<Self, RepoUrlError> {
        let trimmed = url.trim();
        let rest = trimmed
            .strip_prefix("https://")
            .or_else(|| trimmed.strip_prefix("http://"))
            .unwrap_or(trimmed);

        let (host, path) = rest.split_once('/').unwrap_or((rest, ""));
        if !host.eq_ignore_ascii_case(TRUSTED_HOST) {
            return Err(RepoUrlError::UntrustedHost {
                host: host.to_string(),
            });
        }

        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        if segments.len() < 2 {
            return Err(RepoUrlError::MalformedPath {
                path: format!("/{path}"),
            });
        }

        let owner = segments[0].to_string();
        let name = segments[1].trim_end_matches(".git").to_string();
        if owner.is_empty() || name.is_empty() {
            return Err(RepoUrlError::MalformedPath {
                path: format!("/{path}"),
            });
        }

        Ok(RepoRef { owner, name })
    }

    /// Directory-safe name for the checkout, e.g. `owner__repo`.
    pub fn dir_name(&self) -> String {
        format!("{}__{}", self.owner, self.name)
    }

    /// Issue-creation endpoint on the tracker API.
    pub fn issues_api_url(&self) -> String {
        format!(
            "https://api.github.com/repos/{}/{}/issues",
            self.owner, self.name
        )
    }
}

impl std::fmt::Display for RepoRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_url_parses() {
        let r = RepoRef::parse("https://github.com/tokio-rs/tokio").unwrap();
        assert_eq!(r.owner, "tokio-rs");
        assert_eq!(r.name, "tokio");
    }

    #[test]
    fn trailing_slash_and_git_suffix_parse_to_same_pair() {
        let plain = RepoRef::parse("https://github.com/owner/repo").unwrap();
        let slash = RepoRef::parse("https://github.com/owner/repo/").unwrap();
        let git = RepoRef::parse("https://github.com/owner/repo.git").unwrap();
        assert_eq!(plain, slash);
        assert_eq!(plain, git);
    }

    #[test]
    fn surrounding_whitespace_is_tolerated() {
        let r = RepoRef::parse("  https://github.com/owner/repo\n").unwrap();
        assert_eq!(r.to_string(), "owner/repo");
    }

    #[test]
    fn non_github_host_is_rejected() {
        let err = RepoRef::parse("https://gitlab.com/owner/repo").unwrap_err();
        assert!(matches!(err, RepoUrlError::UntrustedHost { .. }));
    }

    #[test]
    fn single_segment_path_is_rejected() {
        let err = RepoRef::parse("https://github.com/onlyowner").unwrap_err();
        assert!(matches!(err, RepoUrlError::MalformedPath { .. }));
    }

    #[test]
    fn empty_path_is_rejected() {
        assert!(RepoRef::parse("https://github.com/").is_err());
        assert!(RepoRef::parse("https://github.com").is_err());
    }

    #[test]
    fn dir_name_is_filesystem_safe() {
        let r = RepoRef::parse("https://github.com/owner/repo").unwrap();
        assert_eq!(r.dir_name(), "owner__repo");
        assert!(!r.dir_name().contains('/'));
    }

    #[test]
    fn issues_api_url_targets_the_repo() {
        let r = RepoRef::parse("https://github.com/owner/repo.git").unwrap();
        assert_eq!(
            r.issues_api_url(),
            "https://api.github.com/repos/owner/repo/issues"
        );
    }
}
