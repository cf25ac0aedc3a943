//! Rule-based findings derived from the evidence set alone.
//!
//! Every rule is a presence/absence or threshold check — no I/O, no model.
//! Rule order is fixed and observable: callers and tests may assert the
//! exact sequence of entries.

use serde::{Deserialize, Serialize};

use crate::evidence::EvidenceSet;

/// Sampled-file count above which a repo counts as "large".
pub const LARGE_REPO_THRESHOLD: usize = 180;

/// Output of the heuristic scan, split by tone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeuristicFindings {
    pub findings: Vec<String>,
    pub quick_wins: Vec<String>,
    pub risks: Vec<String>,
}

/// Run all heuristic rules over an evidence set.
///
/// Rules are independent; toggling one key file changes at most one entry.
pub fn scan(evidence: &EvidenceSet) -> HeuristicFindings {
    let mut out = HeuristicFindings::default();

    if !evidence.has_key_file("README.md") {
        out.quick_wins
            .push("Add a README.md with setup and usage instructions.".to_string());
    }
    if !evidence.has_key_file(".env.example") {
        out.quick_wins
            .push("Add a .env.example for environment variables.".to_string());
    }
    if !evidence.has_key_file("Dockerfile") {
        out.quick_wins
            .push("Add a Dockerfile for reproducible builds.".to_string());
    }

    if !evidence.has_key_file("LICENSE") {
        out.risks.push("No LICENSE file found.".to_string());
    }
    if !evidence
        .files
        .iter()
        .any(|f| f.to_lowercase().contains("test"))
    {
        out.risks.push("No obvious tests detected.".to_string());
    }

    if evidence.files.len() > LARGE_REPO_THRESHOLD {
        out.findings
            .push("Large repo: consider adding docs/architecture.md.".to_string());
    }

    out
}
