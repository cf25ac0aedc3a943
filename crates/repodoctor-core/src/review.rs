//! Schema-constrained AI review of an evidence set.
//!
//! The model is asked for exactly five issues, each with evidence and a
//! fix, as provider-validated structured output. Anything that deviates
//! from the declared shape is rejected at this boundary — partially valid
//! provider output is never trusted.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::ModelError;
use crate::evidence::{truncate_chars, EvidenceSet};

/// Default review model.
pub const DEFAULT_REVIEW_MODEL: &str = "gpt-4o-mini";

/// Default API base URL.
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Ceiling on a single model call.
pub const REVIEW_TIMEOUT_SECS: u64 = 60;

/// The review must contain exactly this many issues.
pub const REQUIRED_ISSUE_COUNT: usize = 5;

/// File-tree entries included in the prompt payload.
const FILE_TREE_PROMPT_LIMIT: usize = 200;

/// Per-key-file character cap in the prompt payload. Applied even to
/// already-truncated extractor output.
const KEY_FILE_PROMPT_CHARS: usize = 4000;

const SYSTEM_PROMPT: &str = "\
You are RepoDoctor, a strict senior engineer.

Rules:
- Use ONLY the provided file tree + key file contents as evidence.
- If you can't verify something from the provided data, do NOT claim it.
- Produce EXACTLY 5 issues in top_5.
- Every issue must include evidence (file path + short snippet or concrete clue).
- Every issue must include a concrete fix (specific steps or edits).

Return ONLY valid JSON matching the schema. No markdown.
";

/// Issue severity, ordered `low < medium < high < critical`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        };
        write!(f, "{s}")
    }
}

/// One reviewed issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReviewIssue {
    pub title: String,
    pub severity: Severity,
    pub evidence: String,
    pub fix: String,
}

/// The full structured review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReviewReport {
    pub one_liner: String,
    pub top_5: Vec<ReviewIssue>,
    pub next_7_days_plan: Vec<String>,
}

impl ReviewReport {
    /// Enforce the shape contract the schema promises.
    ///
    /// The provider validates against the schema before returning, but the
    /// five-item pin and non-empty fields are re-checked here so a
    /// misbehaving provider cannot slip degenerate output through.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.top_5.len() != REQUIRED_ISSUE_COUNT {
            return Err(ModelError::SchemaViolation(format!(
                "expected exactly {REQUIRED_ISSUE_COUNT} issues, got {}",
                self.top_5.len()
            )));
        }
        for (i, issue) in self.top_5.iter().enumerate() {
            if issue.title.trim().is_empty()
                || issue.evidence.trim().is_empty()
                || issue.fix.trim().is_empty()
            {
                return Err(ModelError::SchemaViolation(format!(
                    "issue {i} has an empty title, evidence or fix"
                )));
            }
        }
        Ok(())
    }
}

/// JSON Schema the provider enforces on the review output.
fn review_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "additionalProperties": false,
        "properties": {
            "one_liner": { "type": "string" },
            "top_5": {
                "type": "array",
                "minItems": REQUIRED_ISSUE_COUNT,
                "maxItems": REQUIRED_ISSUE_COUNT,
                "items": {
                    "type": "object",
                    "additionalProperties": false,
                    "properties": {
                        "title": { "type": "string" },
                        "severity": {
                            "type": "string",
                            "enum": ["critical", "high", "medium", "low"]
                        },
                        "evidence": { "type": "string" },
                        "fix": { "type": "string" }
                    },
                    "required": ["title", "severity", "evidence", "fix"]
                }
            },
            "next_7_days_plan": {
                "type": "array",
                "items": { "type": "string" }
            }
        },
        "required": ["one_liner", "top_5", "next_7_days_plan"]
    })
}

/// Build the bounded user payload sent alongside the system prompt.
fn build_payload(repo_url: &str, evidence: &EvidenceSet) -> serde_json::Value {
    let file_tree = evidence
        .files
        .iter()
        .take(FILE_TREE_PROMPT_LIMIT)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join("\n");

    let key_files: BTreeMap<&str, String> = evidence
        .key_files
        .iter()
        .map(|(name, content)| {
            (
                name.as_str(),
                truncate_chars(content.as_str(), KEY_FILE_PROMPT_CHARS),
            )
        })
        .collect();

    json!({
        "repo_url": repo_url,
        "file_tree": file_tree,
        "key_files": key_files,
    })
}

/// Asks the external model for a structured review.
#[async_trait]
pub trait ReviewProvider: Send + Sync {
    /// Single attempt, no retry; the caller decides how to degrade.
    async fn review(&self, repo_url: &str, evidence: &EvidenceSet)
        -> Result<ReviewReport, ModelError>;
}

/// Production reviewer backed by the OpenAI chat-completions API.
#[derive(Debug, Clone)]
pub struct ReviewClient {
    api_key: Option<String>,
    model: String,
    base_url: String,
    client: reqwest::Client,
}

impl ReviewClient {
    /// Create a reviewer. A missing key is legal at construction time and
    /// only fails the individual review call, so the rest of the pipeline
    /// keeps working without credentials.
    pub fn new(api_key: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(concat!("repodoctor/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(REVIEW_TIMEOUT_SECS))
            .build()
            .expect("failed to create HTTP client");

        ReviewClient {
            api_key,
            model: DEFAULT_REVIEW_MODEL.to_string(),
            base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            client,
        }
    }

    /// Set the model to use.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the base URL for API requests.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    response_format: serde_json::Value,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

#[async_trait]
impl ReviewProvider for ReviewClient {
    async fn review(
        &self,
        repo_url: &str,
        evidence: &EvidenceSet,
    ) -> Result<ReviewReport, ModelError> {
        let api_key = self.api_key.as_deref().ok_or(ModelError::MissingApiKey)?;

        let payload = build_payload(repo_url, evidence);
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: payload.to_string(),
                },
            ],
            response_format: json!({
                "type": "json_schema",
                "json_schema": {
                    "name": "repo_review",
                    "schema": review_schema(),
                    "strict": true
                }
            }),
        };

        let url = format!("{}/chat/completions", self.base_url);
        tracing::debug!(model = %self.model, %repo_url, "requesting AI review");

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ModelError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ModelError::Api {
                status: status.as_u16(),
                body: truncate_chars(&body, 300),
            });
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| ModelError::Http(format!("undecodable completion envelope: {e}")))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| ModelError::SchemaViolation("completion had no choices".to_string()))?;

        let report: ReviewReport = serde_json::from_str(&content)
            .map_err(|e| ModelError::SchemaViolation(e.to_string()))?;
        report.validate()?;
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evidence::KeyFile;

    fn issue(title: &str) -> ReviewIssue {
        ReviewIssue {
            title: title.to_string(),
            severity: Severity::Medium,
            evidence: "README.md: no install section".to_string(),
            fix: "Document the install steps.".to_string(),
        }
    }

    fn valid_report() -> ReviewReport {
        ReviewReport {
            one_liner: "Solid core, rough edges.".to_string(),
            top_5: (0..5).map(|i| issue(&format!("issue {i}"))).collect(),
            next_7_days_plan: vec!["Add CI".to_string()],
        }
    }

    #[test]
    fn severity_orders_critical_highest() {
        assert!(Severity::Critical > Severity::High);
        assert!(Severity::High > Severity::Medium);
        assert!(Severity::Medium > Severity::Low);
    }

    #[test]
    fn severity_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&Severity::Critical).unwrap(),
            "\"critical\""
        );
        let s: Severity = serde_json::from_str("\"high\"").unwrap();
        assert_eq!(s, Severity::High);
    }

    #[test]
    fn unknown_severity_is_rejected() {
        assert!(serde_json::from_str::<Severity>("\"blocker\"").is_err());
    }

    #[test]
    fn valid_report_passes_validation() {
        assert!(valid_report().validate().is_ok());
    }

    #[test]
    fn wrong_issue_count_is_a_schema_violation() {
        let mut report = valid_report();
        report.top_5.pop();
        let err = report.validate().unwrap_err();
        assert!(matches!(err, ModelError::SchemaViolation(_)));
        assert!(err.to_string().contains("got 4"));
    }

    #[test]
    fn empty_fix_is_a_schema_violation() {
        let mut report = valid_report();
        report.top_5[2].fix = "   ".to_string();
        let err = report.validate().unwrap_err();
        assert!(err.to_string().contains("issue 2"));
    }

    #[test]
    fn unknown_fields_are_rejected_on_decode() {
        let json = r#"{
            "one_liner": "ok",
            "top_5": [],
            "next_7_days_plan": [],
            "extra": true
        }"#;
        assert!(serde_json::from_str::<ReviewReport>(json).is_err());
    }

    #[test]
    fn issue_with_missing_field_is_rejected_on_decode() {
        let json = r#"{"title": "t", "severity": "low", "evidence": "e"}"#;
        assert!(serde_json::from_str::<ReviewIssue>(json).is_err());
    }

    #[test]
    fn payload_bounds_file_tree_and_key_files() {
        let mut evidence = EvidenceSet {
            files: (0..300).map(|i| format!("f{i}.rs")).collect(),
            ..Default::default()
        };
        evidence
            .key_files
            .insert("README.md".to_string(), KeyFile::Text("x".repeat(6000)));
        evidence
            .key_files
            .insert(".github".to_string(), KeyFile::Directory);

        let payload = build_payload("https://github.com/o/r", &evidence);

        let tree = payload["file_tree"].as_str().unwrap();
        assert_eq!(tree.lines().count(), 200);
        assert_eq!(
            payload["key_files"]["README.md"].as_str().unwrap().len(),
            4000
        );
        assert_eq!(
            payload["key_files"][".github"].as_str().unwrap(),
            "DIRECTORY_PRESENT"
        );
    }

    #[test]
    fn schema_pins_exactly_five_items() {
        let schema = review_schema();
        assert_eq!(schema["properties"]["top_5"]["minItems"], 5);
        assert_eq!(schema["properties"]["top_5"]["maxItems"], 5);
        assert_eq!(schema["additionalProperties"], false);
        assert_eq!(
            schema["properties"]["top_5"]["items"]["additionalProperties"],
            false
        );
    }

    #[tokio::test]
    async fn client_without_key_fails_with_missing_key() {
        let client = ReviewClient::new(None);
        let evidence = EvidenceSet::default();
        let err = client
            .review("https://github.com/o/r", &evidence)
            .await
            .unwrap_err();
        assert!(matches!(err, ModelError::MissingApiKey));
    }
}
