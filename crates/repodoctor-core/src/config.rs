//! Process-wide configuration.
//!
//! Credentials and endpoints are read from the environment exactly once at
//! startup and injected into the components that need them, so the review
//! and publish paths stay testable with fake credentials.

use serde::Serialize;

use crate::review::{ReviewClient, DEFAULT_OPENAI_BASE_URL, DEFAULT_REVIEW_MODEL};

/// RepoDoctor configuration.
///
/// The API key is optional by design: without it the analyze pipeline still
/// runs and only the AI review degrades.
#[derive(Debug, Clone, Serialize)]
pub struct RepoDoctorConfig {
    /// Model-provider API key. Never logged.
    #[serde(skip_serializing)]
    pub openai_api_key: Option<String>,
    /// Review model name.
    pub model: String,
    /// Model-provider base URL.
    pub openai_base_url: String,
    /// Daemon listen address.
    pub bind_addr: String,
}

impl Default for RepoDoctorConfig {
    fn default() -> Self {
        RepoDoctorConfig {
            openai_api_key: None,
            model: DEFAULT_REVIEW_MODEL.to_string(),
            openai_base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            bind_addr: "127.0.0.1:8000".to_string(),
        }
    }
}

impl RepoDoctorConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        RepoDoctorConfig {
            openai_api_key: std::env::var("OPENAI_API_KEY").ok().filter(|k| !k.is_empty()),
            model: std::env::var("REPODOCTOR_MODEL").unwrap_or(defaults.model),
            openai_base_url: std::env::var("OPENAI_BASE_URL").unwrap_or(defaults.openai_base_url),
            bind_addr: std::env::var("REPODOCTOR_BIND").unwrap_or(defaults.bind_addr),
        }
    }

    /// Set the API key.
    pub fn with_api_key(mut self, key: &str) -> Self {
        self.openai_api_key = Some(key.to_string());
        self
    }

    /// Build the production review client for this configuration.
    pub fn review_client(&self) -> ReviewClient {
        ReviewClient::new(self.openai_api_key.clone())
            .with_model(&self.model)
            .with_base_url(&self.openai_base_url)
    }
}
