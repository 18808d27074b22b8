//! Configuration for litscout.

use std::path::PathBuf;
use std::time::Duration;

/// API configuration constants.
pub mod api {
    use std::time::Duration;

    /// Base URL for the PubMed E-utilities API.
    pub const ENTREZ_BASE: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils";

    /// Base URL for the Gemini generateContent API.
    pub const GEMINI_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

    /// Default Gemini model.
    pub const GEMINI_MODEL: &str = "gemini-2.0-flash";

    /// Request timeout for E-utilities calls.
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

    /// Request timeout for evaluation calls (the scorer is slow, 1-3s typical).
    pub const EVAL_TIMEOUT: Duration = Duration::from_secs(60);

    /// Connection timeout.
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

    /// Minimum interval between E-utilities requests without an API key.
    /// NCBI allows 3 req/s; 340ms keeps a safety margin.
    pub const REQUEST_DELAY: Duration = Duration::from_millis(340);

    /// Minimum interval between E-utilities requests with an API key (10 req/s).
    pub const REQUEST_DELAY_WITH_KEY: Duration = Duration::from_millis(100);

    /// Retry bounds for the transient-retry middleware.
    pub const RETRY_MIN: Duration = Duration::from_secs(1);
    /// Upper retry bound.
    pub const RETRY_MAX: Duration = Duration::from_secs(30);
    /// Maximum middleware retries per request.
    pub const MAX_RETRIES: u32 = 3;
}

/// Default traversal parameters.
pub mod defaults {
    /// Maximum traversal depth from the seed.
    pub const MAX_DEPTH: u32 = 2;

    /// Maximum number of articles visited per run.
    pub const MAX_ARTICLES: usize = 500;

    /// Relevance score cutoff (0-100); score >= threshold is relevant.
    pub const RELEVANCE_THRESHOLD: u8 = 60;

    /// Per-article cap on similar-article links followed.
    pub const MAX_SIMILAR: usize = 20;

    /// Per-article cap on cited-by links followed.
    pub const MAX_CITED_BY: usize = 20;

    /// Per-article cap on reference links followed.
    pub const MAX_REFERENCES: usize = 20;

    /// Engine-level retry budget for transient client failures.
    pub const RETRY_BUDGET: u32 = 2;

    /// Fixed backoff between engine-level retries, in milliseconds.
    pub const RETRY_BACKOFF_MS: u64 = 1000;

    /// Directory that holds project data.
    pub const PROJECTS_DIR: &str = "projects";
}

/// Runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// NCBI API key (optional, raises the E-utilities rate limit).
    pub ncbi_api_key: Option<String>,

    /// Gemini API key (required for scoring; absent only in tests).
    pub gemini_api_key: Option<String>,

    /// Gemini model name.
    pub gemini_model: String,

    /// Base URL for E-utilities (overridable for mock servers).
    pub entrez_base_url: String,

    /// Base URL for the evaluation API (overridable for mock servers).
    pub gemini_base_url: String,

    /// Request timeout for E-utilities calls.
    pub request_timeout: Duration,

    /// Request timeout for evaluation calls.
    pub eval_timeout: Duration,

    /// Connection timeout.
    pub connect_timeout: Duration,

    /// Minimum interval between E-utilities requests.
    pub request_delay: Duration,

    /// Maximum middleware retries per request.
    pub max_retries: u32,

    /// Directory that holds project data.
    pub projects_dir: PathBuf,
}

impl Config {
    /// Create a new configuration.
    ///
    /// The E-utilities request delay is adjusted based on API key presence:
    /// 340ms without a key (3 req/s), 100ms with one (10 req/s).
    #[must_use]
    pub fn new(ncbi_api_key: Option<String>, gemini_api_key: Option<String>) -> Self {
        let has_key = ncbi_api_key.is_some();
        Self {
            ncbi_api_key,
            gemini_api_key,
            gemini_model: api::GEMINI_MODEL.to_string(),
            entrez_base_url: api::ENTREZ_BASE.to_string(),
            gemini_base_url: api::GEMINI_BASE.to_string(),
            request_timeout: api::REQUEST_TIMEOUT,
            eval_timeout: api::EVAL_TIMEOUT,
            connect_timeout: api::CONNECT_TIMEOUT,
            request_delay: if has_key {
                api::REQUEST_DELAY_WITH_KEY
            } else {
                api::REQUEST_DELAY
            },
            max_retries: api::MAX_RETRIES,
            projects_dir: PathBuf::from(defaults::PROJECTS_DIR),
        }
    }

    /// Create a test configuration pointed at a mock server, with no
    /// rate-limit delay.
    #[must_use]
    pub fn for_testing(base_url: &str) -> Self {
        Self {
            ncbi_api_key: None,
            gemini_api_key: None,
            gemini_model: api::GEMINI_MODEL.to_string(),
            entrez_base_url: base_url.to_string(),
            gemini_base_url: base_url.to_string(),
            request_timeout: Duration::from_secs(5),
            eval_timeout: Duration::from_secs(5),
            connect_timeout: Duration::from_secs(2),
            request_delay: Duration::from_millis(0),
            max_retries: 0,
            projects_dir: PathBuf::from(defaults::PROJECTS_DIR),
        }
    }

    /// Create configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        let ncbi_api_key = std::env::var("NCBI_API_KEY").ok();
        let gemini_api_key = std::env::var("GEMINI_API_KEY").ok();
        let mut config = Self::new(ncbi_api_key, gemini_api_key);
        if let Ok(model) = std::env::var("GEMINI_MODEL") {
            config.gemini_model = model;
        }
        config
    }

    /// Check if an NCBI API key is configured.
    #[must_use]
    pub const fn has_ncbi_key(&self) -> bool {
        self.ncbi_api_key.is_some()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(None, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert!(!config.has_ncbi_key());
        assert_eq!(config.request_delay, api::REQUEST_DELAY);
    }

    #[test]
    fn test_config_key_raises_rate_limit() {
        let config = Config::new(Some("test-key".to_string()), None);
        assert!(config.has_ncbi_key());
        assert_eq!(config.request_delay, api::REQUEST_DELAY_WITH_KEY);
    }

    #[test]
    fn test_config_for_testing_has_no_delay() {
        let config = Config::for_testing("http://127.0.0.1:1234");
        assert_eq!(config.request_delay, Duration::from_millis(0));
        assert_eq!(config.entrez_base_url, "http://127.0.0.1:1234");
    }
}
