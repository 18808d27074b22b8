//! Gemini-backed relevance scoring.
//!
//! One call type: given a research theme and an article's title/abstract,
//! ask the model for a 0-100 relevance score and a short justification.
//! Scores are not deterministic across calls; reproducibility comes from the
//! project store caching them.

use regex::Regex;
use reqwest::Client;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use serde::Deserialize;
use serde_json::json;

use crate::config::{Config, api};
use crate::error::{EvalError, EvalResult};
use crate::models::Evaluation;
use crate::provider::RelevanceScorer;

/// Score used when the model reply carries no parseable score line.
const FALLBACK_SCORE: u8 = 50;

/// Relevance scorer backed by the Gemini generateContent API.
pub struct GeminiScorer {
    client: ClientWithMiddleware,
    api_key: Option<String>,
    model: String,
    base_url: String,
    score_re: Regex,
    reasoning_re: Regex,
}

impl GeminiScorer {
    /// Create a new scorer.
    ///
    /// # Errors
    ///
    /// Returns error if HTTP client initialization fails.
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(config.eval_timeout)
            .connect_timeout(config.connect_timeout)
            .gzip(true)
            .build()?;

        let retry_policy = ExponentialBackoff::builder()
            .retry_bounds(api::RETRY_MIN, api::RETRY_MAX)
            .build_with_max_retries(config.max_retries);

        let client = ClientBuilder::new(client)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Ok(Self {
            client,
            api_key: config.gemini_api_key.clone(),
            model: config.gemini_model.clone(),
            base_url: config.gemini_base_url.clone(),
            score_re: Regex::new(r"(?i)score[:\s]*(\d{1,3})").expect("valid score regex"),
            reasoning_re: Regex::new(r"(?is)reasoning[:\s]*(.+?)(?:\n\n|\z)")
                .expect("valid reasoning regex"),
        })
    }

    /// Build the evaluation prompt.
    fn prompt(theme: &str, title: &str, abstract_text: &str) -> String {
        let abstract_block = if abstract_text.is_empty() {
            format!("(No abstract is available. Evaluate from the title alone: {title})")
        } else {
            abstract_text.to_string()
        };

        format!(
            "You are an expert in academic research. Rate how well the following \
             article matches what the user is looking for.\n\n\
             [What the user is looking for]\n{theme}\n\n\
             [Article under evaluation]\n\
             Title: {title}\n\n\
             Abstract:\n{abstract_block}\n\n\
             [Scoring guide]\n\
             - Rate the match on a 0-100 scale\n\
             - 100: a perfect match and a highly important article\n\
             - 70-99: a strong match, clearly useful\n\
             - 40-69: a partial match\n\
             - 1-39: a weak match\n\
             - 0: unrelated\n\n\
             [Output format]\n\
             Score: [number 0-100]\n\
             Reasoning: [one or two sentences explaining the rating]\n\n\
             Begin the evaluation."
        )
    }

    /// Extract a score and justification from the model reply.
    ///
    /// Missing score lines fall back to a neutral 50; out-of-range scores
    /// are clamped to 100.
    fn parse_reply(&self, text: &str) -> (u8, String) {
        let score = self
            .score_re
            .captures(text)
            .and_then(|c| c[1].parse::<u32>().ok())
            .map_or(FALLBACK_SCORE, |s| s.min(100) as u8);

        let reasoning = self
            .reasoning_re
            .captures(text)
            .map(|c| c[1].trim().to_string())
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| "No reasoning returned by the scorer.".to_string());

        (score, reasoning)
    }
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Default, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[async_trait::async_trait]
impl RelevanceScorer for GeminiScorer {
    async fn evaluate(
        &self,
        theme: &str,
        title: &str,
        abstract_text: &str,
    ) -> EvalResult<Evaluation> {
        if title.is_empty() && abstract_text.is_empty() {
            return Err(EvalError::EmptyInput);
        }

        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let body = json!({
            "contents": [{
                "parts": [{"text": Self::prompt(theme, title, abstract_text)}]
            }]
        });

        let mut request = self.client.post(&url).json(&body);
        if let Some(ref key) = self.api_key {
            request = request.query(&[("key", key.as_str())]);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(EvalError::server(status.as_u16(), text));
        }

        let reply: GenerateResponse = serde_json::from_str(&response.text().await?)?;
        let text = reply
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|c| c.parts.into_iter().next())
            .map(|p| p.text)
            .filter(|t| !t.is_empty())
            .ok_or(EvalError::EmptyResponse)?;

        let (score, reasoning) = self.parse_reply(&text);
        Ok(Evaluation::new(score, reasoning))
    }
}

impl std::fmt::Debug for GeminiScorer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiScorer")
            .field("model", &self.model)
            .field("has_api_key", &self.api_key.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scorer() -> GeminiScorer {
        GeminiScorer::new(&Config::for_testing("http://127.0.0.1:0")).unwrap()
    }

    #[test]
    fn test_parse_reply_standard() {
        let (score, reasoning) =
            scorer().parse_reply("Score: 85\nReasoning: Directly addresses the theme.");
        assert_eq!(score, 85);
        assert_eq!(reasoning, "Directly addresses the theme.");
    }

    #[test]
    fn test_parse_reply_clamps_overflow() {
        let (score, _) = scorer().parse_reply("Score: 150\nReasoning: enthusiastic model");
        assert_eq!(score, 100);
    }

    #[test]
    fn test_parse_reply_missing_score_defaults() {
        let (score, reasoning) = scorer().parse_reply("The article seems relevant.");
        assert_eq!(score, FALLBACK_SCORE);
        assert_eq!(reasoning, "No reasoning returned by the scorer.");
    }

    #[test]
    fn test_parse_reply_case_insensitive() {
        let (score, reasoning) = scorer().parse_reply("SCORE: 0\nREASONING: Unrelated field.");
        assert_eq!(score, 0);
        assert_eq!(reasoning, "Unrelated field.");
    }

    #[test]
    fn test_prompt_title_only_fallback() {
        let prompt = GeminiScorer::prompt("theme", "Some Title", "");
        assert!(prompt.contains("No abstract is available"));
        assert!(prompt.contains("Some Title"));
    }

    #[tokio::test]
    async fn test_empty_input_rejected_before_network() {
        let result = scorer().evaluate("theme", "", "").await;
        assert!(matches!(result, Err(EvalError::EmptyInput)));
    }
}
