//! PubMed E-utilities client.
//!
//! Wraps esummary (metadata), efetch (abstracts), and elink (similar /
//! cited-by / reference links) behind the [`ArticleProvider`] trait, with:
//! - Connection pooling via reqwest
//! - Retry middleware with exponential backoff
//! - A shared [`RateLimiter`] acquired before every network call

mod wire;

use std::sync::Arc;

use regex::Regex;
use reqwest::Client;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use url::Url;

use crate::config::{Config, api};
use crate::error::{ClientError, ClientResult};
use crate::limiter::RateLimiter;
use crate::models::{Article, RelationKind};
use crate::provider::ArticleProvider;

/// Extract a PMID from raw user input.
///
/// Accepts a bare numeric id, a pubmed.ncbi.nlm.nih.gov URL with the id in
/// the path, or a URL with an `id` query parameter.
#[must_use]
pub fn extract_pmid(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if !trimmed.is_empty() && trimmed.chars().all(|c| c.is_ascii_digit()) {
        return Some(trimmed.to_string());
    }

    let parsed = Url::parse(trimmed).ok()?;

    if let Some(segment) =
        parsed.path_segments().and_then(|mut s| s.find(|seg| seg.chars().all(|c| c.is_ascii_digit()) && !seg.is_empty()))
    {
        return Some(segment.to_string());
    }

    parsed
        .query_pairs()
        .find(|(k, _)| k == "id")
        .map(|(_, v)| v.into_owned())
}

/// PubMed E-utilities API client.
#[derive(Clone)]
pub struct EntrezClient {
    /// HTTP client with retry middleware.
    client: ClientWithMiddleware,

    /// Shared rate limiter, one per target provider.
    limiter: Arc<RateLimiter>,

    /// NCBI API key (optional).
    api_key: Option<String>,

    /// E-utilities base URL.
    base_url: String,

    /// `<AbstractText>` extraction.
    abstract_re: Regex,

    /// `<OtherAbstract>` fallback extraction.
    other_abstract_re: Regex,

    /// First four-digit year in a pubdate string.
    year_re: Regex,
}

impl EntrezClient {
    /// Create a new client sharing the given rate limiter.
    ///
    /// # Errors
    ///
    /// Returns error if HTTP client initialization fails.
    pub fn new(config: &Config, limiter: Arc<RateLimiter>) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
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
            limiter,
            api_key: config.ncbi_api_key.clone(),
            base_url: config.entrez_base_url.clone(),
            abstract_re: Regex::new(r"(?s)<AbstractText[^>]*>(.*?)</AbstractText>")
                .expect("valid abstract regex"),
            other_abstract_re: Regex::new(r"(?s)<OtherAbstract[^>]*>(.*?)</OtherAbstract>")
                .expect("valid other-abstract regex"),
            year_re: Regex::new(r"(\d{4})").expect("valid year regex"),
        })
    }

    /// Check if an API key is configured.
    #[must_use]
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    fn params(&self, base: Vec<(String, String)>) -> Vec<(String, String)> {
        let mut params = base;
        if let Some(ref key) = self.api_key {
            params.push(("api_key".to_string(), key.clone()));
        }
        params
    }

    /// Make a rate-limited GET request and return the raw response.
    async fn get(&self, endpoint: &str, params: &[(String, String)]) -> ClientResult<reqwest::Response> {
        self.limiter.acquire().await;

        let url = format!("{}/{}", self.base_url, endpoint);
        let response = self.client.get(&url).query(params).send().await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        match status.as_u16() {
            404 => {
                let text = response.text().await.unwrap_or_default();
                Err(ClientError::not_found(text))
            }
            500..=599 => {
                let text = response.text().await.unwrap_or_default();
                Err(ClientError::server(status.as_u16(), text))
            }
            _ => {
                let text = response.text().await.unwrap_or_default();
                Err(ClientError::UnexpectedStatus { status: status.as_u16(), message: text })
            }
        }
    }

    fn extract_year(&self, pubdate: &str) -> Option<i32> {
        self.year_re.captures(pubdate).and_then(|c| c[1].parse().ok())
    }

    /// Strip common XML entities and collapse whitespace in abstract text.
    fn clean_abstract(text: &str) -> String {
        let decoded = text
            .replace("&lt;", "<")
            .replace("&gt;", ">")
            .replace("&amp;", "&")
            .replace("&quot;", "\"");
        decoded.split_whitespace().collect::<Vec<_>>().join(" ")
    }
}

#[async_trait::async_trait]
impl ArticleProvider for EntrezClient {
    async fn fetch_metadata(&self, id: &str) -> ClientResult<Article> {
        let params = self.params(vec![
            ("db".to_string(), "pubmed".to_string()),
            ("id".to_string(), id.to_string()),
            ("retmode".to_string(), "json".to_string()),
        ]);

        let response = self.get("esummary.fcgi", &params).await?;
        let body: serde_json::Value = response.json().await?;

        let summary = body
            .get("result")
            .and_then(|r| r.get(id))
            .ok_or_else(|| ClientError::not_found(id))?;

        // esummary reports unknown ids inside the entry rather than via 404.
        if summary.get("error").is_some() {
            return Err(ClientError::not_found(id));
        }

        let entry: wire::SummaryEntry = serde_json::from_value(summary.clone())?;

        Ok(Article {
            id: id.to_string(),
            title: entry.title,
            abstract_text: String::new(),
            year: self.extract_year(&entry.pubdate),
            authors: entry.authors.into_iter().map(|a| a.name).collect(),
            venue: entry.fulljournalname,
            url: format!("https://pubmed.ncbi.nlm.nih.gov/{id}/"),
        })
    }

    async fn fetch_abstract(&self, id: &str) -> ClientResult<String> {
        let params = self.params(vec![
            ("db".to_string(), "pubmed".to_string()),
            ("id".to_string(), id.to_string()),
            ("retmode".to_string(), "xml".to_string()),
        ]);

        let response = self.get("efetch.fcgi", &params).await?;
        let xml = response.text().await?;

        let sections: Vec<&str> =
            self.abstract_re.captures_iter(&xml).map(|c| c.get(1).map_or("", |m| m.as_str())).collect();

        if !sections.is_empty() {
            return Ok(Self::clean_abstract(&sections.join(" ")));
        }

        // Some records only carry an OtherAbstract block.
        for other in self.other_abstract_re.captures_iter(&xml) {
            let inner = other.get(1).map_or("", |m| m.as_str());
            let texts: Vec<&str> = self
                .abstract_re
                .captures_iter(inner)
                .map(|c| c.get(1).map_or("", |m| m.as_str()))
                .collect();
            if !texts.is_empty() {
                return Ok(Self::clean_abstract(&texts.join(" ")));
            }
        }

        // No abstract is a valid result, not an error.
        Ok(String::new())
    }

    async fn fetch_related(&self, id: &str, kind: RelationKind) -> ClientResult<Vec<String>> {
        let linkname = match kind {
            RelationKind::Similar => "pubmed_pubmed",
            RelationKind::CitedBy => "pubmed_pubmed_citedin",
            RelationKind::References => "pubmed_pubmed_refs",
        };

        let params = self.params(vec![
            ("dbfrom".to_string(), "pubmed".to_string()),
            ("id".to_string(), id.to_string()),
            ("linkname".to_string(), linkname.to_string()),
            ("retmode".to_string(), "json".to_string()),
        ]);

        let response = self.get("elink.fcgi", &params).await?;
        let body: wire::ElinkResponse = response.json().await?;

        let ids = body
            .linksets
            .into_iter()
            .flat_map(|set| set.linksetdbs)
            .find(|db| db.linkname == linkname)
            .map(|db| db.links.into_iter().map(|link| link.into_id()).collect())
            .unwrap_or_default();

        Ok(ids)
    }
}

impl std::fmt::Debug for EntrezClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntrezClient")
            .field("base_url", &self.base_url)
            .field("has_api_key", &self.has_api_key())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_pmid_bare_digits() {
        assert_eq!(extract_pmid("12345678"), Some("12345678".to_string()));
        assert_eq!(extract_pmid("  12345678  "), Some("12345678".to_string()));
    }

    #[test]
    fn test_extract_pmid_from_url_path() {
        assert_eq!(
            extract_pmid("https://pubmed.ncbi.nlm.nih.gov/12345678/"),
            Some("12345678".to_string())
        );
        assert_eq!(
            extract_pmid("https://pubmed.ncbi.nlm.nih.gov/12345678"),
            Some("12345678".to_string())
        );
    }

    #[test]
    fn test_extract_pmid_from_query_param() {
        assert_eq!(
            extract_pmid("https://www.ncbi.nlm.nih.gov/entrez?id=999"),
            Some("999".to_string())
        );
    }

    #[test]
    fn test_extract_pmid_rejects_garbage() {
        assert_eq!(extract_pmid("not a pmid"), None);
        assert_eq!(extract_pmid(""), None);
        assert_eq!(extract_pmid("https://pubmed.ncbi.nlm.nih.gov/about/"), None);
    }

    #[test]
    fn test_clean_abstract() {
        let cleaned = EntrezClient::clean_abstract("  Alpha &amp; beta\n  &lt;0.05&gt; ");
        assert_eq!(cleaned, "Alpha & beta <0.05>");
    }
}
