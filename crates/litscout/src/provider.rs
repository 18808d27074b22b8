//! Trait seams between the discovery engine and its external collaborators.
//!
//! The engine only ever sees these traits; the concrete PubMed and Gemini
//! implementations live in [`crate::client`] and [`crate::evaluator`], and
//! tests substitute in-memory doubles.

use crate::error::{ClientResult, EvalResult};
use crate::models::{Article, Evaluation, RelationKind};

/// Identifier-keyed access to a bibliographic database.
///
/// Relation lists are returned in provider order and are not deduplicated;
/// dedup across relation kinds is the engine's responsibility.
#[async_trait::async_trait]
pub trait ArticleProvider: Send + Sync {
    /// Fetch metadata for one article.
    ///
    /// Fails with [`crate::error::ClientError::NotFound`] when the
    /// identifier does not resolve.
    async fn fetch_metadata(&self, id: &str) -> ClientResult<Article>;

    /// Fetch the abstract for one article.
    ///
    /// An empty string is a valid result, not an error.
    async fn fetch_abstract(&self, id: &str) -> ClientResult<String>;

    /// Fetch the identifiers linked to an article by the given relation.
    async fn fetch_related(&self, id: &str, kind: RelationKind) -> ClientResult<Vec<String>>;
}

/// Scores an article's text against a research theme.
///
/// No deterministic contract: two calls with identical input may yield
/// different scores, which is exactly why evaluations are cached.
#[async_trait::async_trait]
pub trait RelevanceScorer: Send + Sync {
    /// Evaluate relevance of an article (title + abstract) to the theme.
    ///
    /// Fails with [`crate::error::EvalError::EmptyInput`] when there is no
    /// text to score; callers degrade that to a zero-score evaluation.
    async fn evaluate(
        &self,
        theme: &str,
        title: &str,
        abstract_text: &str,
    ) -> EvalResult<Evaluation>;
}
