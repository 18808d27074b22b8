//! Article and evaluation models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Bibliographic metadata for a single article.
///
/// Immutable once fetched within a run. An empty `abstract_text` is a valid
/// value (many older records have no abstract), never a missing-field
/// condition.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Article {
    /// Stable external identifier (PMID).
    pub id: String,

    /// Article title.
    #[serde(default)]
    pub title: String,

    /// Abstract text; empty when unavailable.
    #[serde(default)]
    pub abstract_text: String,

    /// Publication year.
    #[serde(default)]
    pub year: Option<i32>,

    /// Author names, in publication order.
    #[serde(default)]
    pub authors: Vec<String>,

    /// Source venue (journal name).
    #[serde(default)]
    pub venue: String,

    /// Canonical URL for the article.
    #[serde(default)]
    pub url: String,
}

impl Article {
    /// Placeholder for an article whose metadata could not be fetched.
    #[must_use]
    pub fn placeholder(id: impl Into<String>) -> Self {
        let id = id.into();
        let url = format!("https://pubmed.ncbi.nlm.nih.gov/{id}/");
        Self { id, url, ..Self::default() }
    }

    /// Whether there is any text (title or abstract) to evaluate.
    #[must_use]
    pub fn has_text(&self) -> bool {
        !self.title.is_empty() || !self.abstract_text.is_empty()
    }

    /// Author names as a comma-separated string, truncated to three plus
    /// "et al." for longer lists.
    #[must_use]
    pub fn author_line(&self) -> String {
        if self.authors.len() > 3 {
            let mut names: Vec<&str> = self.authors.iter().take(3).map(String::as_str).collect();
            names.push("et al.");
            names.join(", ")
        } else {
            self.authors.join(", ")
        }
    }
}

/// The result of scoring one article against a research theme.
///
/// Produced at most once per article per project; reused across runs through
/// the project store. The score is cache-truth; the relevance flag is never
/// part of this record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Evaluation {
    /// Relevance score on a fixed 0-100 scale.
    pub score: u8,

    /// Free-text justification from the scorer.
    pub justification: String,

    /// When the evaluation was produced.
    pub evaluated_at: DateTime<Utc>,
}

impl Evaluation {
    /// Create an evaluation stamped with the current time.
    #[must_use]
    pub fn new(score: u8, justification: impl Into<String>) -> Self {
        Self { score, justification: justification.into(), evaluated_at: Utc::now() }
    }

    /// Degraded zero-score evaluation used when scoring was impossible.
    #[must_use]
    pub fn degraded(reason: impl Into<String>) -> Self {
        Self::new(0, reason)
    }

    /// Whether the score clears the given admissibility threshold.
    ///
    /// Always computed against the threshold of the current run, so changing
    /// the threshold reclassifies cached articles without new scorer calls.
    #[must_use]
    pub const fn is_relevant(&self, threshold: u8) -> bool {
        self.score >= threshold
    }
}

/// Which relation list produced an article during traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    /// PubMed similar-articles link.
    Similar,
    /// Articles citing this one.
    CitedBy,
    /// Articles this one cites.
    References,
}

impl RelationKind {
    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Similar => "similar",
            Self::CitedBy => "cited_by",
            Self::References => "references",
        }
    }
}

/// A cached article together with its evaluation and traversal bookkeeping.
///
/// This is the unit the project store persists. `is_relevant` is deliberately
/// absent: it is derived from `evaluation.score` and the threshold of
/// whichever run is reading the record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleRecord {
    /// Article metadata.
    pub article: Article,

    /// Cached evaluation.
    pub evaluation: Evaluation,

    /// Depth at which the article was first reached (0 = seed).
    #[serde(default)]
    pub depth: u32,

    /// Identifier of the article whose relation list produced this one.
    #[serde(default)]
    pub parent: Option<String>,

    /// Relation that produced this article.
    #[serde(default)]
    pub relation: Option<RelationKind>,

    /// Search session that first evaluated this article.
    #[serde(default)]
    pub session: Option<String>,
}

impl ArticleRecord {
    /// The article identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.article.id
    }
}
