//! Per-run result records emitted by the discovery engine.

use serde::Serialize;

use super::{Article, RelationKind};

/// One visited article, as emitted to the consumer while a run progresses.
///
/// Unlike [`super::ArticleRecord`], a hit carries the relevance flag: it is
/// recomputed from the current run's threshold at emission time, for cache
/// hits and fresh evaluations alike.
#[derive(Debug, Clone, Serialize)]
pub struct ArticleHit {
    /// Article identifier.
    pub id: String,

    /// Depth at which this article was visited (0 = seed).
    pub depth: u32,

    /// Parent article identifier; `None` for the seed.
    pub parent: Option<String>,

    /// Relation that produced this article; `None` for the seed.
    pub relation: Option<RelationKind>,

    /// Article metadata (a placeholder when the fetch failed).
    pub article: Article,

    /// Relevance score (0-100); 0 for errored hits.
    pub score: u8,

    /// Whether the score clears this run's threshold.
    pub is_relevant: bool,

    /// Scorer justification, or an error description for errored hits.
    pub justification: String,

    /// True when the evaluation came from the project store.
    pub from_cache: bool,

    /// True when the article could not be fetched or evaluated and was
    /// recorded with zero relevance instead of being silently dropped.
    pub errored: bool,
}

/// Final statistics for one discovery run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    /// Articles popped from the frontier and processed.
    pub total_visited: usize,

    /// Fresh scorer calls issued this run.
    pub total_evaluated: usize,

    /// Cache hits (no scorer call).
    pub total_skipped: usize,

    /// Articles recorded with an error marker.
    pub total_errored: usize,

    /// Articles whose score cleared the threshold.
    pub total_relevant: usize,

    /// Articles dropped by the publication-year filter.
    pub total_filtered: usize,

    /// Deepest layer reached.
    pub depth_reached: u32,
}
