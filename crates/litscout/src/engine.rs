//! The relevance-guided discovery engine.
//!
//! Bounded breadth-first traversal over the citation graph: every visited
//! article is looked up in the project store first, scored only on a cache
//! miss, and expanded only while its score clears the admissibility
//! threshold. Results are produced lazily as a stream so callers observe
//! partial progress, with final run statistics as the last item.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_stream::try_stream;
use chrono::Utc;
use futures::{Future, Stream};

use crate::config::defaults;
use crate::error::{ClientResult, EngineError, EngineResult};
use crate::models::{Article, ArticleHit, ArticleRecord, Evaluation, RelationKind, RunStats};
use crate::provider::{ArticleProvider, RelevanceScorer};
use crate::store::Project;

/// Cooperative cancellation flag.
///
/// Checked at the top of the per-article loop; a traversal stops between
/// articles, never mid-fetch.
#[derive(Debug, Clone, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    /// Create a fresh, unset signal.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request that any traversal watching this signal stop.
    pub fn request_stop(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Whether a stop has been requested.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Parameters for one discovery run.
#[derive(Debug, Clone)]
pub struct DiscoveryParams {
    /// Seed article identifier.
    pub seed: String,

    /// Research theme the scorer evaluates against.
    pub theme: String,

    /// Admissibility threshold; `score >= threshold` is relevant.
    pub relevance_threshold: u8,

    /// Maximum depth from the seed.
    pub max_depth: u32,

    /// Maximum number of articles visited.
    pub max_articles: usize,

    /// Drop articles published before this year (applied on cache misses).
    pub year_from: Option<i32>,

    /// Follow similar-article links.
    pub include_similar: bool,
    /// Per-article cap on similar links.
    pub max_similar: usize,

    /// Follow cited-by links.
    pub include_cited_by: bool,
    /// Per-article cap on cited-by links.
    pub max_cited_by: usize,

    /// Follow reference links.
    pub include_references: bool,
    /// Per-article cap on reference links.
    pub max_references: usize,

    /// Re-score articles already present in the store.
    pub force_reevaluate: bool,

    /// Engine-level retries for transient client failures, per article.
    pub retry_budget: u32,

    /// Fixed backoff between engine-level retries.
    pub retry_backoff: Duration,
}

impl DiscoveryParams {
    /// Parameters with defaults for everything but the seed and theme.
    #[must_use]
    pub fn new(seed: impl Into<String>, theme: impl Into<String>) -> Self {
        Self {
            seed: seed.into(),
            theme: theme.into(),
            relevance_threshold: defaults::RELEVANCE_THRESHOLD,
            max_depth: defaults::MAX_DEPTH,
            max_articles: defaults::MAX_ARTICLES,
            year_from: None,
            include_similar: true,
            max_similar: defaults::MAX_SIMILAR,
            include_cited_by: true,
            max_cited_by: defaults::MAX_CITED_BY,
            include_references: false,
            max_references: defaults::MAX_REFERENCES,
            force_reevaluate: false,
            retry_budget: defaults::RETRY_BUDGET,
            retry_backoff: Duration::from_millis(defaults::RETRY_BACKOFF_MS),
        }
    }
}

/// Items produced by a discovery run.
#[derive(Debug)]
pub enum DiscoveryEvent {
    /// One visited article, emitted in visit order.
    Article(Box<ArticleHit>),

    /// Final statistics; always the last event of a completed run.
    Done(RunStats),
}

/// A pending frontier entry.
#[derive(Debug, Clone)]
struct WorkItem {
    id: String,
    depth: u32,
    parent: Option<String>,
    relation: Option<RelationKind>,
}

/// Why an article produced no stored record.
enum ArticleFailure {
    /// Dropped by the publication-year filter; not emitted, not persisted.
    Filtered,
    /// Fetch or lookup failed; emitted with an error marker, not persisted.
    Errored(String),
}

/// Drives the bounded breadth-first traversal.
pub struct DiscoveryEngine {
    provider: Arc<dyn ArticleProvider>,
    scorer: Arc<dyn RelevanceScorer>,
    stop: StopSignal,
}

impl DiscoveryEngine {
    /// Create an engine over the given collaborators.
    #[must_use]
    pub fn new(provider: Arc<dyn ArticleProvider>, scorer: Arc<dyn RelevanceScorer>) -> Self {
        Self { provider, scorer, stop: StopSignal::new() }
    }

    /// A handle that can stop this engine's traversals between articles.
    #[must_use]
    pub fn stop_signal(&self) -> StopSignal {
        self.stop.clone()
    }

    /// Run one discovery traversal against a project.
    ///
    /// The returned stream yields [`DiscoveryEvent::Article`] per visited
    /// article and ends with [`DiscoveryEvent::Done`]. Per-article failures
    /// become errored hits; only a persistence failure terminates the stream
    /// with an `Err`, before the frontier advances past the affected
    /// article.
    pub fn run<'a>(
        &'a self,
        project: &'a mut Project,
        params: DiscoveryParams,
    ) -> impl Stream<Item = EngineResult<DiscoveryEvent>> + 'a {
        try_stream! {
            let seed = params.seed.trim().to_string();
            if seed.is_empty() {
                Err(EngineError::InvalidSeed { input: params.seed.clone() })?;
            }

            let session_id = Utc::now().to_rfc3339();
            let mut stats = RunStats::default();
            let mut newly_evaluated = 0_usize;

            let mut visited: HashSet<String> = HashSet::new();
            let mut enqueued: HashSet<String> = HashSet::new();
            let mut frontier: VecDeque<WorkItem> = VecDeque::new();

            enqueued.insert(seed.clone());
            frontier.push_back(WorkItem { id: seed, depth: 0, parent: None, relation: None });

            while let Some(item) = frontier.pop_front() {
                if self.stop.is_stopped() {
                    tracing::info!("stop requested, ending traversal");
                    break;
                }
                if visited.len() >= params.max_articles {
                    tracing::info!(max_articles = params.max_articles, "article limit reached");
                    break;
                }
                // Re-discovered via another parent, or a self-loop.
                if !visited.insert(item.id.clone()) {
                    continue;
                }

                stats.total_visited += 1;
                stats.depth_reached = stats.depth_reached.max(item.depth);

                let cached = if params.force_reevaluate { None } else { project.get(&item.id).cloned() };

                let (record, from_cache, error) = if let Some(record) = cached {
                    tracing::debug!(id = %item.id, score = record.evaluation.score, "cache hit");
                    stats.total_skipped += 1;
                    (Some(record), true, None)
                } else {
                    match self.evaluate_article(&item, &params, &session_id).await {
                        Ok(record) => {
                            project.put(record.clone())?;
                            stats.total_evaluated += 1;
                            newly_evaluated += 1;
                            (Some(record), false, None)
                        }
                        Err(ArticleFailure::Filtered) => {
                            stats.total_filtered += 1;
                            continue;
                        }
                        Err(ArticleFailure::Errored(reason)) => {
                            tracing::warn!(id = %item.id, reason = %reason, "article errored");
                            stats.total_errored += 1;
                            (None, false, Some(reason))
                        }
                    }
                };

                let hit = match record {
                    Some(record) => {
                        let is_relevant =
                            record.evaluation.is_relevant(params.relevance_threshold);
                        ArticleHit {
                            id: item.id.clone(),
                            depth: item.depth,
                            parent: item.parent.clone(),
                            relation: item.relation,
                            article: record.article,
                            score: record.evaluation.score,
                            is_relevant,
                            justification: record.evaluation.justification,
                            from_cache,
                            errored: false,
                        }
                    }
                    None => ArticleHit {
                        id: item.id.clone(),
                        depth: item.depth,
                        parent: item.parent.clone(),
                        relation: item.relation,
                        article: Article::placeholder(&item.id),
                        score: 0,
                        is_relevant: false,
                        justification: error.unwrap_or_default(),
                        from_cache: false,
                        errored: true,
                    },
                };

                if hit.is_relevant {
                    stats.total_relevant += 1;
                }

                let expand = hit.is_relevant && item.depth < params.max_depth;
                yield DiscoveryEvent::Article(Box::new(hit));

                if expand {
                    for (child, kind) in self.collect_children(&item.id, &params).await {
                        if visited.contains(&child) || !enqueued.insert(child.clone()) {
                            continue;
                        }
                        frontier.push_back(WorkItem {
                            id: child,
                            depth: item.depth + 1,
                            parent: Some(item.id.clone()),
                            relation: Some(kind),
                        });
                    }
                }
            }

            if newly_evaluated > 0 {
                project.add_session(&session_id, newly_evaluated)?;
            }

            yield DiscoveryEvent::Done(stats);
        }
    }

    /// Fetch, score, and assemble a record for a cache miss.
    async fn evaluate_article(
        &self,
        item: &WorkItem,
        params: &DiscoveryParams,
        session_id: &str,
    ) -> Result<ArticleRecord, ArticleFailure> {
        let mut article = match retry_client(params.retry_budget, params.retry_backoff, || {
            self.provider.fetch_metadata(&item.id)
        })
        .await
        {
            Ok(article) => article,
            Err(e) => return Err(ArticleFailure::Errored(e.to_string())),
        };

        if let (Some(year_from), Some(year)) = (params.year_from, article.year) {
            if year < year_from {
                tracing::debug!(id = %item.id, year, year_from, "dropped by year filter");
                return Err(ArticleFailure::Filtered);
            }
        }

        // A missing abstract is a valid empty value; a failed fetch is
        // downgraded to one so scoring can still run on the title.
        article.abstract_text = match retry_client(params.retry_budget, params.retry_backoff, || {
            self.provider.fetch_abstract(&item.id)
        })
        .await
        {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(id = %item.id, error = %e, "abstract fetch failed, scoring on title only");
                String::new()
            }
        };

        let evaluation = match self
            .scorer
            .evaluate(&params.theme, &article.title, &article.abstract_text)
            .await
        {
            Ok(evaluation) => evaluation,
            Err(e) => {
                // Unusable input or scorer failure degrades to score 0 so
                // the traversal stays alive; the record is still persisted.
                tracing::warn!(id = %item.id, error = %e, "evaluation degraded to score 0");
                Evaluation::degraded(format!("Evaluation failed: {e}"))
            }
        };

        Ok(ArticleRecord {
            article,
            evaluation,
            depth: item.depth,
            parent: item.parent.clone(),
            relation: item.relation,
            session: Some(session_id.to_string()),
        })
    }

    /// Gather child identifiers across the enabled relation lists.
    ///
    /// Relation lists are truncated to their per-article caps and
    /// deduplicated keeping the first relation that produced an id. A failed
    /// relation fetch contributes nothing rather than failing the article.
    async fn collect_children(
        &self,
        id: &str,
        params: &DiscoveryParams,
    ) -> Vec<(String, RelationKind)> {
        let mut seen: HashSet<String> = HashSet::new();
        let mut children = Vec::new();

        let relations = [
            (params.include_similar, params.max_similar, RelationKind::Similar),
            (params.include_cited_by, params.max_cited_by, RelationKind::CitedBy),
            (params.include_references, params.max_references, RelationKind::References),
        ];

        for (enabled, cap, kind) in relations {
            if !enabled {
                continue;
            }

            match self.provider.fetch_related(id, kind).await {
                Ok(ids) => {
                    let mut taken = 0;
                    for child in ids {
                        if taken >= cap {
                            break;
                        }
                        taken += 1;
                        if seen.insert(child.clone()) {
                            children.push((child, kind));
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(id, relation = kind.label(), error = %e, "relation fetch failed");
                }
            }
        }

        children
    }
}

impl std::fmt::Debug for DiscoveryEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscoveryEngine").finish_non_exhaustive()
    }
}

/// Retry a client operation on transient failures with a fixed backoff.
async fn retry_client<T, Fut>(
    budget: u32,
    backoff: Duration,
    mut op: impl FnMut() -> Fut,
) -> ClientResult<T>
where
    Fut: Future<Output = ClientResult<T>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() && attempt < budget => {
                attempt += 1;
                tracing::warn!(error = %e, attempt, "transient failure, retrying");
                tokio::time::sleep(backoff).await;
            }
            Err(e) => return Err(e),
        }
    }
}
