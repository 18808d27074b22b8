//! litscout: relevance-guided citation-graph discovery
//!
//! Starting from a seed PubMed article, litscout walks "similar" and
//! "cited-by" relations breadth-first, scores each discovered article
//! against a research theme with an LLM, and prunes the frontier around an
//! admissibility threshold. Evaluations are cached in a durable per-project
//! store, so repeated runs are cheap and reproducible even though the scorer
//! itself is not deterministic.
//!
//! # Features
//!
//! - **Bounded BFS**: depth and article-count limits, relevance-gated
//!   expansion, cycle-safe via a visited set
//! - **Durable cache**: evaluations persist per project; re-runs skip the
//!   scorer entirely for known articles
//! - **Rate-limited**: one shared limiter per bibliographic provider
//! - **Streaming results**: callers observe progress article by article
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use futures::{StreamExt, pin_mut};
//! use litscout::{
//!     Config, DiscoveryEngine, DiscoveryEvent, DiscoveryParams, EntrezClient, GeminiScorer,
//!     ProjectManager, RateLimiter,
//! };
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env();
//!     let limiter = Arc::new(RateLimiter::new(config.request_delay));
//!     let client = Arc::new(EntrezClient::new(&config, limiter)?);
//!     let scorer = Arc::new(GeminiScorer::new(&config)?);
//!
//!     let manager = ProjectManager::new(&config.projects_dir)?;
//!     let mut project = manager.load_or_create("neuro-review", "my research theme")?;
//!
//!     let engine = DiscoveryEngine::new(client, scorer);
//!     let stream = engine.run(&mut project, DiscoveryParams::new("12345678", "my research theme"));
//!     pin_mut!(stream);
//!
//!     while let Some(event) = stream.next().await {
//!         if let DiscoveryEvent::Article(hit) = event? {
//!             println!("{} score={} relevant={}", hit.id, hit.score, hit.is_relevant);
//!         }
//!     }
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod export;
pub mod limiter;
pub mod models;
pub mod provider;
pub mod store;

pub use client::EntrezClient;
pub use config::Config;
pub use engine::{DiscoveryEngine, DiscoveryEvent, DiscoveryParams, StopSignal};
pub use error::{ClientError, EngineError, EvalError, StoreError};
pub use evaluator::GeminiScorer;
pub use limiter::RateLimiter;
pub use models::{Article, ArticleHit, ArticleRecord, Evaluation, RelationKind, RunStats};
pub use provider::{ArticleProvider, RelevanceScorer};
pub use store::{Project, ProjectManager};
