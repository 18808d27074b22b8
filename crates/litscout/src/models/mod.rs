//! Data models for articles, evaluations, and discovery results.
//!
//! Persisted models use `#[serde(default)]` for optional fields so that
//! records written by older versions still load.

mod article;
mod record;

pub use article::{Article, ArticleRecord, Evaluation, RelationKind};
pub use record::{ArticleHit, RunStats};
