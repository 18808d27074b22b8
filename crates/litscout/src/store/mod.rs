//! Durable project store.
//!
//! A project is a directory holding `metadata.json` (name, theme, stats,
//! session history) and `articles.json` (id -> evaluated article record).
//! Writes go through a temp-file-plus-rename so a crash mid-write can lose
//! at most the in-flight article, never previously committed ones; stale
//! `.tmp` files from an unclean shutdown are ignored on reopen.
//!
//! Single-writer discipline is assumed; concurrent writers to the same
//! project are out of scope.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};
use crate::models::ArticleRecord;

const METADATA_FILE: &str = "metadata.json";
const ARTICLES_FILE: &str = "articles.json";

/// Project-level metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectMetadata {
    /// Display name.
    pub name: String,

    /// Filesystem-safe directory name.
    pub safe_name: String,

    /// Research theme the project's evaluations were scored against.
    pub research_theme: String,

    /// Creation time.
    pub created_at: DateTime<Utc>,

    /// Last save time.
    pub updated_at: DateTime<Utc>,

    /// Aggregate counters.
    #[serde(default)]
    pub stats: ProjectStats,

    /// One entry per run that evaluated at least one new article.
    #[serde(default)]
    pub sessions: Vec<SearchSession>,
}

/// Aggregate counters for a project.
///
/// Relevant-article counts are deliberately absent: relevance is a function
/// of the threshold supplied to each run, so it is computed on read via
/// [`Project::relevant_records`], never persisted.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ProjectStats {
    /// Number of evaluated articles in the store.
    #[serde(default)]
    pub total_articles: usize,
}

/// Record of one discovery run against a project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchSession {
    /// Session identifier (run start timestamp).
    pub session_id: String,

    /// Articles newly evaluated during the session.
    pub article_count: usize,

    /// When the session ran.
    pub timestamp: DateTime<Utc>,
}

/// Creates, loads, lists, and deletes projects under a root directory.
#[derive(Debug, Clone)]
pub struct ProjectManager {
    projects_dir: PathBuf,
}

impl ProjectManager {
    /// Create a manager rooted at `projects_dir`, creating it if absent.
    pub fn new(projects_dir: impl Into<PathBuf>) -> StoreResult<Self> {
        let projects_dir = projects_dir.into();
        fs::create_dir_all(&projects_dir)?;
        Ok(Self { projects_dir })
    }

    /// Create a new project.
    pub fn create(&self, name: &str, research_theme: &str) -> StoreResult<Project> {
        let safe_name = sanitize_name(name);
        let dir = self.projects_dir.join(&safe_name);

        if dir.exists() {
            return Err(StoreError::exists(name));
        }
        fs::create_dir_all(&dir)?;

        let now = Utc::now();
        let metadata = ProjectMetadata {
            name: name.to_string(),
            safe_name,
            research_theme: research_theme.to_string(),
            created_at: now,
            updated_at: now,
            stats: ProjectStats::default(),
            sessions: Vec::new(),
        };

        let mut project = Project { dir, metadata, articles: BTreeMap::new() };
        project.save()?;
        Ok(project)
    }

    /// Load an existing project by name (display name or directory name).
    ///
    /// The name is sanitized before it touches the filesystem, so path
    /// separators and dot segments cannot resolve outside the projects root.
    pub fn load(&self, name: &str) -> StoreResult<Project> {
        let dir = self.projects_dir.join(sanitize_name(name));
        if !dir.exists() {
            return Err(StoreError::not_found(name));
        }

        Project::open(dir)
    }

    /// Load a project, creating it first if it does not exist.
    pub fn load_or_create(&self, name: &str, research_theme: &str) -> StoreResult<Project> {
        match self.load(name) {
            Ok(project) => Ok(project),
            Err(StoreError::ProjectNotFound { .. }) => self.create(name, research_theme),
            Err(e) => Err(e),
        }
    }

    /// List metadata for all projects, most recently updated first.
    ///
    /// Unreadable project directories are skipped with a warning rather than
    /// failing the whole listing.
    pub fn list(&self) -> StoreResult<Vec<ProjectMetadata>> {
        let mut projects = Vec::new();

        for entry in fs::read_dir(&self.projects_dir)? {
            let entry = entry?;
            if !entry.path().is_dir() {
                continue;
            }

            let metadata_path = entry.path().join(METADATA_FILE);
            if !metadata_path.exists() {
                continue;
            }

            match fs::read_to_string(&metadata_path)
                .map_err(StoreError::from)
                .and_then(|s| serde_json::from_str(&s).map_err(StoreError::from))
            {
                Ok(metadata) => projects.push(metadata),
                Err(e) => {
                    tracing::warn!(path = %metadata_path.display(), error = %e, "skipping unreadable project");
                }
            }
        }

        projects.sort_by(|a: &ProjectMetadata, b: &ProjectMetadata| b.updated_at.cmp(&a.updated_at));
        Ok(projects)
    }

    /// Delete a project and all its data.
    pub fn delete(&self, name: &str) -> StoreResult<()> {
        let project = self.load(name)?;
        fs::remove_dir_all(project.dir)?;
        Ok(())
    }
}

/// One project: its metadata and the durable evaluation cache.
#[derive(Debug)]
pub struct Project {
    dir: PathBuf,
    metadata: ProjectMetadata,
    articles: BTreeMap<String, ArticleRecord>,
}

impl Project {
    fn open(dir: PathBuf) -> StoreResult<Self> {
        let metadata_raw = fs::read_to_string(dir.join(METADATA_FILE))?;
        let metadata: ProjectMetadata = serde_json::from_str(&metadata_raw)?;

        let articles_path = dir.join(ARTICLES_FILE);
        let articles = if articles_path.exists() {
            serde_json::from_str(&fs::read_to_string(&articles_path)?)?
        } else {
            BTreeMap::new()
        };

        Ok(Self { dir, metadata, articles })
    }

    /// Project metadata.
    #[must_use]
    pub fn metadata(&self) -> &ProjectMetadata {
        &self.metadata
    }

    /// Whether the store holds an evaluation for `id`.
    #[must_use]
    pub fn has(&self, id: &str) -> bool {
        self.articles.contains_key(id)
    }

    /// Fetch the cached record for `id`, if any.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&ArticleRecord> {
        self.articles.get(id)
    }

    /// Upsert a record and persist before returning.
    ///
    /// Last write for a given id is authoritative.
    pub fn put(&mut self, record: ArticleRecord) -> StoreResult<()> {
        self.articles.insert(record.id().to_string(), record);
        self.save()
    }

    /// Remove a record and persist. Returns false if the id was absent.
    pub fn remove(&mut self, id: &str) -> StoreResult<bool> {
        if self.articles.remove(id).is_none() {
            return Ok(false);
        }
        self.save()?;
        Ok(true)
    }

    /// All article identifiers in the store.
    #[must_use]
    pub fn all_ids(&self) -> Vec<String> {
        self.articles.keys().cloned().collect()
    }

    /// All records, in id order.
    #[must_use]
    pub fn records(&self) -> Vec<&ArticleRecord> {
        self.articles.values().collect()
    }

    /// Records whose cached score clears the given threshold.
    #[must_use]
    pub fn relevant_records(&self, threshold: u8) -> Vec<&ArticleRecord> {
        self.articles.values().filter(|r| r.evaluation.is_relevant(threshold)).collect()
    }

    /// Append a search session to the history and persist.
    pub fn add_session(&mut self, session_id: &str, article_count: usize) -> StoreResult<()> {
        self.metadata.sessions.push(SearchSession {
            session_id: session_id.to_string(),
            article_count,
            timestamp: Utc::now(),
        });
        self.save()
    }

    /// Persist metadata and articles atomically.
    pub fn save(&mut self) -> StoreResult<()> {
        self.metadata.updated_at = Utc::now();
        self.metadata.stats.total_articles = self.articles.len();

        write_atomic(&self.dir.join(METADATA_FILE), &serde_json::to_vec_pretty(&self.metadata)?)?;
        write_atomic(&self.dir.join(ARTICLES_FILE), &serde_json::to_vec_pretty(&self.articles)?)?;
        Ok(())
    }
}

/// Write `contents` to `path` via a sibling temp file and rename, fsyncing
/// before the swap so the committed file is always complete.
fn write_atomic(path: &Path, contents: &[u8]) -> StoreResult<()> {
    let tmp = path.with_extension("json.tmp");

    let mut file = fs::File::create(&tmp)?;
    file.write_all(contents)?;
    file.sync_all()?;
    drop(file);

    fs::rename(&tmp, path)?;
    Ok(())
}

/// Replace filesystem-hostile characters and cap the length.
///
/// Dot-only names (`.`, `..`) would address the projects root or its parent
/// when joined onto a path, so they map to `_` like any other unsafe input.
#[must_use]
pub fn sanitize_name(name: &str) -> String {
    let safe: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | ' ' => '_',
            other => other,
        })
        .take(100)
        .collect();

    if safe.is_empty() || safe.chars().all(|c| c == '.') {
        return "_".to_string();
    }
    safe
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_name() {
        assert_eq!(sanitize_name("my project: draft/2"), "my_project__draft_2");
        assert_eq!(sanitize_name("plain"), "plain");
        assert_eq!(sanitize_name(&"x".repeat(200)).len(), 100);
    }

    #[test]
    fn test_sanitize_name_neutralizes_dot_segments() {
        assert_eq!(sanitize_name(".."), "_");
        assert_eq!(sanitize_name("."), "_");
        assert_eq!(sanitize_name(""), "_");
        assert_eq!(sanitize_name("../escape"), ".._escape");
        assert_eq!(sanitize_name("..\\escape"), ".._escape");
        assert_eq!(sanitize_name("v1.2"), "v1.2");
    }
}
