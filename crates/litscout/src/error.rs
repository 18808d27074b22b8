//! Error types for litscout.
//!
//! Uses `thiserror` for structured error handling with automatic `From`
//! implementations. Each layer has its own enum; the engine maps per-article
//! failures into result records and only lets persistence failures escape.

/// Errors from the bibliographic client layer.
#[derive(thiserror::Error, Debug)]
pub enum ClientError {
    /// HTTP transport error (connection, DNS, TLS, timeout).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Middleware error (retry policy exhausted, etc.).
    #[error("Middleware error: {0}")]
    Middleware(#[from] reqwest_middleware::Error),

    /// The identifier does not resolve to an article (404 or empty esummary).
    #[error("Article not found: {id}")]
    NotFound {
        /// The identifier that failed to resolve.
        id: String,
    },

    /// Server error (5xx response).
    #[error("Server error ({status}): {message}")]
    Server {
        /// HTTP status code.
        status: u16,
        /// Error message.
        message: String,
    },

    /// Response body did not parse.
    #[error("Failed to parse response: {0}")]
    Parse(#[from] serde_json::Error),

    /// Unexpected HTTP status.
    #[error("Unexpected status {status}: {message}")]
    UnexpectedStatus {
        /// HTTP status code.
        status: u16,
        /// Response body or message.
        message: String,
    },
}

impl ClientError {
    /// Create a not found error.
    #[must_use]
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }

    /// Create a server error.
    #[must_use]
    pub fn server(status: u16, message: impl Into<String>) -> Self {
        Self::Server { status, message: message.into() }
    }

    /// Returns true if retrying the same request may succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(_) | Self::Middleware(_) | Self::Server { .. } => true,
            Self::NotFound { .. } | Self::Parse(_) | Self::UnexpectedStatus { .. } => false,
        }
    }
}

/// Errors from the relevance evaluation layer.
#[derive(thiserror::Error, Debug)]
pub enum EvalError {
    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Middleware error.
    #[error("Middleware error: {0}")]
    Middleware(#[from] reqwest_middleware::Error),

    /// Neither title nor abstract is available; nothing to score.
    #[error("Nothing to evaluate: title and abstract are both empty")]
    EmptyInput,

    /// The scoring service rejected the request or failed.
    #[error("Evaluation service error ({status}): {message}")]
    Server {
        /// HTTP status code.
        status: u16,
        /// Error message from the service.
        message: String,
    },

    /// The scoring service returned a response with no usable content.
    #[error("Evaluation response had no content")]
    EmptyResponse,

    /// Response body did not parse.
    #[error("Failed to parse evaluation response: {0}")]
    Parse(#[from] serde_json::Error),
}

impl EvalError {
    /// Create a server error.
    #[must_use]
    pub fn server(status: u16, message: impl Into<String>) -> Self {
        Self::Server { status, message: message.into() }
    }
}

/// Errors from the project store.
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    /// Filesystem failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A committed file failed to deserialize.
    #[error("Corrupt project data: {0}")]
    Corrupt(#[from] serde_json::Error),

    /// Project directory already exists.
    #[error("Project '{name}' already exists")]
    ProjectExists {
        /// Requested project name.
        name: String,
    },

    /// Project directory does not exist.
    #[error("Project '{name}' not found")]
    ProjectNotFound {
        /// Requested project name.
        name: String,
    },
}

impl StoreError {
    /// Create a project-exists error.
    #[must_use]
    pub fn exists(name: impl Into<String>) -> Self {
        Self::ProjectExists { name: name.into() }
    }

    /// Create a project-not-found error.
    #[must_use]
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::ProjectNotFound { name: name.into() }
    }
}

/// Errors that abort a discovery run.
///
/// Per-article client and evaluation failures never surface here; they are
/// folded into the result sequence as errored or degraded records. Only a
/// persistence failure ends the run, before the frontier advances past the
/// article whose evaluation would otherwise be lost.
#[derive(thiserror::Error, Debug)]
pub enum EngineError {
    /// The project store failed to commit a completed evaluation.
    #[error("Persistence failure: {0}")]
    Persistence(#[from] StoreError),

    /// The seed input could not be turned into an article identifier.
    #[error("Invalid seed article: {input}")]
    InvalidSeed {
        /// The raw seed input.
        input: String,
    },
}

/// Result type alias for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Result type alias for evaluation operations.
pub type EvalResult<T> = Result<T, EvalError>;

/// Result type alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Result type alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
