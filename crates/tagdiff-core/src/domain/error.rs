//! Domain-level error taxonomy for tagdiff.

/// Errors produced while turning fetched documents into domain values.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("malformed JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("unexpected document shape: {0}")]
    UnexpectedShape(String),

    #[error("invalid ticket pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

/// Per-ticket failures reported by an issue tracker.
///
/// None of these abort a run; the enricher degrades the affected ticket to
/// its bare ID. `Unauthorized` additionally disables the tracker for the
/// remainder of the run.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EnrichmentError {
    #[error("ticket not found: {0}")]
    NotFound(String),

    #[error("issue tracker rate limit exceeded")]
    RateLimited,

    #[error("issue tracker rejected credentials: {0}")]
    Unauthorized(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("issue tracker API error: {0}")]
    Api(String),
}

/// Failures while listing the commits between two tags.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommitRangeError {
    #[error("tags or repository not found: {repo} {base}...{head}")]
    NotFound {
        repo: String,
        base: String,
        head: String,
    },

    #[error("commit range request failed: {0}")]
    Request(String),
}

/// tagdiff domain errors.
#[derive(Debug, thiserror::Error)]
pub enum TagdiffError {
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("failed to list commits for {service}: {source}")]
    CommitRange {
        service: String,
        #[source]
        source: CommitRangeError,
    },

    #[error("invalid repository reference: {0:?}")]
    InvalidRepository(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for tagdiff domain operations.
pub type Result<T> = std::result::Result<T, TagdiffError>;
