use thiserror::Error;

/// Top-level error type for Tally.
#[derive(Debug, Error)]
pub enum TallyError {
    /// Caller-supplied input was rejected (e.g. empty title).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The persistent store could not be read or written.
    #[error("storage error: {0}")]
    Storage(String),

    /// Remote seed or create call failed (network or non-success status).
    #[error("remote error: {0}")]
    Remote(String),

    /// A required record or key was missing.
    #[error("not found: {0}")]
    NotFound(String),

    /// Notification facility error.
    #[error("notify error: {0}")]
    Notify(String),

    /// Cache layer error.
    #[error("cache error: {0}")]
    Cache(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
