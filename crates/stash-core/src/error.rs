//! Error types for Stash Restore.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    // Key evaluation errors
    #[error("invalid key template {template:?}: {reason}")]
    TemplateSyntax { template: String, reason: String },

    // Index lookup errors
    #[error("invalid restore request: {0}")]
    InvalidRequest(String),

    #[error("no cache archive found for the provided keys")]
    CacheMiss,

    #[error("cache service responded with HTTP {status}: {body}")]
    Transport { status: u16, body: String },

    #[error("Network error: {0}")]
    Network(String),

    // Transfer errors
    #[error("download failed: {0}")]
    Download(String),

    // Extraction errors
    #[error("failed to decompress cache archive: {0}")]
    Extraction(String),

    // Orchestration errors
    #[error("restore cancelled")]
    Cancelled,

    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Whether the transport layer may retry the operation that produced
    /// this error. Decisive business outcomes (cache miss, 4xx responses,
    /// validation failures) are never retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Network(_) => true,
            Error::Transport { status, .. } => *status >= 500,
            _ => false,
        }
    }
}
