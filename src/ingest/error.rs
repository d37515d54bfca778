use thiserror::Error;

/// A source could not deliver a batch. Nothing was written for that cycle.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("source unavailable: {0}")]
    Unavailable(#[from] reqwest::Error),
    #[error("rate limited")]
    RateLimited,
    #[error("unexpected HTTP status {0}")]
    Http(u16),
    #[error("malformed states document: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Why one ingestion cycle produced no report.
#[derive(Debug, Error)]
pub enum CycleError {
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error(transparent)]
    Fusion(#[from] crate::fusion::FusionError),
}
