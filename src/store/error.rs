use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sled::Error),
    #[error("encoding error: {0}")]
    Codec(#[from] serde_json::Error),
    #[error("corrupt history key")]
    CorruptKey,
    #[error("store lock poisoned")]
    Poisoned,
    #[error("sled storage needs a path")]
    MissingPath,
    #[error("invalid bounding box: {0}")]
    InvalidBounds(String),
}
