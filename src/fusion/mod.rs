mod engine;
mod error;
mod rule;

pub use engine::{FusionEngine, Rejection, UpsertReport, DEFAULT_CHUNK_SIZE};
pub use error::FusionError;
pub use rule::{MergeDecision, MergePolicy, MergeReason, DEFAULT_STALENESS_WINDOW_SECS};
