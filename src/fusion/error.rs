use thiserror::Error;

use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum FusionError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}
