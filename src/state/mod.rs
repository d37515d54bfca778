mod clock;
mod error;
mod types;
mod wire;

pub use clock::IngestClock;
pub use error::ValidationError;
pub use types::{Provenance, SourcePriority, StateVector, ROTORCRAFT_CATEGORY};
pub use wire::{decode_row, identifier_of};

#[cfg(test)]
pub(crate) use types::fixtures;
