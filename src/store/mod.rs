//! Current-state rows (one per aircraft) and the append-only history log.

mod bounds;
mod error;
mod memory;
mod persistent;
mod retention;

pub use bounds::BoundingBox;
pub use error::StoreError;
pub use memory::{MemoryHistory, MemoryStore};
pub use persistent::{open_sled, SledHistory, SledStore};
pub use retention::spawn_retention;

use crate::fusion::{MergeDecision, MergePolicy};
use crate::state::StateVector;

/// Upper bound on rows returned by a bounding-box query.
pub const QUERY_ROW_CAP: usize = 1000;

pub trait CurrentStateStore: Send + Sync {
    /// Evaluates `policy` against the stored row for `incoming.icao24` and
    /// writes `incoming` if it wins, as a single atomic step per key.
    fn merge(
        &self,
        incoming: StateVector,
        policy: &MergePolicy,
    ) -> Result<MergeDecision, StoreError>;

    fn get(&self, icao24: &str) -> Result<Option<StateVector>, StoreError>;

    /// Rows heard from at or after `recent_contact` inside `bounds`, newest
    /// first, at most [`QUERY_ROW_CAP`].
    fn query_in_bounds(
        &self,
        bounds: &BoundingBox,
        recent_contact: i64,
    ) -> Result<Vec<StateVector>, StoreError>;

    /// Case-insensitive match on address or callsign, newest first.
    fn find_by_identifier(&self, id: &str) -> Result<Vec<StateVector>, StoreError>;

    fn len(&self) -> Result<usize, StoreError>;
}

pub trait HistoryLog: Send + Sync {
    fn append(&self, vector: &StateVector) -> Result<(), StoreError>;

    /// Archived observations for one aircraft with `from <= last_contact <= to`,
    /// oldest first.
    fn range(&self, icao24: &str, from: i64, to: i64) -> Result<Vec<StateVector>, StoreError>;

    /// Drops every row with `last_contact < cutoff`; returns how many went.
    fn prune_before(&self, cutoff: i64) -> Result<usize, StoreError>;

    fn len(&self) -> Result<usize, StoreError>;
}

fn in_bounds(vector: &StateVector, bounds: &BoundingBox, recent_contact: i64) -> bool {
    vector.last_contact >= recent_contact
        && vector
            .position()
            .is_some_and(|(lat, lon)| bounds.contains(lat, lon))
}

fn newest_first(mut rows: Vec<StateVector>, cap: usize) -> Vec<StateVector> {
    rows.sort_unstable_by(|a, b| {
        b.last_contact
            .cmp(&a.last_contact)
            .then_with(|| a.icao24.cmp(&b.icao24))
    });
    rows.truncate(cap);
    rows
}
