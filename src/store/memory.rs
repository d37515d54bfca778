use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, RwLock};

use crate::fusion::{MergeDecision, MergePolicy};
use crate::state::StateVector;

use super::{in_bounds, newest_first, BoundingBox, CurrentStateStore, HistoryLog, StoreError};
use super::QUERY_ROW_CAP;

/// In-process current-state table.
#[derive(Debug, Default)]
pub struct MemoryStore {
    rows: RwLock<HashMap<String, StateVector>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CurrentStateStore for MemoryStore {
    fn merge(
        &self,
        incoming: StateVector,
        policy: &MergePolicy,
    ) -> Result<MergeDecision, StoreError> {
        let mut rows = self.rows.write().map_err(|_| StoreError::Poisoned)?;
        let decision = policy.decide(rows.get(&incoming.icao24), &incoming);
        if decision.writes() {
            rows.insert(incoming.icao24.clone(), incoming);
        }
        Ok(decision)
    }

    fn get(&self, icao24: &str) -> Result<Option<StateVector>, StoreError> {
        let rows = self.rows.read().map_err(|_| StoreError::Poisoned)?;
        Ok(rows.get(&icao24.to_ascii_lowercase()).cloned())
    }

    fn query_in_bounds(
        &self,
        bounds: &BoundingBox,
        recent_contact: i64,
    ) -> Result<Vec<StateVector>, StoreError> {
        let rows = self.rows.read().map_err(|_| StoreError::Poisoned)?;
        let matched = rows
            .values()
            .filter(|v| in_bounds(v, bounds, recent_contact))
            .cloned()
            .collect();
        Ok(newest_first(matched, QUERY_ROW_CAP))
    }

    fn find_by_identifier(&self, id: &str) -> Result<Vec<StateVector>, StoreError> {
        let rows = self.rows.read().map_err(|_| StoreError::Poisoned)?;
        let matched = rows
            .values()
            .filter(|v| v.matches_identifier(id))
            .cloned()
            .collect();
        Ok(newest_first(matched, usize::MAX))
    }

    fn len(&self) -> Result<usize, StoreError> {
        Ok(self.rows.read().map_err(|_| StoreError::Poisoned)?.len())
    }
}

type HistoryKey = (String, i64, u64);

/// In-process history log ordered by `(icao24, last_contact, arrival)`.
#[derive(Debug, Default)]
pub struct MemoryHistory {
    rows: Mutex<BTreeMap<HistoryKey, StateVector>>,
    seq: AtomicU64,
}

impl MemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HistoryLog for MemoryHistory {
    fn append(&self, vector: &StateVector) -> Result<(), StoreError> {
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        let key = (vector.icao24.clone(), vector.last_contact, seq);
        self.rows
            .lock()
            .map_err(|_| StoreError::Poisoned)?
            .insert(key, vector.clone());
        Ok(())
    }

    fn range(&self, icao24: &str, from: i64, to: i64) -> Result<Vec<StateVector>, StoreError> {
        if from > to {
            return Ok(Vec::new());
        }
        let icao24 = icao24.to_ascii_lowercase();
        let rows = self.rows.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(rows
            .range((icao24.clone(), from, 0)..=(icao24, to, u64::MAX))
            .map(|(_, v)| v.clone())
            .collect())
    }

    fn prune_before(&self, cutoff: i64) -> Result<usize, StoreError> {
        let mut rows = self.rows.lock().map_err(|_| StoreError::Poisoned)?;
        let before = rows.len();
        rows.retain(|(_, last_contact, _), _| *last_contact >= cutoff);
        Ok(before - rows.len())
    }

    fn len(&self) -> Result<usize, StoreError> {
        Ok(self.rows.lock().map_err(|_| StoreError::Poisoned)?.len())
    }
}
