//! sled-backed tables.
//!
//! `current` is keyed by the ASCII address. `history` keys are
//! `icao24 (6 bytes) ‖ last_contact (8 bytes, order-preserving) ‖ id (8 bytes)`
//! so a prefix range walks one aircraft's observations in time order.

use std::path::Path;

use crate::fusion::{MergeDecision, MergePolicy};
use crate::state::StateVector;

use super::{in_bounds, newest_first, BoundingBox, CurrentStateStore, HistoryLog, StoreError};
use super::QUERY_ROW_CAP;

const CURRENT_TREE: &str = "current";
const HISTORY_TREE: &str = "history";
const ICAO24_LEN: usize = 6;
const HISTORY_KEY_LEN: usize = ICAO24_LEN + 16;

pub fn open_sled<P: AsRef<Path>>(path: P) -> Result<sled::Db, StoreError> {
    Ok(sled::open(path)?)
}

pub struct SledStore {
    tree: sled::Tree,
}

impl SledStore {
    pub fn new(db: &sled::Db) -> Result<Self, StoreError> {
        Ok(Self {
            tree: db.open_tree(CURRENT_TREE)?,
        })
    }

    fn decode_all(&self) -> impl Iterator<Item = Result<StateVector, StoreError>> + '_ {
        self.tree.iter().values().map(|value| {
            let bytes = value?;
            Ok(serde_json::from_slice(&bytes)?)
        })
    }
}

impl CurrentStateStore for SledStore {
    fn merge(
        &self,
        incoming: StateVector,
        policy: &MergePolicy,
    ) -> Result<MergeDecision, StoreError> {
        let encoded = serde_json::to_vec(&incoming)?;
        let mut decision = MergeDecision::Keep;
        let mut failure: Option<StoreError> = None;

        // The closure may run several times under contention; only the
        // attempt whose swap succeeds leaves its verdict behind.
        self.tree
            .fetch_and_update(incoming.icao24.as_bytes(), |stored| {
                failure = None;
                match stored {
                    None => {
                        decision = MergeDecision::Insert;
                        Some(encoded.clone())
                    }
                    Some(bytes) => match serde_json::from_slice::<StateVector>(bytes) {
                        Ok(current) => {
                            decision = policy.decide(Some(&current), &incoming);
                            if decision.writes() {
                                Some(encoded.clone())
                            } else {
                                Some(bytes.to_vec())
                            }
                        }
                        Err(e) => {
                            decision = MergeDecision::Keep;
                            failure = Some(e.into());
                            Some(bytes.to_vec())
                        }
                    },
                }
            })?;

        match failure {
            Some(e) => Err(e),
            None => Ok(decision),
        }
    }

    fn get(&self, icao24: &str) -> Result<Option<StateVector>, StoreError> {
        match self.tree.get(icao24.to_ascii_lowercase().as_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn query_in_bounds(
        &self,
        bounds: &BoundingBox,
        recent_contact: i64,
    ) -> Result<Vec<StateVector>, StoreError> {
        let mut matched = Vec::new();
        for row in self.decode_all() {
            let row = row?;
            if in_bounds(&row, bounds, recent_contact) {
                matched.push(row);
            }
        }
        Ok(newest_first(matched, QUERY_ROW_CAP))
    }

    fn find_by_identifier(&self, id: &str) -> Result<Vec<StateVector>, StoreError> {
        let mut matched = Vec::new();
        for row in self.decode_all() {
            let row = row?;
            if row.matches_identifier(id) {
                matched.push(row);
            }
        }
        Ok(newest_first(matched, usize::MAX))
    }

    fn len(&self) -> Result<usize, StoreError> {
        Ok(self.tree.len())
    }
}

pub struct SledHistory {
    db: sled::Db,
    tree: sled::Tree,
}

impl SledHistory {
    pub fn new(db: &sled::Db) -> Result<Self, StoreError> {
        Ok(Self {
            db: db.clone(),
            tree: db.open_tree(HISTORY_TREE)?,
        })
    }
}

fn encode_contact(last_contact: i64) -> [u8; 8] {
    ((last_contact as u64) ^ (1 << 63)).to_be_bytes()
}

fn decode_contact(bytes: &[u8]) -> Result<i64, StoreError> {
    let raw: [u8; 8] = bytes.try_into().map_err(|_| StoreError::CorruptKey)?;
    Ok((u64::from_be_bytes(raw) ^ (1 << 63)) as i64)
}

fn history_key(icao24: &str, last_contact: i64, id: u64) -> Vec<u8> {
    let mut key = Vec::with_capacity(HISTORY_KEY_LEN);
    key.extend_from_slice(icao24.as_bytes());
    key.extend_from_slice(&encode_contact(last_contact));
    key.extend_from_slice(&id.to_be_bytes());
    key
}

impl HistoryLog for SledHistory {
    fn append(&self, vector: &StateVector) -> Result<(), StoreError> {
        let id = self.db.generate_id()?;
        let key = history_key(&vector.icao24, vector.last_contact, id);
        self.tree.insert(key, serde_json::to_vec(vector)?)?;
        Ok(())
    }

    fn range(&self, icao24: &str, from: i64, to: i64) -> Result<Vec<StateVector>, StoreError> {
        if from > to {
            return Ok(Vec::new());
        }
        let icao24 = icao24.to_ascii_lowercase();
        let start = history_key(&icao24, from, 0);
        let end = history_key(&icao24, to, u64::MAX);

        let mut rows = Vec::new();
        for entry in self.tree.range(start..=end) {
            let (_, value) = entry?;
            rows.push(serde_json::from_slice(&value)?);
        }
        Ok(rows)
    }

    fn prune_before(&self, cutoff: i64) -> Result<usize, StoreError> {
        let mut removed = 0;
        for key in self.tree.iter().keys() {
            let key = key?;
            if key.len() != HISTORY_KEY_LEN {
                return Err(StoreError::CorruptKey);
            }
            if decode_contact(&key[ICAO24_LEN..ICAO24_LEN + 8])? < cutoff {
                self.tree.remove(&key)?;
                removed += 1;
            }
        }
        Ok(removed)
    }

    fn len(&self) -> Result<usize, StoreError> {
        Ok(self.tree.len())
    }
}
