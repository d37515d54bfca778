use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use utoipa::ToSchema;

use super::chain::RouteSource;
use super::types::RouteHint;

pub const DEFAULT_CACHE_CAPACITY: usize = 50_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CachedRoute {
    pub icao24: Option<String>,
    pub callsign: Option<String>,
    pub hint: RouteHint,
    pub cached_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct Index {
    by_icao24: HashMap<String, Arc<CachedRoute>>,
    by_callsign: HashMap<String, Arc<CachedRoute>>,
}

/// Resolved routes keyed by address and by callsign.
///
/// A lookup returns the most recently cached entry matching either key.
#[derive(Debug)]
pub struct RouteHintCache {
    index: RwLock<Index>,
    capacity: usize,
}

impl Default for RouteHintCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

fn icao24_key(icao24: &str) -> Option<String> {
    Some(icao24.trim().to_ascii_lowercase()).filter(|k| !k.is_empty())
}

fn callsign_key(callsign: &str) -> Option<String> {
    Some(callsign.trim().to_ascii_uppercase()).filter(|k| !k.is_empty())
}

impl RouteHintCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            index: RwLock::new(Index::default()),
            capacity: capacity.max(1),
        }
    }

    pub fn insert(&self, entry: CachedRoute) {
        let entry = Arc::new(entry);
        let Ok(mut index) = self.index.write() else {
            log::warn!("route cache lock poisoned, dropping entry");
            return;
        };

        if let Some(key) = entry.icao24.as_deref().and_then(icao24_key) {
            keep_newer(&mut index.by_icao24, key, &entry);
        }
        if let Some(key) = entry.callsign.as_deref().and_then(callsign_key) {
            keep_newer(&mut index.by_callsign, key, &entry);
        }

        evict_oldest(&mut index.by_icao24, self.capacity);
        evict_oldest(&mut index.by_callsign, self.capacity);
    }

    pub fn get(&self, icao24: &str, callsign: Option<&str>) -> Option<CachedRoute> {
        let index = self.index.read().ok()?;
        let by_icao24 = icao24_key(icao24).and_then(|k| index.by_icao24.get(&k));
        let by_callsign = callsign
            .and_then(callsign_key)
            .and_then(|k| index.by_callsign.get(&k));

        match (by_icao24, by_callsign) {
            (Some(a), Some(b)) if b.cached_at > a.cached_at => Some(b.as_ref().clone()),
            (Some(a), _) => Some(a.as_ref().clone()),
            (None, b) => b.map(|b| b.as_ref().clone()),
        }
    }

    pub fn len(&self) -> usize {
        self.index
            .read()
            .map(|i| i.by_icao24.len() + i.by_callsign.len())
            .unwrap_or(0)
    }
}

fn keep_newer(map: &mut HashMap<String, Arc<CachedRoute>>, key: String, entry: &Arc<CachedRoute>) {
    match map.get(&key) {
        Some(existing) if existing.cached_at > entry.cached_at => {}
        _ => {
            map.insert(key, entry.clone());
        }
    }
}

/// Drops the oldest tenth once a map outgrows `capacity`.
fn evict_oldest(map: &mut HashMap<String, Arc<CachedRoute>>, capacity: usize) {
    if map.len() <= capacity {
        return;
    }
    let mut ages: Vec<_> = map
        .iter()
        .map(|(k, v)| (v.cached_at, k.clone()))
        .collect();
    ages.sort_unstable();
    let target = capacity - capacity / 10;
    let excess = map.len() - target;
    for (_, key) in ages.into_iter().take(excess) {
        map.remove(&key);
    }
}

impl RouteSource for RouteHintCache {
    fn name(&self) -> &str {
        "cache"
    }

    fn lookup(&self, icao24: &str, callsign: Option<&str>) -> Option<RouteHint> {
        self.get(icao24, callsign).map(|c| c.hint)
    }
}
