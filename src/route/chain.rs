use std::sync::Arc;

use super::types::RouteHint;

/// One strategy for resolving a route (cache, historical feed, paid API...).
pub trait RouteSource: Send + Sync {
    fn name(&self) -> &str;
    fn lookup(&self, icao24: &str, callsign: Option<&str>) -> Option<RouteHint>;
}

/// What the serving path consults. Absence is normal, never an error.
pub trait RouteProvider: Send + Sync {
    fn route_hint(&self, icao24: &str, callsign: Option<&str>) -> Option<RouteHint>;
}

/// Ordered fallback over [`RouteSource`]s; the first hit wins.
#[derive(Default)]
pub struct RouteChain {
    sources: Vec<Arc<dyn RouteSource>>,
}

impl RouteChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_source(mut self, source: Arc<dyn RouteSource>) -> Self {
        self.sources.push(source);
        self
    }

    pub fn source_names(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.name()).collect()
    }
}

impl RouteProvider for RouteChain {
    fn route_hint(&self, icao24: &str, callsign: Option<&str>) -> Option<RouteHint> {
        self.sources.iter().find_map(|source| {
            let hint = source.lookup(icao24, callsign);
            if hint.is_some() {
                log::trace!("route for {} resolved by {}", icao24, source.name());
            }
            hint
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route::FlightStatus;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Fixed {
        name: &'static str,
        hint: Option<RouteHint>,
        calls: AtomicUsize,
    }

    impl RouteSource for Fixed {
        fn name(&self) -> &str {
            self.name
        }

        fn lookup(&self, _icao24: &str, _callsign: Option<&str>) -> Option<RouteHint> {
            self.calls.fetch_add(1, Ordering::Relaxed);
            self.hint.clone()
        }
    }

    fn fixed(name: &'static str, status: Option<FlightStatus>) -> Arc<Fixed> {
        Arc::new(Fixed {
            name,
            hint: status.map(|s| RouteHint {
                status: Some(s),
                ..Default::default()
            }),
            calls: AtomicUsize::new(0),
        })
    }

    #[test]
    fn tries_sources_in_order_and_stops_at_first_hit() {
        let miss = fixed("miss", None);
        let hit = fixed("hit", Some(FlightStatus::Active));
        let never = fixed("never", Some(FlightStatus::Landed));
        let chain = RouteChain::new()
            .with_source(miss.clone())
            .with_source(hit.clone())
            .with_source(never.clone());

        let hint = chain.route_hint("abc123", None).unwrap();
        assert_eq!(hint.status, Some(FlightStatus::Active));
        assert_eq!(miss.calls.load(Ordering::Relaxed), 1);
        assert_eq!(never.calls.load(Ordering::Relaxed), 0);
        assert_eq!(chain.source_names(), ["miss", "hit", "never"]);
    }

    #[test]
    fn empty_chain_resolves_nothing() {
        assert!(RouteChain::new().route_hint("abc123", Some("KLM1")).is_none());
    }
}
