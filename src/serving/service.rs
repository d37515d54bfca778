use std::sync::Arc;

use crate::predict::Predictor;
use crate::route::RouteProvider;
use crate::state::StateVector;
use crate::store::{BoundingBox, CurrentStateStore, StoreError};

use super::types::{CurrentState, ServedState};

/// Answers client queries against the current-state table.
pub struct StateService {
    store: Arc<dyn CurrentStateStore>,
    routes: Arc<dyn RouteProvider>,
    predictor: Predictor,
}

impl StateService {
    pub fn new(
        store: Arc<dyn CurrentStateStore>,
        routes: Arc<dyn RouteProvider>,
        predictor: Predictor,
    ) -> Self {
        Self {
            store,
            routes,
            predictor,
        }
    }

    fn enrich(&self, state: StateVector) -> CurrentState {
        let callsign = state.has_callsign().then(|| state.callsign.trim());
        let route = self.routes.route_hint(&state.icao24, callsign);
        CurrentState { state, route }
    }

    /// Rows inside `bounds` heard from since `recent_contact`, newest first,
    /// each with a best-effort route.
    pub fn query_in_bounds(
        &self,
        bounds: &BoundingBox,
        recent_contact: i64,
    ) -> Result<Vec<CurrentState>, StoreError> {
        let rows = self.store.query_in_bounds(bounds, recent_contact)?;
        Ok(rows.into_iter().map(|row| self.enrich(row)).collect())
    }

    pub fn find_by_identifier(&self, id: &str) -> Result<Vec<CurrentState>, StoreError> {
        let rows = self.store.find_by_identifier(id.trim())?;
        Ok(rows.into_iter().map(|row| self.enrich(row)).collect())
    }

    /// Extrapolates `current` to `now`, or returns it untouched when no
    /// estimate applies.
    pub fn predict(&self, current: CurrentState, now: i64) -> ServedState {
        match self
            .predictor
            .predict(&current.state, current.route.as_ref(), now)
        {
            Some(prediction) => ServedState::predicted(current, prediction),
            None => ServedState::unmodified(current),
        }
    }

    /// Query followed by per-row prediction.
    pub fn snapshot(
        &self,
        bounds: &BoundingBox,
        recent_contact: i64,
        now: i64,
    ) -> Result<Vec<ServedState>, StoreError> {
        let rows = self.query_in_bounds(bounds, recent_contact)?;
        let served: Vec<ServedState> = rows.into_iter().map(|row| self.predict(row, now)).collect();
        log::debug!(
            "snapshot: {} rows, {} predicted",
            served.len(),
            served.iter().filter(|s| s.predicted).count()
        );
        Ok(served)
    }
}
