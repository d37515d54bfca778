use crate::route::RouteHint;
use crate::state::StateVector;

use super::filter::prefilter;
use super::geo::{dead_reckon, haversine_distance, interpolate_great_circle, LatLon};
use super::types::{Prediction, PredictionMethod, PredictorConfig};

const TIME_WEIGHT: f64 = 0.7;
const DISTANCE_WEIGHT: f64 = 0.3;
const PHASE: f64 = 1.0 / 3.0;

const MID_FLIGHT_CONFIDENCE: f64 = 0.9;
const STALE_AFTER_MINUTES: f64 = 5.0;
const STALE_DECAY_PER_MINUTE: f64 = 0.1;
const TIMING_BOOST: f64 = 1.1;
const MIN_CONFIDENCE: f64 = 0.5;
const MAX_CONFIDENCE: f64 = 1.0;
const DEAD_RECKONING_CONFIDENCE: f64 = 0.6;

/// Stateless extrapolator; every call is a pure function of its arguments.
#[derive(Debug, Clone, Default)]
pub struct Predictor {
    config: PredictorConfig,
}

impl Predictor {
    pub fn new(config: PredictorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PredictorConfig {
        &self.config
    }

    /// Estimates where `state` is at `now` (epoch seconds).
    ///
    /// `None` means the record should be served unmodified.
    pub fn predict(
        &self,
        state: &StateVector,
        hint: Option<&RouteHint>,
        now: i64,
    ) -> Option<Prediction> {
        let elapsed = now - state.last_contact;
        if let Some(reason) = prefilter(state, hint, elapsed, now, &self.config) {
            log::trace!("no prediction for {}: {}", state.icao24, reason);
            return None;
        }

        let position = LatLon::from(state.position()?);
        hint.and_then(|h| self.along_route(state, h, position, elapsed, now))
            .or_else(|| self.dead_reckoning(state, position, elapsed))
    }

    fn along_route(
        &self,
        state: &StateVector,
        hint: &RouteHint,
        position: LatLon,
        elapsed: i64,
        now: i64,
    ) -> Option<Prediction> {
        let (departure, arrival) = hint.endpoints()?;
        let (departure, arrival) = (LatLon::from(departure), LatLon::from(arrival));

        let total = haversine_distance(departure, arrival);
        if total <= 0.0 {
            return None;
        }

        let distance_progress = (haversine_distance(departure, position) / total).clamp(0.0, 1.0);
        let time_progress = hint.timing_progress(now);
        let progress = match time_progress {
            Some(t) => TIME_WEIGHT * t + DISTANCE_WEIGHT * distance_progress,
            None => distance_progress,
        };

        // This adds distance flown on top of a progress that was already
        // partly measured from the last position, so it can run ahead of the
        // aircraft on long gaps. Kept as-is to match served behaviour.
        let speed = state.velocity.unwrap_or(self.config.default_velocity_m_s);
        let progress = (progress + speed * elapsed as f64 / total).min(1.0);

        let point = interpolate_great_circle(departure, arrival, progress);
        let altitude = match (self.base_altitude(state), state.vertical_rate) {
            (Some(base), Some(rate)) => Some(self.climb(base, rate, elapsed)),
            (base, _) => Some(self.phase_altitude(base, progress)),
        };

        Some(Prediction {
            latitude: point.lat,
            longitude: point.lon,
            baro_altitude: altitude,
            confidence: route_confidence(progress, elapsed, time_progress.is_some()),
            method: PredictionMethod::GreatCircle,
            last_update_age_seconds: elapsed,
        })
    }

    fn dead_reckoning(
        &self,
        state: &StateVector,
        position: LatLon,
        elapsed: i64,
    ) -> Option<Prediction> {
        let speed = state.velocity?;
        let track = state.true_track?;

        let point = dead_reckon(position, track, speed * elapsed as f64);
        let altitude = self.base_altitude(state).map(|base| match state.vertical_rate {
            Some(rate) => self.climb(base, rate, elapsed),
            None => base.clamp(0.0, self.config.max_altitude_m),
        });

        Some(Prediction {
            latitude: point.lat,
            longitude: point.lon,
            baro_altitude: altitude,
            confidence: DEAD_RECKONING_CONFIDENCE,
            method: PredictionMethod::DeadReckoning,
            last_update_age_seconds: elapsed,
        })
    }

    fn base_altitude(&self, state: &StateVector) -> Option<f64> {
        state.baro_altitude.or(state.geo_altitude)
    }

    fn climb(&self, base: f64, rate: f64, elapsed: i64) -> f64 {
        (base + rate * elapsed as f64).clamp(0.0, self.config.max_altitude_m)
    }

    /// Climb toward cruise in the first third, hold in the middle third,
    /// descend toward the field in the last third.
    fn phase_altitude(&self, current: Option<f64>, progress: f64) -> f64 {
        let cruise = self.config.cruise_altitude_m;
        let altitude = if progress < PHASE {
            let target = cruise * progress / PHASE;
            current.map_or(target, |alt| alt.max(target))
        } else if progress <= 1.0 - PHASE {
            current.unwrap_or(cruise)
        } else {
            let target = cruise * (1.0 - progress) / PHASE;
            current.map_or(target, |alt| alt.min(target))
        };
        altitude.clamp(0.0, self.config.max_altitude_m)
    }
}

fn route_confidence(progress: f64, elapsed_secs: i64, has_timing: bool) -> f64 {
    let mut confidence = MAX_CONFIDENCE;
    if progress > 0.1 && progress < 0.9 {
        confidence = MID_FLIGHT_CONFIDENCE;
    }

    let minutes = elapsed_secs as f64 / 60.0;
    if minutes > STALE_AFTER_MINUTES {
        confidence *= (1.0 - STALE_DECAY_PER_MINUTE * (minutes - STALE_AFTER_MINUTES)).max(0.5);
    }
    if has_timing {
        confidence = (confidence * TIMING_BOOST).min(MAX_CONFIDENCE);
    }

    confidence.clamp(MIN_CONFIDENCE, MAX_CONFIDENCE)
}
