use crate::route::RouteHint;
use crate::state::StateVector;

use super::types::PredictorConfig;

/// Why an aircraft is served without extrapolation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "snake_case")]
pub enum SkipReason {
    TooFresh,
    TooStale,
    Rotorcraft,
    NotCruising,
    Arrived,
    SameAirport,
    RotorcraftType,
}

/// Cheap checks that rule out prediction before any geometry is done.
pub fn prefilter(
    state: &StateVector,
    hint: Option<&RouteHint>,
    elapsed_secs: i64,
    now: i64,
    config: &PredictorConfig,
) -> Option<SkipReason> {
    if elapsed_secs < config.min_age_secs {
        return Some(SkipReason::TooFresh);
    }
    if elapsed_secs > config.max_age_secs {
        return Some(SkipReason::TooStale);
    }
    if state.is_rotorcraft() {
        return Some(SkipReason::Rotorcraft);
    }
    if state.velocity.is_some_and(|v| v < config.min_velocity_m_s) {
        return Some(SkipReason::NotCruising);
    }

    let hint = hint?;
    if hint.has_arrived(now) {
        Some(SkipReason::Arrived)
    } else if hint.is_round_trip() {
        Some(SkipReason::SameAirport)
    } else if hint.is_rotorcraft_type() {
        Some(SkipReason::RotorcraftType)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route::{Airport, FlightStatus};
    use crate::state::fixtures::vector;
    use crate::state::{Provenance, ROTORCRAFT_CATEGORY};

    fn check(state: &StateVector, hint: Option<&RouteHint>, elapsed: i64) -> Option<SkipReason> {
        prefilter(state, hint, elapsed, 10_000, &PredictorConfig::default())
    }

    #[test]
    fn age_window() {
        let v = vector("abc123", 1000, &Provenance::primary_feed());
        assert_eq!(check(&v, None, 20), Some(SkipReason::TooFresh));
        assert_eq!(check(&v, None, 700), Some(SkipReason::TooStale));
        assert_eq!(check(&v, None, 30), None);
        assert_eq!(check(&v, None, 600), None);
    }

    #[test]
    fn aircraft_properties() {
        let mut v = vector("abc123", 1000, &Provenance::primary_feed());
        v.category = Some(ROTORCRAFT_CATEGORY);
        assert_eq!(check(&v, None, 120), Some(SkipReason::Rotorcraft));

        let mut v = vector("abc123", 1000, &Provenance::primary_feed());
        v.velocity = Some(49.9);
        assert_eq!(check(&v, None, 120), Some(SkipReason::NotCruising));
        v.velocity = None;
        assert_eq!(check(&v, None, 120), None);
    }

    #[test]
    fn route_hint_vetoes() {
        let v = vector("abc123", 1000, &Provenance::primary_feed());
        let landed = RouteHint {
            status: Some(FlightStatus::Landed),
            ..Default::default()
        };
        assert_eq!(check(&v, Some(&landed), 120), Some(SkipReason::Arrived));

        let eham = Airport {
            code: Some("EHAM".into()),
            ..Default::default()
        };
        let circuit = RouteHint {
            departure_location: Some(eham.clone()),
            arrival_location: Some(eham),
            ..Default::default()
        };
        assert_eq!(check(&v, Some(&circuit), 120), Some(SkipReason::SameAirport));

        let heli = RouteHint {
            aircraft_type: Some("AgustaWestland AW139 helicopter".into()),
            ..Default::default()
        };
        assert_eq!(check(&v, Some(&heli), 120), Some(SkipReason::RotorcraftType));
    }
}
