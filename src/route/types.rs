use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

const SAME_AIRPORT_EPSILON_DEG: f64 = 1e-6;
const ROTORCRAFT_MARKERS: [&str; 3] = ["heli", "rotor", "gyro"];

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Airport {
    /// ICAO or IATA code.
    pub code: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl Airport {
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        Some((self.latitude?, self.longitude?))
    }

    pub fn same_as(&self, other: &Airport) -> bool {
        if let (Some(a), Some(b)) = (&self.code, &other.code) {
            return a.trim().eq_ignore_ascii_case(b.trim());
        }
        match (self.coordinates(), other.coordinates()) {
            (Some(a), Some(b)) => {
                (a.0 - b.0).abs() < SAME_AIRPORT_EPSILON_DEG
                    && (a.1 - b.1).abs() < SAME_AIRPORT_EPSILON_DEG
            }
            _ => false,
        }
    }
}

/// Epoch seconds; any subset may be known.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FlightTimestamps {
    pub scheduled_departure: Option<i64>,
    pub actual_departure: Option<i64>,
    pub scheduled_arrival: Option<i64>,
    pub estimated_arrival: Option<i64>,
    pub actual_arrival: Option<i64>,
}

impl FlightTimestamps {
    pub fn departure(&self) -> Option<i64> {
        self.actual_departure.or(self.scheduled_departure)
    }

    pub fn arrival(&self) -> Option<i64> {
        self.actual_arrival
            .or(self.estimated_arrival)
            .or(self.scheduled_arrival)
    }

    /// Elapsed share of the block time at `now`, when both ends are known.
    pub fn progress_at(&self, now: i64) -> Option<f64> {
        let (departure, arrival) = (self.departure()?, self.arrival()?);
        if arrival <= departure {
            return None;
        }
        let progress = (now - departure) as f64 / (arrival - departure) as f64;
        Some(progress.clamp(0.0, 1.0))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum FlightStatus {
    Scheduled,
    Active,
    Landed,
    Cancelled,
    Diverted,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RouteHint {
    pub departure_location: Option<Airport>,
    pub arrival_location: Option<Airport>,
    pub flight_timestamps: Option<FlightTimestamps>,
    pub status: Option<FlightStatus>,
    /// Free-form type description, e.g. "Airbus A320" or "Eurocopter EC135".
    pub aircraft_type: Option<String>,
}

impl RouteHint {
    /// Departure and arrival coordinates, when both are known.
    pub fn endpoints(&self) -> Option<((f64, f64), (f64, f64))> {
        let departure = self.departure_location.as_ref()?.coordinates()?;
        let arrival = self.arrival_location.as_ref()?.coordinates()?;
        Some((departure, arrival))
    }

    pub fn timing_progress(&self, now: i64) -> Option<f64> {
        self.flight_timestamps.as_ref()?.progress_at(now)
    }

    pub fn has_arrived(&self, now: i64) -> bool {
        self.status == Some(FlightStatus::Landed)
            || self
                .flight_timestamps
                .as_ref()
                .and_then(|t| t.actual_arrival)
                .is_some_and(|t| t <= now)
    }

    pub fn is_round_trip(&self) -> bool {
        match (&self.departure_location, &self.arrival_location) {
            (Some(d), Some(a)) => d.same_as(a),
            _ => false,
        }
    }

    pub fn is_rotorcraft_type(&self) -> bool {
        self.aircraft_type.as_deref().is_some_and(|t| {
            let t = t.to_ascii_lowercase();
            ROTORCRAFT_MARKERS.iter().any(|m| t.contains(m))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn airport(code: Option<&str>, lat: f64, lon: f64) -> Airport {
        Airport {
            code: code.map(String::from),
            latitude: Some(lat),
            longitude: Some(lon),
        }
    }

    #[test]
    fn endpoints_need_both_coordinates() {
        let mut hint = RouteHint {
            departure_location: Some(airport(Some("EHAM"), 52.31, 4.76)),
            ..Default::default()
        };
        assert!(hint.endpoints().is_none());
        hint.arrival_location = Some(Airport {
            code: Some("LFPG".into()),
            ..Default::default()
        });
        assert!(hint.endpoints().is_none());
        hint.arrival_location = Some(airport(Some("LFPG"), 49.01, 2.55));
        assert_eq!(hint.endpoints(), Some(((52.31, 4.76), (49.01, 2.55))));
    }

    #[test]
    fn timing_progress_prefers_actual_times() {
        let t = FlightTimestamps {
            scheduled_departure: Some(0),
            actual_departure: Some(100),
            scheduled_arrival: Some(1000),
            estimated_arrival: Some(1100),
            actual_arrival: None,
        };
        assert_eq!(t.progress_at(600), Some(0.5));
        assert_eq!(t.progress_at(5000), Some(1.0));
        assert_eq!(t.progress_at(0), Some(0.0));

        let inverted = FlightTimestamps {
            scheduled_departure: Some(1000),
            scheduled_arrival: Some(1000),
            ..Default::default()
        };
        assert_eq!(inverted.progress_at(500), None);
    }

    #[test]
    fn arrival_detection() {
        let mut hint = RouteHint::default();
        assert!(!hint.has_arrived(100));
        hint.flight_timestamps = Some(FlightTimestamps {
            actual_arrival: Some(50),
            ..Default::default()
        });
        assert!(hint.has_arrived(100));
        assert!(!hint.has_arrived(10));
        hint.flight_timestamps = None;
        hint.status = Some(FlightStatus::Landed);
        assert!(hint.has_arrived(0));
    }

    #[test]
    fn round_trip_by_code_or_position() {
        let hint = RouteHint {
            departure_location: Some(airport(Some("eham"), 52.31, 4.76)),
            arrival_location: Some(airport(Some("EHAM"), 0.0, 0.0)),
            ..Default::default()
        };
        assert!(hint.is_round_trip());

        let hint = RouteHint {
            departure_location: Some(airport(None, 52.31, 4.76)),
            arrival_location: Some(airport(None, 52.31, 4.76)),
            ..Default::default()
        };
        assert!(hint.is_round_trip());
    }

    #[test]
    fn rotorcraft_types() {
        let mut hint = RouteHint {
            aircraft_type: Some("Eurocopter EC135 Helicopter".into()),
            ..Default::default()
        };
        assert!(hint.is_rotorcraft_type());
        hint.aircraft_type = Some("Boeing 737-800".into());
        assert!(!hint.is_rotorcraft_type());
    }
}
