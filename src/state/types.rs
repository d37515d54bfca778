use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// OpenSky emitter category for rotorcraft.
pub const ROTORCRAFT_CATEGORY: u8 = 7;

/// Trust rank of a telemetry source. Lower values are more trusted.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(transparent)]
pub struct SourcePriority(pub u8);

impl SourcePriority {
    pub const FEEDER: SourcePriority = SourcePriority(10);
    pub const SECONDARY_API: SourcePriority = SourcePriority(20);
    pub const PRIMARY_FEED: SourcePriority = SourcePriority(30);
}

impl std::fmt::Display for SourcePriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where a batch of observations came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Provenance {
    pub data_source: String,
    pub feeder_id: Option<String>,
    pub priority: SourcePriority,
}

impl Provenance {
    pub fn feeder(feeder_id: impl Into<String>) -> Self {
        Self {
            data_source: "feeder".to_string(),
            feeder_id: Some(feeder_id.into()),
            priority: SourcePriority::FEEDER,
        }
    }

    pub fn secondary(data_source: impl Into<String>) -> Self {
        Self {
            data_source: data_source.into(),
            feeder_id: None,
            priority: SourcePriority::SECONDARY_API,
        }
    }

    pub fn primary_feed() -> Self {
        Self {
            data_source: "opensky".to_string(),
            feeder_id: None,
            priority: SourcePriority::PRIMARY_FEED,
        }
    }
}

/// One telemetry observation for one aircraft.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StateVector {
    pub icao24: String,
    pub callsign: String,
    pub origin_country: String,
    pub time_position: Option<i64>,
    pub last_contact: i64,
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
    pub baro_altitude: Option<f64>,
    pub on_ground: bool,
    pub velocity: Option<f64>,
    pub true_track: Option<f64>,
    pub vertical_rate: Option<f64>,
    pub sensors: Option<Vec<i64>>,
    pub geo_altitude: Option<f64>,
    pub squawk: Option<String>,
    pub spi: bool,
    pub position_source: u8,
    pub category: Option<u8>,
    pub feeder_id: Option<String>,
    pub ingestion_timestamp: DateTime<Utc>,
    pub data_source: String,
    pub source_priority: SourcePriority,
}

impl StateVector {
    pub fn position(&self) -> Option<(f64, f64)> {
        Some((self.latitude?, self.longitude?))
    }

    pub fn has_callsign(&self) -> bool {
        !self.callsign.is_empty()
    }

    pub fn is_rotorcraft(&self) -> bool {
        self.category == Some(ROTORCRAFT_CATEGORY)
    }

    /// Case-insensitive match on the address or the callsign.
    pub fn matches_identifier(&self, id: &str) -> bool {
        let id = id.trim();
        if id.is_empty() {
            return false;
        }
        self.icao24.eq_ignore_ascii_case(id)
            || (self.has_callsign() && self.callsign.eq_ignore_ascii_case(id))
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::vector;
    use super::*;

    #[test]
    fn lower_priority_value_sorts_first() {
        assert!(SourcePriority::FEEDER < SourcePriority::SECONDARY_API);
        assert!(SourcePriority::SECONDARY_API < SourcePriority::PRIMARY_FEED);
    }

    #[test]
    fn identifier_match_ignores_case() {
        let v = vector("abc123", 1000, &Provenance::primary_feed());
        assert!(v.matches_identifier("ABC123"));
        assert!(v.matches_identifier("klm1023"));
        assert!(!v.matches_identifier("klm10"));
        assert!(!v.matches_identifier("  "));
    }

    #[test]
    fn blank_callsign_never_matches() {
        let mut v = vector("abc123", 1000, &Provenance::primary_feed());
        v.callsign.clear();
        assert!(!v.matches_identifier(""));
        assert!(v.matches_identifier("abc123"));
    }
}
