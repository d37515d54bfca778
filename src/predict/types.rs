use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema, strum_macros::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PredictionMethod {
    GreatCircle,
    DeadReckoning,
}

/// Extrapolated position for one aircraft at one instant.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Prediction {
    pub latitude: f64,
    pub longitude: f64,
    pub baro_altitude: Option<f64>,
    /// Always within `[0.5, 1.0]` for great-circle estimates.
    pub confidence: f64,
    pub method: PredictionMethod,
    pub last_update_age_seconds: i64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PredictorConfig {
    /// Younger observations are served as-is.
    pub min_age_secs: i64,
    /// Older observations are no longer extrapolated.
    pub max_age_secs: i64,
    /// Below this ground speed the aircraft is not in cruise.
    pub min_velocity_m_s: f64,
    /// Assumed speed along a route when none was reported.
    pub default_velocity_m_s: f64,
    pub cruise_altitude_m: f64,
    pub max_altitude_m: f64,
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            min_age_secs: 30,
            max_age_secs: 600,
            min_velocity_m_s: 50.0,
            default_velocity_m_s: 250.0,
            cruise_altitude_m: 12_000.0,
            max_altitude_m: 50_000.0,
        }
    }
}
