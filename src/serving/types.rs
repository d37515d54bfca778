use serde::Serialize;
use utoipa::ToSchema;

use crate::predict::{Prediction, PredictionMethod};
use crate::route::RouteHint;
use crate::state::StateVector;

/// A current-state row with whatever route the provider could resolve.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CurrentState {
    #[serde(flatten)]
    pub state: StateVector,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route: Option<RouteHint>,
}

/// What clients receive: the row as stored, or with its position replaced by
/// an extrapolation when `predicted` is set.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServedState {
    #[serde(flatten)]
    pub state: StateVector,
    pub predicted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prediction_confidence: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prediction_method: Option<PredictionMethod>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_update_age_seconds: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route: Option<RouteHint>,
}

impl ServedState {
    pub fn unmodified(current: CurrentState) -> Self {
        Self {
            state: current.state,
            predicted: false,
            prediction_confidence: None,
            prediction_method: None,
            last_update_age_seconds: None,
            route: current.route,
        }
    }

    pub fn predicted(current: CurrentState, prediction: Prediction) -> Self {
        let mut state = current.state;
        state.latitude = Some(prediction.latitude);
        state.longitude = Some(prediction.longitude);
        state.baro_altitude = prediction.baro_altitude;
        Self {
            state,
            predicted: true,
            prediction_confidence: Some(prediction.confidence),
            prediction_method: Some(prediction.method),
            last_update_age_seconds: Some(prediction.last_update_age_seconds),
            route: current.route,
        }
    }
}
