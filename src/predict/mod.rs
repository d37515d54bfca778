mod filter;
mod geo;
mod predictor;
mod types;

pub use filter::{prefilter, SkipReason};
pub use geo::{
    dead_reckon, haversine_distance, interpolate_great_circle, LatLon, EARTH_RADIUS_M,
    METERS_PER_DEGREE,
};
pub use predictor::Predictor;
pub use types::{Prediction, PredictionMethod, PredictorConfig};
