use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::error::StoreError;

/// Lat/lon rectangle. A box with `lon_min > lon_max` wraps across the
/// antimeridian.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct BoundingBox {
    pub lat_min: f64,
    pub lon_min: f64,
    pub lat_max: f64,
    pub lon_max: f64,
}

impl BoundingBox {
    pub fn new(lat_min: f64, lon_min: f64, lat_max: f64, lon_max: f64) -> Result<Self, StoreError> {
        let finite = [lat_min, lon_min, lat_max, lon_max]
            .iter()
            .all(|v| v.is_finite());
        if !finite {
            return Err(StoreError::InvalidBounds("non-finite coordinate".into()));
        }
        if !(-90.0..=90.0).contains(&lat_min) || !(-90.0..=90.0).contains(&lat_max) {
            return Err(StoreError::InvalidBounds("latitude outside -90..90".into()));
        }
        if !(-180.0..=180.0).contains(&lon_min) || !(-180.0..=180.0).contains(&lon_max) {
            return Err(StoreError::InvalidBounds("longitude outside -180..180".into()));
        }
        if lat_min > lat_max {
            return Err(StoreError::InvalidBounds(format!(
                "lat_min {} above lat_max {}",
                lat_min, lat_max
            )));
        }
        Ok(Self {
            lat_min,
            lon_min,
            lat_max,
            lon_max,
        })
    }

    pub fn world() -> Self {
        Self {
            lat_min: -90.0,
            lon_min: -180.0,
            lat_max: 90.0,
            lon_max: 180.0,
        }
    }

    pub fn crosses_antimeridian(&self) -> bool {
        self.lon_min > self.lon_max
    }

    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        if lat < self.lat_min || lat > self.lat_max {
            return false;
        }
        if self.crosses_antimeridian() {
            lon >= self.lon_min || lon <= self.lon_max
        } else {
            lon >= self.lon_min && lon <= self.lon_max
        }
    }
}
