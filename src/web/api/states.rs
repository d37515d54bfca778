use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::serving::{CurrentState, ServedState};
use crate::state::StateVector;
use crate::store::BoundingBox;
use crate::web::api::error::{ApiError, ApiResult, ErrorResponse};
use crate::web::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct StatesQuery {
    pub lamin: Option<f64>,
    pub lomin: Option<f64>,
    pub lamax: Option<f64>,
    pub lomax: Option<f64>,
    /// Seconds; overrides `query.recent_contact`.
    pub max_age: Option<u64>,
    /// Extrapolate positions; on unless explicitly disabled.
    pub predict: Option<bool>,
}

impl StatesQuery {
    fn bounds(&self) -> ApiResult<BoundingBox> {
        match (self.lamin, self.lomin, self.lamax, self.lomax) {
            (None, None, None, None) => Ok(BoundingBox::world()),
            (Some(lamin), Some(lomin), Some(lamax), Some(lomax)) => {
                Ok(BoundingBox::new(lamin, lomin, lamax, lomax)?)
            }
            _ => Err(ApiError::Validation(
                "lamin, lomin, lamax and lomax must be given together".into(),
            )),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StatesResponse {
    /// Epoch seconds the snapshot was computed for.
    pub time: i64,
    pub states: Vec<ServedState>,
}

#[utoipa::path(
    get,
    path = "/api/states",
    tag = "states",
    params(
        ("lamin" = Option<f64>, Query, description = "Southern latitude"),
        ("lomin" = Option<f64>, Query, description = "Western longitude; may exceed lomax to wrap the antimeridian"),
        ("lamax" = Option<f64>, Query, description = "Northern latitude"),
        ("lomax" = Option<f64>, Query, description = "Eastern longitude"),
        ("max_age" = Option<u64>, Query, description = "Only aircraft heard from within this many seconds"),
        ("predict" = Option<bool>, Query, description = "Extrapolate positions (default true)")
    ),
    responses(
        (status = 200, description = "Aircraft in the box, newest first, at most 1000", body = StatesResponse),
        (status = 400, description = "Invalid bounding box", body = ErrorResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse)
    )
)]
pub async fn list_states(
    State(state): State<AppState>,
    Query(query): Query<StatesQuery>,
) -> ApiResult<Json<StatesResponse>> {
    let bounds = query.bounds()?;
    let now = Utc::now().timestamp();
    let max_age = query
        .max_age
        .unwrap_or_else(|| state.config.query.recent_contact.as_secs());
    let recent_contact = now.saturating_sub(i64::try_from(max_age).unwrap_or(i64::MAX));

    let states = if query.predict.unwrap_or(true) {
        state.service.snapshot(&bounds, recent_contact, now)?
    } else {
        state
            .service
            .query_in_bounds(&bounds, recent_contact)?
            .into_iter()
            .map(ServedState::unmodified)
            .collect()
    };

    Ok(Json(StatesResponse { time: now, states }))
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: String,
}

#[utoipa::path(
    get,
    path = "/api/states/search",
    tag = "states",
    params(
        ("q" = String, Query, description = "ICAO 24-bit address or callsign, case-insensitive")
    ),
    responses(
        (status = 200, description = "Matching aircraft, most recent first", body = Vec<CurrentState>),
        (status = 400, description = "Empty query", body = ErrorResponse)
    )
)]
pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Json<Vec<CurrentState>>> {
    if query.q.trim().is_empty() {
        return Err(ApiError::Validation("q must not be empty".into()));
    }
    Ok(Json(state.service.find_by_identifier(&query.q)?))
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub from: Option<i64>,
    pub to: Option<i64>,
}

#[utoipa::path(
    get,
    path = "/api/states/{icao24}/history",
    tag = "states",
    params(
        ("icao24" = String, Path, description = "ICAO 24-bit address, 6 hex digits"),
        ("from" = Option<i64>, Query, description = "Earliest last contact, epoch seconds (default: one hour ago)"),
        ("to" = Option<i64>, Query, description = "Latest last contact, epoch seconds (default: now)")
    ),
    responses(
        (status = 200, description = "Archived observations, oldest first", body = Vec<StateVector>),
        (status = 400, description = "Invalid address or range", body = ErrorResponse)
    )
)]
pub async fn history(
    State(state): State<AppState>,
    Path(icao24): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<Json<Vec<StateVector>>> {
    if icao24.len() != 6 || !icao24.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ApiError::Validation(format!("invalid icao24 {:?}", icao24)));
    }
    if query.from.is_some_and(|t| t < 0) || query.to.is_some_and(|t| t < 0) {
        return Err(ApiError::Validation("from and to must not be negative".into()));
    }
    let now = Utc::now().timestamp();
    let to = query.to.unwrap_or(now);
    let from = query.from.unwrap_or(to.saturating_sub(3600).max(0));
    if from > to {
        return Err(ApiError::Validation("from is after to".into()));
    }

    Ok(Json(state.history.range(&icao24, from, to)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::fixtures::vector;
    use crate::state::Provenance;
    use crate::web::test_support::app_state;

    #[test]
    fn partial_bounds_are_rejected() {
        let query = StatesQuery {
            lamin: Some(10.0),
            ..Default::default()
        };
        assert!(matches!(query.bounds(), Err(ApiError::Validation(_))));

        let query = StatesQuery {
            lamin: Some(-10.0),
            lomin: Some(170.0),
            lamax: Some(10.0),
            lomax: Some(-170.0),
            ..Default::default()
        };
        assert!(query.bounds().unwrap().crosses_antimeridian());
        assert_eq!(StatesQuery::default().bounds().unwrap(), BoundingBox::world());
    }

    #[tokio::test]
    async fn lists_recent_aircraft_in_the_box() {
        let state = app_state();
        let now = Utc::now().timestamp();
        let mut v = vector("abc123", now, &Provenance::primary_feed());
        v.latitude = Some(52.0);
        v.longitude = Some(4.0);
        state.engine.apply(v).unwrap();
        state
            .engine
            .apply(vector("def456", now - 7200, &Provenance::primary_feed()))
            .unwrap();

        let query = StatesQuery {
            lamin: Some(50.0),
            lomin: Some(0.0),
            lamax: Some(55.0),
            lomax: Some(10.0),
            ..Default::default()
        };
        let Json(response) = list_states(State(state), Query(query)).await.unwrap();
        assert_eq!(response.states.len(), 1);
        assert_eq!(response.states[0].state.icao24, "abc123");
        assert!(!response.states[0].predicted);
    }

    #[tokio::test]
    async fn search_requires_a_term() {
        let state = app_state();
        let result = search(State(state), Query(SearchQuery { q: "  ".into() })).await;
        assert!(matches!(result, Err(ApiError::Validation(_))));
    }

    #[tokio::test]
    async fn history_validates_and_ranges() {
        let state = app_state();
        let feed = Provenance::primary_feed();
        for lc in [100, 200, 300] {
            state.engine.apply(vector("abc123", lc, &feed)).unwrap();
        }

        let bad = history(
            State(state.clone()),
            Path("xyz".to_string()),
            Query(HistoryQuery { from: None, to: None }),
        )
        .await;
        assert!(matches!(bad, Err(ApiError::Validation(_))));

        let Json(rows) = history(
            State(state),
            Path("ABC123".to_string()),
            Query(HistoryQuery {
                from: Some(150),
                to: Some(300),
            }),
        )
        .await
        .unwrap();
        let contacts: Vec<_> = rows.iter().map(|r| r.last_contact).collect();
        assert_eq!(contacts, [200, 300]);
    }

    #[tokio::test]
    async fn history_rejects_negative_bounds() {
        let state = app_state();
        state
            .engine
            .apply(vector("abc123", 100, &Provenance::primary_feed()))
            .unwrap();

        for (from, to) in [(None, Some(i64::MIN)), (Some(-1), None), (Some(-3600), Some(0))] {
            let result = history(
                State(state.clone()),
                Path("abc123".to_string()),
                Query(HistoryQuery { from, to }),
            )
            .await;
            assert!(matches!(result, Err(ApiError::Validation(_))));
        }

        let Json(rows) = history(
            State(state),
            Path("abc123".to_string()),
            Query(HistoryQuery {
                from: None,
                to: Some(100),
            }),
        )
        .await
        .unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[tokio::test]
    async fn huge_max_age_keeps_every_recent_row() {
        let state = app_state();
        let now = Utc::now().timestamp();
        state
            .engine
            .apply(vector("abc123", now, &Provenance::primary_feed()))
            .unwrap();

        let query = StatesQuery {
            max_age: Some(u64::MAX),
            predict: Some(false),
            ..Default::default()
        };
        let Json(response) = list_states(State(state), Query(query)).await.unwrap();
        assert_eq!(response.states.len(), 1);
        assert_eq!(response.states[0].state.icao24, "abc123");
    }
}
