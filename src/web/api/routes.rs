use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use serde::Deserialize;
use utoipa::ToSchema;

use crate::route::{CachedRoute, RouteHint};
use crate::web::api::error::{ApiError, ApiResult, ErrorResponse};
use crate::web::state::AppState;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RouteUpdate {
    pub icao24: Option<String>,
    pub callsign: Option<String>,
    pub hint: RouteHint,
}

#[utoipa::path(
    post,
    path = "/api/routes",
    tag = "routes",
    request_body = RouteUpdate,
    responses(
        (status = 204, description = "Route cached"),
        (status = 400, description = "Neither icao24 nor callsign given", body = ErrorResponse)
    )
)]
pub async fn put_route(
    State(state): State<AppState>,
    Json(update): Json<RouteUpdate>,
) -> ApiResult<StatusCode> {
    let blank = |s: &Option<String>| s.as_deref().map_or(true, |s| s.trim().is_empty());
    if blank(&update.icao24) && blank(&update.callsign) {
        return Err(ApiError::Validation(
            "icao24 or callsign is required".into(),
        ));
    }

    state.routes.insert(CachedRoute {
        icao24: update.icao24,
        callsign: update.callsign,
        hint: update.hint,
        cached_at: Utc::now(),
    });
    Ok(StatusCode::NO_CONTENT)
}
