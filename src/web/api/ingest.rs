use axum::{extract::State, Json};
use serde::Deserialize;
use serde_json::Value;
use utoipa::ToSchema;

use crate::fusion::UpsertReport;
use crate::state::Provenance;
use crate::web::api::error::{ApiError, ApiResult, ErrorResponse};
use crate::web::state::AppState;

/// A pushed batch of OpenSky-format rows.
///
/// Batches carrying a `feederId` are feeder data; anything else is a
/// secondary API and must name itself in `dataSource`.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IngestRequest {
    pub feeder_id: Option<String>,
    pub data_source: Option<String>,
    #[schema(value_type = Vec<Object>)]
    pub states: Vec<Value>,
}

impl IngestRequest {
    fn provenance(&self) -> ApiResult<Provenance> {
        let non_blank = |s: &Option<String>| {
            s.as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
        };
        match (non_blank(&self.feeder_id), non_blank(&self.data_source)) {
            (Some(feeder), _) => Ok(Provenance::feeder(feeder)),
            (None, Some(source)) => Ok(Provenance::secondary(source)),
            (None, None) => Err(ApiError::Validation(
                "either feederId or dataSource is required".into(),
            )),
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/ingest",
    tag = "ingest",
    request_body = IngestRequest,
    responses(
        (status = 200, description = "Batch merged; invalid rows are listed, not fatal", body = UpsertReport),
        (status = 400, description = "Missing provenance", body = ErrorResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse)
    )
)]
pub async fn ingest(
    State(state): State<AppState>,
    Json(request): Json<IngestRequest>,
) -> ApiResult<Json<UpsertReport>> {
    let provenance = request.provenance()?;
    let report = state
        .engine
        .upsert_batch(&request.states, &provenance)
        .await?;
    log::info!(
        "ingest from {}: processed {}, applied {}, rejected {}",
        provenance.feeder_id.as_deref().unwrap_or(&provenance.data_source),
        report.processed,
        report.applied,
        report.rejected.len()
    );
    Ok(Json(report))
}
