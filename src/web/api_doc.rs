use utoipa::OpenApi;

use super::api::error::ErrorResponse;
use super::api::ingest::IngestRequest;
use super::api::routes::RouteUpdate;
use super::api::states::StatesResponse;

#[derive(OpenApi)]
#[openapi(
    paths(
        super::api::states::list_states,
        super::api::states::search,
        super::api::states::history,
        super::api::ingest::ingest,
        super::api::routes::put_route,
    ),
    components(
        schemas(
            StatesResponse,
            IngestRequest,
            RouteUpdate,
            ErrorResponse,
            crate::serving::ServedState,
            crate::serving::CurrentState,
            crate::state::StateVector,
            crate::state::SourcePriority,
            crate::fusion::UpsertReport,
            crate::fusion::Rejection,
            crate::predict::PredictionMethod,
            crate::route::RouteHint,
            crate::route::Airport,
            crate::route::FlightTimestamps,
            crate::route::FlightStatus,
        )
    ),
    info(
        title = "Skyfuse API",
        description = "Fused aircraft state with trajectory prediction",
        version = "0.1.0"
    ),
    tags(
        (name = "states", description = "Current and archived aircraft state"),
        (name = "ingest", description = "Feeder and secondary-source batches"),
        (name = "routes", description = "Route hints used for enrichment and prediction")
    )
)]
pub struct ApiDoc;
