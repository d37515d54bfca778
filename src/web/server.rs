use axum::{routing::get, routing::post, Router};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::watch;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::{Config, SourceConfig, SourceKind, StorageBackend, StorageConfig};
use crate::fusion::FusionEngine;
use crate::ingest::{FileSource, IngestionSource, OpenSkySource, Poller, SourceError};
use crate::predict::Predictor;
use crate::route::{RouteChain, RouteHintCache};
use crate::serving::StateService;
use crate::store::{
    open_sled, spawn_retention, BoundingBox, CurrentStateStore, HistoryLog, MemoryHistory,
    MemoryStore, SledHistory, SledStore, StoreError,
};

use super::api::ingest as ingest_handlers;
use super::api::routes as route_handlers;
use super::api::states as state_handlers;
use super::api_doc::ApiDoc;
use super::state::AppState;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage: {0}")]
    Store(#[from] StoreError),
    #[error("source: {0}")]
    Source(#[from] SourceError),
}

pub struct Backends {
    pub current: Arc<dyn CurrentStateStore>,
    pub history: Arc<dyn HistoryLog>,
    db: Option<sled::Db>,
}

impl Backends {
    pub fn open(storage: &StorageConfig) -> Result<Self, StoreError> {
        match (storage.backend, &storage.path) {
            (StorageBackend::Sled, Some(path)) => {
                let db = open_sled(path)?;
                log::info!("opened sled store at {}", path.display());
                Ok(Self {
                    current: Arc::new(SledStore::new(&db)?),
                    history: Arc::new(SledHistory::new(&db)?),
                    db: Some(db),
                })
            }
            (StorageBackend::Sled, None) => Err(StoreError::MissingPath),
            (StorageBackend::Memory, _) => Ok(Self {
                current: Arc::new(MemoryStore::new()),
                history: Arc::new(MemoryHistory::new()),
                db: None,
            }),
        }
    }

    pub async fn flush(&self) {
        if let Some(db) = &self.db {
            if let Err(e) = db.flush_async().await {
                log::warn!("flushing store failed: {}", e);
            }
        }
    }
}

pub fn build_source(config: &SourceConfig) -> Result<Arc<dyn IngestionSource>, SourceError> {
    let provenance = config.provenance();
    match &config.kind {
        SourceKind::Opensky {
            url,
            timeout,
            username,
            password,
            bounds,
        } => {
            let mut source = OpenSkySource::new(
                config.name.clone(),
                url.clone(),
                config.interval,
                *timeout,
                provenance,
            )?;
            if let (Some(user), Some(pass)) = (username, password) {
                source = source.with_credentials(user.clone(), pass.clone());
            }
            if let Some([lat_min, lon_min, lat_max, lon_max]) = bounds {
                match BoundingBox::new(*lat_min, *lon_min, *lat_max, *lon_max) {
                    Ok(b) => source = source.with_bounds(b),
                    Err(e) => log::warn!("{}: ignoring bounds: {}", config.name, e),
                }
            }
            Ok(Arc::new(source))
        }
        SourceKind::File { path } => Ok(Arc::new(FileSource::new(
            config.name.clone(),
            path.clone(),
            config.interval,
            provenance,
        ))),
    }
}

pub fn build_state(config: Config, backends: &Backends) -> AppState {
    let engine = FusionEngine::new(
        backends.current.clone(),
        backends.history.clone(),
        config.fusion.policy(),
    )
    .with_chunk_size(config.fusion.chunk_size);

    let routes = Arc::new(RouteHintCache::new(config.routes.cache_capacity));
    let chain = RouteChain::new().with_source(routes.clone());
    log::info!("route sources: {}", chain.source_names().join(", "));

    let service = StateService::new(
        backends.current.clone(),
        Arc::new(chain),
        Predictor::new(config.predict.predictor()),
    );

    AppState {
        config: Arc::new(config),
        engine: Arc::new(engine),
        service: Arc::new(service),
        history: backends.history.clone(),
        routes,
    }
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/states", get(state_handlers::list_states))
        .route("/api/states/search", get(state_handlers::search))
        .route("/api/states/{icao24}/history", get(state_handlers::history))
        .route("/api/ingest", post(ingest_handlers::ingest))
        .route("/api/routes", post(route_handlers::put_route))
        // OpenAPI / Swagger
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()))
        // Middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run_server(config: Config) -> Result<(), ServerError> {
    let bind_addr = config.web.bind.clone();
    let backends = Backends::open(&config.storage)?;

    let sources = config
        .ingest
        .sources
        .iter()
        .map(build_source)
        .collect::<Result<Vec<_>, _>>()?;

    let state = build_state(config, &backends);
    let poller = sources
        .into_iter()
        .fold(Poller::new(state.engine.clone()), Poller::with_source);

    let (stop_tx, stop_rx) = watch::channel(false);
    let mut tasks = poller.spawn(stop_rx.clone());
    tasks.push(spawn_retention(
        backends.history.clone(),
        state.config.storage.history_retention,
        state.config.storage.retention_interval,
        stop_rx,
    ));

    let app = router(state);

    log::info!("Starting server on {}", bind_addr);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                log::warn!("cannot listen for shutdown signal: {}", e);
                std::future::pending::<()>().await;
            }
            log::info!("shutting down");
        })
        .await?;

    let _ = stop_tx.send(true);
    for task in tasks {
        if let Err(e) = task.await {
            log::warn!("background task ended abnormally: {}", e);
        }
    }
    backends.flush().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn memory_backends_by_default() {
        let backends = Backends::open(&StorageConfig::default()).unwrap();
        assert!(backends.db.is_none());
        assert_eq!(backends.current.len().unwrap(), 0);
    }

    #[test]
    fn builds_configured_sources() {
        let config = Config::from_yaml(
            r#"
ingest:
  sources:
    - name: opensky
      kind: opensky
      bounds: [45.0, 5.0, 55.0, 15.0]
    - name: replay
      kind: file
      path: ./states.json
      interval: 2s
"#,
        )
        .unwrap();
        let sources: Vec<_> = config
            .ingest
            .sources
            .iter()
            .map(|s| build_source(s).unwrap())
            .collect();
        assert_eq!(sources[0].name(), "opensky");
        assert_eq!(sources[1].poll_interval(), Duration::from_secs(2));
    }

    #[test]
    fn state_uses_configured_policy() {
        let mut config = Config::default();
        config.fusion.staleness_window = Duration::from_secs(60);
        let backends = Backends::open(&config.storage).unwrap();
        let state = build_state(config, &backends);
        assert_eq!(state.engine.policy().staleness_window_secs, 60);
        let _ = router(state);
    }
}
