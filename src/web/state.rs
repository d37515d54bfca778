use std::sync::Arc;

use crate::config::Config;
use crate::fusion::FusionEngine;
use crate::route::RouteHintCache;
use crate::serving::StateService;
use crate::store::HistoryLog;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub engine: Arc<FusionEngine>,
    pub service: Arc<StateService>,
    pub history: Arc<dyn HistoryLog>,
    pub routes: Arc<RouteHintCache>,
}
