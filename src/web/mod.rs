pub mod api;
pub mod api_doc;
pub mod server;
pub mod state;

pub use server::run_server;
pub use state::AppState;

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use crate::config::Config;
    use crate::fusion::{FusionEngine, MergePolicy};
    use crate::predict::Predictor;
    use crate::route::{RouteChain, RouteHintCache};
    use crate::serving::StateService;
    use crate::store::{MemoryHistory, MemoryStore};

    use super::AppState;

    pub fn app_state() -> AppState {
        let store = Arc::new(MemoryStore::new());
        let history = Arc::new(MemoryHistory::new());
        let routes = Arc::new(RouteHintCache::default());
        let chain = RouteChain::new().with_source(routes.clone());
        AppState {
            config: Arc::new(Config::default()),
            engine: Arc::new(FusionEngine::new(
                store.clone(),
                history.clone(),
                MergePolicy::default(),
            )),
            service: Arc::new(StateService::new(store, Arc::new(chain), Predictor::default())),
            history,
            routes,
        }
    }
}
