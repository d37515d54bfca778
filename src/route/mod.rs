mod cache;
mod chain;
mod types;

pub use cache::{CachedRoute, RouteHintCache, DEFAULT_CACHE_CAPACITY};
pub use chain::{RouteChain, RouteProvider, RouteSource};
pub use types::{Airport, FlightStatus, FlightTimestamps, RouteHint};
