mod service;
mod types;

pub use service::StateService;
pub use types::{CurrentState, ServedState};
