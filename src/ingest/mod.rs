mod error;
mod file;
mod opensky;
mod poller;
mod source;

pub use error::{CycleError, SourceError};
pub use file::FileSource;
pub use opensky::{OpenSkySource, DEFAULT_OPENSKY_URL};
pub use poller::{run_cycle, Poller};
pub use source::{parse_states_document, IngestionSource, RawBatch};
