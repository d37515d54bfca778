pub mod error;
pub mod ingest;
pub mod routes;
pub mod states;
