//! Aircraft state fusion and trajectory prediction.

pub mod config;
pub mod fusion;
pub mod ingest;
pub mod predict;
pub mod route;
pub mod serving;
pub mod state;
pub mod store;
pub mod web;
