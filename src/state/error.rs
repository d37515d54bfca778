use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("state vector must be an array")]
    NotAnArray,
    #[error("expected 17 or 18 fields, got {0}")]
    FieldCount(usize),
    #[error("invalid icao24 address: {0:?}")]
    InvalidIcao24(String),
    #[error("missing required field {0}")]
    Missing(&'static str),
    #[error("{field}: expected {expected}")]
    FieldType {
        field: &'static str,
        expected: &'static str,
    },
    #[error("{field} out of range: {value}")]
    OutOfRange { field: &'static str, value: f64 },
    #[error("invalid category {0}, expected 0-19")]
    InvalidCategory(i64),
    #[error("invalid position source {0}, expected 0-3")]
    InvalidPositionSource(i64),
}
