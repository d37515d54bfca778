use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

use crate::state::Provenance;

use super::error::SourceError;

/// One poll's worth of undecoded rows, tagged with where they came from.
#[derive(Debug, Clone)]
pub struct RawBatch {
    pub rows: Vec<Value>,
    pub provenance: Provenance,
    /// Server-side snapshot time, when the source reports one.
    pub time: Option<i64>,
}

#[async_trait]
pub trait IngestionSource: Send + Sync {
    fn name(&self) -> &str;

    fn poll_interval(&self) -> Duration;

    async fn fetch(&self) -> Result<RawBatch, SourceError>;
}

#[derive(Deserialize)]
struct StatesDocument {
    time: Option<i64>,
    states: Option<Vec<Value>>,
}

/// Parses an OpenSky `{"time": .., "states": [[..], ..]}` document.
///
/// `"states": null` is what the feed sends when nothing is in view.
pub fn parse_states_document(bytes: &[u8]) -> Result<(Option<i64>, Vec<Value>), SourceError> {
    let document: StatesDocument = serde_json::from_slice(bytes)?;
    Ok((document.time, document.states.unwrap_or_default()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_states_is_an_empty_batch() {
        let (time, rows) = parse_states_document(br#"{"time": 1700000000, "states": null}"#).unwrap();
        assert_eq!(time, Some(1_700_000_000));
        assert!(rows.is_empty());
    }

    #[test]
    fn rows_are_kept_undecoded() {
        let doc = br#"{"time": 1, "states": [["abc123", "KLM1023 "], ["nothex"]]}"#;
        let (_, rows) = parse_states_document(doc).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1][0], "nothex");
    }

    #[test]
    fn not_a_document_is_a_decode_error() {
        assert!(matches!(
            parse_states_document(b"[1, 2, 3]"),
            Err(SourceError::Decode(_))
        ));
    }
}
