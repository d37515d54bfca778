use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;

use crate::state::Provenance;

use super::error::SourceError;
use super::source::{parse_states_document, IngestionSource, RawBatch};

/// Re-reads an OpenSky-format document from disk on every poll.
pub struct FileSource {
    name: String,
    path: PathBuf,
    interval: Duration,
    provenance: Provenance,
}

impl FileSource {
    pub fn new(
        name: impl Into<String>,
        path: impl Into<PathBuf>,
        interval: Duration,
        provenance: Provenance,
    ) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            interval,
            provenance,
        }
    }
}

#[async_trait]
impl IngestionSource for FileSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn poll_interval(&self) -> Duration {
        self.interval
    }

    async fn fetch(&self) -> Result<RawBatch, SourceError> {
        let bytes = tokio::fs::read(&self.path).await?;
        let (time, rows) = parse_states_document(&bytes)?;
        Ok(RawBatch {
            rows,
            provenance: self.provenance.clone(),
            time,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reads_a_states_document() {
        let path = std::env::temp_dir().join(format!("skyfuse-file-source-{}.json", std::process::id()));
        std::fs::write(&path, r#"{"time": 5, "states": [["abc123"]]}"#).unwrap();

        let source = FileSource::new("replay", &path, Duration::from_secs(1), Provenance::feeder("f-1"));
        let batch = source.fetch().await.unwrap();
        assert_eq!(batch.rows.len(), 1);
        assert_eq!(batch.time, Some(5));
        assert_eq!(batch.provenance.feeder_id.as_deref(), Some("f-1"));

        std::fs::remove_file(&path).unwrap();
    }

    #[tokio::test]
    async fn missing_file_is_an_io_error() {
        let source = FileSource::new(
            "replay",
            "/nonexistent/skyfuse/states.json",
            Duration::from_secs(1),
            Provenance::primary_feed(),
        );
        assert!(matches!(source.fetch().await, Err(SourceError::Io(_))));
    }
}
