use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::fusion::{FusionEngine, UpsertReport};

use super::error::{CycleError, SourceError};
use super::source::IngestionSource;

const MAX_BACKOFF: Duration = Duration::from_secs(300);

/// Fetches one batch from `source` and merges it.
///
/// A fetch failure leaves every store untouched.
pub async fn run_cycle(
    source: &dyn IngestionSource,
    engine: &FusionEngine,
) -> Result<UpsertReport, CycleError> {
    let batch = source.fetch().await?;
    let report = engine.upsert_batch(&batch.rows, &batch.provenance).await?;
    log::info!(
        "{}: processed {}, applied {}, rejected {}",
        source.name(),
        report.processed,
        report.applied,
        report.rejected.len()
    );
    Ok(report)
}

/// Runs every source on its own interval, independently of the others.
pub struct Poller {
    engine: Arc<FusionEngine>,
    sources: Vec<Arc<dyn IngestionSource>>,
}

impl Poller {
    pub fn new(engine: Arc<FusionEngine>) -> Self {
        Self {
            engine,
            sources: Vec::new(),
        }
    }

    pub fn with_source(mut self, source: Arc<dyn IngestionSource>) -> Self {
        self.sources.push(source);
        self
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// One task per source. Each stops when `stop` flips to `true` or its
    /// sender is dropped.
    pub fn spawn(self, stop: watch::Receiver<bool>) -> Vec<JoinHandle<()>> {
        self.sources
            .into_iter()
            .map(|source| tokio::spawn(poll_loop(source, self.engine.clone(), stop.clone())))
            .collect()
    }
}

async fn poll_loop(
    source: Arc<dyn IngestionSource>,
    engine: Arc<FusionEngine>,
    mut stop: watch::Receiver<bool>,
) {
    log::info!(
        "polling {} every {}",
        source.name(),
        humantime::format_duration(source.poll_interval())
    );

    let mut ticker = tokio::time::interval(source.poll_interval());
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    let mut consecutive_errors: u32 = 0;

    loop {
        let wait = if consecutive_errors > 0 {
            Some(backoff(consecutive_errors))
        } else {
            None
        };

        tokio::select! {
            _ = async {
                ticker.tick().await;
                if let Some(wait) = wait {
                    tokio::time::sleep(wait).await;
                }
            } => {}
            changed = stop.changed() => {
                if changed.is_err() || *stop.borrow() {
                    break;
                }
                continue;
            }
        }

        match run_cycle(source.as_ref(), &engine).await {
            Ok(_) => consecutive_errors = 0,
            Err(CycleError::Source(SourceError::RateLimited)) => {
                consecutive_errors += 1;
                log::warn!("{}: rate limited, backing off", source.name());
            }
            Err(e) => {
                consecutive_errors += 1;
                log::warn!(
                    "{}: cycle failed ({} in a row): {}",
                    source.name(),
                    consecutive_errors,
                    e
                );
            }
        }
    }

    log::info!("stopped polling {}", source.name());
}

/// 2^n seconds, capped.
fn backoff(consecutive_errors: u32) -> Duration {
    let secs = 2u64.saturating_pow(consecutive_errors.min(20));
    Duration::from_secs(secs).min(MAX_BACKOFF)
}
