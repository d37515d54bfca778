use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::state::{decode_row, identifier_of, IngestClock, Provenance, StateVector};
use crate::store::{CurrentStateStore, HistoryLog};

use super::error::FusionError;
use super::rule::{MergeDecision, MergePolicy};

pub const DEFAULT_CHUNK_SIZE: usize = 500;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Rejection {
    pub identifier: String,
    pub reason: String,
}

/// Outcome of one batch upsert.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct UpsertReport {
    /// Vectors that passed validation and went through the merge.
    pub processed: usize,
    /// Of those, how many replaced or created a current-state row.
    pub applied: usize,
    pub rejected: Vec<Rejection>,
}

/// Write path: validates, merges into current state, archives to history.
pub struct FusionEngine {
    current: Arc<dyn CurrentStateStore>,
    history: Arc<dyn HistoryLog>,
    policy: MergePolicy,
    chunk_size: usize,
    clock: IngestClock,
}

impl FusionEngine {
    pub fn new(
        current: Arc<dyn CurrentStateStore>,
        history: Arc<dyn HistoryLog>,
        policy: MergePolicy,
    ) -> Self {
        Self {
            current,
            history,
            policy,
            chunk_size: DEFAULT_CHUNK_SIZE,
            clock: IngestClock::new(),
        }
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn policy(&self) -> &MergePolicy {
        &self.policy
    }

    /// Merges one already-validated vector and archives it.
    ///
    /// The history append happens whatever the merge outcome.
    pub fn apply(&self, incoming: StateVector) -> Result<MergeDecision, FusionError> {
        self.history.append(&incoming)?;
        let icao24 = incoming.icao24.clone();
        let decision = self.current.merge(incoming, &self.policy)?;
        if let MergeDecision::Overwrite(reason) = decision {
            log::trace!("{} overwritten ({})", icao24, reason);
        }
        Ok(decision)
    }

    /// Decodes and merges a batch of wire rows from one source.
    ///
    /// Invalid rows are reported and skipped; the rest of the batch proceeds.
    /// The task yields between chunks so large polls do not starve other work.
    pub async fn upsert_batch(
        &self,
        rows: &[Value],
        provenance: &Provenance,
    ) -> Result<UpsertReport, FusionError> {
        let mut report = UpsertReport::default();

        for chunk in rows.chunks(self.chunk_size) {
            for row in chunk {
                match decode_row(row, provenance, self.clock.now()) {
                    Ok(vector) => {
                        if self.apply(vector)?.writes() {
                            report.applied += 1;
                        }
                        report.processed += 1;
                    }
                    Err(e) => {
                        let identifier = identifier_of(row);
                        log::debug!(
                            "rejected {} from {}: {}",
                            identifier,
                            provenance.data_source,
                            e
                        );
                        report.rejected.push(Rejection {
                            identifier,
                            reason: e.to_string(),
                        });
                    }
                }
            }
            tokio::task::yield_now().await;
        }

        Ok(report)
    }
}
