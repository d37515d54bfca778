use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicI64, Ordering};

/// Receipt clock for ingested observations.
///
/// Readings never repeat and never go backwards within one process, so two
/// vectors from the same source tier always have a strict receipt order even
/// when they arrive in the same microsecond or across a wall-clock step.
#[derive(Debug, Default)]
pub struct IngestClock {
    last_us: AtomicI64,
}

impl IngestClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> DateTime<Utc> {
        let wall = Utc::now().timestamp_micros();
        let mut prev = self.last_us.load(Ordering::Relaxed);
        loop {
            let next = wall.max(prev + 1);
            match self
                .last_us
                .compare_exchange_weak(prev, next, Ordering::AcqRel, Ordering::Relaxed)
            {
                Ok(_) => return DateTime::from_timestamp_micros(next).unwrap_or_else(Utc::now),
                Err(actual) => prev = actual,
            }
        }
    }
}
