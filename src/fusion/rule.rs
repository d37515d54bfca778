use crate::state::StateVector;

/// How much newer, in seconds of `last_contact`, an observation must be to
/// replace a row held by a more trusted source.
pub const DEFAULT_STALENESS_WINDOW_SECS: i64 = 600;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display, strum_macros::IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum MergeReason {
    /// Incoming source is strictly more trusted.
    HigherPriority,
    /// Same trust tier, received later.
    NewerSameTier,
    /// Stored row is older than the staleness window.
    StalenessOverride,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeDecision {
    /// No row existed for this aircraft.
    Insert,
    Overwrite(MergeReason),
    /// Incoming loses; only the history keeps it.
    Keep,
}

impl MergeDecision {
    pub fn writes(&self) -> bool {
        !matches!(self, MergeDecision::Keep)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergePolicy {
    pub staleness_window_secs: i64,
}

impl Default for MergePolicy {
    fn default() -> Self {
        Self {
            staleness_window_secs: DEFAULT_STALENESS_WINDOW_SECS,
        }
    }
}

impl MergePolicy {
    pub fn new(staleness_window_secs: i64) -> Self {
        Self {
            staleness_window_secs,
        }
    }

    /// Decides whether `incoming` replaces `current`.
    ///
    /// Callers must evaluate this and apply the write under the same lock or
    /// compare-and-swap, otherwise two writers can both win against a stale read.
    pub fn decide(&self, current: Option<&StateVector>, incoming: &StateVector) -> MergeDecision {
        let Some(current) = current else {
            return MergeDecision::Insert;
        };

        if incoming.source_priority < current.source_priority {
            return MergeDecision::Overwrite(MergeReason::HigherPriority);
        }
        if incoming.source_priority == current.source_priority
            && incoming.ingestion_timestamp > current.ingestion_timestamp
        {
            return MergeDecision::Overwrite(MergeReason::NewerSameTier);
        }
        if incoming.last_contact > current.last_contact.saturating_add(self.staleness_window_secs) {
            return MergeDecision::Overwrite(MergeReason::StalenessOverride);
        }

        MergeDecision::Keep
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{Provenance, SourcePriority};
    use crate::state::fixtures::vector;
    use chrono::{Duration, Utc};

    fn with_priority(priority: SourcePriority, last_contact: i64) -> StateVector {
        let mut v = vector("abc123", last_contact, &Provenance::primary_feed());
        v.source_priority = priority;
        v
    }

    #[test]
    fn first_observation_is_inserted() {
        let v = with_priority(SourcePriority::PRIMARY_FEED, 1000);
        assert_eq!(MergePolicy::default().decide(None, &v), MergeDecision::Insert);
    }

    #[test]
    fn more_trusted_source_wins_regardless_of_timestamps() {
        let policy = MergePolicy::default();
        let mut current = with_priority(SourcePriority::PRIMARY_FEED, 5000);
        current.ingestion_timestamp = Utc::now();
        for priority in [SourcePriority::FEEDER, SourcePriority::SECONDARY_API] {
            let mut incoming = with_priority(priority, 10);
            incoming.ingestion_timestamp = current.ingestion_timestamp - Duration::hours(1);
            assert_eq!(
                policy.decide(Some(&current), &incoming),
                MergeDecision::Overwrite(MergeReason::HigherPriority)
            );
        }
    }

    #[test]
    fn same_tier_later_receipt_wins() {
        let policy = MergePolicy::default();
        let current = with_priority(SourcePriority::SECONDARY_API, 1000);
        let mut later = with_priority(SourcePriority::SECONDARY_API, 900);
        later.ingestion_timestamp = current.ingestion_timestamp + Duration::milliseconds(1);
        assert_eq!(
            policy.decide(Some(&current), &later),
            MergeDecision::Overwrite(MergeReason::NewerSameTier)
        );

        let mut earlier = later.clone();
        earlier.ingestion_timestamp = current.ingestion_timestamp - Duration::milliseconds(1);
        assert_eq!(policy.decide(Some(&current), &earlier), MergeDecision::Keep);
    }

    #[test]
    fn same_receipt_time_does_not_overwrite() {
        let policy = MergePolicy::default();
        let current = with_priority(SourcePriority::FEEDER, 1000);
        let twin = current.clone();
        assert_eq!(policy.decide(Some(&current), &twin), MergeDecision::Keep);
    }

    #[test]
    fn stale_trusted_row_yields_to_fresh_untrusted_data() {
        let policy = MergePolicy::default();
        let current = with_priority(SourcePriority::FEEDER, 1000);

        let mut fresh = with_priority(SourcePriority::PRIMARY_FEED, 1601);
        fresh.ingestion_timestamp = current.ingestion_timestamp - Duration::seconds(1);
        assert_eq!(
            policy.decide(Some(&current), &fresh),
            MergeDecision::Overwrite(MergeReason::StalenessOverride)
        );

        // Exactly at the window edge is not enough.
        fresh.last_contact = 1600;
        assert_eq!(policy.decide(Some(&current), &fresh), MergeDecision::Keep);
    }

    #[test]
    fn lower_trust_within_window_loses() {
        let policy = MergePolicy::default();
        let current = with_priority(SourcePriority::FEEDER, 1000);
        let mut incoming = with_priority(SourcePriority::PRIMARY_FEED, 1005);
        incoming.ingestion_timestamp = current.ingestion_timestamp + Duration::seconds(5);
        assert_eq!(policy.decide(Some(&current), &incoming), MergeDecision::Keep);
    }

    #[test]
    fn custom_window_is_honoured() {
        let policy = MergePolicy::new(60);
        let current = with_priority(SourcePriority::FEEDER, 1000);
        let mut incoming = with_priority(SourcePriority::PRIMARY_FEED, 1061);
        incoming.ingestion_timestamp = current.ingestion_timestamp;
        assert!(policy.decide(Some(&current), &incoming).writes());
    }

    #[test]
    fn reason_names_are_snake_case() {
        assert_eq!(MergeReason::StalenessOverride.to_string(), "staleness_override");
        let name: &'static str = MergeReason::HigherPriority.into();
        assert_eq!(name, "higher_priority");
    }
}
