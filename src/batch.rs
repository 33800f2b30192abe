// Per-item failure isolation for long annotation batches.
//
// A single bad record must never abort a pass over the corpus. Each item is
// either folded into an aggregate or recorded here with the reason it was
// skipped, and the batch keeps going.

use serde::Serialize;
use tracing::warn;

/// Why a single document (or record line) was left out of an aggregate.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SkipReason {
    #[error("malformed record: {0}")]
    Malformed(String),
    #[error("no metadata for document {0}")]
    MissingMetadata(String),
    #[error("unusable metadata for document {doc}: {reason}")]
    InvalidMetadata { doc: String, reason: String },
    #[error("topic {topic} out of range (model has {topics} topics)")]
    TopicOutOfRange { topic: usize, topics: usize },
    #[error("unknown place {0}")]
    UnknownPlace(u64),
}

/// One skipped item in the side-channel log.
#[derive(Debug, Clone, Serialize)]
pub struct SkippedItem {
    /// Document id, or the line number when the id itself could not be read
    pub item: String,
    pub reason: String,
}

/// Side-channel log of everything a batch skipped.
#[derive(Debug, Default, Clone)]
pub struct BatchLog {
    accepted: usize,
    skipped: Vec<SkippedItem>,
}

impl BatchLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome of one item. Failures are logged and kept, never raised.
    pub fn record(&mut self, item: &str, outcome: Result<(), SkipReason>) {
        match outcome {
            Ok(()) => self.accepted += 1,
            Err(reason) => {
                warn!(item, reason = %reason, "Skipping item");
                self.skipped.push(SkippedItem {
                    item: item.to_string(),
                    reason: reason.to_string(),
                });
            }
        }
    }

    pub fn accepted(&self) -> usize {
        self.accepted
    }

    pub fn skipped(&self) -> &[SkippedItem] {
        &self.skipped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failures_do_not_stop_counting() {
        let mut log = BatchLog::new();
        log.record("a", Ok(()));
        log.record("b", Err(SkipReason::MissingMetadata("b".into())));
        log.record("c", Ok(()));

        assert_eq!(log.accepted(), 2);
        assert_eq!(log.skipped().len(), 1);
        assert_eq!(log.skipped()[0].item, "b");
        assert_eq!(log.skipped()[0].reason, "no metadata for document b");
    }
}
