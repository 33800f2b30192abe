// Topic model post-processing — record parsing, per-topic series and
// correlation statistics.

pub mod correlation;
pub mod diagnostics;
pub mod records;
pub mod signals;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use self::diagnostics::TopicLabel;
use self::signals::TopicSignals;

/// Everything the topic pass produces before statistics are derived. This is
/// what the cache snapshot holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicAggregate {
    pub signals: TopicSignals,
    pub labels: BTreeMap<usize, TopicLabel>,
    pub coherence: BTreeMap<usize, f64>,
    /// Documents in the corpus metadata, the denominator for proportions
    pub total_documents: usize,
}
