// Place co-occurrence edges — origin place -> other places mentioned in the
// same document, counted per bucket.
//
// Counts only ever go up. A (source, target) pair seen again in the same
// bucket bumps the existing counter instead of adding a record.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::buckets::Bucket;

use super::mentions::{DocumentMentions, PlaceId};

/// Directed edge key within one bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EdgeKey {
    pub source: PlaceId,
    pub target: PlaceId,
}

/// A counted edge, as serialized for the front end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub source: PlaceId,
    pub target: PlaceId,
    pub year: Bucket,
    pub weight: u32,
}

/// Minimum number of distinct non-origin places a document needs before it
/// contributes edges. Once past it, every mention counts.
pub const MIN_EDGE_TARGETS: usize = 2;

#[derive(Debug, Default, Clone)]
pub struct EdgeAggregator {
    by_bucket: BTreeMap<Bucket, BTreeMap<EdgeKey, u32>>,
}

impl EdgeAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a document's edges, one increment per target mention. Returns the
    /// number of increments; documents without an origin or with too few
    /// distinct targets add none.
    pub fn add_document(&mut self, bucket: Bucket, doc: &DocumentMentions) -> usize {
        let Some(source) = doc.origin else {
            return 0;
        };
        if doc.distinct_targets() < MIN_EDGE_TARGETS {
            return 0;
        }
        let targets = doc.targets();

        let edges = self.by_bucket.entry(bucket).or_default();
        for &target in &targets {
            *edges.entry(EdgeKey { source, target }).or_insert(0) += 1;
        }
        targets.len()
    }

    pub fn count(&self, bucket: Bucket, source: PlaceId, target: PlaceId) -> u32 {
        self.by_bucket
            .get(&bucket)
            .and_then(|edges| edges.get(&EdgeKey { source, target }))
            .copied()
            .unwrap_or(0)
    }

    /// Edges grouped by bucket: buckets ascending, edges by (source, target).
    pub fn finish(self) -> Vec<Vec<Edge>> {
        self.by_bucket
            .into_iter()
            .map(|(year, edges)| {
                edges
                    .into_iter()
                    .map(|(key, weight)| Edge {
                        source: key.source,
                        target: key.target,
                        year,
                        weight,
                    })
                    .collect()
            })
            .collect()
    }
}
