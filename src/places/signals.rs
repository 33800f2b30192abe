// Place signals — per-place mention counts per bucket, plus the edge graph.
//
// Every mention counts, the origin's included. Edges are handed off to the
// EdgeAggregator, which decides whether a document qualifies.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::batch::{BatchLog, SkipReason};
use crate::buckets::{numeric_span, Bucket, BucketResolver};
use crate::corpus::{normalize_key, Metadata};

use super::edges::{Edge, EdgeAggregator};
use super::mentions::{DocumentMentions, GeoparseOutput, PlaceId, PlaceInfo, PlaceReferences};

/// Completed place aggregates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlaceSignals {
    /// Reference data for every place the geocoder reported
    pub places: BTreeMap<PlaceId, PlaceInfo>,
    /// place -> bucket -> mention count
    pub weights: BTreeMap<PlaceId, BTreeMap<Bucket, u32>>,
    /// Edges grouped by bucket, buckets ascending
    pub links_by_year: Vec<Vec<Edge>>,
    /// Earliest and latest dated year in the corpus
    pub span: Option<(Bucket, Bucket)>,
}

impl PlaceSignals {
    pub fn weight(&self, place: PlaceId, bucket: Bucket) -> u32 {
        self.weights
            .get(&place)
            .and_then(|w| w.get(&bucket))
            .copied()
            .unwrap_or(0)
    }

    /// Total mentions of a place across all buckets.
    pub fn total(&self, place: PlaceId) -> u32 {
        self.weights.get(&place).map_or(0, |w| w.values().sum())
    }

    /// Largest total mention count of any country (0 when none).
    pub fn max_country_weight(&self) -> u32 {
        self.weights
            .keys()
            .filter(|id| self.places.get(*id).is_some_and(PlaceInfo::is_country))
            .map(|id| self.total(*id))
            .max()
            .unwrap_or(0)
    }
}

/// Accumulates geocoder mentions into place weights and edges.
pub struct PlaceSignalAggregator<'a> {
    metadata: &'a Metadata,
    places: &'a BTreeMap<PlaceId, PlaceInfo>,
    resolver: BucketResolver,
    weights: BTreeMap<PlaceId, BTreeMap<Bucket, u32>>,
    edges: EdgeAggregator,
    log: BatchLog,
}

impl<'a> PlaceSignalAggregator<'a> {
    pub fn new(
        metadata: &'a Metadata,
        places: &'a BTreeMap<PlaceId, PlaceInfo>,
        fallback: Bucket,
    ) -> Self {
        Self {
            metadata,
            places,
            resolver: BucketResolver::new(fallback),
            weights: BTreeMap::new(),
            edges: EdgeAggregator::new(),
            log: BatchLog::new(),
        }
    }

    /// Feed every document of a geocoder run.
    pub fn ingest_all(&mut self, geo: &GeoparseOutput) {
        for (doc, refs) in &geo.documents {
            self.ingest_document(doc, refs);
        }
    }

    /// Feed one document, recording a failure in the batch log.
    pub fn ingest_document(&mut self, doc: &str, refs: &[PlaceReferences]) {
        let outcome = self.ingest(doc, refs);
        self.log.record(doc, outcome);
    }

    /// Add one document's mentions. All-or-nothing: a document referencing
    /// an unknown place contributes nothing.
    pub fn ingest(&mut self, doc: &str, refs: &[PlaceReferences]) -> Result<(), SkipReason> {
        let meta = self.metadata.lookup(doc)?;

        if let Some(unknown) = refs.iter().find(|r| !self.places.contains_key(&r.place)) {
            return Err(SkipReason::UnknownPlace(unknown.place));
        }

        let bucket = self.resolver.bucket_for(&normalize_key(doc), &meta.year);
        let mentions = DocumentMentions::classify(refs, meta.origin_hint_len());

        for m in &mentions.mentions {
            *self
                .weights
                .entry(m.place)
                .or_default()
                .entry(bucket)
                .or_insert(0) += 1;
        }

        let touched = self.edges.add_document(bucket, &mentions);
        debug!(
            doc,
            bucket,
            mentions = mentions.mentions.len(),
            edges = touched,
            "Document aggregated"
        );
        Ok(())
    }

    pub fn finish(self) -> (PlaceSignals, BatchLog) {
        (
            PlaceSignals {
                places: self.places.clone(),
                weights: self.weights,
                links_by_year: self.edges.finish(),
                span: numeric_span(self.metadata),
            },
            self.log,
        )
    }
}
