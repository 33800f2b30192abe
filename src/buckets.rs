// Time buckets — mapping a document's raw year field to a discrete bucket.
//
// Years that are not plain digits, and the placeholder "0000", land in a
// configured fallback bucket instead of being dropped. Collections routinely
// carry undated items and they still belong in the totals.

use std::collections::{BTreeSet, HashMap};

use crate::corpus::Metadata;

/// A time bucket key (a calendar year).
pub type Bucket = i32;

/// Resolve a raw year string to a bucket.
pub fn resolve_year(raw: &str, fallback: Bucket) -> Bucket {
    if !is_dated(raw) {
        return fallback;
    }
    raw.trim().parse().unwrap_or(fallback)
}

/// True when the raw year resolves on its own, without the fallback.
pub fn is_dated(raw: &str) -> bool {
    let raw = raw.trim();
    !raw.is_empty()
        && raw != "0000"
        && raw.bytes().all(|b| b.is_ascii_digit())
        && raw.parse::<Bucket>().is_ok()
}

/// Per-document bucket memo. Each document's bucket is resolved once.
#[derive(Debug, Clone)]
pub struct BucketResolver {
    fallback: Bucket,
    memo: HashMap<String, Bucket>,
}

impl BucketResolver {
    pub fn new(fallback: Bucket) -> Self {
        Self {
            fallback,
            memo: HashMap::new(),
        }
    }

    /// Pre-resolve every document in the corpus.
    pub fn from_metadata(metadata: &Metadata, fallback: Bucket) -> Self {
        let mut resolver = Self::new(fallback);
        for (doc, meta) in metadata.iter() {
            resolver.bucket_for(doc, &meta.year);
        }
        resolver
    }

    /// Bucket for a document, resolving its raw year on first sight.
    pub fn bucket_for(&mut self, doc: &str, raw_year: &str) -> Bucket {
        let fallback = self.fallback;
        *self
            .memo
            .entry(doc.to_string())
            .or_insert_with(|| resolve_year(raw_year, fallback))
    }

    /// Previously resolved bucket for a document.
    pub fn get(&self, doc: &str) -> Option<Bucket> {
        self.memo.get(doc).copied()
    }

    pub fn fallback(&self) -> Bucket {
        self.fallback
    }

    /// Sorted distinct buckets seen so far.
    pub fn index(&self) -> BucketIndex {
        BucketIndex::new(self.memo.values().copied())
    }
}

/// Sorted distinct buckets, mapping each to its ordinal position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BucketIndex {
    buckets: Vec<Bucket>,
}

impl BucketIndex {
    pub fn new(buckets: impl IntoIterator<Item = Bucket>) -> Self {
        let set: BTreeSet<Bucket> = buckets.into_iter().collect();
        Self {
            buckets: set.into_iter().collect(),
        }
    }

    pub fn ordinal(&self, bucket: Bucket) -> Option<usize> {
        self.buckets.binary_search(&bucket).ok()
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn buckets(&self) -> &[Bucket] {
        &self.buckets
    }
}

/// Earliest and latest year that resolved without the fallback.
pub fn numeric_span(metadata: &Metadata) -> Option<(Bucket, Bucket)> {
    let years: Vec<Bucket> = metadata
        .iter()
        .filter(|(_, m)| is_dated(&m.year))
        .filter_map(|(_, m)| m.year.trim().parse().ok())
        .collect();
    Some((*years.iter().min()?, *years.iter().max()?))
}
