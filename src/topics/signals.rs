// Topic signals — per-topic, per-bucket document weights.
//
// Every topic gets one slot per bucket in the corpus (empty slots included)
// so the front end can draw fixed-length series. Each slot lists the
// documents that put weight on the topic in that bucket.

use serde::{Deserialize, Serialize};

use crate::batch::{BatchLog, SkipReason};
use crate::buckets::{Bucket, BucketIndex, BucketResolver};
use crate::corpus::{normalize_key, title_from_path, ItemId, Metadata};

use super::records::{parse_doc_topics_line, DocTopics};

/// One document's weight on a topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicEntry {
    pub title: String,
    #[serde(rename = "itemID")]
    pub item_id: ItemId,
    pub label: String,
    /// Share of the document's probability mass on this topic
    pub ratio: f64,
}

/// One bucket of one topic's series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BucketSlot {
    /// Bucket label (the year as a string)
    pub x: String,
    pub topic: usize,
    /// Documents in this bucket, sorted by title
    pub y: Vec<TopicEntry>,
}

impl BucketSlot {
    pub fn sum(&self) -> f64 {
        self.y.iter().map(|e| e.ratio).sum()
    }
}

/// Completed topic series: `weights_by_topic[topic][ordinal]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicSignals {
    pub buckets: Vec<Bucket>,
    pub weights_by_topic: Vec<Vec<BucketSlot>>,
}

impl TopicSignals {
    pub fn topic_count(&self) -> usize {
        self.weights_by_topic.len()
    }

    /// Per topic, one summed weight per bucket.
    pub fn bucket_sums(&self) -> Vec<Vec<f64>> {
        self.weights_by_topic
            .iter()
            .map(|slots| slots.iter().map(BucketSlot::sum).collect())
            .collect()
    }

    /// Summed weight of a topic in a given bucket (0.0 when absent).
    pub fn weight_at(&self, topic: usize, bucket: Bucket) -> f64 {
        let Some(ordinal) = self.buckets.iter().position(|b| *b == bucket) else {
            return 0.0;
        };
        self.weights_by_topic
            .get(topic)
            .and_then(|slots| slots.get(ordinal))
            .map_or(0.0, BucketSlot::sum)
    }
}

/// Accumulates doc-topic records into per-topic series.
pub struct TopicSignalAggregator<'a> {
    metadata: &'a Metadata,
    resolver: BucketResolver,
    index: BucketIndex,
    topics: usize,
    /// slots[topic][ordinal] -> entries
    slots: Vec<Vec<Vec<TopicEntry>>>,
    log: BatchLog,
}

impl<'a> TopicSignalAggregator<'a> {
    /// Set up an aggregator for a model with `topics` topics. The bucket index
    /// is built from every document in the metadata, not just the ones that
    /// appear in the records.
    pub fn new(metadata: &'a Metadata, topics: usize, fallback: Bucket) -> Self {
        let resolver = BucketResolver::from_metadata(metadata, fallback);
        let index = resolver.index();
        let slots = vec![vec![Vec::new(); index.len()]; topics];
        Self {
            metadata,
            resolver,
            index,
            topics,
            slots,
            log: BatchLog::new(),
        }
    }

    pub fn index(&self) -> &BucketIndex {
        &self.index
    }

    /// Feed one raw doc-topics line. Failures go to the batch log.
    pub fn ingest_line(&mut self, line_no: usize, line: &str) {
        match parse_doc_topics_line(line) {
            Ok(None) => {}
            Ok(Some(doc)) => {
                let outcome = self.ingest(&doc);
                self.log.record(&doc.path, outcome);
            }
            Err(reason) => self.log.record(&format!("line {line_no}"), Err(reason)),
        }
    }

    /// Add one parsed document. All-or-nothing: a document with any bad
    /// topic index contributes to no topic at all.
    pub fn ingest(&mut self, doc: &DocTopics) -> Result<(), SkipReason> {
        let meta = self.metadata.lookup(&doc.path)?;

        if let Some(&(topic, _)) = doc.weights.iter().find(|(t, _)| *t >= self.topics) {
            return Err(SkipReason::TopicOutOfRange {
                topic,
                topics: self.topics,
            });
        }

        let bucket = self.resolver.bucket_for(&normalize_key(&doc.path), &meta.year);
        let ordinal = self
            .index
            .ordinal(bucket)
            .ok_or_else(|| SkipReason::Malformed(format!("bucket {bucket} not in corpus index")))?;

        let title = title_from_path(&doc.path);
        for &(topic, ratio) in &doc.weights {
            self.slots[topic][ordinal].push(TopicEntry {
                title: title.clone(),
                item_id: meta.item_id.clone(),
                label: meta.label.clone(),
                ratio,
            });
        }
        Ok(())
    }

    /// Close the pass. Entries are sorted so the result does not depend on
    /// the order documents were streamed in.
    pub fn finish(self) -> (TopicSignals, BatchLog) {
        let buckets = self.index.buckets().to_vec();
        let weights_by_topic = self
            .slots
            .into_iter()
            .enumerate()
            .map(|(topic, per_bucket)| {
                per_bucket
                    .into_iter()
                    .zip(&buckets)
                    .map(|(mut entries, bucket)| {
                        entries.sort_by(|a, b| {
                            a.title
                                .cmp(&b.title)
                                .then_with(|| a.item_id.cmp(&b.item_id))
                                .then_with(|| a.ratio.total_cmp(&b.ratio))
                        });
                        BucketSlot {
                            x: bucket.to_string(),
                            topic,
                            y: entries,
                        }
                    })
                    .collect()
            })
            .collect();

        (
            TopicSignals {
                buckets,
                weights_by_topic,
            },
            self.log,
        )
    }
}
