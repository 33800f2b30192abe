// Topic pipeline: annotator files -> topic series -> statistics -> payload.
//
// 1. Digest the input files
// 2. On a dry run, reuse the snapshot if it was built from the same inputs
// 3. Otherwise parse keys + diagnostics and stream doc-topics through the aggregator
// 4. Derive proportions, spreads and correlations from the bucket sums
// 5. Write the snapshot (fresh runs only) and the payload

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use crate::batch::BatchLog;
use crate::config::Config;
use crate::corpus::Metadata;
use crate::output::render::{topic_payload, RenderPayload};
use crate::output::snapshot;
use crate::topics::correlation::TopicStatistics;
use crate::topics::diagnostics::{build_labels, coherence, parse_diagnostics, TopicDiagnostics};
use crate::topics::records::{parse_topic_keys, TopicKey};
use crate::topics::signals::TopicSignalAggregator;
use crate::topics::TopicAggregate;

/// Where the topic annotator left its output.
#[derive(Debug, Clone)]
pub struct TopicInputs {
    pub metadata: PathBuf,
    pub doc_topics: PathBuf,
    pub topic_keys: PathBuf,
    pub diagnostics: PathBuf,
}

impl TopicInputs {
    fn paths(&self) -> [&Path; 4] {
        [
            &self.metadata,
            &self.doc_topics,
            &self.topic_keys,
            &self.diagnostics,
        ]
    }
}

/// Result of one topic run.
pub struct TopicRun {
    pub aggregate: TopicAggregate,
    pub stats: TopicStatistics,
    pub payload: RenderPayload,
    /// None when the aggregate came from the snapshot
    pub log: Option<BatchLog>,
    pub snapshot_path: PathBuf,
    pub payload_path: PathBuf,
}

/// Number of topics the model has: one past the highest topic id seen in
/// either the keys or the diagnostics.
pub fn topic_count(keys: &[TopicKey], diagnostics: &BTreeMap<usize, TopicDiagnostics>) -> usize {
    keys.iter()
        .map(|k| k.topic + 1)
        .chain(diagnostics.keys().map(|t| t + 1))
        .max()
        .unwrap_or(0)
}

/// Aggregate in-memory annotator output. Per-line failures land in the
/// returned log; nothing here is fatal.
pub fn aggregate(
    metadata: &Metadata,
    doc_topics: &str,
    keys: &[TopicKey],
    diagnostics: &BTreeMap<usize, TopicDiagnostics>,
    config: &Config,
) -> (TopicAggregate, BatchLog) {
    let topics = topic_count(keys, diagnostics);
    let mut aggregator = TopicSignalAggregator::new(metadata, topics, config.fallback_year);
    info!(
        topics,
        buckets = aggregator.index().len(),
        documents = metadata.len(),
        "Aggregating topic weights"
    );

    let lines: Vec<&str> = doc_topics.lines().collect();
    let pb = ProgressBar::new(lines.len() as u64);
    if let Ok(style) =
        ProgressStyle::default_bar().template("  Topics [{bar:30}] {pos}/{len} ({eta})")
    {
        pb.set_style(style);
    }
    for (n, line) in lines.iter().enumerate() {
        aggregator.ingest_line(n + 1, line);
        pb.inc(1);
    }
    pb.finish_and_clear();

    let (signals, log) = aggregator.finish();
    let aggregate = TopicAggregate {
        signals,
        labels: build_labels(keys, diagnostics, config.label_words),
        coherence: coherence(diagnostics),
        total_documents: metadata.len(),
    };
    (aggregate, log)
}

/// Derive statistics and the payload from a finished aggregate.
pub fn summarize(
    aggregate: &TopicAggregate,
    config: &Config,
) -> Result<(TopicStatistics, RenderPayload)> {
    let stats =
        TopicStatistics::compute(&aggregate.signals.bucket_sums(), aggregate.total_documents);
    let payload = topic_payload(aggregate, &stats, config.categorical)?;
    Ok((stats, payload))
}

/// Run the topic pipeline end to end.
pub fn run(inputs: &TopicInputs, config: &Config, name: &str, dry: bool) -> Result<TopicRun> {
    let digest = snapshot::digest_inputs(&inputs.paths())?;
    let snapshot_path = config.snapshot_path(name);
    let payload_path = config.payload_path(name);

    let reused: Option<TopicAggregate> = if dry {
        snapshot::load_fresh(&snapshot_path, &digest)?
    } else {
        None
    };

    let (aggregate, log) = match reused {
        Some(aggregate) => {
            info!(path = %snapshot_path.display(), "Reusing topic snapshot");
            (aggregate, None)
        }
        None => {
            let metadata = Metadata::load(&inputs.metadata)?;
            let keys = parse_topic_keys(&read(&inputs.topic_keys)?)?;
            let diagnostics = parse_diagnostics(&read(&inputs.diagnostics)?)?;
            let doc_topics = read(&inputs.doc_topics)?;

            let (built, log) = aggregate(&metadata, &doc_topics, &keys, &diagnostics, config);
            snapshot::write(&snapshot_path, &digest, &built)?;
            (built, Some(log))
        }
    };

    let (stats, payload) = summarize(&aggregate, config)?;
    payload.write(&payload_path)?;
    info!(path = %payload_path.display(), "Topic payload written");

    Ok(TopicRun {
        aggregate,
        stats,
        payload,
        log,
        snapshot_path,
        payload_path,
    })
}

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}
