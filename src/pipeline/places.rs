// Place pipeline: geocoder output -> place weights + edges -> payload.
//
// Same shape as the topic pipeline, minus statistics: digest inputs, reuse
// a fresh snapshot on a dry run, otherwise aggregate and snapshot, then
// write the payload.

use std::path::{Path, PathBuf};

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use crate::batch::BatchLog;
use crate::config::Config;
use crate::corpus::Metadata;
use crate::output::render::{place_payload, RenderPayload};
use crate::output::snapshot;
use crate::places::mentions::GeoparseOutput;
use crate::places::signals::{PlaceSignalAggregator, PlaceSignals};

/// Where the geocoder and host application left their output.
#[derive(Debug, Clone)]
pub struct PlaceInputs {
    pub metadata: PathBuf,
    pub geoparse: PathBuf,
}

pub struct PlaceRun {
    pub signals: PlaceSignals,
    pub payload: RenderPayload,
    /// None when the aggregate came from the snapshot
    pub log: Option<BatchLog>,
    pub snapshot_path: PathBuf,
    pub payload_path: PathBuf,
}

/// Aggregate in-memory geocoder output.
pub fn aggregate(
    metadata: &Metadata,
    geo: &GeoparseOutput,
    config: &Config,
) -> (PlaceSignals, BatchLog) {
    info!(
        places = geo.places.len(),
        documents = geo.documents.len(),
        "Aggregating place mentions"
    );

    let mut aggregator = PlaceSignalAggregator::new(metadata, &geo.places, config.fallback_year);
    let pb = ProgressBar::new(geo.documents.len() as u64);
    if let Ok(style) =
        ProgressStyle::default_bar().template("  Places [{bar:30}] {pos}/{len} ({eta})")
    {
        pb.set_style(style);
    }
    for (doc, refs) in &geo.documents {
        aggregator.ingest_document(doc, refs);
        pb.inc(1);
    }
    pb.finish_and_clear();

    aggregator.finish()
}

/// Run the place pipeline end to end.
pub fn run(inputs: &PlaceInputs, config: &Config, name: &str, dry: bool) -> Result<PlaceRun> {
    let paths: [&Path; 2] = [&inputs.metadata, &inputs.geoparse];
    let digest = snapshot::digest_inputs(&paths)?;
    let snapshot_path = config.snapshot_path(name);
    let payload_path = config.payload_path(name);

    let reused: Option<PlaceSignals> = if dry {
        snapshot::load_fresh(&snapshot_path, &digest)?
    } else {
        None
    };

    let (signals, log) = match reused {
        Some(signals) => {
            info!(path = %snapshot_path.display(), "Reusing place snapshot");
            (signals, None)
        }
        None => {
            let metadata = Metadata::load(&inputs.metadata)?;
            let geo = GeoparseOutput::load(&inputs.geoparse)?;
            let (signals, log) = aggregate(&metadata, &geo, config);
            snapshot::write(&snapshot_path, &digest, &signals)?;
            (signals, Some(log))
        }
    };

    let payload = place_payload(&signals)?;
    payload.write(&payload_path)?;
    info!(path = %payload_path.display(), "Place payload written");

    Ok(PlaceRun {
        signals,
        payload,
        log,
        snapshot_path,
        payload_path,
    })
}
