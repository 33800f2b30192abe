use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::buckets::Bucket;

/// Default bucket for undated documents.
pub const DEFAULT_FALLBACK_YEAR: Bucket = 2012;

/// Central configuration loaded from environment variables.
///
/// The .env file is loaded automatically at startup via dotenvy. CLI flags
/// override the paths; everything else comes from here.
#[derive(Debug, Clone)]
pub struct Config {
    /// Bucket for documents whose year is missing, non-numeric or "0000"
    pub fallback_year: Bucket,
    /// Where snapshots and payloads are written
    pub output_dir: PathBuf,
    /// How many top words make up a topic's short label
    pub label_words: usize,
    /// Passed through to the front end: draw topics as categories instead of a timeline
    pub categorical: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fallback_year: DEFAULT_FALLBACK_YEAR,
            output_dir: PathBuf::from("./output"),
            label_words: 3,
            categorical: false,
        }
    }
}

impl Config {
    /// Load configuration from environment variables. Unset variables keep
    /// their defaults; set-but-invalid ones are an error.
    pub fn load() -> Result<Self> {
        let defaults = Self::default();

        let fallback_year = match env::var("STRATA_FALLBACK_YEAR") {
            Ok(v) => v
                .trim()
                .parse()
                .with_context(|| format!("STRATA_FALLBACK_YEAR={v:?} is not a year"))?,
            Err(_) => defaults.fallback_year,
        };

        let label_words = match env::var("STRATA_LABEL_WORDS") {
            Ok(v) => v
                .trim()
                .parse()
                .with_context(|| format!("STRATA_LABEL_WORDS={v:?} is not a count"))?,
            Err(_) => defaults.label_words,
        };

        let categorical = match env::var("STRATA_CATEGORICAL").as_deref() {
            Ok("1") | Ok("true") | Ok("yes") => true,
            // Anything else, or unset, keeps the timeline view
            _ => defaults.categorical,
        };

        Ok(Self {
            fallback_year,
            output_dir: env::var("STRATA_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
            label_words,
            categorical,
        })
    }

    /// Snapshot path for a run name.
    pub fn snapshot_path(&self, name: &str) -> PathBuf {
        self.output_dir.join(format!("{name}.snapshot.json"))
    }

    /// Rendering payload path for a run name.
    pub fn payload_path(&self, name: &str) -> PathBuf {
        self.output_dir.join(format!("{name}.js"))
    }
}
