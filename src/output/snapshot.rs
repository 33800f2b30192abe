// Cache snapshot — raw aggregates from one pass, reusable on a later run.
//
// A snapshot records a SHA-256 digest of the annotator files it was built
// from. A dry run only reuses it when the digest still matches; if the
// annotator was rerun in between, aggregation runs again.

use std::path::Path;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use super::write_atomic;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot<T> {
    /// Hex SHA-256 over the input files
    pub source_digest: String,
    pub data: T,
}

/// Digest a set of input files, in the given order.
pub fn digest_inputs(paths: &[&Path]) -> Result<String> {
    let mut hasher = Sha256::new();
    for path in paths {
        let bytes =
            std::fs::read(path).with_context(|| format!("reading {} for digest", path.display()))?;
        // Length prefix keeps ("ab", "c") and ("a", "bc") apart
        hasher.update((bytes.len() as u64).to_le_bytes());
        hasher.update(&bytes);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Write a snapshot as pretty JSON.
pub fn write<T: Serialize>(path: &Path, source_digest: &str, data: &T) -> Result<()> {
    #[derive(Serialize)]
    struct SnapshotRef<'a, T> {
        source_digest: &'a str,
        data: &'a T,
    }

    let json = serde_json::to_vec_pretty(&SnapshotRef {
        source_digest,
        data,
    })?;
    write_atomic(path, &json)?;
    info!(path = %path.display(), "Snapshot written");
    Ok(())
}

/// Load a snapshot if it exists and was built from the same inputs.
///
/// A missing or stale snapshot is `Ok(None)`; an unreadable one is an error.
pub fn load_fresh<T: DeserializeOwned>(path: &Path, source_digest: &str) -> Result<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = std::fs::read(path).with_context(|| format!("reading snapshot {}", path.display()))?;
    let snapshot: Snapshot<T> = serde_json::from_slice(&raw)
        .with_context(|| format!("parsing snapshot {}", path.display()))?;

    if snapshot.source_digest != source_digest {
        warn!(path = %path.display(), "Snapshot is stale, inputs changed since it was built");
        return Ok(None);
    }
    Ok(Some(snapshot.data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn scratch(name: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("strata-snap-{}-{name}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_fresh_snapshot_reloads_verbatim() {
        let dir = scratch("fresh");
        let path = dir.join("snap.json");
        let data: BTreeMap<String, Vec<f64>> = [("a".to_string(), vec![0.1, 0.2])].into();

        write(&path, "abc", &data).unwrap();
        let loaded: Option<BTreeMap<String, Vec<f64>>> = load_fresh(&path, "abc").unwrap();
        assert_eq!(loaded, Some(data));

        let stale: Option<BTreeMap<String, Vec<f64>>> = load_fresh(&path, "def").unwrap();
        assert_eq!(stale, None);
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_missing_snapshot_is_none() {
        let dir = scratch("missing");
        let loaded: Option<Vec<u8>> = load_fresh(&dir.join("nope.json"), "abc").unwrap();
        assert!(loaded.is_none());
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_digest_depends_on_content_and_boundaries() {
        let dir = scratch("digest");
        let (a, b) = (dir.join("a"), dir.join("b"));
        std::fs::write(&a, "ab").unwrap();
        std::fs::write(&b, "c").unwrap();
        let first = digest_inputs(&[&a, &b]).unwrap();

        std::fs::write(&a, "a").unwrap();
        std::fs::write(&b, "bc").unwrap();
        let second = digest_inputs(&[&a, &b]).unwrap();

        assert_eq!(first.len(), 64);
        assert_ne!(first, second);
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
