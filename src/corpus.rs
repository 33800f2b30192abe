// Corpus metadata — the per-document facts the host application knows.
//
// Metadata is keyed by document file name. Annotators tend to mangle spaces
// in paths, so keys are normalized (spaces -> underscores) on load and every
// lookup goes through the same normalization.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::batch::SkipReason;

/// The host application's identifier for a document. Usually numeric, but
/// some collections use string keys, and both are passed through untouched.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ItemId {
    Number(i64),
    Text(String),
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemId::Number(n) => write!(f, "{n}"),
            ItemId::Text(s) => f.write_str(s),
        }
    }
}

/// Metadata for a single document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentMeta {
    /// Raw year field — may be empty, non-numeric, or "0000". Hosts that
    /// store it as a JSON number are accepted too.
    #[serde(default, deserialize_with = "year_text")]
    pub year: String,
    #[serde(rename = "itemID")]
    pub item_id: ItemId,
    #[serde(default)]
    pub label: String,
    /// Origin hint: text prepended before geocoding. Mentions whose offset
    /// falls inside it are the document's "home" location.
    #[serde(default)]
    pub place: Option<String>,
}

impl DocumentMeta {
    /// Length of the origin hint in characters (0 when absent).
    pub fn origin_hint_len(&self) -> usize {
        self.place.as_deref().map_or(0, |p| p.chars().count())
    }
}

fn year_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Null => Ok(String::new()),
        other => Err(serde::de::Error::custom(format!(
            "year must be a string or number, got {other}"
        ))),
    }
}

/// All document metadata, keyed by normalized file name.
///
/// Entries that fail to parse are kept aside with their error instead of
/// failing the whole load; lookups of those documents report why.
#[derive(Debug, Clone, Default)]
pub struct Metadata {
    docs: BTreeMap<String, DocumentMeta>,
    rejected: BTreeMap<String, String>,
}

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load metadata from a JSON object of `{ "<file>": { year, itemID, label, place } }`.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading metadata {}", path.display()))?;
        let entries: BTreeMap<String, Value> = serde_json::from_str(&raw)
            .with_context(|| format!("parsing metadata {}", path.display()))?;
        Ok(Self::from_entries(entries))
    }

    /// Build from raw JSON entries, one document at a time.
    pub fn from_entries(entries: BTreeMap<String, Value>) -> Self {
        let mut metadata = Self::new();
        for (file, value) in entries {
            match serde_json::from_value::<DocumentMeta>(value) {
                Ok(meta) => metadata.insert(&file, meta),
                Err(e) => {
                    warn!(file = %file, error = %e, "Rejecting metadata entry");
                    metadata.rejected.insert(normalize_key(&file), e.to_string());
                }
            }
        }
        metadata
    }

    pub fn insert(&mut self, file: &str, meta: DocumentMeta) {
        let key = normalize_key(file);
        self.rejected.remove(&key);
        if self.docs.insert(key.clone(), meta).is_some() {
            warn!(
                file,
                key = %key,
                "Metadata key collides after normalization, keeping the later entry"
            );
        }
    }

    /// Look up a document by the path an annotator reported for it.
    pub fn get(&self, file: &str) -> Option<&DocumentMeta> {
        let key = normalize_key(file);
        self.docs
            .get(&key)
            .or_else(|| key.strip_prefix("file:").and_then(|k| self.docs.get(k)))
    }

    /// Look up a document, saying why when it can't be used.
    pub fn lookup(&self, file: &str) -> Result<&DocumentMeta, SkipReason> {
        if let Some(meta) = self.get(file) {
            return Ok(meta);
        }
        let key = normalize_key(file);
        let rejected = self
            .rejected
            .get(&key)
            .or_else(|| key.strip_prefix("file:").and_then(|k| self.rejected.get(k)));
        Err(match rejected {
            Some(reason) => SkipReason::InvalidMetadata {
                doc: file.to_string(),
                reason: reason.clone(),
            },
            None => SkipReason::MissingMetadata(file.to_string()),
        })
    }

    /// Entries that failed to parse: normalized key -> error.
    pub fn rejected(&self) -> &BTreeMap<String, String> {
        &self.rejected
    }

    /// Number of usable documents.
    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    /// Iterate documents in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &DocumentMeta)> {
        self.docs.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl FromIterator<(String, DocumentMeta)> for Metadata {
    fn from_iter<I: IntoIterator<Item = (String, DocumentMeta)>>(iter: I) -> Self {
        let mut metadata = Metadata::new();
        for (file, meta) in iter {
            metadata.insert(&file, meta);
        }
        metadata
    }
}

/// Normalize a document path for metadata lookup.
pub fn normalize_key(file: &str) -> String {
    file.replace(' ', "_")
}

/// Human-readable title from a document path: base name, no `.txt`,
/// underscores back to spaces.
pub fn title_from_path(file: &str) -> String {
    let base = file.rsplit(['/', '\\']).next().unwrap_or(file);
    base.replace(".txt", "").replace('_', " ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(year: &str) -> DocumentMeta {
        DocumentMeta {
            year: year.to_string(),
            item_id: ItemId::Number(1),
            label: "Doc".to_string(),
            place: None,
        }
    }

    #[test]
    fn test_lookup_normalizes_spaces() {
        let mut md = Metadata::new();
        md.insert("/corpus/my doc.txt", meta("1900"));
        assert!(md.get("/corpus/my_doc.txt").is_some());
        assert!(md.get("/corpus/my doc.txt").is_some());
        assert!(md.get("file:/corpus/my_doc.txt").is_some());
    }

    #[test]
    fn test_title_from_path() {
        assert_eq!(title_from_path("/corpus/letters_of_1850.txt"), "letters of 1850");
        assert_eq!(title_from_path("plain"), "plain");
    }

    #[test]
    fn test_origin_hint_len_counts_chars() {
        let mut m = meta("1900");
        assert_eq!(m.origin_hint_len(), 0);
        m.place = Some("Zürich ".to_string());
        assert_eq!(m.origin_hint_len(), 7);
    }

    #[test]
    fn test_item_id_accepts_number_or_string() {
        let json = r#"{"a.txt": {"year": "1900", "itemID": 42, "label": "A"},
                       "b.txt": {"year": "x", "itemID": "K7", "label": "B", "place": "Paris"}}"#;
        let docs: BTreeMap<String, DocumentMeta> = serde_json::from_str(json).unwrap();
        assert_eq!(docs["a.txt"].item_id, ItemId::Number(42));
        assert_eq!(docs["b.txt"].item_id, ItemId::Text("K7".into()));
        assert_eq!(docs["b.txt"].place.as_deref(), Some("Paris"));
    }

    #[test]
    fn test_bad_entry_is_rejected_not_fatal() {
        let entries: BTreeMap<String, Value> = serde_json::from_str(
            r#"{"a.txt": {"year": 1901, "itemID": 1, "label": "A"},
                "b.txt": {"year": "1902", "label": "B"},
                "c.txt": {"year": "1903", "itemID": 2.5, "label": "C"}}"#,
        )
        .unwrap();
        let md = Metadata::from_entries(entries);

        assert_eq!(md.len(), 1);
        assert_eq!(md.lookup("a.txt").unwrap().year, "1901");
        assert!(matches!(
            md.lookup("b.txt"),
            Err(SkipReason::InvalidMetadata { .. })
        ));
        assert!(matches!(
            md.lookup("c.txt"),
            Err(SkipReason::InvalidMetadata { .. })
        ));
        assert_eq!(
            md.lookup("z.txt"),
            Err(SkipReason::MissingMetadata("z.txt".into()))
        );
    }

    #[test]
    fn test_colliding_keys_keep_later_entry() {
        let mut md = Metadata::new();
        md.insert("a b.txt", meta("1900"));
        md.insert("a_b.txt", meta("1901"));
        assert_eq!(md.len(), 1);
        assert_eq!(md.get("a b.txt").unwrap().year, "1901");
    }
}
