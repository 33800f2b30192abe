// Geocoder output — place reference table and per-document mentions.
//
// The geocoder is run over "<origin hint><document text>", so a mention whose
// character offset falls inside the hint names the document's home place and
// everything after it is an ordinary reference.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Geocoder place identifier.
pub type PlaceId = u64;

/// Reference data for one place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceInfo {
    pub name: String,
    /// Place type as reported by the geocoder ("Country", "Town", ...)
    #[serde(rename = "type")]
    pub kind: String,
    /// Centroid as [longitude, latitude]
    pub coordinates: [f64; 2],
}

impl PlaceInfo {
    pub fn is_country(&self) -> bool {
        self.kind == "Country"
    }
}

/// Every offset at which one place was mentioned in a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceReferences {
    pub place: PlaceId,
    pub offsets: Vec<usize>,
}

/// Materialized geocoder output for a corpus.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeoparseOutput {
    pub places: BTreeMap<PlaceId, PlaceInfo>,
    /// Document file name -> references, grouped by place
    pub documents: BTreeMap<String, Vec<PlaceReferences>>,
}

impl GeoparseOutput {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading geocoder output {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("parsing geocoder output {}", path.display()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MentionRole {
    Origin,
    Reference,
}

/// A single mention of a place in a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mention {
    pub place: PlaceId,
    pub offset: usize,
    pub role: MentionRole,
}

/// A document's mentions, tagged, with its origin resolved.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentMentions {
    pub origin: Option<PlaceId>,
    /// Sorted by offset
    pub mentions: Vec<Mention>,
}

impl DocumentMentions {
    /// Tag each mention against the origin hint length. The earliest
    /// origin-tagged mention (lowest place id on a tie) is the origin.
    pub fn classify(refs: &[PlaceReferences], hint_len: usize) -> Self {
        let mut mentions: Vec<Mention> = refs
            .iter()
            .flat_map(|r| {
                r.offsets.iter().map(move |&offset| Mention {
                    place: r.place,
                    offset,
                    role: if offset < hint_len {
                        MentionRole::Origin
                    } else {
                        MentionRole::Reference
                    },
                })
            })
            .collect();
        mentions.sort_by_key(|m| (m.offset, m.place));

        let origin = mentions
            .iter()
            .find(|m| m.role == MentionRole::Origin)
            .map(|m| m.place);

        Self { origin, mentions }
    }

    /// Places referenced outside the origin hint, origin excluded, one entry
    /// per mention in offset order.
    pub fn targets(&self) -> Vec<PlaceId> {
        self.mentions
            .iter()
            .filter(|m| m.role == MentionRole::Reference && Some(m.place) != self.origin)
            .map(|m| m.place)
            .collect()
    }

    /// Number of distinct places among `targets()`.
    pub fn distinct_targets(&self) -> usize {
        self.targets().into_iter().collect::<BTreeSet<_>>().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn refs(list: &[(PlaceId, &[usize])]) -> Vec<PlaceReferences> {
        list.iter()
            .map(|(place, offsets)| PlaceReferences {
                place: *place,
                offsets: offsets.to_vec(),
            })
            .collect()
    }

    #[test]
    fn test_origin_is_earliest_hint_mention() {
        let doc = DocumentMentions::classify(&refs(&[(300, &[40]), (200, &[3]), (100, &[0])]), 10);
        assert_eq!(doc.origin, Some(100));
        assert_eq!(doc.mentions[0].role, MentionRole::Origin);
        assert_eq!(doc.mentions[1].place, 200);
        assert_eq!(doc.mentions[1].role, MentionRole::Origin);
        assert_eq!(doc.mentions[2].role, MentionRole::Reference);
    }

    #[test]
    fn test_no_hint_means_no_origin() {
        let doc = DocumentMentions::classify(&refs(&[(100, &[0, 12])]), 0);
        assert_eq!(doc.origin, None);
        assert_eq!(doc.mentions.len(), 2);
    }

    #[test]
    fn test_targets_exclude_origin() {
        let doc = DocumentMentions::classify(
            &refs(&[(100, &[0, 50]), (200, &[20, 30]), (300, &[60])]),
            10,
        );
        assert_eq!(doc.targets(), vec![200, 200, 300]);
        assert_eq!(doc.distinct_targets(), 2);
    }

    #[test]
    fn test_integer_keys_round_trip_through_json() {
        let json = r#"{"places": {"100": {"name": "Lyon", "type": "Town", "coordinates": [4.8, 45.7]}},
                       "documents": {"a.txt": [{"place": 100, "offsets": [0, 9]}]}}"#;
        let geo: GeoparseOutput = serde_json::from_str(json).unwrap();
        assert_eq!(geo.places[&100].name, "Lyon");
        assert!(!geo.places[&100].is_country());
        assert_eq!(geo.documents["a.txt"][0].offsets, vec![0, 9]);
    }
}
