// Rendering payload — named variable assignments for the static front end.
//
// The payload is a block of `var NAME=<json>;` lines. Names are emitted in
// sorted order and every map is key-sorted, so the same input always
// produces the same bytes.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Result;
use serde::Serialize;
use serde_json::Value;

use crate::buckets::Bucket;
use crate::places::mentions::PlaceId;
use crate::places::signals::PlaceSignals;
use crate::topics::correlation::TopicStatistics;
use crate::topics::TopicAggregate;

use super::write_atomic;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderPayload {
    vars: BTreeMap<String, Value>,
}

impl RenderPayload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set<T: Serialize>(&mut self, name: &str, value: &T) -> Result<()> {
        self.vars
            .insert(name.to_string(), serde_json::to_value(value)?);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.vars.keys().map(String::as_str)
    }

    /// Render as `var NAME=<json>;` lines.
    pub fn to_js(&self) -> String {
        let mut out = String::new();
        for (name, value) in &self.vars {
            out.push_str("var ");
            out.push_str(name);
            out.push('=');
            out.push_str(&value.to_string());
            out.push_str(";\n");
        }
        out
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        write_atomic(path, self.to_js().as_bytes())
    }
}

/// Topic payload: series, labels, diagnostics and statistics.
pub fn topic_payload(
    aggregate: &TopicAggregate,
    stats: &TopicStatistics,
    categorical: bool,
) -> Result<RenderPayload> {
    let correlations: BTreeMap<String, Option<f64>> = stats
        .correlations
        .iter()
        .map(|(pair, r)| (pair.to_string(), *r))
        .collect();

    let mut payload = RenderPayload::new();
    payload.set("CATEGORICAL", &categorical)?;
    payload.set("TOPICS_DOCS", &aggregate.signals.weights_by_topic)?;
    payload.set("TOPIC_LABELS", &aggregate.labels)?;
    payload.set("TOPIC_COHERENCE", &aggregate.coherence)?;
    payload.set("TOPIC_PROPORTIONS", &stats.proportions)?;
    payload.set("TOPIC_STDEVS", &stats.stdevs)?;
    payload.set("TOPIC_CORRELATIONS", &correlations)?;
    Ok(payload)
}

/// Place payload: reference tables, per-name weights split into countries
/// and other places, the date span, and the edge list per year.
pub fn place_payload(signals: &PlaceSignals) -> Result<RenderPayload> {
    let ids_to_names: BTreeMap<PlaceId, &str> = signals
        .places
        .iter()
        .map(|(id, p)| (*id, p.name.as_str()))
        .collect();
    let ids_to_coords: BTreeMap<PlaceId, [f64; 2]> = signals
        .places
        .iter()
        .map(|(id, p)| (*id, p.coordinates))
        .collect();

    // Keyed by name; places that share a name share a series
    let mut countries: BTreeMap<&str, BTreeMap<Bucket, u32>> = BTreeMap::new();
    let mut mentioned: BTreeMap<&str, BTreeMap<Bucket, u32>> = BTreeMap::new();
    for (id, weights) in &signals.weights {
        let Some(place) = signals.places.get(id) else {
            continue;
        };
        let target = if place.is_country() {
            &mut countries
        } else {
            &mut mentioned
        };
        let series = target.entry(place.name.as_str()).or_default();
        for (bucket, count) in weights {
            *series.entry(*bucket).or_insert(0) += count;
        }
    }

    let mut payload = RenderPayload::new();
    payload.set("placeIDsToNames", &ids_to_names)?;
    payload.set("placeIDsToCoords", &ids_to_coords)?;
    payload.set("countries", &countries)?;
    payload.set("placesMentioned", &mentioned)?;
    payload.set("max_country_weight", &signals.max_country_weight())?;
    payload.set("startDate", &signals.span.map(|(start, _)| start))?;
    payload.set("endDate", &signals.span.map(|(_, end)| end))?;
    payload.set("LINKS_BY_YEAR", &signals.links_by_year)?;
    Ok(payload)
}
