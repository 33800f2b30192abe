// Topic diagnostics — per-topic quality measures from the topic modeling tool.
//
// The diagnostics file is XML:
//
//   <model>
//     <topic id="0" coherence="-120.5" allocation_ratio="0.02" ...>
//       <word rank="1" prob="0.051">war</word>
//       ...
//     </topic>
//   </model>
//
// Only coherence, allocation ratio and the ranked word list are kept.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::records::TopicKey;

/// A ranked word and its probability within a topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordProb {
    pub text: String,
    pub prob: f64,
}

/// Diagnostics for one topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicDiagnostics {
    pub coherence: f64,
    pub allocation_ratio: f64,
    pub words: Vec<WordProb>,
}

/// What the front end shows for a topic: its short label, full ranked word
/// list, and allocation ratio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicLabel {
    pub label: Vec<String>,
    pub fulltopic: Vec<WordProb>,
    pub allocation_ratio: f64,
}

/// Join topic keys with diagnostics. A topic without diagnostics still gets
/// its label; only its word list and ratio are left empty.
pub fn build_labels(
    keys: &[TopicKey],
    diagnostics: &BTreeMap<usize, TopicDiagnostics>,
    label_words: usize,
) -> BTreeMap<usize, TopicLabel> {
    keys.iter()
        .map(|key| {
            let diag = diagnostics.get(&key.topic);
            if diag.is_none() {
                warn!(topic = key.topic, "No diagnostics for topic");
            }
            (
                key.topic,
                TopicLabel {
                    label: key.label(label_words),
                    fulltopic: diag.map(|d| d.words.clone()).unwrap_or_default(),
                    allocation_ratio: diag.map_or(0.0, |d| d.allocation_ratio),
                },
            )
        })
        .collect()
}

/// Coherence per topic.
pub fn coherence(diagnostics: &BTreeMap<usize, TopicDiagnostics>) -> BTreeMap<usize, f64> {
    diagnostics
        .iter()
        .map(|(t, d)| (*t, d.coherence))
        .collect()
}

/// Parse a diagnostics document into per-topic diagnostics.
pub fn parse_diagnostics(xml: &str) -> Result<BTreeMap<usize, TopicDiagnostics>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut topics = BTreeMap::new();
    let mut current: Option<(usize, TopicDiagnostics)> = None;
    let mut pending_word: Option<f64> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) if e.local_name().as_ref() == b"topic" => {
                current = Some(read_topic(e)?);
            }
            Ok(Event::Empty(ref e)) if e.local_name().as_ref() == b"topic" => {
                let (id, diag) = read_topic(e)?;
                topics.insert(id, diag);
            }
            Ok(Event::Start(ref e)) if e.local_name().as_ref() == b"word" => {
                pending_word = Some(attr_f64(e, b"prob")?.unwrap_or(0.0));
            }
            Ok(Event::Text(ref e)) => {
                if let (Some(prob), Some((_, diag))) = (pending_word, current.as_mut()) {
                    let text = e.unescape().context("decoding topic word")?;
                    diag.words.push(WordProb {
                        text: text.into_owned(),
                        prob,
                    });
                    pending_word = None;
                }
            }
            Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                b"word" => pending_word = None,
                b"topic" => {
                    if let Some((id, diag)) = current.take() {
                        topics.insert(id, diag);
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("diagnostics XML at byte {}", reader.buffer_position())
                })
            }
            _ => {}
        }
    }

    Ok(topics)
}

fn read_topic(e: &BytesStart) -> Result<(usize, TopicDiagnostics)> {
    let id = attr_string(e, b"id")?.context("topic element without id")?;
    let id: usize = id
        .parse()
        .with_context(|| format!("topic id {id:?} is not a number"))?;
    Ok((
        id,
        TopicDiagnostics {
            coherence: attr_f64(e, b"coherence")?.unwrap_or(0.0),
            allocation_ratio: attr_f64(e, b"allocation_ratio")?.unwrap_or(0.0),
            words: Vec::new(),
        },
    ))
}

fn attr_string(e: &BytesStart, name: &[u8]) -> Result<Option<String>> {
    for attr in e.attributes() {
        let attr = attr.context("malformed attribute")?;
        if attr.key.as_ref() == name {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

fn attr_f64(e: &BytesStart, name: &[u8]) -> Result<Option<f64>> {
    attr_string(e, name)?
        .map(|v| {
            v.parse::<f64>().with_context(|| {
                format!(
                    "attribute {} = {v:?} is not a number",
                    String::from_utf8_lossy(name)
                )
            })
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<model>
<topic id="0" tokens="1200" coherence="-101.5" allocation_ratio="0.25">
  <word rank="1" prob="0.061">war</word>
  <word rank="2" prob="0.040">army</word>
</topic>
<topic id="1" tokens="800" coherence="-88" allocation_ratio="0.1">
  <word rank="1" prob="0.070">sea &amp; ships</word>
</topic>
</model>"#;

    #[test]
    fn test_parse_sample() {
        let d = parse_diagnostics(SAMPLE).unwrap();
        assert_eq!(d.len(), 2);
        assert_eq!(d[&0].coherence, -101.5);
        assert_eq!(d[&0].allocation_ratio, 0.25);
        assert_eq!(d[&0].words.len(), 2);
        assert_eq!(d[&0].words[1].text, "army");
        assert_eq!(d[&1].words[0].text, "sea & ships");
        assert!((d[&1].words[0].prob - 0.07).abs() < 1e-12);
    }

    #[test]
    fn test_labels_survive_missing_diagnostics() {
        let d = parse_diagnostics(SAMPLE).unwrap();
        let keys = vec![
            TopicKey {
                topic: 0,
                alpha: 0.5,
                words: vec!["war".into(), "army".into(), "battle".into(), "siege".into()],
            },
            TopicKey {
                topic: 5,
                alpha: 0.5,
                words: vec!["grain".into()],
            },
        ];
        let labels = build_labels(&keys, &d, 3);
        assert_eq!(labels[&0].label, vec!["war", "army", "battle"]);
        assert_eq!(labels[&0].fulltopic.len(), 2);
        assert_eq!(labels[&0].allocation_ratio, 0.25);
        assert!(labels[&5].fulltopic.is_empty());
        assert_eq!(coherence(&d)[&1], -88.0);
    }

    #[test]
    fn test_bad_number_is_an_error() {
        let xml = r#"<model><topic id="0" coherence="high"></topic></model>"#;
        assert!(parse_diagnostics(xml).is_err());
    }
}
