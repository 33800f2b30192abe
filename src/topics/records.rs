// Topic model record parsing — doc-topics and topic-keys lines.
//
// The doc-topics file has one whitespace-delimited line per document:
//
//   <doc-index> <path> <topic> <weight> <topic> <weight> ...
//
// preceded by a header line ("#doc name topic proportion ..."). Headers,
// comments and blank lines are skipped; anything else that fails to parse is
// a per-line failure for the caller to log.

use anyhow::{Context, Result};

use crate::batch::SkipReason;

/// One document's topic weights.
#[derive(Debug, Clone, PartialEq)]
pub struct DocTopics {
    pub index: String,
    pub path: String,
    /// (topic, weight) pairs in the order the annotator wrote them
    pub weights: Vec<(usize, f64)>,
}

/// Parse one doc-topics line. `Ok(None)` means a header or blank line.
pub fn parse_doc_topics_line(line: &str) -> Result<Option<DocTopics>, SkipReason> {
    let mut fields = line.split_whitespace();
    let index = match fields.next() {
        None => return Ok(None),
        Some(f) if f.starts_with('#') => return Ok(None),
        Some(f) => f,
    };
    let path = fields
        .next()
        .ok_or_else(|| SkipReason::Malformed(format!("no document path after {index}")))?;
    if path == "name" {
        return Ok(None);
    }

    let rest: Vec<&str> = fields.collect();
    if rest.len() % 2 != 0 {
        return Err(SkipReason::Malformed(format!(
            "{path}: odd number of topic/weight fields ({})",
            rest.len()
        )));
    }

    let mut weights = Vec::with_capacity(rest.len() / 2);
    for pair in rest.chunks_exact(2) {
        let topic: usize = pair[0]
            .parse()
            .map_err(|_| SkipReason::Malformed(format!("{path}: bad topic index {:?}", pair[0])))?;
        let weight: f64 = pair[1]
            .parse()
            .map_err(|_| SkipReason::Malformed(format!("{path}: bad weight {:?}", pair[1])))?;
        if !(0.0..=1.0).contains(&weight) {
            return Err(SkipReason::Malformed(format!(
                "{path}: weight {weight} outside [0, 1]"
            )));
        }
        weights.push((topic, weight));
    }

    Ok(Some(DocTopics {
        index: index.to_string(),
        path: path.to_string(),
        weights,
    }))
}

/// One topic-keys line: `<topic> <alpha> <word> <word> ...`.
#[derive(Debug, Clone, PartialEq)]
pub struct TopicKey {
    pub topic: usize,
    pub alpha: f64,
    /// Top words, most probable first
    pub words: Vec<String>,
}

impl TopicKey {
    /// Short label: the first `n` top words.
    pub fn label(&self, n: usize) -> Vec<String> {
        self.words.iter().take(n).cloned().collect()
    }
}

/// Parse the whole topic-keys file. Unlike doc-topics, a bad line here is
/// fatal: it describes the model itself, not one document.
pub fn parse_topic_keys(raw: &str) -> Result<Vec<TopicKey>> {
    let mut keys = Vec::new();
    for (n, line) in raw.lines().enumerate() {
        let mut fields = line.split_whitespace();
        let Some(topic) = fields.next() else {
            continue;
        };
        let topic: usize = topic
            .parse()
            .with_context(|| format!("topic-keys line {}: bad topic id {topic:?}", n + 1))?;
        let alpha: f64 = fields
            .next()
            .with_context(|| format!("topic-keys line {}: missing alpha", n + 1))?
            .parse()
            .with_context(|| format!("topic-keys line {}: bad alpha", n + 1))?;
        keys.push(TopicKey {
            topic,
            alpha,
            words: fields.map(str::to_string).collect(),
        });
    }
    keys.sort_by_key(|k| k.topic);
    Ok(keys)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pairs() {
        let doc = parse_doc_topics_line("0 doc1.txt 0 0.7 1 0.3").unwrap().unwrap();
        assert_eq!(doc.index, "0");
        assert_eq!(doc.path, "doc1.txt");
        assert_eq!(doc.weights, vec![(0, 0.7), (1, 0.3)]);
    }

    #[test]
    fn test_headers_are_skipped() {
        assert_eq!(parse_doc_topics_line("#doc name topic proportion ..."), Ok(None));
        assert_eq!(parse_doc_topics_line("doc name topic proportion"), Ok(None));
        assert_eq!(parse_doc_topics_line("   "), Ok(None));
    }

    #[test]
    fn test_malformed_lines_fail() {
        assert!(parse_doc_topics_line("3").is_err());
        assert!(parse_doc_topics_line("3 a.txt 0").is_err());
        assert!(parse_doc_topics_line("3 a.txt x 0.5").is_err());
        assert!(parse_doc_topics_line("3 a.txt 0 nope").is_err());
        assert!(parse_doc_topics_line("3 a.txt 0 1.5").is_err());
    }

    #[test]
    fn test_topic_keys_sorted_and_labelled() {
        let raw = "1\t0.5\tship sea harbor port\n0\t0.25\twar army battle\n\n";
        let keys = parse_topic_keys(raw).unwrap();
        assert_eq!(keys.len(), 2);
        assert_eq!(keys[0].topic, 0);
        assert_eq!(keys[1].label(3), vec!["ship", "sea", "harbor"]);
        assert_eq!(keys[0].label(5).len(), 3);
    }

    #[test]
    fn test_topic_keys_bad_alpha_is_fatal() {
        assert!(parse_topic_keys("0 abc war").is_err());
    }
}
