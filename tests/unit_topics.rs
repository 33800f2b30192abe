// Unit tests for topic aggregation and statistics.
//
// Tests the public pieces in isolation: the doc-topics aggregator against
// concrete records, statistics bounds and undefined cases, and bucket
// fallback behavior.

use strata::buckets::resolve_year;
use strata::corpus::{DocumentMeta, ItemId, Metadata};
use strata::topics::correlation::{correlation, proportion, stdev, TopicPair, TopicStatistics};
use strata::topics::signals::TopicSignalAggregator;

fn metadata(docs: &[(&str, &str)]) -> Metadata {
    docs.iter()
        .enumerate()
        .map(|(i, (file, year))| {
            (
                file.to_string(),
                DocumentMeta {
                    year: year.to_string(),
                    item_id: ItemId::Number(i as i64 + 1),
                    label: format!("Item {}", i + 1),
                    place: None,
                },
            )
        })
        .collect()
}

// ============================================================
// TopicSignalAggregator — concrete records
// ============================================================

#[test]
fn two_documents_two_years() {
    let md = metadata(&[("doc1.txt", "2000"), ("doc2.txt", "2001")]);
    let mut agg = TopicSignalAggregator::new(&md, 2, 2012);
    agg.ingest_line(1, "0 doc1.txt 0 0.7 1 0.3");
    agg.ingest_line(2, "1 doc2.txt 0 0.2 1 0.8");
    let (signals, log) = agg.finish();

    assert_eq!(log.accepted(), 2);
    assert!(log.skipped().is_empty());
    assert!((signals.weight_at(0, 2000) - 0.7).abs() < 1e-12);
    assert!((signals.weight_at(0, 2001) - 0.2).abs() < 1e-12);
    assert!((signals.weight_at(1, 2000) - 0.3).abs() < 1e-12);
    assert!((signals.weight_at(1, 2001) - 0.8).abs() < 1e-12);
}

#[test]
fn header_and_junk_lines_do_not_abort_the_stream() {
    let md = metadata(&[("doc1.txt", "2000"), ("doc2.txt", "2001")]);
    let mut agg = TopicSignalAggregator::new(&md, 2, 2012);
    agg.ingest_line(1, "#doc name topic proportion ...");
    agg.ingest_line(2, "0 doc1.txt 0 0.7 1");
    agg.ingest_line(3, "1 missing.txt 0 0.5");
    agg.ingest_line(4, "2 doc2.txt 1 0.8");
    let (signals, log) = agg.finish();

    assert_eq!(log.accepted(), 1);
    assert_eq!(log.skipped().len(), 2);
    assert_eq!(log.skipped()[0].item, "line 2");
    assert_eq!(log.skipped()[1].item, "missing.txt");
    assert!((signals.weight_at(1, 2001) - 0.8).abs() < 1e-12);
    assert_eq!(signals.weight_at(0, 2000), 0.0);
}

#[test]
fn undated_documents_land_in_fallback_bucket() {
    let md = metadata(&[("a.txt", "0000"), ("b.txt", "unknown"), ("c.txt", "1999")]);
    let mut agg = TopicSignalAggregator::new(&md, 1, 2012);
    agg.ingest_line(1, "0 a.txt 0 0.5");
    agg.ingest_line(2, "1 b.txt 0 0.25");
    agg.ingest_line(3, "2 c.txt 0 1.0");
    let (signals, _) = agg.finish();

    assert_eq!(signals.buckets, vec![1999, 2012]);
    assert!((signals.weight_at(0, 2012) - 0.75).abs() < 1e-12);
    assert_eq!(signals.weights_by_topic[0][1].y.len(), 2);
}

#[test]
fn stream_order_does_not_change_the_result() {
    let md = metadata(&[
        ("a.txt", "1900"),
        ("b.txt", "1900"),
        ("c.txt", "1901"),
        ("d.txt", "1902"),
    ]);
    let lines = [
        "0 a.txt 0 0.1 1 0.9",
        "1 b.txt 0 0.6 1 0.4",
        "2 c.txt 0 0.3 1 0.7",
        "3 d.txt 0 0.95 1 0.05",
    ];

    let mut forward = TopicSignalAggregator::new(&md, 2, 2012);
    for (n, line) in lines.iter().enumerate() {
        forward.ingest_line(n + 1, line);
    }
    let mut backward = TopicSignalAggregator::new(&md, 2, 2012);
    for (n, line) in lines.iter().rev().enumerate() {
        backward.ingest_line(n + 1, line);
    }

    assert_eq!(forward.finish().0, backward.finish().0);
}

// ============================================================
// Statistics — bounds and undefined results
// ============================================================

#[test]
fn proportions_stay_in_unit_interval() {
    let md = metadata(&[("a.txt", "1900"), ("b.txt", "1901"), ("c.txt", "1902")]);
    let mut agg = TopicSignalAggregator::new(&md, 3, 2012);
    agg.ingest_line(1, "0 a.txt 0 0.5 1 0.3 2 0.2");
    agg.ingest_line(2, "1 b.txt 0 0.1 1 0.1 2 0.8");
    agg.ingest_line(3, "2 c.txt 0 1.0");
    let (signals, _) = agg.finish();

    let stats = TopicStatistics::compute(&signals.bucket_sums(), md.len());
    for (topic, p) in &stats.proportions {
        let p = p.expect("corpus is not empty");
        assert!((0.0..=1.0).contains(&p), "topic {topic} proportion {p}");
    }
    let total: f64 = stats.proportions.values().map(|p| p.unwrap()).sum();
    assert!((total - 1.0).abs() < 1e-12);
}

#[test]
fn correlations_bounded_or_undefined() {
    let series = vec![
        vec![0.1, 0.4, 0.2, 0.9],
        vec![0.8, 0.1, 0.5, 0.3],
        vec![0.25, 0.25, 0.25, 0.25],
        vec![0.3, 0.6, 0.2, 1.0],
    ];
    let stats = TopicStatistics::compute(&series, 4);

    assert_eq!(stats.correlations.len(), 6);
    for (pair, r) in &stats.correlations {
        assert!(pair.i < pair.j);
        let flat = pair.i == 2 || pair.j == 2;
        match r {
            Some(r) => {
                assert!(!flat, "{pair} involves a flat series");
                assert!((-1.0..=1.0).contains(r), "{pair} = {r}");
            }
            None => assert!(flat, "{pair} should be defined"),
        }
    }
}

#[test]
fn single_bucket_corpus_has_undefined_spread() {
    let stats = TopicStatistics::compute(&[vec![0.5], vec![0.5]], 1);
    assert_eq!(stats.stdevs[&0], None);
    assert_eq!(stats.correlations[&TopicPair { i: 0, j: 1 }], None);
    assert_eq!(stats.proportions[&0], Some(0.5));
}

#[test]
fn correlation_is_symmetric() {
    let a = [0.1, 0.5, 0.3, 0.9];
    let b = [0.7, 0.2, 0.6, 0.1];
    let ab = correlation(&a, &b).unwrap();
    let ba = correlation(&b, &a).unwrap();
    assert!((ab - ba).abs() < 1e-12);
}

#[test]
fn stdev_and_proportion_edge_cases() {
    assert_eq!(stdev(&[]), None);
    assert_eq!(proportion(&[0.2, 0.3], 0), None);
    assert_eq!(proportion(&[0.2, 0.3], 5), Some(0.1));
}

// ============================================================
// Buckets
// ============================================================

#[test]
fn fallback_rule_is_explicit() {
    assert_eq!(resolve_year("0000", 1850), 1850);
    assert_eq!(resolve_year("1850s", 1900), 1900);
    assert_eq!(resolve_year("1851", 1900), 1851);
}
