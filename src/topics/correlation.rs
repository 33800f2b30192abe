// Topic statistics — proportion, spread and pairwise correlation of the
// per-bucket topic series.
//
// Every statistic that can't be computed (a single bucket, a flat series,
// an empty corpus) comes back as `None` rather than NaN or infinity, and is
// written out as `null`.

use std::collections::BTreeMap;
use std::fmt;

/// Standard deviations below this are treated as a flat series.
const FLAT_STDEV: f64 = 1e-12;

/// An unordered topic pair, always stored with `i < j`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TopicPair {
    pub i: usize,
    pub j: usize,
}

impl TopicPair {
    /// Build a pair from two distinct topics, in either order.
    pub fn new(a: usize, b: usize) -> Option<Self> {
        match a.cmp(&b) {
            std::cmp::Ordering::Less => Some(Self { i: a, j: b }),
            std::cmp::Ordering::Greater => Some(Self { i: b, j: a }),
            std::cmp::Ordering::Equal => None,
        }
    }
}

impl fmt::Display for TopicPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.i, self.j)
    }
}

/// Summary statistics over all topics.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TopicStatistics {
    pub proportions: BTreeMap<usize, Option<f64>>,
    pub stdevs: BTreeMap<usize, Option<f64>>,
    /// Upper triangle only: one entry per pair with `i < j`
    pub correlations: BTreeMap<TopicPair, Option<f64>>,
}

impl TopicStatistics {
    /// Compute all statistics from per-topic bucket sums.
    pub fn compute(series: &[Vec<f64>], total_documents: usize) -> Self {
        let proportions = series
            .iter()
            .enumerate()
            .map(|(t, s)| (t, proportion(s, total_documents)))
            .collect();

        let stdevs: BTreeMap<usize, Option<f64>> = series
            .iter()
            .enumerate()
            .map(|(t, s)| (t, stdev(s)))
            .collect();

        let mut correlations = BTreeMap::new();
        for i in 0..series.len() {
            for j in (i + 1)..series.len() {
                let r = correlation_with(&series[i], &series[j], stdevs[&i], stdevs[&j]);
                correlations.insert(TopicPair { i, j }, r);
            }
        }

        Self {
            proportions,
            stdevs,
            correlations,
        }
    }
}

/// Share of the corpus's total probability mass held by a topic.
pub fn proportion(series: &[f64], total_documents: usize) -> Option<f64> {
    if total_documents == 0 {
        return None;
    }
    Some(series.iter().sum::<f64>() / total_documents as f64)
}

pub fn mean(xs: &[f64]) -> Option<f64> {
    if xs.is_empty() {
        return None;
    }
    Some(xs.iter().sum::<f64>() / xs.len() as f64)
}

/// Sample standard deviation (n - 1 denominator). Undefined for n < 2.
pub fn stdev(xs: &[f64]) -> Option<f64> {
    if xs.len() < 2 {
        return None;
    }
    let xbar = mean(xs)?;
    let ss: f64 = xs.iter().map(|x| (x - xbar).powi(2)).sum();
    let sd = (ss / (xs.len() - 1) as f64).sqrt();
    Some(if sd < FLAT_STDEV { 0.0 } else { sd })
}

/// Sample covariance (n - 1 denominator). Undefined for n < 2 or unequal lengths.
pub fn covariance(xs: &[f64], ys: &[f64]) -> Option<f64> {
    if xs.len() < 2 || xs.len() != ys.len() {
        return None;
    }
    let xbar = mean(xs)?;
    let ybar = mean(ys)?;
    let s: f64 = xs
        .iter()
        .zip(ys)
        .map(|(x, y)| (x - xbar) * (y - ybar))
        .sum();
    Some(s / (xs.len() - 1) as f64)
}

/// Pearson correlation of two series. Undefined when either is flat.
pub fn correlation(xs: &[f64], ys: &[f64]) -> Option<f64> {
    correlation_with(xs, ys, stdev(xs), stdev(ys))
}

fn correlation_with(xs: &[f64], ys: &[f64], sx: Option<f64>, sy: Option<f64>) -> Option<f64> {
    let (sx, sy) = (sx?, sy?);
    if sx == 0.0 || sy == 0.0 {
        return None;
    }
    let r = covariance(xs, ys)? / (sx * sy);
    r.is_finite().then(|| r.clamp(-1.0, 1.0))
}
