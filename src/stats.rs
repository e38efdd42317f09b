//! Descriptive statistics and distributions over normalized entries
//!
//! Percentiles use the rank-based linear interpolation method, variance uses
//! the sample (n-1) denominator, and skewness is the bias-corrected
//! Fisher-Pearson estimator. Undefined statistics (coefficient of variation
//! with a zero mean, skewness with fewer than three samples or zero spread)
//! come back as NaN rather than a substitute value.
//!
//! Source attribution ([`find_stat_sources`]) matches on exact floating-point
//! equality: an interpolated percentile that does not land on an observed
//! value produces no attribution, which is how callers distinguish "this
//! percentile falls on real data" from "this percentile is synthetic".

use crate::types::{ModelBreakdown, NormalizedEntry};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Metric extracted from an entry or breakdown for statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKey {
    Cost,
    TotalTokens,
    InputTokens,
    OutputTokens,
    CacheCreationTokens,
    CacheReadTokens,
}

impl MetricKey {
    /// The metric's value for a whole entry
    pub fn of_entry(self, entry: &NormalizedEntry) -> f64 {
        match self {
            Self::Cost => entry.cost,
            Self::TotalTokens => entry.total_tokens as f64,
            Self::InputTokens => entry.tokens.input_tokens as f64,
            Self::OutputTokens => entry.tokens.output_tokens as f64,
            Self::CacheCreationTokens => entry.tokens.cache_creation_tokens as f64,
            Self::CacheReadTokens => entry.tokens.cache_read_tokens as f64,
        }
    }

    /// The metric's value for a single model's slice of an entry
    pub fn of_breakdown(self, breakdown: &ModelBreakdown) -> f64 {
        match self {
            Self::Cost => breakdown.cost,
            Self::TotalTokens => breakdown.tokens.total() as f64,
            Self::InputTokens => breakdown.tokens.input_tokens as f64,
            Self::OutputTokens => breakdown.tokens.output_tokens as f64,
            Self::CacheCreationTokens => breakdown.tokens.cache_creation_tokens as f64,
            Self::CacheReadTokens => breakdown.tokens.cache_read_tokens as f64,
        }
    }
}

/// Descriptive statistics for one metric
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DescriptiveStats {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub sum: f64,
    pub mean: f64,
    pub median: f64,
    pub standard_deviation: f64,
    /// stddev / mean; NaN when the mean is exactly zero
    pub coefficient_of_variation: f64,
    /// Bias-corrected Fisher-Pearson estimator; NaN when n < 3 or stddev is 0
    pub skewness: f64,
    pub p25: f64,
    pub p75: f64,
    pub p90: f64,
    pub p95: f64,
    pub p99: f64,
    pub iqr: f64,
}

/// Interpolated percentile of an ascending-sorted slice, `p` in `[0, 1]`
///
/// Rank-based ("inclusive") method: rank = p * (n - 1), interpolating between
/// the neighboring observations. Empty input yields 0.
pub fn percentile(sorted: &[f64], p: f64) -> f64 {
    match sorted.len() {
        0 => 0.0,
        1 => sorted[0],
        n => {
            let rank = p * (n - 1) as f64;
            let lower = rank.floor() as usize;
            let upper = rank.ceil() as usize;
            if lower == upper {
                sorted[lower]
            } else {
                let fraction = rank - lower as f64;
                sorted[lower] + (sorted[upper] - sorted[lower]) * fraction
            }
        }
    }
}

/// Compute descriptive statistics for a set of values
///
/// The input need not be sorted and is not mutated; a sorted copy is taken
/// internally.
pub fn compute_stats(values: &[f64]) -> DescriptiveStats {
    let n = values.len();
    if n == 0 {
        return DescriptiveStats {
            count: 0,
            min: 0.0,
            max: 0.0,
            sum: 0.0,
            mean: 0.0,
            median: 0.0,
            standard_deviation: 0.0,
            coefficient_of_variation: f64::NAN,
            skewness: f64::NAN,
            p25: 0.0,
            p75: 0.0,
            p90: 0.0,
            p95: 0.0,
            p99: 0.0,
            iqr: 0.0,
        };
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let sum: f64 = sorted.iter().sum();
    let mean = sum / n as f64;

    // Sample variance (n - 1 denominator), zero for a single observation
    let variance = if n > 1 {
        sorted.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64
    } else {
        0.0
    };
    let standard_deviation = variance.sqrt();

    let coefficient_of_variation = if mean == 0.0 {
        f64::NAN
    } else {
        standard_deviation / mean
    };

    let skewness = if n < 3 || standard_deviation == 0.0 {
        f64::NAN
    } else {
        let cubed_sum: f64 = sorted
            .iter()
            .map(|v| ((v - mean) / standard_deviation).powi(3))
            .sum();
        let n = n as f64;
        n / ((n - 1.0) * (n - 2.0)) * cubed_sum
    };

    let p25 = percentile(&sorted, 0.25);
    let p75 = percentile(&sorted, 0.75);

    DescriptiveStats {
        count: n,
        min: sorted[0],
        max: sorted[n - 1],
        sum,
        mean,
        median: percentile(&sorted, 0.5),
        standard_deviation,
        coefficient_of_variation,
        skewness,
        p25,
        p75,
        p90: percentile(&sorted, 0.90),
        p95: percentile(&sorted, 0.95),
        p99: percentile(&sorted, 0.99),
        iqr: p75 - p25,
    }
}

/// One point of a sorted distribution: percentile rank 0..=100 and the value
/// observed there
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DistributionPoint {
    pub rank: u32,
    pub value: f64,
}

/// Sorted distribution of one metric across entries
///
/// Values sort ascending; rank at index i is `round(i / (n-1) * 100)`. A
/// single value sits at rank 100.
pub fn build_distribution(entries: &[NormalizedEntry], metric: MetricKey) -> Vec<DistributionPoint> {
    let mut values: Vec<f64> = entries.iter().map(|e| metric.of_entry(e)).collect();
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let n = values.len();
    match n {
        0 => Vec::new(),
        1 => vec![DistributionPoint {
            rank: 100,
            value: values[0],
        }],
        _ => values
            .into_iter()
            .enumerate()
            .map(|(i, value)| DistributionPoint {
                rank: (i as f64 / (n - 1) as f64 * 100.0).round() as u32,
                value,
            })
            .collect(),
    }
}

/// The statistics eligible for exact-match source attribution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatKind {
    Min,
    Max,
    Median,
    P75,
    P90,
    P95,
    P99,
}

impl StatKind {
    /// All attributable statistics, in presentation order
    pub const ALL: [StatKind; 7] = [
        Self::Min,
        Self::Max,
        Self::Median,
        Self::P75,
        Self::P90,
        Self::P95,
        Self::P99,
    ];

    fn value(self, stats: &DescriptiveStats) -> f64 {
        match self {
            Self::Min => stats.min,
            Self::Max => stats.max,
            Self::Median => stats.median,
            Self::P75 => stats.p75,
            Self::P90 => stats.p90,
            Self::P95 => stats.p95,
            Self::P99 => stats.p99,
        }
    }
}

impl fmt::Display for StatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Min => write!(f, "min"),
            Self::Max => write!(f, "max"),
            Self::Median => write!(f, "median"),
            Self::P75 => write!(f, "p75"),
            Self::P90 => write!(f, "p90"),
            Self::P95 => write!(f, "p95"),
            Self::P99 => write!(f, "p99"),
        }
    }
}

/// A labeled observation for source attribution
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledValue {
    pub label: String,
    pub value: f64,
}

impl LabeledValue {
    pub fn new(label: impl Into<String>, value: f64) -> Self {
        Self {
            label: label.into(),
            value,
        }
    }
}

/// Which original entries produced each statistic
///
/// For every attributable statistic, collects the labels of all observations
/// exactly equal to it, in input order. Statistics with no exact match are
/// absent from the map.
pub fn find_stat_sources(
    values: &[LabeledValue],
    stats: &DescriptiveStats,
) -> HashMap<StatKind, Vec<String>> {
    let mut sources = HashMap::new();
    for kind in StatKind::ALL {
        let target = kind.value(stats);
        let labels: Vec<String> = values
            .iter()
            .filter(|v| v.value == target)
            .map(|v| v.label.clone())
            .collect();
        if !labels.is_empty() {
            sources.insert(kind, labels);
        }
    }
    sources
}

/// Name of the implicit bucket for entries without per-model detail
pub const OTHER_BUCKET: &str = "Other";

/// Extract one metric per entry, restricted to a visible subset of models
///
/// Entries with breakdowns contribute the metric summed over their visible
/// models only, and are skipped when none of their models is visible.
/// Entries without breakdowns contribute their aggregate value under the
/// implicit "Other" bucket, but only when `include_other` is set and "Other"
/// is itself visible.
pub fn extract_metric_for_visible_models(
    entries: &[NormalizedEntry],
    metric: MetricKey,
    visible_models: &HashSet<String>,
    include_other: bool,
) -> Vec<f64> {
    let other_visible = include_other && visible_models.contains(OTHER_BUCKET);

    let mut values = Vec::new();
    for entry in entries {
        match entry.model_breakdowns.as_deref() {
            Some(breakdowns) if !breakdowns.is_empty() => {
                let visible: Vec<&ModelBreakdown> = breakdowns
                    .iter()
                    .filter(|b| visible_models.contains(&b.model_name))
                    .collect();
                if visible.is_empty() {
                    continue;
                }
                values.push(visible.iter().map(|b| metric.of_breakdown(b)).sum());
            }
            _ => {
                if other_visible {
                    values.push(metric.of_entry(entry));
                }
            }
        }
    }
    values
}

/// Descriptive statistics over the visible-model filtered metric
pub fn compute_stats_for_visible_models(
    entries: &[NormalizedEntry],
    metric: MetricKey,
    visible_models: &HashSet<String>,
    include_other: bool,
) -> DescriptiveStats {
    compute_stats(&extract_metric_for_visible_models(
        entries,
        metric,
        visible_models,
        include_other,
    ))
}

/// Invert a distribution: the rank a value would occupy
///
/// Values at or beyond the distribution's boundaries snap to rank 0 or 100;
/// interior values interpolate linearly between the bracketing points' ranks.
/// An empty distribution has no rank for anything.
pub fn find_rank_for_value(points: &[DistributionPoint], value: f64) -> Option<f64> {
    let first = points.first()?;
    let last = points.last()?;

    if value >= last.value {
        return Some(100.0);
    }
    if value <= first.value {
        return Some(0.0);
    }

    for pair in points.windows(2) {
        let (lo, hi) = (pair[0], pair[1]);
        if value >= lo.value && value <= hi.value {
            if hi.value == lo.value {
                return Some(lo.rank as f64);
            }
            let fraction = (value - lo.value) / (hi.value - lo.value);
            return Some(lo.rank as f64 + fraction * (hi.rank - lo.rank) as f64);
        }
    }

    None
}
